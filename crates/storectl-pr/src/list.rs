//! Count-then-fetch list reads:
//! registration keys, reservations, and full-status entries, plus the
//! pre-SPC-3 full-status fallback synthesis.

use alloc::vec::Vec;

use storectl_core::device::DataPhase;
use storectl_core::{DeviceHandle, Error, Result};

use crate::scsi::{pr_in_cdb, SERVICE_ACTION_READ_FULL_STATUS, SERVICE_ACTION_READ_KEYS, SERVICE_ACTION_READ_RESERVATION};
use crate::types::{FullReservationEntry, RegistrationKey, Reservation, ReservationScope, ReservationType};

const HEADER_LEN: usize = 8;

fn header_additional_length(header: &[u8]) -> u32 {
    u32::from_be_bytes(header[4..8].try_into().unwrap())
}

fn read_with_count_then_fetch(device: &mut dyn DeviceHandle, service_action: u8) -> Result<Vec<u8>> {
    let mut probe = [0u8; HEADER_LEN];
    let cdb = pr_in_cdb(service_action, HEADER_LEN as u16);
    let outcome = device.scsi_command(&cdb, DataPhase::In(&mut probe))?;
    if !outcome.is_good() {
        return Err(Error::Failure("PERSISTENT RESERVE IN count query rejected by device"));
    }
    let additional_length = header_additional_length(&probe);
    let total_len = HEADER_LEN + additional_length as usize;

    let mut buf = alloc::vec![0u8; total_len];
    let cdb = pr_in_cdb(service_action, total_len as u16);
    let outcome = device.scsi_command(&cdb, DataPhase::In(&mut buf))?;
    if !outcome.is_good() {
        return Err(Error::Failure("PERSISTENT RESERVE IN fetch rejected by device"));
    }
    // The generation number may have advanced between the count and the
    // fetch; the view is accepted as "latest at fetch time"
    // without re-counting.
    Ok(buf)
}

/// Reads the registration key list. Keys are packed 8-byte
/// big-endian values starting at byte 8.
pub fn read_keys(device: &mut dyn DeviceHandle) -> Result<Vec<RegistrationKey>> {
    let buf = read_with_count_then_fetch(device, SERVICE_ACTION_READ_KEYS)?;
    let additional_length = header_additional_length(&buf) as usize;
    let body = &buf[HEADER_LEN..HEADER_LEN + additional_length];
    Ok(body.chunks_exact(8).map(|c| RegistrationKey(u64::from_be_bytes(c.try_into().unwrap()))).collect())
}

/// Reads the current reservation, if any. An `additional_length` of
/// zero means no reservation is held.
pub fn read_reservation(device: &mut dyn DeviceHandle) -> Result<Option<Reservation>> {
    let buf = read_with_count_then_fetch(device, SERVICE_ACTION_READ_RESERVATION)?;
    let additional_length = header_additional_length(&buf) as usize;
    if additional_length == 0 {
        return Ok(None);
    }
    let d = &buf[HEADER_LEN..HEADER_LEN + 16];
    let holder = RegistrationKey(u64::from_be_bytes(d[0..8].try_into().unwrap()));
    let scope_type = d[13];
    Ok(Some(Reservation {
                holder,
                scope: ReservationScope::from_code(scope_type >> 4),
                reservation_type: ReservationType::from_scsi_code(scope_type & 0x0F).ok_or(Error::Failure("unrecognized reservation type code"))?,
    }))
}

const FULL_STATUS_HEADER_LEN: usize = 24;

/// Reads the full-status list directly from the device. Each
/// descriptor's own additional-descriptor-length field (the last 4
/// bytes of its 24-byte header) is consumed byte-exactly to find the
/// next descriptor, since transport ID lengths vary per entry.
pub fn read_full_status(device: &mut dyn DeviceHandle) -> Result<Vec<FullReservationEntry>> {
    let buf = read_with_count_then_fetch(device, SERVICE_ACTION_READ_FULL_STATUS)?;
    let additional_length = header_additional_length(&buf) as usize;
    let mut body = &buf[HEADER_LEN..HEADER_LEN + additional_length];
    let mut entries = Vec::new();

    while body.len() >= FULL_STATUS_HEADER_LEN {
        let key = RegistrationKey(u64::from_be_bytes(body[0..8].try_into().unwrap()));
        let flags = body[12];
        let scope_type = body[13];
        let relative_target_port_id = u16::from_be_bytes(body[18..20].try_into().unwrap());
        let transport_id_len = u32::from_be_bytes(body[20..24].try_into().unwrap()) as usize;

        let transport_id_start = FULL_STATUS_HEADER_LEN;
        let transport_id_end = transport_id_start + transport_id_len;
        if body.len() < transport_id_end {
            return Err(Error::Failure("full-status transport ID length overruns the response"));
        }

        entries.push(FullReservationEntry {
                key,
                all_target_ports: flags & 0x02 != 0,
                is_holder: flags & 0x01 != 0,
                relative_target_port_id,
                scope: ReservationScope::from_code(scope_type >> 4),
                reservation_type: ReservationType::from_scsi_code(scope_type & 0x0F).ok_or(Error::Failure("unrecognized reservation type code"))?,
                transport_id: body[transport_id_start..transport_id_end].to_vec(),
                synthesized: false,
        });

        body = &body[transport_id_end..];
    }

    Ok(entries)
}

/// Synthesizes a full-status view for pre-SPC-3 devices by joining the
/// registration key list with the current reservation on key equality:
/// every registered key becomes an entry; the one matching the current
/// reservation's holder gets `is_holder=true` and the reservation's
/// scope/type. Relative target port id and transport id are zeroed.
pub fn synthesize_full_status(keys: &[RegistrationKey], reservation: Option<&Reservation>) -> Vec<FullReservationEntry> {
    keys.iter()
    .map(|&key| {
            let held = reservation.filter(|r| r.holder == key);
            FullReservationEntry {
                key,
                all_target_ports: false,
                is_holder: held.is_some(),
                relative_target_port_id: 0,
                scope: held.map_or(ReservationScope::LogicalUnit, |r| r.scope),
                reservation_type: held.map_or(ReservationType::WriteExclusive, |r| r.reservation_type),
                transport_id: Vec::new(),
                synthesized: true,
            }
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_status_synthesis_flags_only_the_holder() {
        let keys = [RegistrationKey(0xA), RegistrationKey(0xB), RegistrationKey(0xC)];
        let reservation = Reservation {
            holder: RegistrationKey(0xB),
            scope: ReservationScope::LogicalUnit,
            reservation_type: ReservationType::WriteExclusiveRegistrantsOnly,
        };
        let entries = synthesize_full_status(&keys, Some(&reservation));
        assert_eq!(entries.len(), 3);
        let holder_count = entries.iter().filter(|e| e.is_holder).count();
        assert_eq!(holder_count, 1);
        let holder = entries.iter().find(|e| e.is_holder).unwrap();
        assert_eq!(holder.key, RegistrationKey(0xB));
        assert_eq!(holder.scope, ReservationScope::LogicalUnit);
        assert_eq!(holder.reservation_type, ReservationType::WriteExclusiveRegistrantsOnly);
        assert!(entries.iter().filter(|e| !e.is_holder).all(|e| e.relative_target_port_id == 0 && e.transport_id.is_empty()));
    }

    #[test]
    fn synthesis_with_no_reservation_marks_nobody_holder() {
        let keys = [RegistrationKey(0x1), RegistrationKey(0x2)];
        let entries = synthesize_full_status(&keys, None);
        assert!(entries.iter().all(|e| !e.is_holder));
    }
}
