//! Protocol dispatch: choosing between raw-ATA and SATL-wrapped command
//! forms for features that exist in both. This module owns the
//! *decision procedure* and the SECURITY PROTOCOL IN/OUT CDB shape;
//! feature modules (ATA Security in particular) call into it to decide
//! which parameter-block serialization to use, then serialize
//! bit-exactly themselves — a naive `memcpy` between the native and
//! SATL forms is wrong for two fields.

use crate::device::{DataPhase, DeviceHandle, DriveClass};
use crate::error::{Error, Result};

/// The SAT Security Protocol id reserved for ATA Security pass-through.
pub const SECURITY_PROTOCOL_ATA_SECURITY: u8 = 0xEF;

/// Which wire form a dispatched operation should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityPath {
    NativeAta,
    Satl,
}

/// Builds a SECURITY PROTOCOL IN CDB (opcode 0xA2, SPC-4 §6.30).
///
/// `protocol_specific` is the 16-bit protocol-specific field (for
/// protocol 0xEF this selects which ATA Security sub-page to read).
/// `allocation_length` is in bytes; INC_512 is never set, matching the
/// byte-granular reads this module performs.
fn security_protocol_in_cdb(protocol: u8, protocol_specific: u16, allocation_length: u32) -> [u8; 12] {
    let mut cdb = [0u8; 12];
    cdb[0] = 0xA2;
    cdb[1] = protocol;
    cdb[2..4].copy_from_slice(&protocol_specific.to_be_bytes());
    cdb[6..10].copy_from_slice(&allocation_length.to_be_bytes());
    cdb
}

/// Builds a SECURITY PROTOCOL OUT CDB (opcode 0xB5, SPC-4 §6.31).
pub fn security_protocol_out_cdb(protocol: u8, protocol_specific: u16, transfer_length: u32) -> [u8; 12] {
    let mut cdb = [0u8; 12];
    cdb[0] = 0xB5;
    cdb[1] = protocol;
    cdb[2..4].copy_from_slice(&protocol_specific.to_be_bytes());
    cdb[6..10].copy_from_slice(&transfer_length.to_be_bytes());
    cdb
}

/// Runs the decision procedure of steps 1-4.
///
/// `force_satl`: `Some(true)` always uses SATL, `Some(false)` always
/// uses native ATA (honoring an explicit caller override per step 1);
/// `None` runs the normal probe (steps 2-4).
pub fn choose_security_path(device: &mut dyn DeviceHandle, force_satl: Option<bool>) -> Result<SecurityPath> {
    if let Some(force) = force_satl {
        return Ok(if force { SecurityPath::Satl } else { SecurityPath::NativeAta });
    }

    let hints = device.transport_hints();
    if device.drive_class() == DriveClass::Ata && hints.direct_ata_path {
        return Ok(SecurityPath::NativeAta);
    }

    if device.drive_class() != DriveClass::Scsi && device.drive_class() != DriveClass::Ata {
        return Err(Error::NotSupported);
    }

    probe_satl_security_protocol(device)
}

/// Queries the supported-protocols page, then sanity-reads the ATA
/// Security specific page.
fn probe_satl_security_protocol(device: &mut dyn DeviceHandle) -> Result<SecurityPath> {
    let mut info_page = [0u8; 64];
    let cdb = security_protocol_in_cdb(0x00, 0x0000, info_page.len() as u32);
    let outcome = device.scsi_command(&cdb, DataPhase::In(&mut info_page))?;
    if !outcome.is_good() {
        return Err(Error::NotSupported);
    }

    // Supported Security Protocols List: 8-byte header, then one byte
    // per supported protocol id.
    let list_len = u32::from_be_bytes(info_page[4..8].try_into().unwrap()) as usize;
    let list = &info_page[8..(8 + list_len).min(info_page.len())];
    if !list.contains(&SECURITY_PROTOCOL_ATA_SECURITY) {
        return Err(Error::NotSupported);
    }

    let mut sanity = [0u8; 0x0E];
    let cdb = security_protocol_in_cdb(SECURITY_PROTOCOL_ATA_SECURITY, 0x0001, sanity.len() as u32);
    let outcome = device.scsi_command(&cdb, DataPhase::In(&mut sanity))?;
    if !outcome.is_good() {
        return Err(Error::NotSupported);
    }

    // The ATA Security protocol-specific page's length byte must agree
    // with the length we asked for; otherwise the SATL doesn't actually
    // implement the pass-through, just acknowledges the protocol id.
    if sanity[1] as usize != sanity.len() - 2 {
        return Err(Error::NotSupported);
    }

    Ok(SecurityPath::Satl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_security_protocol_in_cdb() {
        let cdb = security_protocol_in_cdb(0xEF, 0x0001, 0x0E);
        assert_eq!(cdb[0], 0xA2);
        assert_eq!(cdb[1], 0xEF);
        assert_eq!(&cdb[2..4], &0x0001u16.to_be_bytes());
        assert_eq!(&cdb[6..10], &0x0Eu32.to_be_bytes());
    }

    #[test]
    fn builds_security_protocol_out_cdb() {
        let cdb = security_protocol_out_cdb(0xEF, 0x0001, 512);
        assert_eq!(cdb[0], 0xB5);
        assert_eq!(&cdb[6..10], &512u32.to_be_bytes());
    }
}
