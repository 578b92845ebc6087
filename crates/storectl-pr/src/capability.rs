//! Report Capabilities: the SCSI fixed
//! 8-byte response, and its NVMe synthesis from controller/namespace
//! identify data.

use storectl_core::device::DataPhase;
use storectl_core::{DeviceHandle, DriveClass, Error, Result};

use crate::scsi::{pr_in_cdb, SERVICE_ACTION_REPORT_CAPABILITIES};
use crate::types::{AllowedCommands, Capability};

const RESPONSE_LEN: usize = 8;

fn parse(body: &[u8; RESPONSE_LEN]) -> Capability {
    Capability {
        replace_lost_reservation_capable: body[2] & 0x80 != 0,
        compatible_reservation_handling: body[2] & 0x20 != 0,
        specify_initiator_ports_capable: body[2] & 0x10 != 0,
        all_target_ports_capable: body[2] & 0x08 != 0,
        persist_through_power_loss_capable: body[2] & 0x01 != 0,
        persist_through_power_loss_activated: body[3] & 0x01 != 0,
        allowed_commands: AllowedCommands::from_code((body[3] >> 4) & 0x07),
        type_mask: u16::from_be_bytes([body[6], body[7]]),
    }
}

fn read_scsi(device: &mut dyn DeviceHandle) -> Result<Capability> {
    let cdb = pr_in_cdb(SERVICE_ACTION_REPORT_CAPABILITIES, RESPONSE_LEN as u16);
    let mut buf = [0u8; RESPONSE_LEN];
    let outcome = device.scsi_command(&cdb, DataPhase::In(&mut buf))?;
    if !outcome.is_good() {
        return Err(Error::Failure("PERSISTENT RESERVE IN / Report Capabilities rejected by device"));
    }
    Ok(parse(&buf))
}

/// Synthesizes the capability view for an NVMe device from controller
/// identify ONCS bit 5 and namespace identify RESCAP. Returns
/// `Error::NotSupported` when ONCS bit 5 (reservations supported) is
/// clear.
fn synthesize_nvme(device: &mut dyn DeviceHandle) -> Result<Capability> {
    let identify = device.nvme_identify()?;
    let oncs = u16::from_le_bytes([identify.controller[520], identify.controller[521]]);
    if oncs & (1 << 5) == 0 {
        return Err(Error::NotSupported);
    }
    let rescap = identify.namespace[30];
    let mut type_mask = 0u16;
    if rescap & (1 << 1) != 0 {
        type_mask |= 1 << 1; // WE
    }
    if rescap & (1 << 2) != 0 {
        type_mask |= 1 << 3; // EA
    }
    if rescap & (1 << 3) != 0 {
        type_mask |= 1 << 5; // WE-RO
    }
    if rescap & (1 << 4) != 0 {
        type_mask |= 1 << 6; // EA-RO
    }
    if rescap & (1 << 5) != 0 {
        type_mask |= 1 << 7; // WE-AR
    }
    if rescap & (1 << 6) != 0 {
        type_mask |= 1 << 8; // EA-AR
    }
    Ok(Capability {
            replace_lost_reservation_capable: false,
            compatible_reservation_handling: false,
            specify_initiator_ports_capable: false,
            all_target_ports_capable: false,
            persist_through_power_loss_capable: rescap & (1 << 0) != 0,
            persist_through_power_loss_activated: false,
            allowed_commands: AllowedCommands::NotSpecified,
            type_mask,
    })
}

/// Reads the capability view for whichever protocol `device` speaks.
pub fn read_capability(device: &mut dyn DeviceHandle) -> Result<Capability> {
    match device.drive_class() {
        DriveClass::Scsi | DriveClass::Ata => read_scsi(device),
        DriveClass::Nvme => synthesize_nvme(device),
    }
}
