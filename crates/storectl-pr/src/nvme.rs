//! NVMe Reservation Register/Acquire/Release commands (
//! "Operations").

use storectl_core::device::{DataPhase, NvmeCommand};
use storectl_core::{DeviceHandle, Error, Result};

use crate::types::ReservationType;

pub const OPCODE_RESERVATION_REGISTER: u8 = 0x0D;
pub const OPCODE_RESERVATION_REPORT: u8 = 0x0E;
pub const OPCODE_RESERVATION_ACQUIRE: u8 = 0x11;
pub const OPCODE_RESERVATION_RELEASE: u8 = 0x15;

/// CPTPL values for Reservation Register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePersistThroughPowerLoss {
    NoChange,
    Clear,
    Set,
}

impl ChangePersistThroughPowerLoss {
    fn code(self) -> u32 {
        match self {
            Self::NoChange => 0,
            Self::Clear => 2,
            Self::Set => 3,
        }
    }
}

const RREGA_REGISTER: u32 = 0;
const RREGA_UNREGISTER: u32 = 1;

fn register_command(rrega: u32, cptpl: ChangePersistThroughPowerLoss, ignore_existing: bool) -> NvmeCommand {
    let mut cmd = NvmeCommand::new(OPCODE_RESERVATION_REGISTER, 1);
    cmd.cdw10 = rrega | ((ignore_existing as u32) << 3) | (cptpl.code() << 30);
    cmd
}

/// Reservation Register: current key = `current`, new/service-action
/// key = `new_key`.
pub fn register(device: &mut dyn DeviceHandle, current: u64, new_key: u64, cptpl: ChangePersistThroughPowerLoss, ignore_existing: bool) -> Result<()> {
    let cmd = register_command(RREGA_REGISTER, cptpl, ignore_existing);
    let mut data = [0u8; 16];
    data[0..8].copy_from_slice(&current.to_le_bytes());
    data[8..16].copy_from_slice(&new_key.to_le_bytes());
    let outcome = device.nvme_command(&cmd, DataPhase::Out(&data))?;
    if !outcome.succeeded() {
        return Err(Error::Failure("Reservation Register rejected by controller"));
    }
    Ok(())
}

/// Reservation Register unregister op.
pub fn unregister(device: &mut dyn DeviceHandle, current: u64) -> Result<()> {
    let cmd = register_command(RREGA_UNREGISTER, ChangePersistThroughPowerLoss::NoChange, false);
    let mut data = [0u8; 16];
    data[0..8].copy_from_slice(&current.to_le_bytes());
    let outcome = device.nvme_command(&cmd, DataPhase::Out(&data))?;
    if !outcome.succeeded() {
        return Err(Error::Failure("Reservation Register (unregister) rejected by controller"));
    }
    Ok(())
}

const RACQA_ACQUIRE: u32 = 0;
const RACQA_PREEMPT: u32 = 1;
const RACQA_PREEMPT_AND_ABORT: u32 = 2;

fn acquire_command(racqa: u32, reservation_type: ReservationType) -> Result<NvmeCommand> {
    let rtype = reservation_type.nvme_code().ok_or(Error::BadParameter)?;
    let mut cmd = NvmeCommand::new(OPCODE_RESERVATION_ACQUIRE, 1);
    cmd.cdw10 = racqa | ((rtype as u32) << 8);
    Ok(cmd)
}

/// Reservation Acquire: rejects obsolete SCSI-only reservation types
/// since they have no NVMe code.
pub fn acquire(device: &mut dyn DeviceHandle, current: u64, reservation_type: ReservationType) -> Result<()> {
    let cmd = acquire_command(RACQA_ACQUIRE, reservation_type)?;
    let mut data = [0u8; 16];
    data[0..8].copy_from_slice(&current.to_le_bytes());
    let outcome = device.nvme_command(&cmd, DataPhase::Out(&data))?;
    if !outcome.succeeded() {
        return Err(Error::Failure("Reservation Acquire rejected by controller"));
    }
    Ok(())
}

/// Reservation Acquire with a preempt op: `abort` selects
/// Preempt-and-Abort (RACQA=2) over plain Preempt (RACQA=1).
pub fn preempt(device: &mut dyn DeviceHandle, current: u64, preempt_key: u64, reservation_type: ReservationType, abort: bool) -> Result<()> {
    let racqa = if abort { RACQA_PREEMPT_AND_ABORT } else { RACQA_PREEMPT };
    let cmd = acquire_command(racqa, reservation_type)?;
    let mut data = [0u8; 16];
    data[0..8].copy_from_slice(&current.to_le_bytes());
    data[8..16].copy_from_slice(&preempt_key.to_le_bytes());
    let outcome = device.nvme_command(&cmd, DataPhase::Out(&data))?;
    if !outcome.succeeded() {
        return Err(Error::Failure("Reservation Acquire (preempt) rejected by controller"));
    }
    Ok(())
}

const RRELA_RELEASE: u32 = 0;
const RRELA_CLEAR: u32 = 1;

fn release_command(rrela: u32, reservation_type: ReservationType) -> Result<NvmeCommand> {
    let rtype = reservation_type.nvme_code().ok_or(Error::BadParameter)?;
    let mut cmd = NvmeCommand::new(OPCODE_RESERVATION_RELEASE, 1);
    cmd.cdw10 = rrela | ((rtype as u32) << 8);
    Ok(cmd)
}

/// Reservation Release.
pub fn release(device: &mut dyn DeviceHandle, current: u64, reservation_type: ReservationType) -> Result<()> {
    let cmd = release_command(RRELA_RELEASE, reservation_type)?;
    let data = current.to_le_bytes();
    let outcome = device.nvme_command(&cmd, DataPhase::Out(&data))?;
    if !outcome.succeeded() {
        return Err(Error::Failure("Reservation Release rejected by controller"));
    }
    Ok(())
}

/// Reservation Release clear op. The reservation
/// type field is ignored by the clear op but the command still requires
/// one; `WriteExclusive` is passed as an arbitrary legal placeholder.
pub fn clear(device: &mut dyn DeviceHandle, current: u64) -> Result<()> {
    let cmd = release_command(RRELA_CLEAR, ReservationType::WriteExclusive)?;
    let data = current.to_le_bytes();
    let outcome = device.nvme_command(&cmd, DataPhase::Out(&data))?;
    if !outcome.succeeded() {
        return Err(Error::Failure("Reservation Release (clear) rejected by controller"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_command_packs_rrega_cptpl_and_iekey() {
        let cmd = register_command(RREGA_REGISTER, ChangePersistThroughPowerLoss::Set, true);
        assert_eq!(cmd.cdw10 & 0x7, RREGA_REGISTER);
        assert_eq!((cmd.cdw10 >> 3) & 0x1, 1);
        assert_eq!(cmd.cdw10 >> 30, 3);
    }

    #[test]
    fn acquire_command_rejects_obsolete_scsi_only_type() {
        assert_eq!(acquire_command(RACQA_ACQUIRE, ReservationType::ReadShared).unwrap_err(), Error::BadParameter);
    }

    #[test]
    fn acquire_command_packs_racqa_and_rtype() {
        let cmd = acquire_command(RACQA_PREEMPT, ReservationType::ExclusiveAccessAllRegistrants).unwrap();
        assert_eq!(cmd.cdw10 & 0x7, RACQA_PREEMPT);
        assert_eq!((cmd.cdw10 >> 8) & 0xFF, 6);
    }
}
