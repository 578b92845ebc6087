//! Protocol-dispatched block read/write/flush, the one piece of "send a
//! command and get bytes back" that Host Erase and Max-LBA restore need
//! which isn't already owned by another feature crate. Unlike
//! `storectl-core::dispatch` (native-ATA-vs-SATL for ATA Security), this
//! dispatches across all three drive classes for plain sequential I/O.

use storectl_core::device::{AtaTaskfile, DataPhase};
use storectl_core::{DeviceHandle, DriveClass, Error, NvmeCommand, Result};

const ATA_CMD_READ_SECTORS_EXT: u8 = 0x24;
const ATA_CMD_WRITE_SECTORS_EXT: u8 = 0x34;
const ATA_CMD_FLUSH_CACHE_EXT: u8 = 0xEA;

const SCSI_OPCODE_READ16: u8 = 0x88;
const SCSI_OPCODE_WRITE16: u8 = 0x8A;
const SCSI_OPCODE_SYNCHRONIZE_CACHE16: u8 = 0x91;

const NVME_OPCODE_WRITE: u8 = 0x01;
const NVME_OPCODE_READ: u8 = 0x02;
const NVME_OPCODE_FLUSH: u8 = 0x00;

fn read16_cdb(lba: u64, block_count: u32) -> [u8; 16] {
    let mut cdb = [0u8; 16];
    cdb[0] = SCSI_OPCODE_READ16;
    cdb[2..10].copy_from_slice(&lba.to_be_bytes());
    cdb[10..14].copy_from_slice(&block_count.to_be_bytes());
    cdb
}

fn write16_cdb(lba: u64, block_count: u32) -> [u8; 16] {
    let mut cdb = [0u8; 16];
    cdb[0] = SCSI_OPCODE_WRITE16;
    cdb[2..10].copy_from_slice(&lba.to_be_bytes());
    cdb[10..14].copy_from_slice(&block_count.to_be_bytes());
    cdb
}

fn synchronize_cache16_cdb() -> [u8; 16] {
    let mut cdb = [0u8; 16];
    cdb[0] = SCSI_OPCODE_SYNCHRONIZE_CACHE16;
    cdb
}

/// Reads `block_count` blocks starting at `lba` into `buf` (`buf.len()`
/// must equal `block_count * device.block_size`).
pub fn read_blocks(device: &mut dyn DeviceHandle, lba: u64, block_count: u32, buf: &mut [u8]) -> Result<()> {
    match device.drive_class() {
        DriveClass::Ata => {
            let mut taskfile = AtaTaskfile::new(ATA_CMD_READ_SECTORS_EXT);
            taskfile.lba = lba;
            taskfile.sector_count = block_count as u16;
            taskfile.uses_48bit = true;
            let outcome = device.ata_command(&taskfile, DataPhase::In(buf))?;
            if !outcome.succeeded() {
                return Err(Error::Failure("READ SECTORS EXT rejected by device"));
            }
        }
        DriveClass::Scsi => {
            let cdb = read16_cdb(lba, block_count);
            let outcome = device.scsi_command(&cdb, DataPhase::In(buf))?;
            if !outcome.is_good() {
                return Err(Error::Failure("READ(16) rejected by device"));
            }
        }
        DriveClass::Nvme => {
            let mut cmd = NvmeCommand::new(NVME_OPCODE_READ, 1);
            cmd.cdw10 = lba as u32;
            cmd.cdw11 = (lba >> 32) as u32;
            cmd.cdw12 = block_count.saturating_sub(1);
            let outcome = device.nvme_command(&cmd, DataPhase::In(buf))?;
            if !outcome.succeeded() {
                return Err(Error::Failure("NVMe Read rejected by device"));
            }
        }
    }
    Ok(())
}

/// Writes `block_count` blocks starting at `lba` from `buf`.
pub fn write_blocks(device: &mut dyn DeviceHandle, lba: u64, block_count: u32, buf: &[u8]) -> Result<()> {
    match device.drive_class() {
        DriveClass::Ata => {
            let mut taskfile = AtaTaskfile::new(ATA_CMD_WRITE_SECTORS_EXT);
            taskfile.lba = lba;
            taskfile.sector_count = block_count as u16;
            taskfile.uses_48bit = true;
            let outcome = device.ata_command(&taskfile, DataPhase::Out(buf))?;
            if !outcome.succeeded() {
                return Err(Error::Failure("WRITE SECTORS EXT rejected by device"));
            }
        }
        DriveClass::Scsi => {
            let cdb = write16_cdb(lba, block_count);
            let outcome = device.scsi_command(&cdb, DataPhase::Out(buf))?;
            if !outcome.is_good() {
                return Err(Error::Failure("WRITE(16) rejected by device"));
            }
        }
        DriveClass::Nvme => {
            let mut cmd = NvmeCommand::new(NVME_OPCODE_WRITE, 1);
            cmd.cdw10 = lba as u32;
            cmd.cdw11 = (lba >> 32) as u32;
            cmd.cdw12 = block_count.saturating_sub(1);
            let outcome = device.nvme_command(&cmd, DataPhase::Out(buf))?;
            if !outcome.succeeded() {
                return Err(Error::Failure("NVMe Write rejected by device"));
            }
        }
    }
    Ok(())
}

/// Flushes the device's write cache.
pub fn flush_cache(device: &mut dyn DeviceHandle) -> Result<()> {
    match device.drive_class() {
        DriveClass::Ata => {
            let taskfile = AtaTaskfile::new(ATA_CMD_FLUSH_CACHE_EXT);
            let outcome = device.ata_command(&taskfile, DataPhase::None)?;
            if !outcome.succeeded() {
                return Err(Error::Failure("FLUSH CACHE EXT rejected by device"));
            }
        }
        DriveClass::Scsi => {
            let cdb = synchronize_cache16_cdb();
            let outcome = device.scsi_command(&cdb, DataPhase::None)?;
            if !outcome.is_good() {
                return Err(Error::Failure("SYNCHRONIZE CACHE(16) rejected by device"));
            }
        }
        DriveClass::Nvme => {
            let cmd = NvmeCommand::new(NVME_OPCODE_FLUSH, 1);
            let outcome = device.nvme_command(&cmd, DataPhase::None)?;
            if !outcome.succeeded() {
                return Err(Error::Failure("NVMe Flush rejected by device"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read16_cdb_places_lba_and_count() {
        let cdb = read16_cdb(0x0102_0304_0506, 16);
        assert_eq!(cdb[0], SCSI_OPCODE_READ16);
        assert_eq!(&cdb[2..10], &0x0102_0304_0506u64.to_be_bytes());
        assert_eq!(&cdb[10..14], &16u32.to_be_bytes());
    }

    #[test]
    fn write16_cdb_places_lba_and_count() {
        let cdb = write16_cdb(5, 1);
        assert_eq!(cdb[0], SCSI_OPCODE_WRITE16);
        assert_eq!(&cdb[10..14], &1u32.to_be_bytes());
    }
}
