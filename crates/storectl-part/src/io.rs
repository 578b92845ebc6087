//! Protocol-dispatched read-only block I/O. A read-only sibling of
//! `storectl_erase::io`: this crate never writes a device, so only the
//! read half is reproduced here.

use storectl_core::device::{AtaTaskfile, DataPhase};
use storectl_core::{DeviceHandle, DriveClass, Error, NvmeCommand, Result};

const ATA_CMD_READ_SECTORS_EXT: u8 = 0x24;
const SCSI_OPCODE_READ16: u8 = 0x88;
const NVME_OPCODE_READ: u8 = 0x02;

fn read16_cdb(lba: u64, block_count: u32) -> [u8; 16] {
    let mut cdb = [0u8; 16];
    cdb[0] = SCSI_OPCODE_READ16;
    cdb[2..10].copy_from_slice(&lba.to_be_bytes());
    cdb[10..14].copy_from_slice(&block_count.to_be_bytes());
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
}
