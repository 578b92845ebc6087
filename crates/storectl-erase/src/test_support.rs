//! A scripted in-memory block device shared by this crate's test
//! modules (range/time/boot erase all need identical sequential
//! read/write/flush semantics over a backing buffer, unlike the
//! per-feature mocks in the other crates which each script a different,
//! narrow command sequence).
#![cfg(test)]

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use storectl_core::device::{AtaIdentify, AtaOutcome, AtaTaskfile, DataPhase, DriveClass, IdentifyData, NvmeCommand, NvmeOutcome, ScsiOutcome, TransportHints};
use storectl_core::{DeviceHandle, Error, Result};

const ATA_CMD_READ_SECTORS_EXT: u8 = 0x24;
const ATA_CMD_WRITE_SECTORS_EXT: u8 = 0x34;
const ATA_CMD_FLUSH_CACHE_EXT: u8 = 0xEA;

pub struct MockDevice {
    pub block_size: u32,
    pub storage: Vec<u8>,
    pub max_lba_value: u64,
    identify_data: IdentifyData,
}

impl MockDevice {
    pub fn new(block_size: u32, blocks: u64) -> Self {
        Self {
            block_size,
            storage: vec![0u8; block_size as usize * blocks as usize],
            max_lba_value: blocks,
            identify_data: IdentifyData::Ata(AtaIdentify { words: [0u16; 256] }),
        }
    }
}

impl DeviceHandle for MockDevice {
    fn drive_class(&self) -> DriveClass {
        DriveClass::Ata
    }

    fn identify(&self) -> &IdentifyData {
        &self.identify_data
    }

    fn block_size(&self) -> u32 {
        self.block_size
    }

    fn max_lba(&self) -> u64 {
        self.max_lba_value
    }

    fn min_dma_alignment(&self) -> u32 {
        1
    }

    fn transport_hints(&self) -> TransportHints {
        TransportHints {
            sat_layer_present: false,
            direct_ata_path: true,
            dma_available: true,
        }
    }

    fn ata_command(&mut self, cmd: &AtaTaskfile, data: DataPhase<'_>) -> Result<AtaOutcome> {
        let block_size = self.block_size as usize;
        match cmd.command {
            ATA_CMD_READ_SECTORS_EXT => {
                if let DataPhase::In(buf) = data {
                    let start = cmd.lba as usize * block_size;
                    buf.copy_from_slice(&self.storage[start..start + buf.len()]);
                }
                Ok(AtaOutcome { status: 0, error: 0 })
            }
            ATA_CMD_WRITE_SECTORS_EXT => {
                if let DataPhase::Out(buf) = data {
                    let start = cmd.lba as usize * block_size;
                    self.storage[start..start + buf.len()].copy_from_slice(buf);
                }
                Ok(AtaOutcome { status: 0, error: 0 })
            }
            ATA_CMD_FLUSH_CACHE_EXT => Ok(AtaOutcome { status: 0, error: 0 }),
            _ => Ok(AtaOutcome { status: 0x01, error: 0 }),
        }
    }

    fn scsi_command(&mut self, _cdb: &[u8], _data: DataPhase<'_>) -> Result<ScsiOutcome> {
        Err(Error::NotSupported)
    }

    fn nvme_command(&mut self, _cmd: &NvmeCommand, _data: DataPhase<'_>) -> Result<NvmeOutcome> {
        Err(Error::NotSupported)
    }

    fn refresh_identify(&mut self) -> Result<()> {
        Ok(())
    }
}
