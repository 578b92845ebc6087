//! A read-only `DeviceHandle` over a plain disk image file, used by the
//! `partitions` subcommand. This is the one operation that is
//! meaningfully exercisable without a real transport: partition tables
//! are read-only data sitting at known LBAs, not protocol state.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use storectl_core::device::{
    AtaIdentify, AtaOutcome, AtaTaskfile, DataPhase, DriveClass, IdentifyData, NvmeCommand,
    NvmeOutcome, ScsiOutcome, TransportHints,
};
use storectl_core::{DeviceHandle, Error, Result};

const ATA_CMD_READ_SECTORS_EXT: u8 = 0x24;
const BLOCK_SIZE: u32 = 512;

pub struct ImageDevice {
    file: File,
    block_count: u64,
    identify_data: IdentifyData,
}

impl ImageDevice {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
                file,
                block_count: len / BLOCK_SIZE as u64,
                identify_data: IdentifyData::Ata(AtaIdentify { words: [0u16; 256] }),
        })
    }
}

impl DeviceHandle for ImageDevice {
    fn drive_class(&self) -> DriveClass {
        DriveClass::Ata
    }

    fn identify(&self) -> &IdentifyData {
        &self.identify_data
    }

    fn block_size(&self) -> u32 {
        BLOCK_SIZE
    }

    fn max_lba(&self) -> u64 {
        self.block_count
    }

    fn min_dma_alignment(&self) -> u32 {
        1
    }

    fn transport_hints(&self) -> TransportHints {
        TransportHints {
            sat_layer_present: false,
            direct_ata_path: true,
            dma_available: false,
        }
    }

    fn ata_command(&mut self, cmd: &AtaTaskfile, data: DataPhase<'_>) -> Result<AtaOutcome> {
        match cmd.command {
            ATA_CMD_READ_SECTORS_EXT => {
                let DataPhase::In(buf) = data else {
                    return Ok(AtaOutcome { status: 0x01, error: 0x04 });
                };
                let offset = cmd.lba * BLOCK_SIZE as u64;
                self.file
                .seek(SeekFrom::Start(offset))
                .map_err(|_| Error::Failure("seeking disk image"))?;
                self.file
                .read_exact(buf)
                .map_err(|_| Error::Failure("reading disk image (past end of file?)"))?;
                Ok(AtaOutcome { status: 0, error: 0 })
            }
            _ => Ok(AtaOutcome { status: 0x01, error: 0x04 }),
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
