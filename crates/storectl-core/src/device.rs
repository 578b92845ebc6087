//! The `DeviceHandle` seam. This is the "external collaborator"
//! names: a transport library implements it for real hardware; every
//! feature crate in this workspace is generic over it and never touches
//! a transport directly.

use crate::error::{Error, Result};

/// Which wire protocol a device natively speaks. A single physical drive
/// may still be reachable through more than one protocol dispatch path
/// (e.g. an ATA drive behind a SAT layer is `DriveClass::Ata` with
/// `TransportHints::sat_layer_present = true`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveClass {
    Ata,
    Scsi,
    Nvme,
}

/// Transport-reported facts about how a device can be reached, used by
/// the protocol-dispatch decision procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportHints {
    /// A SCSI-ATA-Translation (SAT) layer sits in front of an ATA drive.
    pub sat_layer_present: bool,
    /// The transport reports a direct (non-translated) ATA path.
    pub direct_ata_path: bool,
    /// DMA-mode commands are available on this transport.
    pub dma_available: bool,
}

/// The raw identify payload for one drive class. ATA identify data is
/// always exactly 256 words; SCSI and NVMe identify data are returned
/// as opaque byte buffers, parsed on demand by the feature module that
/// needs a specific field (inquiry data, VPD pages, controller/namespace
/// identify structures).
#[derive(Debug, Clone)]
pub enum IdentifyData {
    Ata(AtaIdentify),
    Scsi(ScsiIdentify),
    Nvme(NvmeIdentify),
}

/// 256-word (512-byte) ATA IDENTIFY DEVICE / IDENTIFY PACKET DEVICE data.
#[derive(Debug, Clone, Copy)]
pub struct AtaIdentify {
    pub words: [u16; 256],
}

impl AtaIdentify {
    pub const fn word(&self, index: usize) -> u16 {
        self.words[index]
    }
}

/// SCSI inquiry + the VPD pages a transport has cached. `vpd` is kept as
/// a small association list rather than a map: the set of pages fetched
/// per device is small (Unit Serial Number, ATA Information, Supported
/// VPD Pages) and a linear scan avoids pulling in a hashing dependency
/// for what is, in practice, 2-4 entries.
#[derive(Debug, Clone)]
pub struct ScsiIdentify {
    pub inquiry: [u8; 96],
    pub vpd: alloc::vec::Vec<(u8, alloc::vec::Vec<u8>)>,
}

impl ScsiIdentify {
    pub fn vpd_page(&self, page: u8) -> Option<&[u8]> {
        self.vpd.iter().find(|(p, _)| *p == page).map(|(_, b)| b.as_slice())
    }
}

/// NVMe controller + namespace identify structures (4096 bytes each per
/// the NVMe spec).
#[derive(Clone)]
pub struct NvmeIdentify {
    pub controller: alloc::boxed::Box<[u8; 4096]>,
    pub namespace: alloc::boxed::Box<[u8; 4096]>,
}

impl core::fmt::Debug for NvmeIdentify {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NvmeIdentify").finish_non_exhaustive()
    }
}

/// One raw ATA taskfile command.
#[derive(Debug, Clone)]
pub struct AtaTaskfile {
    pub command: u8,
    pub features: u16,
    pub lba: u64,
    pub sector_count: u16,
    pub device: u8,
    pub uses_48bit: bool,
}

impl AtaTaskfile {
    pub fn new(command: u8) -> Self {
        Self {
            command,
            features: 0,
            lba: 0,
            sector_count: 0,
            device: 0,
            uses_48bit: false,
        }
    }
}

/// Direction and buffer for the data phase of a taskfile or CDB command.
pub enum DataPhase<'a> {
    None,
    In(&'a mut [u8]),
    Out(&'a [u8]),
}

/// Result of one ATA taskfile command: the returned status/error
/// register pair plus whatever data the command transferred.
#[derive(Debug, Clone)]
pub struct AtaOutcome {
    pub status: u8,
    pub error: u8,
}

impl AtaOutcome {
    pub fn succeeded(&self) -> bool {
        self.status & 0x01 == 0
    }
}

/// SCSI sense data, as returned alongside a non-GOOD status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenseData {
    pub sense_key: u8,
    pub asc: u8,
    pub ascq: u8,
}

/// Result of one SCSI CDB: status byte plus sense data (zeroed when the
/// status was GOOD).
#[derive(Debug, Clone)]
pub struct ScsiOutcome {
    pub status: u8,
    pub sense: SenseData,
}

impl ScsiOutcome {
    pub fn is_good(&self) -> bool {
        self.status == 0x00
    }

    pub fn is_aborted(&self) -> bool {
        self.status == 0x02 && self.sense.sense_key == 0x0B
    }
}

/// One NVMe admin or I/O command.
#[derive(Debug, Clone)]
pub struct NvmeCommand {
    pub opcode: u8,
    pub nsid: u32,
    pub cdw10: u32,
    pub cdw11: u32,
    pub cdw12: u32,
    pub cdw13: u32,
    pub cdw14: u32,
    pub cdw15: u32,
}

impl NvmeCommand {
    pub fn new(opcode: u8, nsid: u32) -> Self {
        Self {
            opcode,
            nsid,
            cdw10: 0,
            cdw11: 0,
            cdw12: 0,
            cdw13: 0,
            cdw14: 0,
            cdw15: 0,
        }
    }
}

/// Result of one NVMe command: the 15-bit status field from the
/// completion queue entry (SCT:SC packed as `(sct << 8) | sc`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NvmeOutcome {
    pub status: u16,
}

impl NvmeOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == 0
    }
}

/// One block storage device, reachable over exactly one of ATA, SCSI, or
/// NVMe, with the identify data, geometry, and transport hints the
/// feature modules need plus the three command-issuing entry points.
///
/// Implementations are provided by the transport library this core
/// consumes; nothing in this workspace implements this trait against
/// real hardware. Each feature crate's test module builds its own small
/// scripted mock against this trait rather than sharing one here.
pub trait DeviceHandle {
    fn drive_class(&self) -> DriveClass;
    fn identify(&self) -> &IdentifyData;
    fn block_size(&self) -> u32;
    fn max_lba(&self) -> u64;
    fn min_dma_alignment(&self) -> u32;
    fn transport_hints(&self) -> TransportHints;

    fn ata_command(&mut self, cmd: &AtaTaskfile, data: DataPhase<'_>) -> Result<AtaOutcome>;
    fn scsi_command(&mut self, cdb: &[u8], data: DataPhase<'_>) -> Result<ScsiOutcome>;
    fn nvme_command(&mut self, cmd: &NvmeCommand, data: DataPhase<'_>) -> Result<NvmeOutcome>;

    /// Re-issues IDENTIFY (and, for SATL-attached devices, VPD 0x89) so
    /// the transport's cached identify/max-LBA data is fresh. Every
    /// operation that can change reported max-LBA or identify contents
    /// (security erase, DCO set, set-max) must call this before trusting
    /// `identify`/`max_lba` again.
    fn refresh_identify(&mut self) -> Result<()>;

    fn ata_identify(&self) -> Result<&AtaIdentify> {
        match self.identify() {
            IdentifyData::Ata(id) => Ok(id),
            _ => Err(Error::NotSupported),
        }
    }

    fn scsi_identify(&self) -> Result<&ScsiIdentify> {
        match self.identify() {
            IdentifyData::Scsi(id) => Ok(id),
            _ => Err(Error::NotSupported),
        }
    }

    fn nvme_identify(&self) -> Result<&NvmeIdentify> {
        match self.identify() {
            IdentifyData::Nvme(id) => Ok(id),
            _ => Err(Error::NotSupported),
        }
    }
}
