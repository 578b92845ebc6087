//! SATA PHY Event Counters: ATA log address 0x11, a 512-byte
//! page of variable-width little-endian counters, word-sum checksummed
//! the same way as the DCO parameter page.

extern crate alloc;
use alloc::vec::Vec;

use storectl_core::device::{AtaTaskfile, DataPhase};
use storectl_core::{DeviceHandle, Error, Result};

pub const LOG_ADDRESS_SATA_PHY_EVENT_COUNTERS: u8 = 0x11;
const CMD_READ_LOG_EXT: u8 = 0x2F;
const COUNTERS_OFFSET: usize = 4;
const MAX_COUNTERS: usize = 32;

/// Which width a single PHY event counter's value field uses (bits 14:12
/// select `{1: 16-bit, 2: 32-bit, 3: 48-bit, 4: 64-bit}` counter width).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterWidth {
    Bits16,
    Bits32,
    Bits48,
    Bits64,
}

impl CounterWidth {
    fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Bits16),
            2 => Some(Self::Bits32),
            3 => Some(Self::Bits48),
            4 => Some(Self::Bits64),
            _ => None,
        }
    }

    fn byte_len(self) -> usize {
        match self {
            Self::Bits16 => 2,
            Self::Bits32 => 4,
            Self::Bits48 => 6,
            Self::Bits64 => 8,
        }
    }
}

/// One decoded PHY event counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhyEventCounter {
    pub event_id: u16,
    pub vendor_unique: bool,
    pub width: CounterWidth,
    pub value: u64,
}

/// The parsed SATA PHY event counter log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SataPhyEventLog {
    pub counters: Vec<PhyEventCounter>,
    /// `false` if the page's word-sum-to-zero checksum didn't validate;
    /// the parsed counters are returned regardless.
    pub valid_checksum: bool,
}

impl SataPhyEventLog {
    /// Parses a 512-byte SATA PHY event counter log page.
    pub fn parse(page: &[u8; 512]) -> Self {
        let valid_checksum = storectl_common::alg::hash::word_sum::is_valid(page);
        let mut counters = Vec::new();
        let mut offset = COUNTERS_OFFSET;

        while offset + 2 <= page.len() && counters.len() < MAX_COUNTERS {
            let raw_id = u16::from_le_bytes([page[offset], page[offset + 1]]);
            if raw_id == 0 {
                break;
            }
            offset += 2;

            let vendor_unique = raw_id & 0x8000 != 0;
            let width_code = (raw_id >> 12) & 0x7;
            let event_id = raw_id & 0x0FFF;
            let width = match CounterWidth::from_code(width_code) {
                Some(w) => w,
                None => break,
            };

            let len = width.byte_len();
            if offset + len > page.len() {
                break;
            }
            let mut value_bytes = [0u8; 8];
            value_bytes[..len].copy_from_slice(&page[offset..offset + len]);
            let value = u64::from_le_bytes(value_bytes);
            offset += len;

            counters.push(PhyEventCounter {
                    event_id,
                    vendor_unique,
                    width,
                    value,
            });
        }

        Self { counters, valid_checksum }
    }
}

fn read_log_page(device: &mut dyn DeviceHandle, feature: u16, buf: &mut [u8; 512]) -> Result<()> {
    let mut taskfile = AtaTaskfile::new(CMD_READ_LOG_EXT);
    taskfile.features = feature;
    taskfile.lba = LOG_ADDRESS_SATA_PHY_EVENT_COUNTERS as u64;
    taskfile.sector_count = 1;
    taskfile.uses_48bit = true;
    let outcome = device.ata_command(&taskfile, DataPhase::In(buf))?;
    if !outcome.succeeded() {
        return Err(Error::Failure("READ LOG EXT rejected by device"));
    }
    Ok(())
}

/// Reads and parses the SATA PHY event counter log without clearing it.
pub fn read_event_log(device: &mut dyn DeviceHandle) -> Result<SataPhyEventLog> {
    let mut buf = [0u8; 512];
    read_log_page(device, 0, &mut buf)?;
    Ok(SataPhyEventLog::parse(&buf))
}

/// Reads the log with feature=1, which clears the device's counters
/// atomically with the read.
pub fn read_and_clear_event_log(device: &mut dyn DeviceHandle) -> Result<SataPhyEventLog> {
    let mut buf = [0u8; 512];
    read_log_page(device, 1, &mut buf)?;
    Ok(SataPhyEventLog::parse(&buf))
}
