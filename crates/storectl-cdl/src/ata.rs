//! ATA CDL dialect: log address 0x18 (the CDL settings themselves) and
//! the supported-policy discovery in Identify Device Data log 0x30,
//! pages 3 and 4.

use storectl_core::device::{AtaTaskfile, DataPhase};
use storectl_core::{DeviceHandle, Error, Result};

use crate::descriptor::{parse_ata_list, serialize_ata_list, AtaCdlDescriptor, DESCRIPTORS_PER_LIST};
use crate::policy::{validate_ata, validate_performance_value, SupportedPolicies};

pub const LOG_ADDRESS_CDL: u8 = 0x18;
pub const LOG_ADDRESS_IDENTIFY_DEVICE_DATA: u8 = 0x30;
const READ_DESCRIPTORS_OFFSET: usize = 64;
const WRITE_DESCRIPTORS_OFFSET: usize = 288;

const CMD_READ_LOG_EXT: u8 = 0x2F;
const CMD_WRITE_LOG_EXT: u8 = 0x3F;

/// The full contents of ATA CDL log page 0x18: the page-level
/// performance-vs-command-completion byte, plus the seven read and
/// seven write descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtaCdlSettings {
    pub performance_vs_command_completion: u8,
    pub read_descriptors: [AtaCdlDescriptor; DESCRIPTORS_PER_LIST],
    pub write_descriptors: [AtaCdlDescriptor; DESCRIPTORS_PER_LIST],
}

impl AtaCdlSettings {
    pub fn parse(page: &[u8; 512]) -> Self {
        Self {
            performance_vs_command_completion: storectl_common::bits::low_nibble(page[0]),
            read_descriptors: parse_ata_list(page, READ_DESCRIPTORS_OFFSET),
            write_descriptors: parse_ata_list(page, WRITE_DESCRIPTORS_OFFSET),
        }
    }

    pub fn to_bytes(&self) -> [u8; 512] {
        let mut page = [0u8; 512];
        page[0] = self.performance_vs_command_completion & 0x0F;
        serialize_ata_list(&self.read_descriptors, &mut page, READ_DESCRIPTORS_OFFSET);
        serialize_ata_list(&self.write_descriptors, &mut page, WRITE_DESCRIPTORS_OFFSET);
        page
    }
}

fn read_log_page(device: &mut dyn DeviceHandle, log_address: u8, page: u16, buf: &mut [u8; 512]) -> Result<()> {
    let mut taskfile = AtaTaskfile::new(CMD_READ_LOG_EXT);
    taskfile.features = page;
    taskfile.lba = log_address as u64;
    taskfile.sector_count = 1;
    taskfile.uses_48bit = true;
    let outcome = device.ata_command(&taskfile, DataPhase::In(buf))?;
    if !outcome.succeeded() {
        return Err(Error::Failure("READ LOG EXT rejected by device"));
    }
    Ok(())
}

fn write_log_page(device: &mut dyn DeviceHandle, log_address: u8, page: u16, buf: &[u8; 512]) -> Result<()> {
    let mut taskfile = AtaTaskfile::new(CMD_WRITE_LOG_EXT);
    taskfile.features = page;
    taskfile.lba = log_address as u64;
    taskfile.sector_count = 1;
    taskfile.uses_48bit = true;
    let outcome = device.ata_command(&taskfile, DataPhase::Out(buf))?;
    if !outcome.succeeded() {
        return Err(Error::Failure("WRITE LOG EXT rejected by device"));
    }
    Ok(())
}

/// Reads the current ATA CDL settings (log 0x18 page 0).
pub fn read_settings(device: &mut dyn DeviceHandle) -> Result<AtaCdlSettings> {
    let mut buf = [0u8; 512];
    read_log_page(device, LOG_ADDRESS_CDL, 0, &mut buf)?;
    Ok(AtaCdlSettings::parse(&buf))
}

/// Reads the supported-policy masks and device-wide time limits from
/// Identify Device Data log 0x30 pages 3 and 4. QWORD offsets are
/// converted to byte offsets (`qword * 8`).
pub fn read_supported_policies(device: &mut dyn DeviceHandle) -> Result<SupportedPolicies> {
    let mut page3 = [0u8; 512];
    read_log_page(device, LOG_ADDRESS_IDENTIFY_DEVICE_DATA, 3, &mut page3)?;
    let mut page4 = [0u8; 512];
    read_log_page(device, LOG_ADDRESS_IDENTIFY_DEVICE_DATA, 4, &mut page4)?;

    let qword_at = |buf: &[u8; 512], byte_offset: usize| u64::from_le_bytes(buf[byte_offset..byte_offset + 8].try_into().unwrap());

    let support_qword = qword_at(&page3, 168);
    let min_time = u32::from_le_bytes(page3[176..180].try_into().unwrap());
    let max_time = u32::from_le_bytes(page3[184..188].try_into().unwrap());
    let mask_qword = qword_at(&page3, 208);

    let feature_qword = qword_at(&page4, 8);

    Ok(SupportedPolicies {
            inactive: (mask_qword & 0xFFFF) as u16,
            active: ((mask_qword >> 16) & 0xFFFF) as u16,
            total: ((mask_qword >> 32) & 0xFFFF) as u16,
            min_time_us: min_time,
            max_time_us: max_time,
            cdl_enabled: (feature_qword >> 21) & 1 != 0,
            cdg_supported: (support_qword >> 1) & 1 != 0,
    })
}

/// Mutable view of one field a caller wants changed in a Set; `apply`
/// writes it into an in-place copy of the currently-read settings so
/// every other nibble/byte is preserved verbatim, 's
/// read-modify-write requirement.
pub enum AtaCdlChange {
    PerformanceVsCompletion(u8),
    ReadDescriptor(usize, AtaCdlDescriptor),
    WriteDescriptor(usize, AtaCdlDescriptor),
}

/// Applies `changes` on top of the device's current settings, validates
/// every changed field against `supported`, then writes the merged page
/// back.
pub fn set_settings(
    device: &mut dyn DeviceHandle,
    supported: &SupportedPolicies,
    changes: &[AtaCdlChange],
) -> Result<()> {
    let mut settings = read_settings(device)?;

    for change in changes {
        match change {
            AtaCdlChange::PerformanceVsCompletion(value) => {
                validate_performance_value(*value)?;
                settings.performance_vs_command_completion = *value;
            }
            AtaCdlChange::ReadDescriptor(index, descriptor) => {
                validate_ata(descriptor, supported)?;
                settings.read_descriptors[*index] = *descriptor;
            }
            AtaCdlChange::WriteDescriptor(index, descriptor) => {
                validate_ata(descriptor, supported)?;
                settings.write_descriptors[*index] = *descriptor;
            }
        }
    }

    let buf = settings.to_bytes();
    write_log_page(device, LOG_ADDRESS_CDL, 0, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_through_bytes() {
        let mut settings = AtaCdlSettings {
            performance_vs_command_completion: 0x3,
            read_descriptors: [AtaCdlDescriptor::default(); DESCRIPTORS_PER_LIST],
            write_descriptors: [AtaCdlDescriptor::default(); DESCRIPTORS_PER_LIST],
        };
        settings.read_descriptors[2].active_time_us = 5000;
        settings.write_descriptors[6].total_time_us = 1;

        let bytes = settings.to_bytes();
        assert_eq!(AtaCdlSettings::parse(&bytes), settings);
    }

    #[test]
    fn supported_policy_masks_split_into_three_fields() {
        // inactive=0x000F, active=0x00F0, total=0x0F00 packed into one qword.
        let mask_qword: u64 = 0x000F | (0x00F0u64 << 16) | (0x0F00u64 << 32);
        let mut page3 = [0u8; 512];
        page3[208..216].copy_from_slice(&mask_qword.to_le_bytes());
        let inactive = (mask_qword & 0xFFFF) as u16;
        let active = ((mask_qword >> 16) & 0xFFFF) as u16;
        let total = ((mask_qword >> 32) & 0xFFFF) as u16;
        assert_eq!(inactive, 0x000F);
        assert_eq!(active, 0x00F0);
        assert_eq!(total, 0x0F00);
    }
}
