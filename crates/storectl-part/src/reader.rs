//! Acquisition strategy and top-level dispatch: read 32 KiB from LBA 0,
//! dispatch on whichever signatures are present, falling back to a
//! trailing-LBA backup-GPT search when nothing at LBA 0 is recognized.

extern crate alloc;

use storectl_core::{DeviceHandle, Error, Result};

use crate::apm::{self, ApmEntry};
use crate::gpt::{self, GptTable};
use crate::io::read_blocks;
use crate::mbr::{self, MbrTable};

const ACQUISITION_BYTES: usize = 32 * 1024;

/// A read-only snapshot of whatever partition-table scheme a disk
/// carries.
#[derive(Debug, Clone)]
pub enum PartitionTable {
    Mbr(MbrTable),
    Apm(alloc::vec::Vec<ApmEntry>),
    Gpt(GptTable),
}

fn read_lba0_window(device: &mut dyn DeviceHandle) -> Result<alloc::vec::Vec<u8>> {
    let block_size = device.block_size() as usize;
    let blocks = (ACQUISITION_BYTES + block_size - 1) / block_size;
    let mut buf = alloc::vec![0u8; blocks * block_size];
    read_blocks(device, 0, blocks as u32, &mut buf)?;
    Ok(buf)
}

fn read_trailing_window(device: &mut dyn DeviceHandle) -> Result<(alloc::vec::Vec<u8>, u64)> {
    let block_size = device.block_size() as usize;
    // `max_lba` is the device's block count (exclusive upper bound,
    // matching the convention `storectl-erase` establishes); the last
    // addressable LBA is one less.
    let last_lba = device.max_lba().saturating_sub(1);
    let blocks = ((ACQUISITION_BYTES + block_size - 1) / block_size) as u64;
    let start = last_lba.saturating_sub(blocks.saturating_sub(1));
    let count = (last_lba - start + 1) as u32;
    let mut buf = alloc::vec![0u8; count as usize * block_size];
    read_blocks(device, start, count, &mut buf)?;
    Ok((buf, start))
}

/// Reads and parses whichever partition-table scheme `device` carries.
/// Returns `None` if no recognizable signature is found anywhere (LBA 0
/// window or the trailing backup-GPT window).
pub fn read_partition_table(device: &mut dyn DeviceHandle) -> Result<Option<PartitionTable>> {
    let block_size = device.block_size() as usize;
    let window = read_lba0_window(device)?;

    let mbr_present = mbr::has_mbr_signature(&window[..block_size.min(window.len())]);
    let lba1 = window.get(block_size..block_size + 92);

    if mbr_present {
        if let Some(lba1_bytes) = lba1 {
            if &lba1_bytes[0..8] == gpt::SIGNATURE {
                if let Some(primary) = read_gpt_primary(device, &window, block_size)? {
                    if primary.is_valid() {
                        return Ok(Some(PartitionTable::Gpt(primary)));
                    }
                    // §4.8/§7: a primary-header or entries-array CRC32
                    // failure is a hard failure that triggers a retry
                    // against the backup copy. If the backup doesn't
                    // check out either, this is a hard `InvalidChecksum`
                    // failure, not a silent pass-through of either copy.
                    if let Some(backup) = read_backup_gpt(device, block_size)? {
                        if backup.is_valid() {
                            return Ok(Some(PartitionTable::Gpt(backup)));
                        }
                    }
                    return Err(Error::InvalidChecksum);
                }
            }
        }
        return Ok(mbr::parse(&window).map(PartitionTable::Mbr));
    }

    if let Some(lba1_bytes) = lba1 {
        if lba1_bytes.len() >= 2 && lba1_bytes[0] == b'P' && lba1_bytes[1] == b'M' {
            let entries = apm::parse(&window, block_size);
            if !entries.is_empty() {
                return Ok(Some(PartitionTable::Apm(entries)));
            }
        }
    }

    // Nothing recognized at LBA 0; retry GPT at the trailing LBA
    // ("read 32 KiB at the trailing end of the disk and
    // retry GPT signature match at the trailing logical block").
    if let Some(table) = read_backup_gpt(device, block_size)? {
        if !table.is_valid() {
            return Err(Error::InvalidChecksum);
        }
        return Ok(Some(PartitionTable::Gpt(table)));
    }

    Ok(None)
}

/// Reads the trailing window and parses the backup GPT header there, if
/// its signature is present. The backup header lives in the disk's
/// very last block, i.e. the last `block_size` bytes of the window, not
/// its first.
fn read_backup_gpt(device: &mut dyn DeviceHandle, block_size: usize) -> Result<Option<GptTable>> {
    let (trailing, trailing_start) = read_trailing_window(device)?;
    if trailing.len() < block_size + 92 {
        return Ok(None);
    }
    let header_offset = trailing.len() - block_size;
    if &trailing[header_offset..header_offset + 8] != gpt::SIGNATURE {
        return Ok(None);
    }
    read_gpt_backup(device, &trailing, trailing_start, header_offset, block_size)
}

fn read_gpt_primary(device: &mut dyn DeviceHandle, window: &[u8], block_size: usize) -> Result<Option<GptTable>> {
    let header_buf = &window[block_size..];
    let header = match gpt::GptHeader::parse(header_buf) {
        Some(h) => h,
        None => return Ok(None),
    };
    let entries_offset = header.partition_entry_lba as usize * block_size;
    let entries_needed = header.entries_count as usize * header.entry_size as usize;

    let entries_buf = if entries_offset + entries_needed <= window.len() {
        window[entries_offset..entries_offset + entries_needed].to_vec()
    } else {
        let start_lba = header.partition_entry_lba;
        let count_blocks = ((entries_needed + block_size - 1) / block_size) as u32;
        let mut buf = alloc::vec![0u8; count_blocks as usize * block_size];
        read_blocks(device, start_lba, count_blocks, &mut buf)?;
        buf
    };

    Ok(gpt::parse(header_buf, &entries_buf, false))
}

fn read_gpt_backup(device: &mut dyn DeviceHandle, trailing: &[u8], trailing_start: u64, header_offset: usize, block_size: usize) -> Result<Option<GptTable>> {
    let header_buf = &trailing[header_offset..];
    let header = match gpt::GptHeader::parse(header_buf) {
        Some(h) => h,
        None => return Ok(None),
    };
    let entries_needed = header.entries_count as usize * header.entry_size as usize;
    let entries_lba = header.partition_entry_lba;
    let count_blocks = ((entries_needed + block_size - 1) / block_size) as u32;

    // The backup partition-entry array sits immediately before the
    // backup header; look for it inside the already-read window first,
    // only issuing a second read if it falls outside it.
    let offset_within_trailing = entries_lba.checked_sub(trailing_start).map(|o| o as usize * block_size);
    let entries_buf = match offset_within_trailing {
        Some(start) if start + entries_needed <= trailing.len() => trailing[start..start + entries_needed].to_vec(),
        _ => {
            let mut buf = alloc::vec![0u8; count_blocks as usize * block_size];
            read_blocks(device, entries_lba, count_blocks, &mut buf)?;
            buf
        }
    };

    Ok(gpt::parse(header_buf, &entries_buf, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockDevice;

    #[test]
    fn returns_none_for_blank_disk() {
        let mut device = MockDevice::new(512, 2048);
        assert!(read_partition_table(&mut device).unwrap().is_none());
    }

    #[test]
    fn recognizes_classic_mbr_at_lba0() {
        let mut device = MockDevice::new(512, 2048);
        device.storage[510] = 0x55;
        device.storage[511] = 0xAA;
        device.storage[446 + 4] = 0x0C; // partition type
        let table = read_partition_table(&mut device).unwrap().unwrap();
        match table {
            PartitionTable::Mbr(m) => assert_eq!(m.entries[0].partition_type, 0x0C),
            _ => panic!("expected Mbr"),
        }
    }

    /// Writes a 92-byte GPT header at `storage[lba * block_size..]`,
    /// with its CRC32 computed and filled in (unless `corrupt` asks for
    /// a post-computation bit flip, which must still leave a
    /// self-consistent structure other than the header checksum).
    fn write_gpt_header(storage: &mut [u8], lba: u64, block_size: usize, current_lba: u64, backup_lba: u64, entries_lba: u64, entries_crc32: u32, corrupt: bool) {
        use storectl_common::alg::hash::crc::Crc32Uefi;
        let base = lba as usize * block_size;
        let mut header = [0u8; 92];
        header[0..8].copy_from_slice(gpt::SIGNATURE);
        header[8..12].copy_from_slice(&0x0001_0000u32.to_le_bytes());
        header[12..16].copy_from_slice(&92u32.to_le_bytes());
        header[24..32].copy_from_slice(&current_lba.to_le_bytes());
        header[32..40].copy_from_slice(&backup_lba.to_le_bytes());
        header[40..48].copy_from_slice(&2u64.to_le_bytes());
        header[48..56].copy_from_slice(&60u64.to_le_bytes());
        header[72..80].copy_from_slice(&entries_lba.to_le_bytes());
        header[80..84].copy_from_slice(&1u32.to_le_bytes());
        header[84..88].copy_from_slice(&(gpt::ENTRY_SIZE as u32).to_le_bytes());
        header[88..92].copy_from_slice(&entries_crc32.to_le_bytes());
        let crc = Crc32Uefi::checksum(&header);
        header[16..20].copy_from_slice(&crc.to_le_bytes());
        if corrupt {
            header[24] ^= 0xFF;
        }
        storage[base..base + 92].copy_from_slice(&header);
    }

    fn write_gpt_entry(storage: &mut [u8], lba: u64, block_size: usize) -> u32 {
        use storectl_common::alg::hash::crc::Crc32Uefi;
        let base = lba as usize * block_size;
        let mut entry = [0u8; gpt::ENTRY_SIZE];
        entry[0..16].copy_from_slice(crate::guid_table::efi_system_partition().as_bytes());
        entry[32..40].copy_from_slice(&2048u64.to_le_bytes());
        entry[40..48].copy_from_slice(&206847u64.to_le_bytes());
        storage[base..base + gpt::ENTRY_SIZE].copy_from_slice(&entry);
        Crc32Uefi::checksum(&entry)
    }

    #[test]
    fn falls_back_to_backup_gpt_when_primary_header_crc_is_corrupt() {
        let mut device = MockDevice::new(512, 64);
        device.storage[510] = 0x55;
        device.storage[511] = 0xAA;

        let backup_entries_crc = write_gpt_entry(&mut device.storage, 62, 512);
        write_gpt_header(&mut device.storage, 63, 512, 63, 1, 62, backup_entries_crc, false);

        let primary_entries_crc = write_gpt_entry(&mut device.storage, 2, 512);
        write_gpt_header(&mut device.storage, 1, 512, 1, 63, 2, primary_entries_crc, true);

        let table = read_partition_table(&mut device).unwrap().unwrap();
        match table {
            PartitionTable::Gpt(gpt_table) => {
                assert!(gpt_table.is_valid());
                assert!(gpt_table.from_backup);
                assert_eq!(gpt_table.header.current_lba, 63);
                assert_eq!(gpt_table.entries[0].first_lba, 2048);
            }
            _ => panic!("expected Gpt recovered from backup"),
        }
    }
}
