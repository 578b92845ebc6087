//! Host-side overwrite of an LBA range, with head/tail read-modify-write
//! for transfer-unit misalignment.

use alloc::vec;

use storectl_core::{DeviceHandle, Result};

use crate::align::{align_down, is_misaligned};
use crate::boot::erase_boot_sectors;
use crate::io;
use crate::os::OsHooks;

/// Overwrites the half-open LBA range `start..end` with `pattern` (zero if
/// `None`).
///
/// `start` is aligned down to `transfer_len` blocks; if that moved the
/// start backwards, the first transfer is a read-modify-write so only
/// bytes in the aligned transfer that fall within `start..end` are
/// overwritten, the rest of that transfer preserved. The same applies at
/// the tail if `end` does not fall on a transfer boundary. `start == 0`
/// triggers the boot-sector OS-hook dance first.
pub fn range_erase(device: &mut dyn DeviceHandle, start: u64, end: u64, pattern: Option<u8>, transfer_len: u32, hooks: &dyn OsHooks) -> Result<()> {
    if start == 0 {
        erase_boot_sectors(device, transfer_len, pattern, hooks)?;
    }

    let block_size = device.block_size() as usize;
    let fill = pattern.unwrap_or(0);
    let transfer_len_u64 = transfer_len as u64;

    let mut cursor = align_down(start, transfer_len);
    while cursor < end {
        let is_head = cursor == align_down(start, transfer_len) && is_misaligned(start, transfer_len);
        let transfer_end = cursor + transfer_len_u64;
        let is_tail = transfer_end > end;

        if is_head || is_tail {
            let mut buf = vec![0u8; block_size * transfer_len as usize];
            io::read_blocks(device, cursor, transfer_len, &mut buf)?;

            let overlap_start = start.max(cursor);
            let overlap_end = end.min(transfer_end);
            if overlap_end > overlap_start {
                let from = ((overlap_start - cursor) as usize) * block_size;
                let to = ((overlap_end - cursor) as usize) * block_size;
                buf[from..to].fill(fill);
            }
            io::write_blocks(device, cursor, transfer_len, &buf)?;
        } else {
            let buf = vec![fill; block_size * transfer_len as usize];
            io::write_blocks(device, cursor, transfer_len, &buf)?;
        }

        cursor = transfer_end;
    }

    io::flush_cache(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockDevice;

    #[test]
    fn erases_exact_aligned_range() {
        let mut device = MockDevice::new(1, 1000);
        device.storage.fill(0xFF);
        range_erase(&mut device, 100, 200, Some(0x00), 50, &crate::os::NullOsHooks).unwrap();
        assert!(device.storage[100 * 512..200 * 512].iter().all(|b| *b == 0));
        assert!(device.storage[200 * 512..300 * 512].iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn misaligned_start_preserves_bytes_before_start() {
        let mut device = MockDevice::new(1, 1000);
        device.storage.fill(0xAB);
        range_erase(&mut device, 105, 200, Some(0x00), 50, &crate::os::NullOsHooks).unwrap();
        // block [100,150) is read-modify-write: bytes before block 105 survive
        assert!(device.storage[100 * 512..105 * 512].iter().all(|b| *b == 0xAB));
        assert!(device.storage[105 * 512..150 * 512].iter().all(|b| *b == 0));
    }

    #[test]
    fn misaligned_end_preserves_bytes_after_end() {
        let mut device = MockDevice::new(1, 1000);
        device.storage.fill(0xCD);
        range_erase(&mut device, 100, 195, Some(0x00), 50, &crate::os::NullOsHooks).unwrap();
        assert!(device.storage[150 * 512..195 * 512].iter().all(|b| *b == 0));
        assert!(device.storage[195 * 512..200 * 512].iter().all(|b| *b == 0xCD));
    }
}
