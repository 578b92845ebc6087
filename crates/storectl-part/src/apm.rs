//! Apple Partition Map: a sequence of fixed-size 512-byte "DPME"
//! entries starting at block 1, each entry declaring how many entries
//! the whole map has, so parsing must read entry 1 first before it
//! knows the true count.

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

const SIGNATURE: u16 = 0x504D; // "PM" big-endian, the Driver Descriptor Map's partition-entry magic.
const NAME_LEN: usize = 32;
const TYPE_LEN: usize = 32;

/// One Apple Partition Map entry ("DPME" block).
#[derive(Debug, Clone)]
pub struct ApmEntry {
    pub entry_count: u32,
    pub starting_block: u32,
    pub block_count: u32,
    pub name: String,
    pub partition_type: String,
    pub data_starting_block: u32,
    pub data_block_count: u32,
    pub status_flags: u32,
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes(buf[offset..offset + 4].try_into().unwrap())
}

fn read_cstr(buf: &[u8], offset: usize, len: usize) -> String {
    let raw = &buf[offset..offset + len];
    let end = raw.iter().position(|b| *b == 0).unwrap_or(len);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn parse_entry(block: &[u8]) -> Option<ApmEntry> {
    if block.len() < 136 || u16::from_be_bytes([block[0], block[1]]) != SIGNATURE {
        return None;
    }
    Some(ApmEntry {
            entry_count: read_u32(block, 4),
            starting_block: read_u32(block, 8),
            block_count: read_u32(block, 12),
            name: read_cstr(block, 16, NAME_LEN),
            partition_type: read_cstr(block, 48, TYPE_LEN),
            data_starting_block: read_u32(block, 80),
            data_block_count: read_u32(block, 84),
            status_flags: read_u32(block, 88),
    })
}

/// Parses an Apple Partition Map out of `blocks`, a byte slice holding
/// consecutive 512-byte blocks starting at block 0 (the Driver
/// Descriptor Map occupies block 0; entries start at block 1). Returns
/// an empty `Vec` if block 1 isn't a DPME entry.
pub fn parse(blocks: &[u8], block_size: usize) -> Vec<ApmEntry> {
    if blocks.len() < block_size * 2 {
        return Vec::new();
    }
    let first = match parse_entry(&blocks[block_size..block_size * 2]) {
        Some(e) => e,
        None => return Vec::new(),
    };
    let count = first.entry_count as usize;
    let mut entries = Vec::with_capacity(count);
    entries.push(first);
    for i in 2..=count {
        let start = block_size * i;
        if start + block_size > blocks.len() {
            break;
        }
        match parse_entry(&blocks[start..start + block_size]) {
            Some(e) => entries.push(e),
            None => break,
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_entry(entry_count: u32, starting_block: u32, block_count: u32, name: &str, partition_type: &str) -> alloc::vec::Vec<u8> {
        let mut buf = alloc::vec![0u8; 512];
        buf[0..2].copy_from_slice(&SIGNATURE.to_be_bytes());
        buf[4..8].copy_from_slice(&entry_count.to_be_bytes());
        buf[8..12].copy_from_slice(&starting_block.to_be_bytes());
        buf[12..16].copy_from_slice(&block_count.to_be_bytes());
        buf[16..16 + name.len()].copy_from_slice(name.as_bytes());
        buf[48..48 + partition_type.len()].copy_from_slice(partition_type.as_bytes());
        buf
    }

    #[test]
    fn parses_single_entry_map() {
        let mut blocks = alloc::vec![0u8; 512 * 2];
        blocks[512..1024].copy_from_slice(&build_entry(1, 1, 100, "Apple", "Apple_HFS"));
        let entries = parse(&blocks, 512);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Apple");
        assert_eq!(entries[0].partition_type, "Apple_HFS");
    }

    #[test]
    fn parses_multi_entry_map_using_declared_count() {
        let mut blocks = alloc::vec![0u8; 512 * 4];
        blocks[512..1024].copy_from_slice(&build_entry(3, 64, 100, "Apple", "Apple_partition_map"));
        blocks[1024..1536].copy_from_slice(&build_entry(3, 164, 200, "Data", "Apple_HFS"));
        blocks[1536..2048].copy_from_slice(&build_entry(3, 364, 50, "Swap", "Apple_Swap"));
        let entries = parse(&blocks, 512);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].name, "Swap");
    }

    #[test]
    fn missing_dpme_signature_yields_empty_map() {
        let blocks = alloc::vec![0u8; 512 * 2];
        assert!(parse(&blocks, 512).is_empty());
    }
}
