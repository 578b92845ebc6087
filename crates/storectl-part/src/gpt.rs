//! GUID Partition Table parsing: header at LBA 1 (or the trailing LBA
//! for the backup copy), CRC32-validated partition-entry array,
//! mixed-endian GUIDs. GPT's on-wire LBA fields are 64-bit, so this
//! module reads them as `u64` directly rather than the 32-bit layout
//! some adjacent formats use.

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

use storectl_common::alg::hash::crc::Crc32Uefi;
use storectl_common::types::guid::Guid;

use crate::guid_table;

pub const SIGNATURE: &[u8; 8] = b"EFI PART";
pub const ENTRY_SIZE: usize = 128;
pub const MIN_ENTRIES: u32 = 128;

/// Bits 0..2 of a GPT entry's attribute field are universal; the rest
/// is type-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GptAttributes {
    pub platform_required: bool,
    pub efi_firmware_ignore: bool,
    pub legacy_bios_bootable: bool,
    /// Microsoft Basic Data's bits 60..63: read-only, shadow copy,
    /// hidden, no-drive-letter, in that order. Meaningless for other
    /// partition types but decoded unconditionally, as the raw bits are
    /// preserved in `raw` for callers that care about the type.
    pub ms_read_only: bool,
    pub ms_shadow_copy: bool,
    pub ms_hidden: bool,
    pub ms_no_drive_letter: bool,
    pub raw: u64,
}

impl GptAttributes {
    fn parse(raw: u64) -> Self {
        Self {
            platform_required: raw & (1 << 0) != 0,
            efi_firmware_ignore: raw & (1 << 1) != 0,
            legacy_bios_bootable: raw & (1 << 2) != 0,
            ms_read_only: raw & (1 << 60) != 0,
            ms_shadow_copy: raw & (1 << 61) != 0,
            ms_hidden: raw & (1 << 62) != 0,
            ms_no_drive_letter: raw & (1 << 63) != 0,
            raw,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GptEntry {
    pub type_guid: Guid,
    pub unique_guid: Guid,
    pub first_lba: u64,
    pub last_lba: u64,
    pub attributes: GptAttributes,
    pub name: String,
    /// Human name for `type_guid`, or `None` if not in the known table.
    pub type_name: Option<&'static str>,
}

impl GptEntry {
    fn parse(buf: &[u8; ENTRY_SIZE]) -> Self {
        let type_guid = Guid::from_bytes(buf[0..16].try_into().unwrap());
        let unique_guid = Guid::from_bytes(buf[16..32].try_into().unwrap());
        let first_lba = u64::from_le_bytes(buf[32..40].try_into().unwrap());
        let last_lba = u64::from_le_bytes(buf[40..48].try_into().unwrap());
        let attributes = u64::from_le_bytes(buf[48..56].try_into().unwrap());
        let name_units: [u16; 36] = core::array::from_fn(|i| u16::from_le_bytes([buf[56 + i * 2], buf[56 + i * 2 + 1]]));
        let name = char::decode_utf16(name_units.into_iter().take_while(|u| *u != 0))
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();

        Self {
            type_guid,
            unique_guid,
            first_lba,
            last_lba,
            attributes: GptAttributes::parse(attributes),
            name,
            type_name: guid_table::lookup(&type_guid),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.type_guid == Guid::NIL
    }
}

#[derive(Debug, Clone)]
pub struct GptHeader {
    pub revision: u32,
    pub header_size: u32,
    pub header_crc32: u32,
    pub current_lba: u64,
    pub backup_lba: u64,
    pub first_usable_lba: u64,
    pub last_usable_lba: u64,
    pub disk_guid: Guid,
    pub partition_entry_lba: u64,
    pub entries_count: u32,
    pub entry_size: u32,
    pub entries_crc32: u32,
}

impl GptHeader {
    /// Parses the 92-byte GPT header. Does not validate the CRC; call
    /// [`GptHeader::header_checksum_valid`] with the full `header_size`
    /// bytes separately.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < 92 || &buf[0..8] != SIGNATURE {
            return None;
        }
        Some(Self {
                revision: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
                header_size: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
                header_crc32: u32::from_le_bytes(buf[16..20].try_into().unwrap()),
                // bytes 20..24 reserved, must be zero
                current_lba: u64::from_le_bytes(buf[24..32].try_into().unwrap()),
                backup_lba: u64::from_le_bytes(buf[32..40].try_into().unwrap()),
                first_usable_lba: u64::from_le_bytes(buf[40..48].try_into().unwrap()),
                last_usable_lba: u64::from_le_bytes(buf[48..56].try_into().unwrap()),
                disk_guid: Guid::from_bytes(buf[56..72].try_into().unwrap()),
                partition_entry_lba: u64::from_le_bytes(buf[72..80].try_into().unwrap()),
                entries_count: u32::from_le_bytes(buf[80..84].try_into().unwrap()),
                entry_size: u32::from_le_bytes(buf[84..88].try_into().unwrap()),
                entries_crc32: u32::from_le_bytes(buf[88..92].try_into().unwrap()),
        })
    }

    /// Validates the header CRC32 over the first `header_size` bytes of
    /// `full_header_bytes`, with the CRC field (bytes 16..20) zeroed in
    /// a working copy first.
    pub fn header_checksum_valid(&self, full_header_bytes: &[u8]) -> bool {
        let size = self.header_size as usize;
        if full_header_bytes.len() < size || size < 92 {
            return false;
        }
        let mut working = full_header_bytes[..size].to_vec();
        working[16..20].copy_from_slice(&0u32.to_le_bytes());
        Crc32Uefi::checksum(&working) == self.header_crc32
    }

    pub fn entries_checksum_valid(&self, entries_bytes: &[u8]) -> bool {
        Crc32Uefi::checksum(entries_bytes) == self.entries_crc32
    }
}

/// A fully parsed GPT: header plus non-empty partition entries.
#[derive(Debug, Clone)]
pub struct GptTable {
    pub header: GptHeader,
    pub header_valid: bool,
    /// `false` if the partition-entry array's CRC32 didn't match the
    /// header's `entries_crc32`. Unlike the header CRC, a mismatch here
    /// still leaves `entries` populated from whatever bytes were read;
    /// callers that need the §4.8/§7 "hard failure triggers backup
    /// retry" behavior check this flag (and `header_valid`) themselves.
    pub entries_valid: bool,
    pub entries: Vec<GptEntry>,
    /// `true` if this table was recovered from the backup copy at the
    /// trailing LBA rather than the primary at LBA 1.
    pub from_backup: bool,
}

impl GptTable {
    /// A GPT is "valid" per the spec only when both the header and the
    /// partition-entry array CRC32s check out.
    pub fn is_valid(&self) -> bool {
        self.header_valid && self.entries_valid
    }
}

/// Parses a GPT header and its partition-entry array out of
/// already-acquired bytes.
///
/// `header_buf` must start at the candidate header LBA (primary LBA 1
/// or backup at the trailing LBA) and be at least 92 bytes long.
/// `entries_buf` must hold at least `entries_count * entry_size` bytes
/// starting at the header's `partition_entry_lba`; callers are
/// responsible for having read enough, possibly requiring a second read.
pub fn parse(header_buf: &[u8], entries_buf: &[u8], from_backup: bool) -> Option<GptTable> {
    let header = GptHeader::parse(header_buf)?;
    let header_valid = header.header_checksum_valid(header_buf);

    let entry_size = header.entry_size.max(1) as usize;
    let needed = header.entries_count as usize * entry_size;
    if entries_buf.len() < needed {
        return None;
    }
    let entries_valid = header.entries_checksum_valid(&entries_buf[..needed]);

    let mut entries = Vec::with_capacity(header.entries_count as usize);
    for i in 0..header.entries_count as usize {
        let start = i * entry_size;
        if entry_size < ENTRY_SIZE {
            continue;
        }
        let mut raw = [0u8; ENTRY_SIZE];
        raw.copy_from_slice(&entries_buf[start..start + ENTRY_SIZE]);
        let entry = GptEntry::parse(&raw);
        if !entry.is_empty() {
            entries.push(entry);
        }
    }

    Some(GptTable {
            header,
            header_valid,
            entries_valid,
            entries,
            from_backup,
    })
}
