//! The two CDL descriptor wire layouts: the 32-byte ATA
//! descriptor slot (microsecond fields, LE) and the 32-byte SCSI T2A/T2B
//! descriptor slot (BE fields, plus a unit code).

use storectl_common::bits::{high_nibble, low_nibble, pack_nibbles};

pub const DESCRIPTOR_LEN: usize = 32;
pub const DESCRIPTORS_PER_LIST: usize = 7;

/// One ATA CDL descriptor, as stored in ATA log page 0x18. Policy codes
/// are raw nibble values (0..15); validating them against a device's
/// supported-policy mask is [`crate::policy::validate_ata`]'s job, not
/// this type's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtaCdlDescriptor {
    pub total_time_policy: u8,
    pub active_time_policy: u8,
    pub inactive_time_policy: u8,
    pub active_time_us: u32,
    pub inactive_time_us: u32,
    pub total_time_us: u32,
}

impl AtaCdlDescriptor {
    pub fn parse(slot: &[u8; DESCRIPTOR_LEN]) -> Self {
        Self {
            total_time_policy: low_nibble(slot[0]),
            active_time_policy: high_nibble(slot[0]),
            inactive_time_policy: low_nibble(slot[1]),
            active_time_us: u32::from_le_bytes(slot[4..8].try_into().unwrap()),
            inactive_time_us: u32::from_le_bytes(slot[8..12].try_into().unwrap()),
            total_time_us: u32::from_le_bytes(slot[16..20].try_into().unwrap()),
        }
    }

    pub fn serialize(&self) -> [u8; DESCRIPTOR_LEN] {
        let mut slot = [0u8; DESCRIPTOR_LEN];
        slot[0] = pack_nibbles(self.active_time_policy, self.total_time_policy);
        slot[1] = self.inactive_time_policy & 0x0F;
        slot[4..8].copy_from_slice(&self.active_time_us.to_le_bytes());
        slot[8..12].copy_from_slice(&self.inactive_time_us.to_le_bytes());
        slot[16..20].copy_from_slice(&self.total_time_us.to_le_bytes());
        slot
    }
}

/// One SCSI T2A or T2B CDL descriptor. The two subpages share this
/// descriptor layout; only the page-level header differs (T2A carries
/// performance-vs-CDG, T2B does not).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScsiCdlDescriptor {
    pub unit_code: u8,
    pub inactive_time: u16,
    pub active_time: u16,
    pub inactive_time_policy: u8,
    pub active_time_policy: u8,
    pub command_duration_guideline: u16,
    pub cdg_policy: u8,
}

impl ScsiCdlDescriptor {
    pub fn parse(slot: &[u8; DESCRIPTOR_LEN]) -> Self {
        Self {
            unit_code: low_nibble(slot[0]),
            inactive_time: u16::from_be_bytes(slot[2..4].try_into().unwrap()),
            active_time: u16::from_be_bytes(slot[4..6].try_into().unwrap()),
            inactive_time_policy: high_nibble(slot[6]),
            active_time_policy: low_nibble(slot[6]),
            command_duration_guideline: u16::from_be_bytes(slot[10..12].try_into().unwrap()),
            cdg_policy: low_nibble(slot[14]),
        }
    }

    pub fn serialize(&self) -> [u8; DESCRIPTOR_LEN] {
        let mut slot = [0u8; DESCRIPTOR_LEN];
        slot[0] = self.unit_code & 0x0F;
        slot[2..4].copy_from_slice(&self.inactive_time.to_be_bytes());
        slot[4..6].copy_from_slice(&self.active_time.to_be_bytes());
        slot[6] = pack_nibbles(self.inactive_time_policy, self.active_time_policy);
        slot[10..12].copy_from_slice(&self.command_duration_guideline.to_be_bytes());
        slot[14] = self.cdg_policy & 0x0F;
        slot
    }
}

/// Parses `DESCRIPTORS_PER_LIST` consecutive 32-byte ATA slots starting
/// at `body[offset..]`.
pub fn parse_ata_list(body: &[u8], offset: usize) -> [AtaCdlDescriptor; DESCRIPTORS_PER_LIST] {
    let mut out = [AtaCdlDescriptor::default(); DESCRIPTORS_PER_LIST];
    for (i, slot) in out.iter_mut().enumerate() {
        let start = offset + i * DESCRIPTOR_LEN;
        let bytes: [u8; DESCRIPTOR_LEN] = body[start..start + DESCRIPTOR_LEN].try_into().unwrap();
        *slot = AtaCdlDescriptor::parse(&bytes);
    }
    out
}

pub fn serialize_ata_list(list: &[AtaCdlDescriptor; DESCRIPTORS_PER_LIST], body: &mut [u8], offset: usize) {
    for (i, descriptor) in list.iter().enumerate() {
        let start = offset + i * DESCRIPTOR_LEN;
        body[start..start + DESCRIPTOR_LEN].copy_from_slice(&descriptor.serialize());
    }
}

pub fn parse_scsi_list(body: &[u8], offset: usize) -> [ScsiCdlDescriptor; DESCRIPTORS_PER_LIST] {
    let mut out = [ScsiCdlDescriptor::default(); DESCRIPTORS_PER_LIST];
    for (i, slot) in out.iter_mut().enumerate() {
        let start = offset + i * DESCRIPTOR_LEN;
        let bytes: [u8; DESCRIPTOR_LEN] = body[start..start + DESCRIPTOR_LEN].try_into().unwrap();
        *slot = ScsiCdlDescriptor::parse(&bytes);
    }
    out
}

pub fn serialize_scsi_list(list: &[ScsiCdlDescriptor; DESCRIPTORS_PER_LIST], body: &mut [u8], offset: usize) {
    for (i, descriptor) in list.iter().enumerate() {
        let start = offset + i * DESCRIPTOR_LEN;
        body[start..start + DESCRIPTOR_LEN].copy_from_slice(&descriptor.serialize());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ata_descriptor_round_trips() {
        let d = AtaCdlDescriptor {
            total_time_policy: 0x3,
            active_time_policy: 0xD,
            inactive_time_policy: 0x2,
            active_time_us: 12_000,
            inactive_time_us: 500,
            total_time_us: 999_999,
        };
        let slot = d.serialize();
        assert_eq!(AtaCdlDescriptor::parse(&slot), d);
        assert_eq!(slot[0], 0xD3);
        assert_eq!(slot[1], 0x02);
    }

    #[test]
    fn scsi_descriptor_round_trips() {
        let d = ScsiCdlDescriptor {
            unit_code: 0x0A,
            inactive_time: 100,
            active_time: 50,
            inactive_time_policy: 0xF,
            active_time_policy: 0x1,
            command_duration_guideline: 7,
            cdg_policy: 0x5,
        };
        let slot = d.serialize();
        assert_eq!(ScsiCdlDescriptor::parse(&slot), d);
        assert_eq!(slot[6], 0xF1);
    }

    #[test]
    fn ata_list_round_trips_at_offset() {
        let mut list = [AtaCdlDescriptor::default(); DESCRIPTORS_PER_LIST];
        list[3].active_time_us = 42;
        let mut body = [0u8; 512];
        serialize_ata_list(&list, &mut body, 64);
        assert_eq!(parse_ata_list(&body, 64), list);
    }
}
