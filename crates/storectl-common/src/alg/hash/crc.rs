use crc::{CRC_32_ISO_HDLC, Crc};

const HASHER_UEFI: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// The UEFI-reflected CRC32 used by GPT headers and partition-entry
/// arrays. This is the same reflected polynomial (0x04C11DB7, reflected
/// to 0xEDB88320) published by the UEFI spec as "CRC32", and is
/// bit-for-bit the same algorithm as `CRC_32_ISO_HDLC`.
#[derive(Debug, Copy, Clone)]
pub struct Crc32Uefi;

impl Crc32Uefi {
    pub fn checksum(data: &[u8]) -> u32 {
        HASHER_UEFI.checksum(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_of_known_bytes() {
        // CRC32/ISO-HDLC of ASCII "123456789" is the well-known check value.
        assert_eq!(Crc32Uefi::checksum(b"123456789"), 0xCBF4_3926);
    }
}
