/// UEFI-reflected CRC32 (GPT headers and partition-entry arrays).
#[cfg(feature = "std")]
pub mod crc;
/// ATA-style 16-bit word-sum-to-zero checksum (DCO pages, SATA PHY event log).
pub mod word_sum;
