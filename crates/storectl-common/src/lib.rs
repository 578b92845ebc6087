//! Binary-layout building blocks shared by every `storectl` feature crate:
//! endian-tagged integer wrappers for wire structures, bit-range helpers
//! for cross-byte bitfields, checksum algorithms (ATA word-sum and UEFI
//! CRC32), and a fixed-width UTF-16LE string type.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

/// Checksum algorithms (ATA word-sum, UEFI-reflected CRC32).
pub mod alg;
/// Bit-range and cross-byte bitfield helpers.
pub mod bits;
/// Fixed-width strings used in wire structures (GPT partition names).
pub mod str;
/// Endian-tagged integer types and GUID handling.
pub mod types;
