//! Read-only partition-table reader: MBR variants (classic, modern,
//! UEFI, AAP, NEWLDR, AST/NEC/Speedstor, Ontrack Disk Manager), Apple
//! Partition Map, and GPT primary+backup with CRC32 validation.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod apm;
pub mod chs;
pub mod gpt;
pub mod guid_table;
pub mod io;
pub mod mbr;
pub mod reader;

#[cfg(test)]
mod test_support;

pub use apm::ApmEntry;
pub use chs::Chs;
pub use gpt::{GptAttributes, GptEntry, GptHeader, GptTable};
pub use mbr::{MbrEntry, MbrTable, MbrVariant};
pub use reader::{read_partition_table, PartitionTable};
