//! Host Erase and Max-LBA restore: host-side
//! overwrite erase (range- and time-bounded, plus boot-sector wipe) and
//! the layered HPA/AMAC + DCO max-LBA restore sequence with SATL
//! translator-cache resynchronization detection. Co-located in one
//! crate because both share the alignment/transfer-unit math and the
//! "gate on support, re-probe identify" pattern.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

/// Alignment/transfer-unit math shared by `RangeErase` and `TimeErase`.
pub mod align;
/// `EraseBootSectors`.
pub mod boot;
/// The injectable wall-clock seam `TimeErase` measures against.
pub mod clock;
/// Protocol-dispatched block read/write/flush.
pub mod io;
/// Layered HPA/AMAC + DCO max-LBA restore and SATL sync detection.
pub mod maxlba;
/// OS-level hooks (boot-sector permission quirks, filesystem cache).
pub mod os;
/// `RangeErase`.
pub mod range;
/// `TimeErase`.
pub mod time;

#[cfg(test)]
mod test_support;

pub use align::{align_down, is_misaligned};
pub use boot::erase_boot_sectors;
pub use clock::{Clock, SystemClock};
pub use maxlba::{amac_supported, hpa_security_enabled, hpa_supported, is_translator_out_of_sync, restore as restore_max_lba};
pub use os::{NullOsHooks, OsHooks};
pub use range::range_erase;
pub use time::time_erase;
