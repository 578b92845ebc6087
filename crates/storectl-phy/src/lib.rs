//! PHY diagnostics: SATA PHY event counters (ATA log 0x11) and SAS
//! Send Diagnostic PHY test patterns (page 0x3F).

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod sas;
pub mod sata;

pub use sas::{start_test_pattern, stop_test_pattern, PhyTestPatternRequest, SpreadSpectrumClocking};
pub use sata::{read_and_clear_event_log, read_event_log, CounterWidth, PhyEventCounter, SataPhyEventLog};
