//! A unified facade over the `storectl` subsystem crates. Enable the
//! Cargo feature for each protocol surface you need; `storectl-core`
//! (the `DeviceHandle` seam) is always available.

#![cfg_attr(not(feature = "std"), no_std)]

pub use storectl_core as core;

#[cfg(feature = "security")]
pub use storectl_security as security;
#[cfg(feature = "dco")]
pub use storectl_dco as dco;
#[cfg(feature = "cdl")]
pub use storectl_cdl as cdl;
#[cfg(feature = "pr")]
pub use storectl_pr as pr;
#[cfg(feature = "erase")]
pub use storectl_erase as erase;
#[cfg(feature = "part")]
pub use storectl_part as part;
#[cfg(feature = "phy")]
pub use storectl_phy as phy;
