//! The `storectl` core: the `DeviceHandle` seam every feature crate is
//! generic over, the closed error taxonomy, and the
//! native-ATA-vs-SATL protocol dispatch decision procedure.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

/// Diagnostic text output seam: an external-printer trait.
pub mod diagnostics;
/// Protocol dispatch: native ATA vs SATL-wrapped command forms.
pub mod dispatch;
/// The `DeviceHandle` trait family and the wire-command types it passes.
pub mod device;
/// The closed error taxonomy.
pub mod error;

pub use device::{
    AtaIdentify, AtaOutcome, AtaTaskfile, DataPhase, DeviceHandle, DriveClass, IdentifyData,
    NvmeCommand, NvmeIdentify, NvmeOutcome, ScsiIdentify, ScsiOutcome, SenseData, TransportHints,
};
pub use error::{Error, Result};
