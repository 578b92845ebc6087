//! Command Duration Limits: the ATA-log dialect (log 0x18 +
//! Identify Device Data log 0x30) and the SCSI T2A/T2B mode-page
//! dialect, unit-conversion helpers, and supported-policy validation
//! shared by both.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// ATA dialect: log 0x18 settings, Identify Device Data log 0x30
/// supported-policy discovery.
pub mod ata;
/// The two 32-byte descriptor wire layouts (ATA, SCSI T2A/T2B).
pub mod descriptor;
/// Supported-policy masks and pre-Set validation.
pub mod policy;
/// SCSI dialect: mode page 0x0A subpages 0x07/0x08.
pub mod scsi;
/// SCSI CDL time-unit codes and microsecond conversion.
pub mod unit;

pub use ata::{AtaCdlChange, AtaCdlSettings};
pub use descriptor::{AtaCdlDescriptor, ScsiCdlDescriptor};
pub use policy::{SupportedPolicies, ValidationError};
pub use scsi::{ModeSenseForm, ScsiCdlChange, ScsiCdlPage};
pub use unit::TimeUnit;
