//! Persistent Reservations: registration/reservation/full-status
//! lists with the count-then-fetch pattern, Register/Unregister/Acquire/
//! Release/Clear/Preempt, the SCSI<->NVMe reservation-type bridge, and the
//! pre-SPC-3 full-status fallback synthesis.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Report Capabilities: SCSI read, NVMe synthesis from identify data.
pub mod capability;
/// Count-then-fetch list reads and the full-status fallback join.
pub mod list;
/// NVMe Reservation Register/Acquire/Release commands.
pub mod nvme;
/// Register/Unregister/Acquire/Release/Clear/Preempt dispatch.
pub mod ops;
/// SCSI PERSISTENT RESERVE IN/OUT CDB construction and parameter blocks.
pub mod scsi;
/// Shared types: keys, scope, reservation type, capability, full-status entry.
pub mod types;

pub use capability::read_capability;
pub use list::{read_full_status, read_keys, read_reservation, synthesize_full_status};
pub use nvme::ChangePersistThroughPowerLoss;
pub use ops::{acquire, clear, preempt, register, release, unregister};
pub use types::{AllowedCommands, Capability, FullReservationEntry, Reservation, ReservationScope, ReservationType, RegistrationKey};
