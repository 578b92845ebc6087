//! ATA Security: the seven-state state machine, the password-block wire
//! serializers for the native and SATL-wrapped forms, and the
//! guard-and-act operations (SET/DISABLE PASSWORD, UNLOCK, FREEZE LOCK,
//! ERASE UNIT with recovery) built on top of them.

#![cfg_attr(not(feature = "std"), no_std)]

/// Operations: the guard-and-act commands built on the state machine and
/// password serializers.
pub mod ops;
/// The native and SATL-wrapped password block wire forms.
pub mod password;
/// The seven-state security state machine and erase-time decoding.
pub mod state;

pub use ops::{disable_password, freeze_lock, run_erase_with_recovery, set_password, unlock, EraseKind, EraseReport};
pub use password::{PasswordBlock, PasswordRole};
pub use state::{EraseTimeEstimate, SecurityState, SecurityStatus};
