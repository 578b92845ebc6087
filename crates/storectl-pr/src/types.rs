//! Logical Persistent Reservation types shared by the SCSI and NVMe
//! dialects ( "Registration Key", "Reservation", "Full
//! Reservation Entry", "Persistent Reservation Capability").

/// An 8-byte opaque registration key. `0` is the "no current key"
/// sentinel on Register commands ( invariant), and a legal but
/// semantically empty key everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RegistrationKey(pub u64);

impl RegistrationKey {
    pub const NONE: Self = Self(0);
}

/// Reservation scope. Extent and element scope are carried only because
/// the wire format still has bits for them; modern devices use
/// logical-unit scope exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationScope {
    LogicalUnit,
    Extent,
    Element,
}

impl ReservationScope {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x1 => Self::Extent,
            0x2 => Self::Element,
            _ => Self::LogicalUnit,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::LogicalUnit => 0x0,
            Self::Extent => 0x1,
            Self::Element => 0x2,
        }
    }
}

/// The nine logical reservation types. SCSI codes 0..8 map
/// 1:1; NVMe only defines six of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationType {
    ReadShared,
    WriteExclusive,
    ReadSharedObsolete,
    ExclusiveAccess,
    SharedAccess,
    WriteExclusiveRegistrantsOnly,
    ExclusiveAccessRegistrantsOnly,
    WriteExclusiveAllRegistrants,
    ExclusiveAccessAllRegistrants,
}

impl ReservationType {
    /// Decodes the SCSI PERSISTENT RESERVE IN/OUT TYPE field (SPC-4
    /// Table 173).
    pub fn from_scsi_code(code: u8) -> Option<Self> {
        match code {
            0x0 => Some(Self::ReadSharedObsolete),
            0x1 => Some(Self::WriteExclusive),
            0x3 => Some(Self::ExclusiveAccess),
            0x4 => Some(Self::SharedAccess),
            0x5 => Some(Self::WriteExclusiveRegistrantsOnly),
            0x6 => Some(Self::ExclusiveAccessRegistrantsOnly),
            0x7 => Some(Self::WriteExclusiveAllRegistrants),
            0x8 => Some(Self::ExclusiveAccessAllRegistrants),
            _ => None,
        }
    }

    pub fn scsi_code(self) -> u8 {
        match self {
            Self::ReadSharedObsolete | Self::ReadShared => 0x0,
            Self::WriteExclusive => 0x1,
            Self::ExclusiveAccess => 0x3,
            Self::SharedAccess => 0x4,
            Self::WriteExclusiveRegistrantsOnly => 0x5,
            Self::ExclusiveAccessRegistrantsOnly => 0x6,
            Self::WriteExclusiveAllRegistrants => 0x7,
            Self::ExclusiveAccessAllRegistrants => 0x8,
        }
    }

    /// Decodes the NVMe Reservation Acquire/Register RTYPE field: codes
    /// 1..6 map onto {WE, EA, WE-RO, EA-RO, WE-AR, EA-AR}. The obsolete
    /// SCSI-only types (`ReadShared`, `ReadSharedObsolete`, `SharedAccess`)
    /// have no NVMe code.
    pub fn from_nvme_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::WriteExclusive),
            2 => Some(Self::ExclusiveAccess),
            3 => Some(Self::WriteExclusiveRegistrantsOnly),
            4 => Some(Self::ExclusiveAccessRegistrantsOnly),
            5 => Some(Self::WriteExclusiveAllRegistrants),
            6 => Some(Self::ExclusiveAccessAllRegistrants),
            _ => None,
        }
    }

    /// Encodes to the NVMe RTYPE field, or `None` for the SCSI-only
    /// obsolete types that have no NVMe equivalent; callers targeting
    /// NVMe must reject those before issuing a command.
    pub fn nvme_code(self) -> Option<u8> {
        match self {
            Self::WriteExclusive => Some(1),
            Self::ExclusiveAccess => Some(2),
            Self::WriteExclusiveRegistrantsOnly => Some(3),
            Self::ExclusiveAccessRegistrantsOnly => Some(4),
            Self::WriteExclusiveAllRegistrants => Some(5),
            Self::ExclusiveAccessAllRegistrants => Some(6),
            Self::ReadShared | Self::ReadSharedObsolete | Self::SharedAccess => None,
        }
    }
}

/// One entry from a Read Reservation(s) list: the current holder's
/// key, scope, and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub holder: RegistrationKey,
    pub scope: ReservationScope,
    pub reservation_type: ReservationType,
}

/// One entry from a Read Full Status list. `transport_id` retains up
/// to 24 bytes; iSCSI names longer
/// than that are truncated by the device, not by this parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullReservationEntry {
    pub key: RegistrationKey,
    pub all_target_ports: bool,
    pub is_holder: bool,
    pub relative_target_port_id: u16,
    pub scope: ReservationScope,
    pub reservation_type: ReservationType,
    pub transport_id: alloc::vec::Vec<u8>,
    /// `true` when this entry was synthesized by the registration/
    /// reservation join fallback rather than read directly from a Read
    /// Full Status response. Relative target port id and transport id
    /// are zeroed on synthesized entries.
    pub synthesized: bool,
}

/// Allowed-commands enumeration values, 0..5 per SPC-4 Table 172.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedCommands {
    NotSpecified,
    Allow1,
    Allow2,
    Allow3,
    Allow4,
    Allow5,
}

impl AllowedCommands {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Allow1,
            2 => Self::Allow2,
            3 => Self::Allow3,
            4 => Self::Allow4,
            5 => Self::Allow5,
            _ => Self::NotSpecified,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::NotSpecified => 0,
            Self::Allow1 => 1,
            Self::Allow2 => 2,
            Self::Allow3 => 3,
            Self::Allow4 => 4,
            Self::Allow5 => 5,
        }
    }
}

/// The Report Capabilities response, synthesized for NVMe devices from
/// controller/namespace identify data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    pub replace_lost_reservation_capable: bool,
    pub compatible_reservation_handling: bool,
    pub specify_initiator_ports_capable: bool,
    pub all_target_ports_capable: bool,
    pub persist_through_power_loss_capable: bool,
    pub persist_through_power_loss_activated: bool,
    pub allowed_commands: AllowedCommands,
    /// Bit `n` set means reservation type `n` (SCSI TYPE code) is
    /// supported.
    pub type_mask: u16,
}

impl Capability {
    pub fn supports(&self, reservation_type: ReservationType) -> bool {
        self.type_mask & (1 << reservation_type.scsi_code()) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nvme_codes_round_trip_for_mapped_types() {
        let mapped = [
            ReservationType::WriteExclusive,
            ReservationType::ExclusiveAccess,
            ReservationType::WriteExclusiveRegistrantsOnly,
            ReservationType::ExclusiveAccessRegistrantsOnly,
            ReservationType::WriteExclusiveAllRegistrants,
            ReservationType::ExclusiveAccessAllRegistrants,
        ];
        for ty in mapped {
            let code = ty.nvme_code().unwrap();
            assert_eq!(ReservationType::from_nvme_code(code), Some(ty));
        }
    }

    #[test]
    fn obsolete_scsi_only_types_have_no_nvme_code() {
        assert_eq!(ReservationType::ReadShared.nvme_code(), None);
        assert_eq!(ReservationType::SharedAccess.nvme_code(), None);
    }

    #[test]
    fn scsi_codes_round_trip() {
        for code in [0x1u8, 0x3, 0x4, 0x5, 0x6, 0x7, 0x8] {
            let ty = ReservationType::from_scsi_code(code).unwrap();
            assert_eq!(ty.scsi_code(), code);
        }
    }
}
