//! Supported-policy masks and the pre-Set validation pass.

use crate::descriptor::{AtaCdlDescriptor, ScsiCdlDescriptor};
use crate::unit::is_valid_unit_code;

/// The per-policy-kind supported-policy bitmasks a device reports, plus
/// the device-wide time-limit range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupportedPolicies {
    pub inactive: u16,
    pub active: u16,
    pub total: u16,
    pub min_time_us: u32,
    pub max_time_us: u32,
    pub cdl_enabled: bool,
    pub cdg_supported: bool,
}

impl SupportedPolicies {
    /// True if `code` (0..15) is one of the policy codes advertised in
    /// `mask`.
    fn mask_allows(mask: u16, code: u8) -> bool {
        code < 16 && (mask >> code) & 1 != 0
    }
}

/// Errors raised by [`validate_ata`]/[`validate_scsi`] (
/// ValidationFailure, surfaced with structured detail before conversion
/// to the closed taxonomy at the crate boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} policy {1:#x} is not in the device's supported-policy mask")]
    UnsupportedPolicy(&'static str, u8),
    #[error("performance-vs-completion value {0:#x} exceeds the maximum of 0x0C")]
    PerformanceValueTooLarge(u8),
    #[error("SCSI CDL unit code {0:#x} is not one of the defined time-unit codes")]
    InvalidUnitCode(u8),
}

/// Validates one ATA CDL descriptor's policy codes against `supported`
/// (reject before issuing any device command).
pub fn validate_ata(descriptor: &AtaCdlDescriptor, supported: &SupportedPolicies) -> Result<(), ValidationError> {
    if !SupportedPolicies::mask_allows(supported.total, descriptor.total_time_policy) {
        return Err(ValidationError::UnsupportedPolicy("total-time", descriptor.total_time_policy));
    }
    if !SupportedPolicies::mask_allows(supported.active, descriptor.active_time_policy) {
        return Err(ValidationError::UnsupportedPolicy("active-time", descriptor.active_time_policy));
    }
    if !SupportedPolicies::mask_allows(supported.inactive, descriptor.inactive_time_policy) {
        return Err(ValidationError::UnsupportedPolicy("inactive-time", descriptor.inactive_time_policy));
    }
    Ok(())
}

/// Validates one SCSI T2A/T2B descriptor: policy codes
/// against the supported masks, plus the SCSI-specific unit-code and
/// performance-value range checks.
pub fn validate_scsi(descriptor: &ScsiCdlDescriptor, supported: &SupportedPolicies) -> Result<(), ValidationError> {
    if !is_valid_unit_code(descriptor.unit_code) {
        return Err(ValidationError::InvalidUnitCode(descriptor.unit_code));
    }
    if !SupportedPolicies::mask_allows(supported.active, descriptor.active_time_policy) {
        return Err(ValidationError::UnsupportedPolicy("active-time", descriptor.active_time_policy));
    }
    if !SupportedPolicies::mask_allows(supported.inactive, descriptor.inactive_time_policy) {
        return Err(ValidationError::UnsupportedPolicy("inactive-time", descriptor.inactive_time_policy));
    }
    if !SupportedPolicies::mask_allows(supported.total, descriptor.cdg_policy) {
        return Err(ValidationError::UnsupportedPolicy("cdg", descriptor.cdg_policy));
    }
    Ok(())
}

/// Validates a performance-vs-completion (or performance-vs-CDG) byte
/// against the ceiling of `0x0C`.
pub fn validate_performance_value(value: u8) -> Result<(), ValidationError> {
    if value > 0x0C {
        return Err(ValidationError::PerformanceValueTooLarge(value));
    }
    Ok(())
}

impl From<ValidationError> for storectl_core::Error {
    fn from(_: ValidationError) -> Self {
        storectl_core::Error::ValidationFailure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported() -> SupportedPolicies {
        SupportedPolicies {
            inactive: 0x000F,
            active: 0x000F,
            total: 0x000F,
            min_time_us: 0,
            max_time_us: 1_000_000,
            cdl_enabled: true,
            cdg_supported: false,
        }
    }

    #[test]
    fn rejects_unsupported_active_policy() {
        let supported = SupportedPolicies { active: 0x0F, ..supported() };
        let descriptor = AtaCdlDescriptor {
            active_time_policy: 0x0D,
            ..Default::default()
        };
        assert_eq!(
            validate_ata(&descriptor, &supported),
            Err(ValidationError::UnsupportedPolicy("active-time", 0x0D))
        );
    }

    #[test]
    fn accepts_policy_within_mask() {
        let descriptor = AtaCdlDescriptor {
            total_time_policy: 0x2,
            active_time_policy: 0x1,
            inactive_time_policy: 0x3,
            ..Default::default()
        };
        assert_eq!(validate_ata(&descriptor, &supported()), Ok(()));
    }

    #[test]
    fn rejects_invalid_scsi_unit_code() {
        let descriptor = ScsiCdlDescriptor { unit_code: 0x07, ..Default::default() };
        assert_eq!(validate_scsi(&descriptor, &supported()), Err(ValidationError::InvalidUnitCode(0x07)));
    }

    #[test]
    fn rejects_performance_value_above_ceiling() {
        assert_eq!(validate_performance_value(0x0D), Err(ValidationError::PerformanceValueTooLarge(0x0D)));
        assert_eq!(validate_performance_value(0x0C), Ok(()));
    }
}
