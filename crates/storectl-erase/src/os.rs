//! OS-level hooks host erase needs but does not own: an early call
//! before writing LBA 0 to work around OS permission quirks, and a
//! filesystem-cache update afterwards so the OS doesn't serve stale
//! partition-table metadata. Mirrors
//! [`storectl_core::diagnostics::Diagnostics`]: a trait seam with a
//! no-op default, so the erase algorithms themselves stay
//! host-OS-agnostic and testable against a mock.
pub trait OsHooks {
    /// Called once, before the first write to LBA 0, to work around
    /// OS-specific permission or caching quirks on boot-sector writes.
    fn before_boot_sector_erase(&self) {}
    /// Called after LBA 0 (or the disk's partition table generally) has
    /// changed, so the OS re-reads the partition table instead of
    /// serving stale cached metadata.
    fn update_filesystem_cache(&self) {}
}

/// Does nothing. The default for tests and for callers that have
/// already quiesced the OS out-of-band.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOsHooks;

impl OsHooks for NullOsHooks {}
