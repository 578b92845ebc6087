//! Diagnostic text output: an external printer is out of scope for the
//! core, so this module is the seam. The default implementation
//! forwards to `tracing` for structured diagnostics rather than bare
//! `println!`.

/// Where the core sends human-readable progress/warning text (e.g. "host
/// reset detected during erase, recovery attempted", "power cycle
/// required before max-LBA restore can continue").
pub trait Diagnostics {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Forwards to `tracing::info!`/`tracing::warn!`. This is the default
/// used throughout the workspace; a CLI or GUI front end can swap in its
/// own `Diagnostics` impl to route text elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Discards everything. Useful for tests that don't want tracing
/// subscriber noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}
