use tracing::{debug, error, info, warn};

use crate::app::diagnostics::{Diagnostic, Severity};
use crate::app::ports::DiagnosticsPort;

/// Sends diagnostics to the build log through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticsPort for TracingDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        let message = diagnostic.message();
        match diagnostic.severity() {
            Severity::Debug => debug!(target: "personio_source::diagnostics", "{}", message),
            Severity::Info => info!(target: "personio_source::diagnostics", "{}", message),
            Severity::Warn => warn!(target: "personio_source::diagnostics", "{}", message),
            Severity::Error => error!(target: "personio_source::diagnostics", "{}", message),
        }
    }
}
