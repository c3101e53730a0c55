//! Structured error/warning channel of the host build engine.

use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub unit_path: String,
    pub message: String,
}

/// Collects embed diagnostics, mirroring them to the log.
#[derive(Debug, Default)]
pub struct BuildContext {
    diagnostics: Vec<Diagnostic>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, unit_path: impl Into<String>, message: impl Into<String>) {
        let unit_path = unit_path.into();
        let message = message.into();
        error!(unit = %unit_path, "{message}");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            unit_path,
            message,
        });
    }

    pub fn warning(&mut self, unit_path: impl Into<String>, message: impl Into<String>) {
        let unit_path = unit_path.into();
        let message = message.into();
        warn!(unit = %unit_path, "{message}");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            unit_path,
            message,
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}
