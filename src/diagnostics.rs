//! Operator-facing diagnostics.
//!
//! Warnings and notices are routed through a [`DiagnosticSink`] handed to
//! each component, so nothing writes to a shared global destination and
//! tests can assert on exactly what was emitted.

use std::fmt;
#[cfg(test)]
use std::sync::Mutex;

use crate::output::{dim, red_bold, yellow_bold};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Informational, e.g. "status reporting disabled".
    Notice,
    /// Something went wrong but the run continues.
    Warning,
    /// The invocation cannot complete as requested.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.level {
            Level::Notice => "Noop:",
            Level::Warning => "Warning:",
            Level::Error => "Error:",
        };
        write!(f, "{label} {}", self.message)
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);

    fn notice(&self, message: &str) {
        self.emit(Diagnostic {
            level: Level::Notice,
            message: message.to_string(),
        });
    }

    fn warn(&self, message: &str) {
        self.emit(Diagnostic {
            level: Level::Warning,
            message: message.to_string(),
        });
    }

    fn error(&self, message: &str) {
        self.emit(Diagnostic {
            level: Level::Error,
            message: message.to_string(),
        });
    }
}

/// Writes diagnostics to stderr. With `silent` set only errors get through.
pub struct StderrSink {
    silent: bool,
}

impl StderrSink {
    pub fn new(silent: bool) -> Self {
        Self { silent }
    }
}

impl DiagnosticSink for StderrSink {
    fn emit(&self, diagnostic: Diagnostic) {
        log::debug!("{diagnostic}");
        let label = match diagnostic.level {
            Level::Error => red_bold("Error:"),
            Level::Warning if !self.silent => yellow_bold("Warning:"),
            Level::Notice if !self.silent => dim("Noop:"),
            _ => return,
        };
        eprintln!("{label} {}", diagnostic.message);
    }
}

/// Collects every diagnostic in memory.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Diagnostic>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self, level: Level) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|d| d.level == level)
            .map(|d| d.message)
            .collect()
    }
}

#[cfg(test)]
impl DiagnosticSink for RecordingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(diagnostic);
        }
    }
}
