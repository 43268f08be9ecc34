//! Parse diagnostics collection
//!
//! Every document parse owns one [`DiagnosticLog`]. Recoverable conditions
//! (unknown tags, malformed fields, discarded spectra) are appended here and
//! returned to the caller alongside whatever spectra were decoded; they are
//! never raised as errors. A parse that produced zero spectra is the
//! caller's signal that the document failed.

use serde::{Deserialize, Serialize};

/// Severity of a single diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Informational note (e.g. an unrecognized tag was skipped).
    Info,
    /// Suspicious but tolerated condition (e.g. X/Y length mismatch).
    Warning,
    /// A spectrum or payload had to be discarded.
    Error,
}

/// One recorded parse condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity classification.
    pub severity: Severity,
    /// Source location (tag or label name) when one was known.
    pub location: Option<String>,
    /// Human-readable description.
    pub message: String,
}

/// Append-only, ordered log of parse diagnostics, scoped to one document.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry with an explicit severity and optional location.
    pub fn push(&mut self, severity: Severity, location: Option<String>, message: String) {
        match severity {
            Severity::Info => log::debug!("{message}"),
            Severity::Warning => log::warn!("{message}"),
            Severity::Error => log::error!("{message}"),
        }
        self.entries.push(Diagnostic {
            severity,
            location,
            message,
        });
    }

    /// Append an informational entry.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, None, message.into());
    }

    /// Append a warning entry.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, None, message.into());
    }

    /// Append an error entry.
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, None, message.into());
    }

    /// Append an entry tied to a tag or label name.
    pub fn push_at(&mut self, severity: Severity, location: &str, message: impl Into<String>) {
        self.push(severity, Some(location.to_string()), message.into());
    }

    /// All entries in the order they were recorded.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any entry has [`Severity::Error`].
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_order_and_severity() {
        let mut log = DiagnosticLog::new();
        log.info("skipped tag");
        log.warning("length mismatch");
        log.error("spectrum discarded");

        assert_eq!(log.len(), 3);
        assert_eq!(log.entries()[0].severity, Severity::Info);
        assert_eq!(log.entries()[2].severity, Severity::Error);
        assert!(log.has_errors());
    }

    #[test]
    fn location_is_recorded() {
        let mut log = DiagnosticLog::new();
        log.push_at(Severity::Warning, "yaxis", "short payload");
        assert_eq!(log.entries()[0].location.as_deref(), Some("yaxis"));
    }
}
