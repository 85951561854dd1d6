use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a model problem.
///
/// Ordered from most to least severe, so `Severity::Fatal < Severity::Info`
/// sorts fatal problems first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The model is unusable (e.g. the primary build failed outright).
    Fatal,
    /// A semantic error: missing parent, bad coordinates, unresolvable plugin.
    Error,
    /// Suspicious but non-blocking.
    Warning,
    /// Informational note.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        f.write_str(s)
    }
}

/// Source position of a problem within the manifest, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// A single diagnostic produced while building a project model.
///
/// Problems are collected during primary builds, fallback builds and
/// dependency resolution, and surfaced to diagnostics consumers via
/// `ProjectCache::problems`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub message: String,
    pub severity: Severity,
    pub location: Option<Location>,
}

impl Problem {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            location: None,
        }
    }

    /// A fatal problem with no source position, used to wrap build failures
    /// that cannot be attributed to a specific line.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Fatal)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    pub fn with_location(mut self, line: u32, column: u32) -> Self {
        self.location = Some(Location { line, column });
        self
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "[{}] {} ({}:{})",
                self.severity, self.message, loc.line, loc.column
            ),
            None => write!(f, "[{}] {}", self.severity, self.message),
        }
    }
}
