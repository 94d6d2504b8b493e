//! Log severity levels.

use std::fmt;
use std::str::FromStr;

use faultline_core::error::DomainError;
use faultline_core::query::AttributeFilter;
use serde::Serialize;

/// Severity of a log line. Stored and transmitted in upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected but recoverable.
    Warn,
    /// A failed operation.
    Error,
    /// The process cannot continue.
    Fatal,
}

impl Level {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }

    /// Equality filter on the `level` column of logs and log groups.
    #[must_use]
    pub fn filter(self) -> AttributeFilter {
        AttributeFilter {
            column: "level",
            value: self.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "FATAL" => Ok(Self::Fatal),
            other => Err(DomainError::Validation(format!("invalid log level: {other}"))),
        }
    }
}
