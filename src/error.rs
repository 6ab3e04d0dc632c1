use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by the browser runtime.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, String),
    #[error("browser error: {0}")]
    Browser(String),
    #[error("operation not supported by this driver: {0}")]
    Unsupported(&'static str),
}

impl DriverError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout(..))
    }
}

/// Failures while reading credentials, targets or configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("could not open workbook {path}: {detail}")]
    Excel { path: String, detail: String },
    #[error("{0} contains no usable records")]
    Empty(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not write batch result to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode batch result: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Classification written into failed batch entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The credential set was rejected. Fatal for the whole batch.
    CredentialInvalid,
    SessionChallenged,
    /// Re-authentication after a lost session did not restore access.
    SessionLost,
    PageAuthWall,
    NavigationTimeout,
    InvalidTarget,
    Browser,
}

impl FailureKind {
    pub fn is_fatal(self) -> bool {
        self == FailureKind::CredentialInvalid
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::CredentialInvalid => "credential_invalid",
            FailureKind::SessionChallenged => "session_challenged",
            FailureKind::SessionLost => "session_lost",
            FailureKind::PageAuthWall => "page_auth_wall",
            FailureKind::NavigationTimeout => "navigation_timeout",
            FailureKind::InvalidTarget => "invalid_target",
            FailureKind::Browser => "browser",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure of one target (or of session setup for it).
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind}: {detail}")]
pub struct TargetFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl TargetFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        TargetFailure {
            kind,
            detail: detail.into(),
        }
    }

    /// Maps a runtime error raised while loading a page.
    pub fn from_driver(err: &DriverError) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::NavigationTimeout
        } else {
            FailureKind::Browser
        };
        TargetFailure::new(kind, err.to_string())
    }
}
