use serde::Serialize;
use std::{fmt, result};
use thiserror::Error;

/// Errors raised while querying the reporting API.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid report window: {0}")]
    InvalidWindow(String),
    #[error("cannot find mailing list or group {0}")]
    NotFound(String),
    #[error("historical search is not available for this plan: {0}")]
    InsufficientLicense(String),
    #[error("reporting query failed: {0}")]
    TransientQueryFailure(String),
    #[error("reporting API rejected the credentials: {0}")]
    Unauthorized(String),
    #[error("account session is not connected")]
    NotConnected,
    #[error("historical search {0} is not done yet")]
    JobNotDone(String),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidWindow(_) => ErrorKind::InvalidWindow,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InsufficientLicense(_) => ErrorKind::InsufficientLicense,
            Self::TransientQueryFailure(_) => ErrorKind::TransientQueryFailure,
            Self::Unauthorized(_) | Self::NotConnected => ErrorKind::Unauthorized,
            Self::JobNotDone(_) => ErrorKind::JobNotDone,
        }
    }

    /// Whether the error should end the run instead of being recorded
    /// next to the other query results.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Unauthorized(_) | Self::NotConnected
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::TransientQueryFailure(err.to_string())
    }
}

/// Serializable counterpart of [`Error`], used in reports.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    InvalidWindow,
    NotFound,
    InsufficientLicense,
    TransientQueryFailure,
    Unauthorized,
    JobNotDone,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self {
            Self::InvalidWindow => "invalid window",
            Self::NotFound => "not found",
            Self::InsufficientLicense => "insufficient license",
            Self::TransientQueryFailure => "query failure",
            Self::Unauthorized => "unauthorized",
            Self::JobNotDone => "job not done",
        };
        write!(f, "{kind}")
    }
}
