//! Error taxonomy for image loads.
//!
//! [`FetchError`] is what the executor reports; [`LoadError`] is what ends
//! up in [`crate::LoadState::Error`] and what the user gets to see.

use std::time::Duration;
use thiserror::Error;

const EMPTY_LINK_MESSAGE: &str = "URL cannot be empty";
const TIMEOUT_MESSAGE: &str = "Image load timed out";
const BROKEN_LINK_MESSAGE: &str = "The link is broken";

/// Coarse classification of a failed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The user submitted a blank URL
    EmptyInput,
    /// The fetch did not finish before the deadline
    Timeout,
    /// Fetch or decode failed for any other reason
    Broken,
}

impl ErrorKind {
    /// Message shown to the user for this kind of failure
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyInput => EMPTY_LINK_MESSAGE,
            Self::Timeout => TIMEOUT_MESSAGE,
            Self::Broken => BROKEN_LINK_MESSAGE,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty-input"),
            Self::Timeout => write!(f, "timeout"),
            Self::Broken => write!(f, "broken"),
        }
    }
}

/// Errors that can occur while fetching or decoding an image
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported url scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("payload of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decode error: {0}")]
    Decode(String),
}

impl FetchError {
    /// Every fetch failure is a broken link from the user's point of view.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Broken
    }
}

/// Terminal failure of a submission, as published in the load state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("{}", ErrorKind::EmptyInput.user_message())]
    EmptyInput,

    #[error("{} after {after:?}", ErrorKind::Timeout.user_message())]
    Timeout { after: Duration },

    #[error("{}: {detail}", ErrorKind::Broken.user_message())]
    Broken { detail: String },
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Broken { .. } => ErrorKind::Broken,
        }
    }

    /// Short message suitable for a toast
    pub fn user_message(&self) -> &'static str {
        self.kind().user_message()
    }
}

impl From<FetchError> for LoadError {
    fn from(err: FetchError) -> Self {
        Self::Broken {
            detail: err.to_string(),
        }
    }
}
