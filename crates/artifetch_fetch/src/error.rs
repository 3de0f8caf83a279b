use std::{fmt, sync::Arc, time::Duration};

use artifetch_archive::{DecodeError, MaterializeError};
use miette::Diagnostic;
use reqwest::StatusCode;
use reqwest_middleware::Error as ReqwestMiddlewareError;
use thiserror::Error;
use url::Url;

use crate::Locator;

/// Invalid configuration. Reported before any work is scheduled.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the environment prefix must not be empty")]
    EmptyPrefix,

    #[error("the environment prefix '{0}' must not contain '='")]
    InvalidPrefix(String),

    #[error("the concurrency budget must be at least 1, got {0}")]
    #[diagnostic(help("pass a positive number to --max-concurrent-downloads"))]
    InvalidBudget(i64),
}

/// Errors that can occur while retrieving the bytes of an artifact.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum FetchError {
    #[error("'{locator}' is not a valid url")]
    InvalidUrl {
        locator: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported url scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("failed to download {url}: {status}")]
    HttpStatus { url: Url, status: StatusCode },

    #[error(transparent)]
    Reqwest(Arc<reqwest::Error>),

    #[error(transparent)]
    ReqwestMiddleware(Arc<ReqwestMiddlewareError>),

    #[error(transparent)]
    Io(Arc<std::io::Error>),
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Reqwest(Arc::new(err))
    }
}

impl From<ReqwestMiddlewareError> for FetchError {
    fn from(err: ReqwestMiddlewareError) -> Self {
        Self::ReqwestMiddleware(Arc::new(err))
    }
}

/// Why a single artifact could not be fetched and extracted.
///
/// These errors never leave the outcome of the artifact they belong to.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum ArtifactError {
    #[error("get artifact: {locator}")]
    Fetch {
        locator: Locator,
        #[source]
        source: FetchError,
    },

    #[error("get artifact: {locator}: timed out after {timeout:?}")]
    Timeout { locator: Locator, timeout: Duration },

    #[error("unzip artifact: {name}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },

    #[error("unzip artifact: {name}")]
    PathTraversal {
        name: String,
        #[source]
        source: MaterializeError,
    },

    #[error("unzip artifact: {name}")]
    Write {
        name: String,
        #[source]
        source: MaterializeError,
    },

    #[error("cancelled before {locator} was fetched")]
    Cancelled { locator: Locator },

    #[error("the worker for {locator} stopped unexpectedly")]
    Join {
        locator: Locator,
        #[source]
        source: Arc<tokio::task::JoinError>,
    },
}

impl ArtifactError {
    /// Splits a materialization failure into the matching variant.
    pub(crate) fn from_materialize(name: String, err: MaterializeError) -> Self {
        match err {
            MaterializeError::Decode(source) => Self::Decode { name, source },
            err @ MaterializeError::PathTraversal { .. } => Self::PathTraversal { name, source: err },
            err @ MaterializeError::Write { .. } => Self::Write { name, source: err },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::PathTraversal { .. } => ErrorKind::PathTraversal,
            Self::Write { .. } => ErrorKind::Write,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Join { .. } => ErrorKind::Internal,
        }
    }
}

/// Coarse classification of an [`ArtifactError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Fetch,
    Timeout,
    Decode,
    PathTraversal,
    Write,
    Cancelled,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Fetch => "fetch",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Decode => "decode",
            ErrorKind::PathTraversal => "path traversal",
            ErrorKind::Write => "write",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}
