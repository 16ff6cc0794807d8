use std::path::PathBuf;

use crate::form::FormError;

/// Client-specific result type
pub type Result<T> = std::result::Result<T, AudioError>;

/// Stage of a call that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Request rejected locally before any I/O
    Validation,
    /// Audio file could not be opened or read
    Resource,
    /// Multipart body could not be written
    Encoding,
    /// Outbound HTTP call failed or was cancelled
    Transport,
    /// Service answered with a non-success status
    Api,
    /// Response body did not have the expected shape
    Decoding,
    /// Client was misconfigured
    Config,
}

/// Errors from the audio client
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// The request is malformed
    #[error("invalid request: {0}")]
    Validation(String),

    /// The audio file could not be opened or read
    #[error("failed to read audio file {}: {source}", .path.display())]
    Resource {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A multipart write failed
    #[error("failed to encode form field `{field}`: {source}")]
    Encoding {
        /// Form field being written when the failure happened
        field: String,
        /// Underlying writer failure
        #[source]
        source: FormError,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The caller cancelled the call before a response arrived
    #[error("request cancelled")]
    Cancelled,

    /// Server returned an error response
    #[error("{status} {error_type}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error type identifier
        error_type: String,
        /// Human-readable error message
        message: String,
    },

    /// Failed to parse a JSON response body
    #[error("failed to parse response: {0}")]
    Decoding(#[source] serde_json::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AudioError {
    /// The stage at which this error was raised
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Resource { .. } => ErrorKind::Resource,
            Self::Encoding { .. } => ErrorKind::Encoding,
            Self::Transport(_) | Self::Cancelled => ErrorKind::Transport,
            Self::Api { .. } => ErrorKind::Api,
            Self::Decoding(_) => ErrorKind::Decoding,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn encoding(field: &str, source: FormError) -> Self {
        Self::Encoding {
            field: field.to_owned(),
            source,
        }
    }
}
