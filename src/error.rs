//! Error types for md2wechat
//!
//! Every component returns [`Error`] instead of terminating the process; only the
//! command dispatcher in the binary turns an error into the JSON failure envelope
//! and a non-zero exit code.
//!
//! Errors fall into a few classes:
//! - configuration problems ([`Error::Config`]), fatal at startup
//! - validation problems ([`Error::Validation`], [`Error::FileNotFound`]), never retried
//! - transport and upstream failures ([`Error::Network`], [`Error::Http`],
//!   [`Error::Generation`], [`Error::Platform`]), retried only at the upload step
//! - [`Error::UploadExhausted`], wrapping the last failure of a retry sequence

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for md2wechat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for md2wechat
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("{message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The environment variable that caused the error (e.g., "WECHAT_APPID")
        key: Option<String>,
    },

    /// Invalid input: bad arguments, malformed draft JSON, missing article fields
    #[error("{0}")]
    Validation(String),

    /// Local file does not exist
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Transport-level HTTP failure (connect, timeout, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        /// Response status code
        status: u16,
        /// The requested URL (without credentials)
        url: String,
        /// Response body, captured for diagnostics
        body: String,
    },

    /// Image generation API failure
    #[error("generate image: {0}")]
    Generation(String),

    /// The WeChat platform answered with a non-zero `errcode`
    #[error("wechat api error {errcode}: {errmsg}")]
    Platform {
        /// Platform error code
        errcode: i64,
        /// Platform error message
        errmsg: String,
    },

    /// Upstream answered 2xx but the payload is unusable (e.g. empty `media_id`)
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Every upload attempt failed with a retryable error
    #[error("upload failed after {attempts} attempts: {last}")]
    UploadExhausted {
        /// Number of attempts made
        attempts: u32,
        /// The error returned by the final attempt
        #[source]
        last: Box<Error>,
    },

    /// Image decoding or encoding error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to an environment variable
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Shorthand for a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Machine-readable error code, stable across releases
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::FileNotFound(_) => "file_not_found",
            Error::Network(_) => "network_error",
            Error::Http { .. } => "http_error",
            Error::Generation(_) => "generation_error",
            Error::Platform { .. } => "platform_error",
            Error::InvalidResponse(_) => "invalid_response",
            Error::UploadExhausted { .. } => "upload_exhausted",
            Error::Image(_) => "image_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Other(_) => "internal_error",
        }
    }
}
