use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::listeners::ListenerError;

/// Error codes for different types of errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Listener registry errors
    EmitterCapability,

    // Storage errors
    StorageFailed,
    Io,
    Serialization,

    // Helper input errors
    UnknownValidationKind,
    UrlDecodeFailed,
    CryptoFailed,

    // Configuration related errors
    ConfigInvalid,
}

/// PageKit error types using thiserror
#[derive(Error, Debug)]
pub enum PageKitError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("Storage '{area}' failed: {reason}")]
    Storage { area: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown validation kind '{0}'")]
    UnknownValidationKind(String),

    #[error("Failed to decode URL parameter '{key}': {reason}")]
    UrlDecode { key: String, reason: String },

    #[error("Cipher operation failed: {0}")]
    Crypto(String),

    #[error("Invalid configuration for '{key}': {reason}")]
    Config { key: String, reason: String },
}

impl PageKitError {
    /// Get the error code for programmatic handling
    pub fn code(&self) -> ErrorCode {
        match self {
            PageKitError::Listener(_) => ErrorCode::EmitterCapability,
            PageKitError::Storage { .. } => ErrorCode::StorageFailed,
            PageKitError::Io(_) => ErrorCode::Io,
            PageKitError::Json(_) => ErrorCode::Serialization,
            PageKitError::UnknownValidationKind(_) => ErrorCode::UnknownValidationKind,
            PageKitError::UrlDecode { .. } => ErrorCode::UrlDecodeFailed,
            PageKitError::Crypto(_) => ErrorCode::CryptoFailed,
            PageKitError::Config { .. } => ErrorCode::ConfigInvalid,
        }
    }

    pub fn storage(area: impl Into<String>, reason: impl fmt::Display) -> Self {
        PageKitError::Storage {
            area: area.into(),
            reason: reason.to_string(),
        }
    }

    pub fn url_decode(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        PageKitError::UrlDecode {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub fn crypto(reason: impl fmt::Display) -> Self {
        PageKitError::Crypto(reason.to_string())
    }

    pub fn config(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        PageKitError::Config {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::EmitterCapability => "emitter_capability",
            ErrorCode::StorageFailed => "storage_failed",
            ErrorCode::Io => "io",
            ErrorCode::Serialization => "serialization",
            ErrorCode::UnknownValidationKind => "unknown_validation_kind",
            ErrorCode::UrlDecodeFailed => "url_decode_failed",
            ErrorCode::CryptoFailed => "crypto_failed",
            ErrorCode::ConfigInvalid => "config_invalid",
        };
        write!(f, "{}", s)
    }
}

/// Result type alias using PageKitError
pub type Result<T> = std::result::Result<T, PageKitError>;
