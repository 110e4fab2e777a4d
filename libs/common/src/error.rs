//! Custom error types for the common library
//!
//! This module defines the error types raised by the token store, the
//! session guard and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Error raised when writing to or clearing a token store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error occurred while touching the backing file
    #[error("Token store I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// Reasons a stored session is refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// No token is stored
    #[error("No active session, please log in")]
    Missing,

    /// The token could not be decoded or lacks a required claim
    #[error("Session token is malformed, please log in again")]
    Malformed,

    /// The token's expiry is in the past
    #[error("Session expired, please log in again")]
    Expired,
}

/// Error raised while assembling the client configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A source could not be read or a value could not be deserialized
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Type alias for Result with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
