//! Error types for portero-core

use thiserror::Error;

/// Result type alias for portero operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the portero HTTP service
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid HTTP method
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Invalid route path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid listen address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
