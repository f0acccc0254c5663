//! Request handlers

pub mod login;

// Re-exports for convenience
pub use login::{login, Credentials, DECODE_ERROR_MESSAGE};
