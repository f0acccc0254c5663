//! portero-core: HTTP service library for the login echo server
//!
//! Provides the building blocks the `portero` binary wires together:
//! - Typed request/response abstractions
//! - Per-method radix trie router
//! - hyper-based server loop
//! - The `/login` echo handler

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

// Re-exports
pub use config::ServerConfig;
pub use error::{Error, Result};
pub use handlers::{login, Credentials};
pub use request::{Method, Request, RequestBuilder};
pub use response::{Response, ResponseBuilder, StatusCode};
pub use router::{RouteMatch, Router};
pub use server::{BoundServer, Handler, Server, ServerState};
