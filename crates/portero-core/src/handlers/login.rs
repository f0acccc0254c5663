//! Login echo handler
//!
//! Decodes the request body into a credential record and echoes it back as
//! JSON. There is no authentication: the record is never validated, checked
//! against a store, or kept beyond the request.

use crate::{Request, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed plain-text message returned when the body cannot be decoded.
pub const DECODE_ERROR_MESSAGE: &str = "Error al leer el cuerpo de la solicitud";

/// Credential record carried by the login route.
///
/// A pure data carrier. Unknown fields in the input are ignored on
/// deserialization, so they are silently dropped from the echo. Empty
/// strings are valid values for both fields, and a missing field decodes
/// as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Echo the decoded credential record back as JSON.
///
/// Any decode failure (malformed JSON, a non-object top-level value, a
/// truncated body) yields a 400 with a fixed message. Credential values are
/// never logged.
pub async fn login(req: Request) -> Response {
    let credentials: Credentials = match serde_json::from_slice(&req.body) {
        Ok(c) => c,
        Err(_) => {
            debug!(path = %req.path, "rejected undecodable login body");
            return Response::bad_request(DECODE_ERROR_MESSAGE);
        }
    };

    match serde_json::to_vec(&credentials) {
        Ok(body) => Response::json(body),
        Err(_) => Response::internal_error("Internal Server Error"),
    }
}
