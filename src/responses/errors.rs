// src/responses/errors.rs
use astra::{Body, Response, ResponseBuilder};
use log::error;
use serde_json::json;

use crate::errors::ServerError;

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;

/// Convert a ServerError into the API's JSON error envelope.
///
/// Validation/authz details are client-facing; persistence details are
/// logged and replaced with a generic message.
pub fn error_to_response(err: &ServerError) -> Response {
    let (status, message) = match err {
        ServerError::Validation(msg) => (400, msg.clone()),
        ServerError::Unauthorized(msg) => (401, msg.clone()),
        ServerError::Forbidden(msg) => (403, msg.clone()),
        ServerError::NotFound(msg) => (404, msg.clone()),
        ServerError::Conflict(msg) => (409, msg.clone()),
        ServerError::Db(detail) => {
            error!("database error: {detail}");
            (500, "internal server error".to_string())
        }
        ServerError::Internal => (500, "internal server error".to_string()),
    };

    let body = json!({ "status": "error", "message": message }).to_string();

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::from("internal server error")))
}
