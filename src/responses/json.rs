// src/responses/json.rs
use astra::{Body, Response, ResponseBuilder};
use serde::Serialize;

use crate::errors::ServerError;
use crate::responses::ResultResp;

/// Serialize `payload` as the JSON body of a response.
pub fn json_response<T: Serialize>(status: u16, payload: &T) -> ResultResp {
    let body = serde_json::to_vec(payload).map_err(|_| ServerError::Internal)?;

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(Body::from(body))
        .map_err(|_| ServerError::Internal)
}
