#![allow(missing_docs)]

use axum::{body::Body, response::Response};
use serde_json::Value;

/// Read the whole response body and parse it as JSON.
pub(crate) async fn parse_json_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    serde_json::from_slice(&body).expect("Response body is not valid JSON")
}
