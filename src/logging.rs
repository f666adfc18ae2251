//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, header::COOKIE, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::Error;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Cookie headers are redacted since they carry the auth cookie.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return Error::InvalidRequestBody(error.to_string()).into_response();
        }
    };
    log_request(
        &parts.method,
        &parts.uri,
        &redact_cookies(&parts.headers),
        &String::from_utf8_lossy(&body_bytes),
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return Response::from_parts(parts, Body::empty());
        }
    };
    log_response(
        parts.status,
        &redact_cookies(&parts.headers),
        &String::from_utf8_lossy(&body_bytes),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

fn redact_cookies(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    for name in [COOKIE, SET_COOKIE] {
        if headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static("********"));
        }
    }

    headers
}

const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Cut `body` to at most [LOG_BODY_LENGTH_LIMIT] bytes without splitting a character.
fn truncate_body(body: &str) -> Option<&str> {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return None;
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    Some(&body[..end])
}

fn log_request(
    method: &axum::http::Method,
    uri: &axum::http::Uri,
    headers: &HeaderMap,
    body: &str,
) {
    match truncate_body(body) {
        Some(truncated) => {
            tracing::info!("Received request: {method} {uri} {headers:?}\nbody: {truncated}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {method} {uri} {headers:?}\nbody: {body:?}"),
    }
}

fn log_response(status: axum::http::StatusCode, headers: &HeaderMap, body: &str) {
    match truncate_body(body) {
        Some(truncated) => {
            tracing::info!("Sending response: {status} {headers:?}\nbody: {truncated}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {status} {headers:?}\nbody: {body:?}"),
    }
}
