//! Lets HTML forms (GET/POST only) express PUT, PATCH and DELETE through a
//! `_method` parameter, read from the query string or a urlencoded body.

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::{Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::error::AppError;

const FIELD: &str = "_method";
const BODY_LIMIT: usize = 2 * 1024 * 1024;

pub async fn method_override(req: Request, next: Next) -> Response {
    if req.method() != Method::POST {
        return next.run(req).await;
    }

    let (mut req, target) = match req.uri().query().and_then(parse_override) {
        Some(method) => (req, Some(method)),
        None if is_urlencoded(&req) => match override_from_body(req).await {
            Ok(pair) => pair,
            Err(res) => return res,
        },
        None => (req, None),
    };

    if let Some(method) = target {
        debug!("Method override: POST -> {}", method);
        *req.method_mut() = method;
    }
    next.run(req).await
}

/// Maps a `_method` value to a method; only PUT, PATCH and DELETE qualify.
pub fn override_target(value: &str) -> Option<Method> {
    match value.trim().to_ascii_uppercase().as_str() {
        "PUT" => Some(Method::PUT),
        "PATCH" => Some(Method::PATCH),
        "DELETE" => Some(Method::DELETE),
        _ => None,
    }
}

fn parse_override(encoded: &str) -> Option<Method> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(encoded).ok()?;
    pairs
        .iter()
        .find(|(k, _)| k == FIELD)
        .and_then(|(_, v)| override_target(v))
}

fn is_urlencoded(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// Buffers the body to look for `_method`, then puts it back untouched.
async fn override_from_body(req: Request) -> Result<(Request, Option<Method>), Response> {
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|_| AppError::PayloadTooLarge.into_response())?;

    let target = std::str::from_utf8(&bytes).ok().and_then(parse_override);
    Ok((Request::from_parts(parts, Body::from(bytes)), target))
}
