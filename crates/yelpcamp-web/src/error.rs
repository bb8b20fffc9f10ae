use axum::{
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::middleware::Locals;
use crate::views;

pub const GENERIC_MESSAGE: &str = "Oh No, Something Went Wrong!";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("You must be signed in first!")]
    Unauthenticated,

    #[error("You do not have permission to do that!")]
    Forbidden,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

/// The only error shape the error view knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedError {
    pub status: StatusCode,
    pub message: String,
}

impl NormalizedError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            GENERIC_MESSAGE.to_string()
        } else {
            message
        };
        Self { status, message }
    }
}

impl AppError {
    pub fn normalize(&self) -> NormalizedError {
        match self {
            AppError::NotFound(message) => NormalizedError::new(StatusCode::NOT_FOUND, message.as_str()),
            AppError::BadRequest(message) => NormalizedError::new(StatusCode::BAD_REQUEST, message.as_str()),
            AppError::Unauthenticated => NormalizedError::new(StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden => NormalizedError::new(StatusCode::FORBIDDEN, self.to_string()),
            AppError::PayloadTooLarge => NormalizedError::new(StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            // Internals are logged, never shown.
            AppError::Internal(_) => NormalizedError::new(StatusCode::INTERNAL_SERVER_ERROR, ""),
        }
    }
}

/// Handlers never render error pages: the response only carries the
/// normalized error, and [`normalize_errors`] renders it.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(e) = &self {
            error!("{:#}", e);
        }
        let normalized = self.normalize();
        let mut res = normalized.status.into_response();
        res.extensions_mut().insert(normalized);
        res
    }
}

pub const PAGE_NOT_FOUND: &str = "Page Not Found";

/// Catch-all for unmatched routes.
pub async fn not_found() -> AppError {
    AppError::NotFound(PAGE_NOT_FOUND.to_string())
}

/// Renders the error view for normalized errors, and for framework
/// rejections (405, malformed bodies, missing static files) that come back
/// as bare non-HTML failures. Responses it already rendered pass through
/// untouched, so it can wrap both the dispatch stack and the services
/// mounted outside it.
pub async fn normalize_errors(req: Request, next: Next) -> Response {
    let locals = req.extensions().get::<Locals>().cloned();
    let res = next.run(req).await;

    let normalized = match res.extensions().get::<NormalizedError>() {
        Some(normalized) => normalized.clone(),
        None if is_bare_failure(&res) => match res.status() {
            StatusCode::NOT_FOUND => NormalizedError::new(StatusCode::NOT_FOUND, PAGE_NOT_FOUND),
            status => NormalizedError::new(status, status.canonical_reason().unwrap_or_default()),
        },
        None => return res,
    };

    (normalized.status, views::error_page(locals.as_ref(), &normalized)).into_response()
}

fn is_bare_failure(res: &Response) -> bool {
    let status = res.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return false;
    }
    let is_html = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));
    !is_html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_maps_to_a_status() {
        let cases = [
            (AppError::NotFound("Cannot find that campground!".into()), StatusCode::NOT_FOUND),
            (AppError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
            (AppError::Internal(anyhow::anyhow!("db down")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.normalize().status, status);
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let n = AppError::Internal(anyhow::anyhow!("password column missing")).normalize();
        assert_eq!(n.message, GENERIC_MESSAGE);
    }

    #[test]
    fn empty_messages_fall_back_to_generic() {
        assert_eq!(AppError::NotFound(String::new()).normalize().message, GENERIC_MESSAGE);
        assert_eq!(
            AppError::Forbidden.normalize().message,
            "You do not have permission to do that!"
        );
    }

    #[test]
    fn response_carries_normalized_error() {
        let res = AppError::NotFound("Page Not Found".into()).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let n = res.extensions().get::<NormalizedError>().unwrap();
        assert_eq!(n.message, "Page Not Found");
    }
}
