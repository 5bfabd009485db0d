//! API handlers organized by resource type.
//!
//! Helper functions for error conversion and input parsing are shared here.

mod repls;
mod sessions;

pub use repls::*;
pub use sessions::*;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::application::preview::PreviewSessionError;
use crate::application::repls::ReplServiceError;
use crate::application::repos::RepoError;

use super::error::{ApiError, codes};

// ----- Shared input parsing -----

/// Unwrap a JSON body, turning malformed or mistyped payloads into a 400.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        ApiError::bad_request("Invalid request body", Some(rejection.body_text()))
    })
}

/// Repl ids that are not integers cannot exist.
pub(crate) fn parse_repl_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found("Repl not found"))
}

pub(crate) fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Session not found"))
}

// ----- Shared error conversions -----

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

pub(crate) fn repl_to_api(err: ReplServiceError) -> ApiError {
    match err {
        ReplServiceError::NotFound(_) => ApiError::not_found("Repl not found"),
        ReplServiceError::Domain(domain) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid repl",
            Some(domain.to_string()),
        ),
        ReplServiceError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn session_to_api(err: PreviewSessionError) -> ApiError {
    match err {
        PreviewSessionError::SessionNotFound(_) => ApiError::not_found("Session not found"),
        PreviewSessionError::ReplNotFound(_) => ApiError::not_found("Repl not found"),
        PreviewSessionError::Repo(repo) => repo_to_api(repo),
    }
}
