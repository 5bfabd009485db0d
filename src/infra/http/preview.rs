//! Serves mounted preview documents to sandboxed frames.

use axum::{
    extract::{Path, State},
    http::{
        StatusCode,
        header::{CACHE_CONTROL, CONTENT_SECURITY_POLICY, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
    },
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::application::error::HttpError;

use super::HttpState;

/// Scripts may run, but the document gets an opaque origin: no access to the
/// host page, its cookies or its storage.
const PREVIEW_CSP: &str = "sandbox allow-scripts";

pub(super) async fn serve_preview(
    State(state): State<HttpState>,
    Path((session, version)): Path<(String, String)>,
) -> Response {
    let document = match (Uuid::parse_str(&session), version.parse::<u64>()) {
        (Ok(session_id), Ok(version)) => state.previews.document(session_id, version),
        _ => None,
    };

    match document {
        Some(document) => (
            [
                (CONTENT_TYPE, "text/html; charset=utf-8"),
                (CONTENT_SECURITY_POLICY, PREVIEW_CSP),
                (CACHE_CONTROL, "no-store"),
                (X_CONTENT_TYPE_OPTIONS, "nosniff"),
            ],
            document.to_string(),
        )
            .into_response(),
        None => HttpError::new(
            "infra::http::preview::serve_preview",
            StatusCode::NOT_FOUND,
            "Preview not found",
            format!("no mounted document for session `{session}` version `{version}`"),
        )
        .into_response(),
    }
}
