//! Preview session handlers

use std::convert::Infallible;

use async_stream::stream;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use super::{json_body, parse_repl_id, parse_session_id, session_to_api};
use crate::application::preview::sessions::preview_url;
use crate::domain::types::FragmentKind;
use crate::infra::http::HttpState;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{
    FragmentUpdateRequest, ModeUpdateRequest, SessionOpenRequest,
};

pub async fn open_session(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    body: Result<Json<SessionOpenRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let repl_id = parse_repl_id(&id)?;
    let request = match body {
        // An empty POST opens a session with the configured default mode.
        Err(JsonRejection::MissingJsonContentType(_)) => SessionOpenRequest::default(),
        other => json_body(other)?,
    };

    let snapshot = state
        .previews
        .open(repl_id, request.mode)
        .await
        .map_err(session_to_api)?;

    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn get_session(
    State(state): State<HttpState>,
    Path(session): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = parse_session_id(&session)?;
    let snapshot = state
        .previews
        .snapshot(session_id)
        .await
        .map_err(session_to_api)?;

    Ok(Json(snapshot))
}

pub async fn update_fragment(
    State(state): State<HttpState>,
    Path((session, kind)): Path<(String, String)>,
    body: Result<Json<FragmentUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = parse_session_id(&session)?;
    let kind = kind
        .parse::<FragmentKind>()
        .map_err(|err| ApiError::bad_request("Unknown fragment kind", Some(err.to_string())))?;
    let request = json_body(body)?;

    let snapshot = state
        .previews
        .edit(session_id, kind, request.content)
        .await
        .map_err(session_to_api)?;

    Ok(Json(snapshot))
}

pub async fn run_session(
    State(state): State<HttpState>,
    Path(session): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = parse_session_id(&session)?;
    let snapshot = state
        .previews
        .run(session_id)
        .await
        .map_err(session_to_api)?;

    Ok(Json(snapshot))
}

pub async fn update_mode(
    State(state): State<HttpState>,
    Path(session): Path<String>,
    body: Result<Json<ModeUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = parse_session_id(&session)?;
    let request = json_body(body)?;

    let snapshot = state
        .previews
        .set_mode(session_id, request.mode)
        .await
        .map_err(session_to_api)?;

    Ok(Json(snapshot))
}

pub async fn close_session(
    State(state): State<HttpState>,
    Path(session): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = parse_session_id(&session)?;
    state
        .previews
        .close(session_id)
        .await
        .map_err(session_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Server-sent `version` events, starting with the currently mounted version.
pub async fn session_events(
    State(state): State<HttpState>,
    Path(session): Path<String>,
) -> Result<Response, ApiError> {
    let session_id = parse_session_id(&session)?;
    let mut versions = state
        .previews
        .subscribe(session_id)
        .await
        .map_err(session_to_api)?;

    let stream = stream! {
        loop {
            let version = *versions.borrow_and_update();
            yield Ok::<Event, Infallible>(version_event(session_id, version));
            if versions.changed().await.is_err() {
                break;
            }
        }
    };

    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response())
}

fn version_event(session_id: Uuid, version: u64) -> Event {
    let payload = serde_json::json!({
        "version": version,
        "previewUrl": preview_url(session_id, version),
    });

    Event::default()
        .event("version")
        .id(version.to_string())
        .data(payload.to_string())
}
