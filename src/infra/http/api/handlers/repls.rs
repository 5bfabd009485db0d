//! Repl CRUD handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::{json_body, parse_repl_id, repl_to_api};
use crate::infra::http::HttpState;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{ReplCreateRequest, ReplUpdateRequest};

pub async fn list_repls(State(state): State<HttpState>) -> Result<impl IntoResponse, ApiError> {
    let repls = state.repls.list().await.map_err(repl_to_api)?;
    Ok(Json(repls))
}

pub async fn get_repl(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_repl_id(&id)?;
    let repl = state.repls.load(id).await.map_err(repl_to_api)?;
    Ok(Json(repl))
}

pub async fn create_repl(
    State(state): State<HttpState>,
    body: Result<Json<ReplCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(body)?;
    let repl = state
        .repls
        .create(request.into())
        .await
        .map_err(repl_to_api)?;

    Ok((StatusCode::CREATED, Json(repl)))
}

pub async fn update_repl(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    body: Result<Json<ReplUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_repl_id(&id)?;
    let request = json_body(body)?;
    let repl = state
        .repls
        .update(request.into_command(id))
        .await
        .map_err(repl_to_api)?;

    Ok(Json(repl))
}
