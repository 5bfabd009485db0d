use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use time::OffsetDateTime;

use crate::{
    application::{error::HttpError, repls::CreateReplCommand},
    domain::types::TriggerMode,
    presentation::views::{
        DashboardTemplate, EditorTemplate, EditorView, ReplCardView, render_not_found_response,
        render_template_response,
    },
};

use super::HttpState;

pub(super) fn build_pages_router() -> Router<HttpState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/repls", post(create_repl))
        .route("/repl/{id}", get(editor))
}

async fn dashboard(State(state): State<HttpState>) -> Response {
    let repls = match state.repls.list().await {
        Ok(repls) => repls,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let now = OffsetDateTime::now_utc();
    let cards = repls
        .iter()
        .map(|record| ReplCardView::from_record(record, now))
        .collect();

    render_template_response(DashboardTemplate { repls: cards }, StatusCode::OK)
}

async fn create_repl(State(state): State<HttpState>) -> Response {
    match state.repls.create(CreateReplCommand::default()).await {
        Ok(record) => Redirect::to(&format!("/repl/{}", record.id)).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn editor(State(state): State<HttpState>, Path(id): Path<String>) -> Response {
    let Ok(id) = id.parse::<i64>() else {
        return render_not_found_response("Repl not found");
    };

    match state.repls.find(id).await {
        Ok(Some(record)) => {
            let auto_refresh =
                state.previews.config().default_mode == TriggerMode::AutoDebounced;
            let view = EditorView::new(&record, auto_refresh);
            render_template_response(EditorTemplate { view }, StatusCode::OK)
        }
        Ok(None) => render_not_found_response("Repl not found"),
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn fallback() -> Response {
    render_not_found_response("Page not found")
}
