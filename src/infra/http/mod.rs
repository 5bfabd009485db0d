pub mod api;
mod middleware;
mod pages;
mod preview;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::{
    error::ErrorReport,
    preview::PreviewSessions,
    repls::{ReplService, ReplServiceError},
};

use self::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub repls: Arc<ReplService>,
    pub previews: Arc<PreviewSessions>,
}

impl HttpState {
    pub fn new(repls: Arc<ReplService>, previews: Arc<PreviewSessions>) -> Self {
        Self { repls, previews }
    }
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .merge(api::build_api_router())
        .merge(pages::build_pages_router())
        .route("/preview/{session}/{version}", get(preview::serve_preview))
        .route("/_health", get(health))
        .fallback(pages::fallback)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn health(State(state): State<HttpState>) -> Response {
    store_health_response(state.repls.count().await.map(|_| ()))
}

fn store_health_response(result: Result<(), ReplServiceError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::store_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
