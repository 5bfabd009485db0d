pub mod error;
pub mod handlers;
pub mod models;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::infra::http::HttpState;

pub fn build_api_router() -> Router<HttpState> {
    Router::new()
        .route(
            "/api/repls",
            get(handlers::list_repls).post(handlers::create_repl),
        )
        .route(
            "/api/repls/{id}",
            get(handlers::get_repl).put(handlers::update_repl),
        )
        .route("/api/repls/{id}/sessions", post(handlers::open_session))
        .route(
            "/api/sessions/{session}",
            get(handlers::get_session).delete(handlers::close_session),
        )
        .route(
            "/api/sessions/{session}/fragments/{kind}",
            put(handlers::update_fragment),
        )
        .route("/api/sessions/{session}/run", post(handlers::run_session))
        .route("/api/sessions/{session}/mode", put(handlers::update_mode))
        .route("/api/sessions/{session}/events", get(handlers::session_events))
}
