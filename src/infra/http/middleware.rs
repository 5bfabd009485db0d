//! Request correlation and failure logging.

use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

const TARGET: &str = "replbuild::http::response";

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Reuse a caller-supplied request id or mint one, and echo it on the response.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty() && value.len() <= 128)
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Log failed responses together with the [`ErrorReport`] the handler attached.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();

    if status.is_success() || status.is_redirection() {
        debug!(
            target: TARGET,
            status = status.as_u16(),
            method = %method,
            path = %uri.path(),
            elapsed_ms,
            request_id = %request_id,
            "request served"
        );
        return response;
    }

    let report = response.extensions_mut().remove::<ErrorReport>();
    log_failure(
        &FailedRequest {
            status,
            method: &method,
            uri: &uri,
            elapsed_ms,
            request_id: &request_id,
        },
        report,
    );
    response
}

struct FailedRequest<'a> {
    status: StatusCode,
    method: &'a Method,
    uri: &'a Uri,
    elapsed_ms: u128,
    request_id: &'a str,
}

fn log_failure(request: &FailedRequest<'_>, report: Option<ErrorReport>) {
    let (source, chain) = report
        .map(|report| (report.source, report.messages))
        .unwrap_or(("unknown", Vec::new()));
    let detail = chain
        .first()
        .map(String::as_str)
        .unwrap_or("no diagnostic available");

    macro_rules! emit {
        ($level:ident, $message:literal) => {
            $level!(
                target: TARGET,
                status = request.status.as_u16(),
                method = %request.method,
                path = %request.uri.path(),
                elapsed_ms = request.elapsed_ms,
                request_id = %request.request_id,
                source,
                detail,
                chain = ?chain,
                $message
            )
        };
    }

    if request.status.is_server_error() {
        emit!(error, "request failed");
    } else {
        emit!(warn, "client request error");
    }
}
