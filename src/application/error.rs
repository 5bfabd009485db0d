use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{application::repls::ReplServiceError, infra::error::InfraError};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<ReplServiceError> for HttpError {
    fn from(error: ReplServiceError) -> Self {
        match error {
            ReplServiceError::NotFound(id) => HttpError::new(
                "application::error::repl_service_error_to_http",
                StatusCode::NOT_FOUND,
                "Repl not found",
                format!("Repl {id} does not exist"),
            ),
            ReplServiceError::Domain(err) => HttpError::from_error(
                "application::error::repl_service_error_to_http",
                StatusCode::BAD_REQUEST,
                "Request could not be processed",
                &err,
            ),
            ReplServiceError::Repo(err) => HttpError::from_error(
                "application::error::repl_service_error_to_http",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;

    #[test]
    fn report_collects_error_chain() {
        let error = ReplServiceError::Domain(DomainError::validation("title too long"));
        let report = ErrorReport::from_error("test", StatusCode::BAD_REQUEST, &error);

        assert_eq!(report.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            report.messages,
            vec!["domain validation failed: title too long".to_string()]
        );
    }

    #[test]
    fn app_error_displays_infra_cause() {
        let error = AppError::from(InfraError::migration("checksum mismatch"));
        assert_eq!(
            error.to_string(),
            "database migration failed: checksum mismatch"
        );
        assert_eq!(
            AppError::validation("bad").to_string(),
            "validation failed: bad"
        );
    }

    #[test]
    fn missing_repl_becomes_not_found_page_error() {
        let response = HttpError::from(ReplServiceError::NotFound(3)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }
}
