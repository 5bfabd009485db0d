//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::ReplRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateReplParams {
    pub title: String,
    pub html: String,
    pub css: String,
    pub js: String,
}

/// Partial update: `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateReplParams {
    pub id: i64,
    pub title: Option<String>,
    pub html: Option<String>,
    pub css: Option<String>,
    pub js: Option<String>,
}

#[async_trait]
pub trait ReplsRepo: Send + Sync {
    /// All repls, oldest first.
    async fn list_repls(&self) -> Result<Vec<ReplRecord>, RepoError>;

    async fn find_repl(&self, id: i64) -> Result<Option<ReplRecord>, RepoError>;

    async fn create_repl(&self, params: CreateReplParams) -> Result<ReplRecord, RepoError>;

    async fn update_repl(&self, params: UpdateReplParams) -> Result<ReplRecord, RepoError>;

    async fn count_repls(&self) -> Result<u64, RepoError>;
}
