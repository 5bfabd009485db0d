//! Process-local repository used when no database is configured.

use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::application::repos::{CreateReplParams, RepoError, ReplsRepo, UpdateReplParams};
use crate::domain::entities::ReplRecord;

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    repls: BTreeMap<i64, ReplRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryRepositories {
    state: Mutex<MemoryState>,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReplsRepo for InMemoryRepositories {
    async fn list_repls(&self) -> Result<Vec<ReplRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut repls: Vec<ReplRecord> = state.repls.values().cloned().collect();
        repls.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(repls)
    }

    async fn find_repl(&self, id: i64) -> Result<Option<ReplRecord>, RepoError> {
        Ok(self.state.lock().await.repls.get(&id).cloned())
    }

    async fn create_repl(&self, params: CreateReplParams) -> Result<ReplRecord, RepoError> {
        let mut state = self.state.lock().await;
        state.next_id += 1;

        let record = ReplRecord {
            id: state.next_id,
            title: params.title,
            html: params.html,
            css: params.css,
            js: params.js,
            created_at: OffsetDateTime::now_utc(),
        };
        state.repls.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_repl(&self, params: UpdateReplParams) -> Result<ReplRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = state.repls.get_mut(&params.id).ok_or(RepoError::NotFound)?;

        if let Some(title) = params.title {
            record.title = title;
        }
        if let Some(html) = params.html {
            record.html = html;
        }
        if let Some(css) = params.css {
            record.css = css;
        }
        if let Some(js) = params.js {
            record.js = js;
        }

        Ok(record.clone())
    }

    async fn count_repls(&self) -> Result<u64, RepoError> {
        Ok(self.state.lock().await.repls.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(title: &str) -> CreateReplParams {
        CreateReplParams {
            title: title.to_string(),
            html: String::new(),
            css: String::new(),
            js: String::new(),
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially_from_one() {
        let repo = InMemoryRepositories::new();
        let first = repo.create_repl(params("a")).await.unwrap();
        let second = repo.create_repl(params("b")).await.unwrap();

        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(repo.count_repls().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_of_missing_repl_is_not_found() {
        let repo = InMemoryRepositories::new();
        let err = repo
            .update_repl(UpdateReplParams {
                id: 1,
                ..UpdateReplParams::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RepoError::NotFound));
    }
}
