use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{CreateReplParams, RepoError, ReplsRepo, UpdateReplParams};
use crate::domain::entities::{ReplRecord, normalize_title};
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum ReplServiceError {
    #[error("repl {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for ReplServiceError {
    fn from(err: RepoError) -> Self {
        Self::Repo(err)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateReplCommand {
    pub title: Option<String>,
    pub html: Option<String>,
    pub css: Option<String>,
    pub js: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateReplCommand {
    pub id: i64,
    pub title: Option<String>,
    pub html: Option<String>,
    pub css: Option<String>,
    pub js: Option<String>,
}

#[derive(Clone)]
pub struct ReplService {
    repls: Arc<dyn ReplsRepo>,
}

impl ReplService {
    pub fn new(repls: Arc<dyn ReplsRepo>) -> Self {
        Self { repls }
    }

    pub async fn list(&self) -> Result<Vec<ReplRecord>, ReplServiceError> {
        self.repls.list_repls().await.map_err(ReplServiceError::from)
    }

    pub async fn find(&self, id: i64) -> Result<Option<ReplRecord>, ReplServiceError> {
        self.repls.find_repl(id).await.map_err(ReplServiceError::from)
    }

    pub async fn count(&self) -> Result<u64, ReplServiceError> {
        self.repls.count_repls().await.map_err(ReplServiceError::from)
    }

    pub async fn load(&self, id: i64) -> Result<ReplRecord, ReplServiceError> {
        self.find(id).await?.ok_or(ReplServiceError::NotFound(id))
    }

    pub async fn create(&self, command: CreateReplCommand) -> Result<ReplRecord, ReplServiceError> {
        let title = normalize_title(command.title.as_deref().unwrap_or_default())?;

        let record = self
            .repls
            .create_repl(CreateReplParams {
                title,
                html: command.html.unwrap_or_default(),
                css: command.css.unwrap_or_default(),
                js: command.js.unwrap_or_default(),
            })
            .await?;

        info!(
            target = "replbuild::application::repls",
            repl_id = record.id,
            title = %record.title,
            "repl created"
        );
        Ok(record)
    }

    pub async fn update(&self, command: UpdateReplCommand) -> Result<ReplRecord, ReplServiceError> {
        let UpdateReplCommand {
            id,
            title,
            html,
            css,
            js,
        } = command;

        let title = title.as_deref().map(normalize_title).transpose()?;

        self.repls
            .update_repl(UpdateReplParams {
                id,
                title,
                html,
                css,
                js,
            })
            .await
            .map_err(|err| match err {
                RepoError::NotFound => ReplServiceError::NotFound(id),
                other => ReplServiceError::Repo(other),
            })
    }

    /// Populate an empty store with the sample repls. Returns how many were created.
    pub async fn seed_defaults(&self) -> Result<usize, ReplServiceError> {
        if self.repls.count_repls().await? > 0 {
            return Ok(0);
        }

        let samples = default_samples();
        let created = samples.len();
        for params in samples {
            self.repls.create_repl(params).await?;
        }

        info!(
            target = "replbuild::application::repls",
            created, "seeded sample repls"
        );
        Ok(created)
    }
}

fn default_samples() -> Vec<CreateReplParams> {
    vec![
        CreateReplParams {
            title: "Hello World".to_string(),
            html: "<h1>Hello World</h1>\n<p>Start editing to see some magic happen!</p>"
                .to_string(),
            css: "h1 {\n  color: #5b21b6;\n  font-family: sans-serif;\n}".to_string(),
            js: "console.log('Hello from the Repl!');".to_string(),
        },
        CreateReplParams {
            title: "Button Counter".to_string(),
            html: "<button id='btn'>Clicked 0 times</button>".to_string(),
            css: "button {\n  padding: 10px 20px;\n  background: #2563eb;\n  color: white;\n  border: none;\n  border-radius: 4px;\n  cursor: pointer;\n}\nbutton:hover {\n  background: #1d4ed8;\n}".to_string(),
            js: "let count = 0;\nconst btn = document.getElementById('btn');\nbtn.addEventListener('click', () => {\n  count++;\n  btn.textContent = `Clicked ${count} times`;\n});".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::DEFAULT_REPL_TITLE;
    use crate::infra::memory::InMemoryRepositories;

    fn service() -> ReplService {
        ReplService::new(Arc::new(InMemoryRepositories::new()))
    }

    #[tokio::test]
    async fn create_defaults_missing_fields() {
        let service = service();
        let record = service
            .create(CreateReplCommand {
                title: Some("   ".to_string()),
                ..CreateReplCommand::default()
            })
            .await
            .unwrap();

        assert_eq!(record.title, DEFAULT_REPL_TITLE);
        assert_eq!(record.html, "");
        assert_eq!(record.js, "");
    }

    #[tokio::test]
    async fn update_keeps_absent_fields() {
        let service = service();
        let record = service
            .create(CreateReplCommand {
                title: Some("Demo".to_string()),
                html: Some("<p>a</p>".to_string()),
                css: Some("p{}".to_string()),
                js: None,
            })
            .await
            .unwrap();

        let updated = service
            .update(UpdateReplCommand {
                id: record.id,
                js: Some("alert(1)".to_string()),
                ..UpdateReplCommand::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.title, "Demo");
        assert_eq!(updated.html, "<p>a</p>");
        assert_eq!(updated.js, "alert(1)");
        assert_eq!(updated.created_at, record.created_at);
    }

    #[tokio::test]
    async fn update_unknown_repl_is_not_found() {
        let err = service()
            .update(UpdateReplCommand {
                id: 404,
                ..UpdateReplCommand::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ReplServiceError::NotFound(404)));
    }

    #[tokio::test]
    async fn load_reports_missing_repl() {
        let service = service();
        service.seed_defaults().await.unwrap();

        assert_eq!(service.load(2).await.unwrap().title, "Button Counter");
        assert!(matches!(
            service.load(9).await.unwrap_err(),
            ReplServiceError::NotFound(9)
        ));
    }

    #[tokio::test]
    async fn seeding_only_happens_once() {
        let service = service();
        assert_eq!(service.seed_defaults().await.unwrap(), 2);
        assert_eq!(service.seed_defaults().await.unwrap(), 0);

        let titles: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.title)
            .collect();
        assert_eq!(titles, vec!["Hello World", "Button Counter"]);
    }
}
