use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{CreateReplParams, RepoError, ReplsRepo, UpdateReplParams},
    domain::entities::ReplRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ReplRow {
    id: i64,
    title: String,
    html: String,
    css: String,
    js: String,
    created_at: OffsetDateTime,
}

impl From<ReplRow> for ReplRecord {
    fn from(row: ReplRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            html: row.html,
            css: row.css,
            js: row.js,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ReplsRepo for PostgresRepositories {
    async fn list_repls(&self) -> Result<Vec<ReplRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ReplRow>(
            r#"
            SELECT id, title, html, css, js, created_at
            FROM repls
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ReplRecord::from).collect())
    }

    async fn find_repl(&self, id: i64) -> Result<Option<ReplRecord>, RepoError> {
        let row = sqlx::query_as::<_, ReplRow>(
            r#"
            SELECT id, title, html, css, js, created_at
            FROM repls
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ReplRecord::from))
    }

    async fn create_repl(&self, params: CreateReplParams) -> Result<ReplRecord, RepoError> {
        let row = sqlx::query_as::<_, ReplRow>(
            r#"
            INSERT INTO repls (title, html, css, js)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, html, css, js, created_at
            "#,
        )
        .bind(params.title)
        .bind(params.html)
        .bind(params.css)
        .bind(params.js)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_repl(&self, params: UpdateReplParams) -> Result<ReplRecord, RepoError> {
        let row = sqlx::query_as::<_, ReplRow>(
            r#"
            UPDATE repls
            SET title = COALESCE($2, title),
                html = COALESCE($3, html),
                css = COALESCE($4, css),
                js = COALESCE($5, js)
            WHERE id = $1
            RETURNING id, title, html, css, js, created_at
            "#,
        )
        .bind(params.id)
        .bind(params.title)
        .bind(params.html)
        .bind(params.css)
        .bind(params.js)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(ReplRecord::from).ok_or(RepoError::NotFound)
    }

    async fn count_repls(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM repls")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }
}
