use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres};
use std::time::Duration;
use tracing::info;

use super::models::{Article, ArticleSummary, NewArticle, NewUser, User};
use super::{Store, StoreError, Transaction};
use crate::config::DatabaseConfig;

/// Table definitions, applied idempotently at startup
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username VARCHAR(100) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id BIGSERIAL PRIMARY KEY,
        title VARCHAR(200) NOT NULL,
        content TEXT NOT NULL,
        author_id BIGINT NOT NULL REFERENCES users (id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS articles_author_id_idx ON articles (author_id)",
];

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a pool sized and timed from `config`
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    /// Create the users and articles tables if they are missing
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema ready");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2)
             RETURNING id, username, password_hash",
        )
        .bind(user.username)
        .bind(user.password_hash)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn insert_article(&mut self, article: NewArticle) -> Result<Article, StoreError> {
        let article = sqlx::query_as::<_, Article>(
            "INSERT INTO articles (title, content, author_id) VALUES ($1, $2, $3)
             RETURNING id, title, content, author_id",
        )
        .bind(article.title)
        .bind(article.content)
        .bind(article.author_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(article)
    }

    async fn list_articles_by_author(&mut self, author_id: i64) -> Result<Vec<ArticleSummary>, StoreError> {
        let articles = sqlx::query_as::<_, ArticleSummary>(
            "SELECT id, title FROM articles WHERE author_id = $1 ORDER BY id",
        )
        .bind(author_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(articles)
    }

    async fn find_article_for_update(&mut self, id: i64) -> Result<Option<Article>, StoreError> {
        let article = sqlx::query_as::<_, Article>(
            "SELECT id, title, content, author_id FROM articles WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(article)
    }

    async fn find_article_by_id_and_author(
        &mut self,
        id: i64,
        author_id: i64,
    ) -> Result<Option<Article>, StoreError> {
        let article = sqlx::query_as::<_, Article>(
            "SELECT id, title, content, author_id FROM articles WHERE id = $1 AND author_id = $2",
        )
        .bind(id)
        .bind(author_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(article)
    }

    async fn find_article_by_title_and_author(
        &mut self,
        title: &str,
        author_id: i64,
    ) -> Result<Option<Article>, StoreError> {
        let article = sqlx::query_as::<_, Article>(
            "SELECT id, title, content, author_id FROM articles
             WHERE title = $1 AND author_id = $2
             ORDER BY id
             LIMIT 1",
        )
        .bind(title)
        .bind(author_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(article)
    }

    async fn update_article(&mut self, article: &Article) -> Result<(), StoreError> {
        sqlx::query("UPDATE articles SET title = $1, content = $2 WHERE id = $3")
            .bind(&article.title)
            .bind(&article.content)
            .bind(article.id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn delete_article(&mut self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
