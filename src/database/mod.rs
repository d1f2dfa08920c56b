// database/mod.rs - Persistence gateway
//
// Services never see a pool or a global handle. A handler asks the `Store` for
// a request-scoped `Transaction`, passes it down by `&mut`, and commits once
// the operation succeeded. Dropping a transaction without committing rolls it
// back.

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod models;
pub mod postgres;

pub use memory::MemoryStore;
pub use models::{Article, ArticleSummary, NewArticle, NewUser, User};
pub use postgres::PgStore;

/// Errors raised by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Timed out waiting for a database connection")]
    PoolTimedOut,

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::PoolTimedOut) {
            return StoreError::PoolTimedOut;
        }

        // SQLSTATE 23505 unique_violation, 23503 foreign_key_violation
        let code = err
            .as_database_error()
            .and_then(|db_err| db_err.code().map(|code| code.into_owned()));
        match code.as_deref() {
            Some("23505") => StoreError::UniqueViolation(err.to_string()),
            Some("23503") => StoreError::ForeignKeyViolation(err.to_string()),
            _ => StoreError::Sqlx(err),
        }
    }
}

/// Source of request-scoped transactions
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError>;

    /// Cheap connectivity probe for the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Row-level operations available inside one transaction
#[async_trait]
pub trait Transaction: Send {
    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError>;

    async fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError>;

    async fn insert_article(&mut self, article: NewArticle) -> Result<Article, StoreError>;

    /// Articles owned by `author_id`, ascending by id
    async fn list_articles_by_author(&mut self, author_id: i64) -> Result<Vec<ArticleSummary>, StoreError>;

    /// Load an article regardless of owner, locking it for the rest of the
    /// transaction where the backend supports row locks.
    async fn find_article_for_update(&mut self, id: i64) -> Result<Option<Article>, StoreError>;

    async fn find_article_by_id_and_author(
        &mut self,
        id: i64,
        author_id: i64,
    ) -> Result<Option<Article>, StoreError>;

    /// First article (lowest id) with exactly this title owned by `author_id`
    async fn find_article_by_title_and_author(
        &mut self,
        title: &str,
        author_id: i64,
    ) -> Result<Option<Article>, StoreError>;

    /// Persist title and content of an existing article
    async fn update_article(&mut self, article: &Article) -> Result<(), StoreError>;

    async fn delete_article(&mut self, id: i64) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
