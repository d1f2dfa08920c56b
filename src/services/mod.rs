pub mod article_service;
pub mod credential_service;

pub use article_service::{ArticlePatch, ArticleUpdate, NewArticleInput};
pub use credential_service::{CredentialService, Credentials};

use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::auth::JwtError;
use crate::database::StoreError;

/// Domain failures shared by the credential and article services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Identity recovered from a verified token, trusted for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
}

/// Treat a missing field and an empty string the same way
pub(crate) fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
