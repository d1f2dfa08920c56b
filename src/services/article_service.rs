// services/article_service.rs - Article CRUD scoped to the calling user
//
// Reads filter by author in the query itself, so another user's article is
// simply "not found". Writes load the row first and then compare owners, so
// another user's article is "access denied". Both behaviors are part of the
// HTTP contract.

use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

use super::{required, Caller, ServiceError, ServiceResult};
use crate::database::{Article, ArticleSummary, NewArticle, StoreError, Transaction};

/// Matches the articles.title column width
pub const MAX_TITLE_LEN: usize = 200;

/// Body of `POST /articles`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewArticleInput {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Body of `PUT /articles/:id`. Absent and `null` fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Body of `PATCH /articles/:id`. The outer `Option` records whether the key
/// was present at all; the inner one whether it was `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticlePatch {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub content: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// How `GET /article/:param` interprets its parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleLookup<'a> {
    Id(i64),
    Title(&'a str),
    /// All digits, but too large to be any article id
    NoSuchId,
}

impl<'a> ArticleLookup<'a> {
    /// A parameter made only of ASCII digits is always an id, so an article
    /// whose title is a number cannot be fetched by title.
    pub fn parse(param: &'a str) -> Self {
        if !param.is_empty() && param.bytes().all(|b| b.is_ascii_digit()) {
            match param.parse() {
                Ok(id) => ArticleLookup::Id(id),
                Err(_) => ArticleLookup::NoSuchId,
            }
        } else {
            ArticleLookup::Title(param)
        }
    }
}

pub async fn create(tx: &mut dyn Transaction, caller: Caller, input: NewArticleInput) -> ServiceResult<Article> {
    let (Some(title), Some(content)) = (required(input.title), required(input.content)) else {
        return Err(ServiceError::Validation("Title and content required".to_string()));
    };
    validate_title(&title)?;

    let article = tx
        .insert_article(NewArticle {
            title,
            content,
            author_id: caller.user_id,
        })
        .await
        .map_err(|err| match err {
            // Validly signed token for a user the store no longer has
            StoreError::ForeignKeyViolation(_) => {
                warn!("Token subject {} does not name a user", caller.user_id);
                ServiceError::Authentication("Unknown user".to_string())
            }
            other => other.into(),
        })?;

    info!("User {} created article {}", caller.user_id, article.id);
    Ok(article)
}

pub async fn list(tx: &mut dyn Transaction, caller: Caller) -> ServiceResult<Vec<ArticleSummary>> {
    Ok(tx.list_articles_by_author(caller.user_id).await?)
}

pub async fn get_by_param(tx: &mut dyn Transaction, caller: Caller, param: &str) -> ServiceResult<Article> {
    let article = match ArticleLookup::parse(param) {
        ArticleLookup::Id(id) => tx.find_article_by_id_and_author(id, caller.user_id).await?,
        ArticleLookup::Title(title) => tx.find_article_by_title_and_author(title, caller.user_id).await?,
        ArticleLookup::NoSuchId => None,
    };

    article.ok_or_else(article_not_found)
}

/// Replace the provided fields; absent fields keep their stored value
pub async fn update(tx: &mut dyn Transaction, caller: Caller, id: i64, changes: ArticleUpdate) -> ServiceResult<Article> {
    let mut article = load_owned(tx, caller, id).await?;

    if let Some(title) = changes.title {
        validate_title(&title)?;
        article.title = title;
    }
    if let Some(content) = changes.content {
        article.content = content;
    }

    tx.update_article(&article).await?;
    info!("User {} updated article {}", caller.user_id, article.id);
    Ok(article)
}

/// Overwrite only the keys present in the request body
pub async fn patch(tx: &mut dyn Transaction, caller: Caller, id: i64, changes: ArticlePatch) -> ServiceResult<Article> {
    let mut article = load_owned(tx, caller, id).await?;

    match changes.title {
        Some(Some(title)) => {
            validate_title(&title)?;
            article.title = title;
        }
        Some(None) => return Err(ServiceError::Validation("Title cannot be null".to_string())),
        None => {}
    }
    match changes.content {
        Some(Some(content)) => article.content = content,
        Some(None) => return Err(ServiceError::Validation("Content cannot be null".to_string())),
        None => {}
    }

    tx.update_article(&article).await?;
    info!("User {} patched article {}", caller.user_id, article.id);
    Ok(article)
}

pub async fn delete(tx: &mut dyn Transaction, caller: Caller, id: i64) -> ServiceResult<()> {
    let article = load_owned(tx, caller, id).await?;

    tx.delete_article(article.id).await?;
    info!("User {} deleted article {}", caller.user_id, article.id);
    Ok(())
}

/// Existence is checked before ownership: a missing row is NotFound, someone
/// else's row is Authorization.
async fn load_owned(tx: &mut dyn Transaction, caller: Caller, id: i64) -> ServiceResult<Article> {
    let article = tx.find_article_for_update(id).await?.ok_or_else(article_not_found)?;

    if article.author_id != caller.user_id {
        warn!(
            "User {} denied access to article {} owned by {}",
            caller.user_id, article.id, article.author_id
        );
        return Err(ServiceError::Authorization("Access denied".to_string()));
    }

    Ok(article)
}

fn validate_title(title: &str) -> ServiceResult<()> {
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ServiceError::Validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

fn article_not_found() -> ServiceError {
    ServiceError::NotFound("Article not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryStore, NewUser, Store};

    fn input(title: &str, content: &str) -> NewArticleInput {
        NewArticleInput {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
        }
    }

    /// A store holding two users, returned as callers
    async fn two_users() -> (MemoryStore, Caller, Caller) {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let mut callers = Vec::new();
        for name in ["alice", "bob"] {
            let user = tx
                .insert_user(NewUser {
                    username: name.to_string(),
                    password_hash: "hash".to_string(),
                })
                .await
                .unwrap();
            callers.push(Caller { user_id: user.id });
        }
        tx.commit().await.unwrap();
        (store, callers[0], callers[1])
    }

    #[test]
    fn lookup_parses_digits_as_id() {
        assert_eq!(ArticleLookup::parse("42"), ArticleLookup::Id(42));
        assert_eq!(ArticleLookup::parse("007"), ArticleLookup::Id(7));
        assert_eq!(ArticleLookup::parse("MyTitle"), ArticleLookup::Title("MyTitle"));
        assert_eq!(ArticleLookup::parse("42a"), ArticleLookup::Title("42a"));
        assert_eq!(ArticleLookup::parse("-1"), ArticleLookup::Title("-1"));
        assert_eq!(ArticleLookup::parse(""), ArticleLookup::Title(""));
        assert_eq!(ArticleLookup::parse("99999999999999999999"), ArticleLookup::NoSuchId);
    }

    #[tokio::test]
    async fn create_requires_title_and_content() {
        let (store, alice, _) = two_users().await;
        let mut tx = store.begin().await.unwrap();

        for body in [input("", "body"), input("Hi", ""), NewArticleInput::default()] {
            let err = create(tx.as_mut(), alice, body).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
        assert!(list(tx.as_mut(), alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_for_vanished_user_is_authentication_failure() {
        let (store, _, _) = two_users().await;
        let mut tx = store.begin().await.unwrap();

        let ghost = Caller { user_id: 99 };
        let err = create(tx.as_mut(), ghost, input("Hi", "body")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authentication(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn create_rejects_overlong_title() {
        let (store, alice, _) = two_users().await;
        let mut tx = store.begin().await.unwrap();

        let title = "t".repeat(MAX_TITLE_LEN + 1);
        let err = create(tx.as_mut(), alice, input(&title, "body")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn list_only_returns_callers_articles() {
        let (store, alice, bob) = two_users().await;
        let mut tx = store.begin().await.unwrap();
        create(tx.as_mut(), alice, input("First", "a")).await.unwrap();
        create(tx.as_mut(), bob, input("Bob's", "b")).await.unwrap();
        create(tx.as_mut(), alice, input("Second", "c")).await.unwrap();

        let titles: Vec<String> = list(tx.as_mut(), alice)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn get_by_param_resolves_id_and_title() {
        let (store, alice, bob) = two_users().await;
        let mut tx = store.begin().await.unwrap();
        let article = create(tx.as_mut(), alice, input("MyTitle", "body")).await.unwrap();

        let by_id = get_by_param(tx.as_mut(), alice, &article.id.to_string()).await.unwrap();
        assert_eq!(by_id, article);
        let by_title = get_by_param(tx.as_mut(), alice, "MyTitle").await.unwrap();
        assert_eq!(by_title, article);

        let err = get_by_param(tx.as_mut(), alice, "Missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        // Other users see nothing, by id or by title
        let err = get_by_param(tx.as_mut(), bob, &article.id.to_string()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = get_by_param(tx.as_mut(), bob, "MyTitle").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn numeric_title_is_unreachable_by_param() {
        let (store, alice, _) = two_users().await;
        let mut tx = store.begin().await.unwrap();
        create(tx.as_mut(), alice, input("2024", "body")).await.unwrap();

        let err = get_by_param(tx.as_mut(), alice, "2024").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_keeps_absent_fields() {
        let (store, alice, _) = two_users().await;
        let mut tx = store.begin().await.unwrap();
        let article = create(tx.as_mut(), alice, input("Hi", "body")).await.unwrap();

        let changes = ArticleUpdate {
            title: None,
            content: Some("new body".to_string()),
        };
        let updated = update(tx.as_mut(), alice, article.id, changes).await.unwrap();
        assert_eq!(updated.title, "Hi");
        assert_eq!(updated.content, "new body");

        let unchanged = update(tx.as_mut(), alice, article.id, ArticleUpdate::default()).await.unwrap();
        assert_eq!(unchanged, updated);
    }

    #[tokio::test]
    async fn patch_overwrites_only_present_fields() {
        let (store, alice, _) = two_users().await;
        let mut tx = store.begin().await.unwrap();
        let article = create(tx.as_mut(), alice, input("Hi", "body")).await.unwrap();

        let changes: ArticlePatch = serde_json::from_str(r#"{"content": "patched"}"#).unwrap();
        let patched = patch(tx.as_mut(), alice, article.id, changes).await.unwrap();
        assert_eq!(patched.title, "Hi");
        assert_eq!(patched.content, "patched");

        let stored = get_by_param(tx.as_mut(), alice, "Hi").await.unwrap();
        assert_eq!(stored, patched);
    }

    #[tokio::test]
    async fn patch_rejects_explicit_null() {
        let (store, alice, _) = two_users().await;
        let mut tx = store.begin().await.unwrap();
        let article = create(tx.as_mut(), alice, input("Hi", "body")).await.unwrap();

        let changes: ArticlePatch = serde_json::from_str(r#"{"title": null}"#).unwrap();
        assert_eq!(changes.title, Some(None));
        let err = patch(tx.as_mut(), alice, article.id, changes).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn update_treats_null_as_absent() {
        let changes: ArticleUpdate = serde_json::from_str(r#"{"title": null, "content": "x"}"#).unwrap();
        assert_eq!(changes.title, None);
        assert_eq!(changes.content.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn writes_check_existence_before_ownership() {
        let (store, alice, bob) = two_users().await;
        let mut tx = store.begin().await.unwrap();
        let article = create(tx.as_mut(), alice, input("Hi", "body")).await.unwrap();

        let err = update(tx.as_mut(), bob, article.id, ArticleUpdate::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));
        let err = patch(tx.as_mut(), bob, article.id, ArticlePatch::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));
        let err = delete(tx.as_mut(), bob, article.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));

        for err in [
            update(tx.as_mut(), bob, 999, ArticleUpdate::default()).await.unwrap_err(),
            patch(tx.as_mut(), bob, 999, ArticlePatch::default()).await.unwrap_err(),
            delete(tx.as_mut(), bob, 999).await.unwrap_err(),
        ] {
            assert!(matches!(err, ServiceError::NotFound(_)));
        }

        // Alice's article survived Bob's attempts
        assert_eq!(get_by_param(tx.as_mut(), alice, "Hi").await.unwrap(), article);
    }

    #[tokio::test]
    async fn delete_removes_article() {
        let (store, alice, _) = two_users().await;
        let mut tx = store.begin().await.unwrap();
        let article = create(tx.as_mut(), alice, input("Hi", "body")).await.unwrap();

        delete(tx.as_mut(), alice, article.id).await.unwrap();
        assert!(list(tx.as_mut(), alice).await.unwrap().is_empty());
        let err = delete(tx.as_mut(), alice, article.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
