use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::models::{Article, ArticleSummary, NewArticle, NewUser, User};
use super::{Store, StoreError, Transaction};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    articles: BTreeMap<i64, Article>,
    last_user_id: i64,
    last_article_id: i64,
}

/// In-process store with the same constraints as the PostgreSQL schema.
///
/// A transaction holds the table lock until it is committed or dropped, so
/// transactions are fully serialized. Writes go to a private copy that only
/// replaces the shared tables on commit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .working
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        if self.working.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation(format!(
                "users.username '{}' already exists",
                user.username
            )));
        }

        self.working.last_user_id += 1;
        let user = User {
            id: self.working.last_user_id,
            username: user.username,
            password_hash: user.password_hash,
        };
        self.working.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn insert_article(&mut self, article: NewArticle) -> Result<Article, StoreError> {
        if !self.working.users.contains_key(&article.author_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "articles.author_id {} does not reference a user",
                article.author_id
            )));
        }

        self.working.last_article_id += 1;
        let article = Article {
            id: self.working.last_article_id,
            title: article.title,
            content: article.content,
            author_id: article.author_id,
        };
        self.working.articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn list_articles_by_author(&mut self, author_id: i64) -> Result<Vec<ArticleSummary>, StoreError> {
        Ok(self
            .working
            .articles
            .values()
            .filter(|article| article.author_id == author_id)
            .map(ArticleSummary::from)
            .collect())
    }

    async fn find_article_for_update(&mut self, id: i64) -> Result<Option<Article>, StoreError> {
        Ok(self.working.articles.get(&id).cloned())
    }

    async fn find_article_by_id_and_author(
        &mut self,
        id: i64,
        author_id: i64,
    ) -> Result<Option<Article>, StoreError> {
        Ok(self
            .working
            .articles
            .get(&id)
            .filter(|article| article.author_id == author_id)
            .cloned())
    }

    async fn find_article_by_title_and_author(
        &mut self,
        title: &str,
        author_id: i64,
    ) -> Result<Option<Article>, StoreError> {
        Ok(self
            .working
            .articles
            .values()
            .find(|article| article.author_id == author_id && article.title == title)
            .cloned())
    }

    async fn update_article(&mut self, article: &Article) -> Result<(), StoreError> {
        if let Some(stored) = self.working.articles.get_mut(&article.id) {
            stored.title = article.title.clone();
            stored.content = article.content.clone();
        }
        Ok(())
    }

    async fn delete_article(&mut self, id: i64) -> Result<(), StoreError> {
        self.working.articles.remove(&id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn new_article(title: &str, author_id: i64) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            content: "content".to_string(),
            author_id,
        }
    }

    #[tokio::test]
    async fn committed_writes_are_visible_to_later_transactions() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let user = tx.insert_user(new_user("alice")).await.unwrap();
        assert_eq!(user.id, 1);
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let found = tx.find_user_by_username("alice").await.unwrap();
        assert_eq!(found, Some(user));
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = MemoryStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_user(new_user("alice")).await.unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_user_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn username_is_unique() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_user(new_user("alice")).await.unwrap();

        let err = tx.insert_user(new_user("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn article_author_must_exist() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        let err = tx.insert_article(new_article("Hi", 42)).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn lookups_are_scoped_to_author() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let alice = tx.insert_user(new_user("alice")).await.unwrap();
        let bob = tx.insert_user(new_user("bob")).await.unwrap();
        let first = tx.insert_article(new_article("Hi", alice.id)).await.unwrap();
        tx.insert_article(new_article("Hi", alice.id)).await.unwrap();
        tx.insert_article(new_article("Other", bob.id)).await.unwrap();

        let listed = tx.list_articles_by_author(alice.id).await.unwrap();
        assert_eq!(listed.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);

        assert!(tx.find_article_by_id_and_author(first.id, bob.id).await.unwrap().is_none());
        assert_eq!(
            tx.find_article_by_title_and_author("Hi", alice.id).await.unwrap(),
            Some(first)
        );
        assert!(tx.find_article_by_title_and_author("Hi", bob.id).await.unwrap().is_none());
    }
}
