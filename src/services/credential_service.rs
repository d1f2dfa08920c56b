use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{required, Caller, ServiceError, ServiceResult};
use crate::auth::password::{hash_password, verify_password, MAX_PASSWORD_BYTES};
use crate::auth::TokenKeys;
use crate::config::SecurityConfig;
use crate::database::{NewUser, Store, StoreError, User};

/// Matches the users.username column width
pub const MAX_USERNAME_LEN: usize = 100;

/// Body of both `/register` and `/login`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    fn into_required(self) -> ServiceResult<(String, String)> {
        match (required(self.username), required(self.password)) {
            (Some(username), Some(password)) => Ok((username, password)),
            _ => Err(ServiceError::Validation("Username and password required".to_string())),
        }
    }
}

/// Owns user identities and issues tokens for them.
///
/// bcrypt work always happens outside a store transaction, so a slow hash
/// never holds a connection or the memory store's lock.
pub struct CredentialService {
    tokens: TokenKeys,
    bcrypt_cost: u32,
    /// Verified against on unknown usernames so both login failures cost one bcrypt run
    dummy_hash: OnceCell<String>,
}

impl CredentialService {
    pub fn new(tokens: TokenKeys, bcrypt_cost: u32) -> Self {
        Self {
            tokens,
            bcrypt_cost,
            dummy_hash: OnceCell::new(),
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(TokenKeys::from_config(security), security.bcrypt_cost)
    }

    /// Create a user with a bcrypt-hashed password
    pub async fn register(&self, store: &dyn Store, credentials: Credentials) -> ServiceResult<User> {
        let (username, password) = credentials.into_required()?;

        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(ServiceError::Validation(format!(
                "Username must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(ServiceError::Validation(format!(
                "Password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;

        let mut tx = store.begin().await?;
        let user = tx
            .insert_user(NewUser { username, password_hash })
            .await
            .map_err(|err| match err {
                StoreError::UniqueViolation(_) => ServiceError::Conflict("Username already exists".to_string()),
                other => other.into(),
            })?;
        tx.commit().await?;

        info!("Registered user '{}' (ID: {})", user.username, user.id);
        Ok(user)
    }

    /// Check credentials and return a signed token for the user
    pub async fn login(&self, store: &dyn Store, credentials: Credentials) -> ServiceResult<String> {
        let (username, password) = credentials.into_required()?;

        // Read-only lookup; the transaction is rolled back before bcrypt runs
        let mut tx = store.begin().await?;
        let user = tx.find_user_by_username(&username).await?;
        drop(tx);

        let Some(user) = user else {
            verify_password(password, self.dummy_hash().await?.clone()).await?;
            warn!("Login failed: unknown user '{}'", username);
            return Err(invalid_credentials());
        };

        if !verify_password(password, user.password_hash.clone()).await? {
            warn!("Login failed: wrong password for user '{}'", username);
            return Err(invalid_credentials());
        }

        let token = self.tokens.issue(user.id)?;
        info!("User '{}' (ID: {}) logged in", user.username, user.id);
        Ok(token)
    }

    /// Resolve a bearer token to the calling user
    pub fn verify(&self, token: &str) -> ServiceResult<Caller> {
        let claims = self
            .tokens
            .verify(token)
            .map_err(|e| ServiceError::Authentication(e.to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|e| ServiceError::Authentication(e.to_string()))?;

        Ok(Caller { user_id })
    }

    async fn dummy_hash(&self) -> ServiceResult<&String> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| hash_password("not-a-real-password".to_string(), self.bcrypt_cost))
            .await?;
        Ok(hash)
    }
}

fn invalid_credentials() -> ServiceError {
    ServiceError::Authentication("Invalid credentials".to_string())
}
