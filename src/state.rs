use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::services::CredentialService;

/// Shared per-process handles, cloned into every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub credentials: Arc<CredentialService>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let credentials = CredentialService::from_config(&config.security);
        Self {
            config: Arc::new(config),
            store,
            credentials: Arc::new(credentials),
        }
    }
}
