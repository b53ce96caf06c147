use std::sync::Arc;

use tracing::info;

use crate::errors::ServiceError;
use crate::keys;
use crate::storage::KvStore;

/// Admin API keys kept as `user -> api_key` in the `admin:apikeys` hash.
#[derive(Clone)]
pub struct ApiKeyService {
    store: Arc<dyn KvStore>,
}

impl ApiKeyService {
    pub fn new(store: Arc<dyn KvStore>) -> Self { Self { store } }

    /// `(user, api_key)` pairs sorted by user.
    pub async fn list(&self) -> Result<Vec<(String, String)>, ServiceError> {
        let mut pairs: Vec<(String, String)> = self.store.hgetall(keys::ADMIN_API_KEYS).await?.into_iter().collect();
        pairs.sort();
        Ok(pairs)
    }

    /// Upsert the key for a user.
    pub async fn set(&self, user: &str, api_key: &str) -> Result<(), ServiceError> {
        let (user, api_key) = (user.trim(), api_key.trim());
        if user.is_empty() || api_key.is_empty() {
            return Err(ServiceError::Validation("user and api_key are required".into()));
        }
        self.store
            .hset(keys::ADMIN_API_KEYS, &[(user.to_string(), api_key.to_string())])
            .await?;
        info!(%user, "admin api key set");
        Ok(())
    }

    /// Whether an entry existed.
    pub async fn delete(&self, user: &str) -> Result<bool, ServiceError> {
        let existed = self.store.hdel(keys::ADMIN_API_KEYS, &[user.to_string()]).await? > 0;
        if existed {
            info!(%user, "admin api key removed");
        }
        Ok(existed)
    }

    pub async fn is_valid(&self, api_key: &str) -> Result<bool, ServiceError> {
        if api_key.is_empty() {
            return Ok(false);
        }
        Ok(self.store.hgetall(keys::ADMIN_API_KEYS).await?.values().any(|v| v == api_key))
    }
}
