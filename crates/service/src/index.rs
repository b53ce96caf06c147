//! Secondary-index membership helpers.
//!
//! Index sets are denormalized and historically some were written with the
//! wrong value type, so removal tolerates `WRONGTYPE` and only logs it.

use tracing::warn;

use crate::errors::ServiceError;
use crate::storage::{one, KvError, KvStore};

/// Add `id` to the set at `key`; returns whether it was newly added.
pub async fn attach(store: &dyn KvStore, key: &str, id: &str) -> Result<bool, ServiceError> {
    Ok(store.sadd(key, &one(id)).await? > 0)
}

/// Remove `id` from the set at `key`; returns whether it was a member.
pub async fn detach(store: &dyn KvStore, key: &str, id: &str) -> Result<bool, ServiceError> {
    match store.srem(key, &one(id)).await {
        Ok(n) => Ok(n > 0),
        Err(KvError::WrongType { key }) => {
            warn!(%key, business_id = %id, "index key holds a non-set value; skipping");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Set members, empty when the key holds another value kind.
pub async fn members(store: &dyn KvStore, key: &str) -> Result<Vec<String>, ServiceError> {
    match store.smembers(key).await {
        Ok(m) => Ok(m),
        Err(KvError::WrongType { key }) => {
            warn!(%key, "index key holds a non-set value; treating as empty");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Read a string value, `None` when missing or of another kind.
pub async fn get_lenient(store: &dyn KvStore, key: &str) -> Result<Option<String>, ServiceError> {
    match store.get(key).await {
        Ok(v) => Ok(v),
        Err(KvError::WrongType { key }) => {
            warn!(%key, "expected a string value; ignoring");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn detach_tolerates_wrong_type() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        store.set("category:Pet Care:businesses", "[\"b1\"]").await?;
        assert!(!detach(store.as_ref(), "category:Pet Care:businesses", "b1").await?);
        assert!(members(store.as_ref(), "category:Pet Care:businesses").await?.is_empty());

        assert!(attach(store.as_ref(), "s", "b1").await?);
        assert!(!attach(store.as_ref(), "s", "b1").await?);
        assert!(detach(store.as_ref(), "s", "b1").await?);
        assert_eq!(get_lenient(store.as_ref(), "s").await?, None);
        Ok(())
    }
}
