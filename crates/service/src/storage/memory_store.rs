use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::PathBuf,
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::RwLock};
use tracing::warn;

use super::{glob_match, KeyKind, KvError, KvStore};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
enum Entry {
    String(String),
    Set(BTreeSet<String>),
    Hash(BTreeMap<String, String>),
}

impl Entry {
    fn kind(&self) -> KeyKind {
        match self {
            Entry::String(_) => KeyKind::String,
            Entry::Set(_) => KeyKind::Set,
            Entry::Hash(_) => KeyKind::Hash,
        }
    }
}

/// In-process key-value store with Redis value semantics.
///
/// With a snapshot path, every write is persisted to a JSON file which is
/// reloaded on startup; used for local development and tests without Redis.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
    file_path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Load from the snapshot file, creating it with an empty map if missing.
    pub async fn with_snapshot<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, KvError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<String, Entry> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %file_path.display(), error = %e, "unreadable store snapshot; starting empty");
                HashMap::new()
            }),
            Err(_) => {
                let empty: HashMap<String, Entry> = HashMap::new();
                fs::write(&file_path, serde_json::to_vec(&empty).map_err(|e| KvError::Serialization(e.to_string()))?)
                    .await
                    .map_err(|e| KvError::Backend(e.to_string()))?;
                empty
            }
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path: Some(file_path) }))
    }

    async fn save(&self) -> Result<(), KvError> {
        let Some(path) = &self.file_path else { return Ok(()) };
        let map = self.inner.read().await;
        let data = serde_json::to_vec(&*map).map_err(|e| KvError::Serialization(e.to_string()))?;
        drop(map);
        fs::write(path, data).await.map_err(|e| KvError::Backend(e.to_string()))?;
        Ok(())
    }

    /// Apply a mutation under the write lock and persist when it changed anything.
    async fn update_map<T, F>(&self, f: F) -> Result<T, KvError>
    where
        F: FnOnce(&mut HashMap<String, Entry>) -> Result<(T, bool), KvError>,
    {
        let mut map = self.inner.write().await;
        let (out, changed) = f(&mut map)?;
        drop(map);
        if changed {
            self.save().await?;
        }
        Ok(out)
    }

    async fn read_set(&self, key: &str) -> Result<BTreeSet<String>, KvError> {
        let map = self.inner.read().await;
        match map.get(key) {
            None => Ok(BTreeSet::new()),
            Some(Entry::Set(s)) => Ok(s.clone()),
            Some(_) => Err(KvError::wrong_type(key)),
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let map = self.inner.read().await;
        match map.get(key) {
            None => Ok(None),
            Some(Entry::String(v)) => Ok(Some(v.clone())),
            Some(_) => Err(KvError::wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.update_map(|m| {
            m.insert(key.to_string(), Entry::String(value.to_string()));
            Ok(((), true))
        })
        .await
    }

    async fn del(&self, keys: &[String]) -> Result<u64, KvError> {
        self.update_map(|m| {
            let removed = keys.iter().filter(|k| m.remove(k.as_str()).is_some()).count() as u64;
            Ok((removed, removed > 0))
        })
        .await
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64, KvError> {
        self.update_map(|m| {
            let entry = m.entry(key.to_string()).or_insert_with(|| Entry::Hash(BTreeMap::new()));
            let Entry::Hash(hash) = entry else { return Err(KvError::wrong_type(key)) };
            let current = match hash.get(field) {
                None => 0,
                Some(raw) => raw
                    .parse::<i64>()
                    .map_err(|_| KvError::Backend(format!("hash field {field:?} of {key:?} is not an integer")))?,
            };
            let next = current
                .checked_add(delta)
                .ok_or_else(|| KvError::Backend(format!("increment of {key:?} field {field:?} overflows")))?;
            hash.insert(field.to_string(), next.to_string());
            Ok((next, true))
        })
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool, KvError> {
        Ok(self.inner.read().await.contains_key(key))
    }

    async fn kind(&self, key: &str) -> Result<Option<KeyKind>, KvError> {
        Ok(self.inner.read().await.get(key).map(Entry::kind))
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<u64, KvError> {
        if members.is_empty() {
            return Ok(0);
        }
        self.update_map(|m| {
            let entry = m.entry(key.to_string()).or_insert_with(|| Entry::Set(BTreeSet::new()));
            let Entry::Set(set) = entry else { return Err(KvError::wrong_type(key)) };
            let added = members.iter().filter(|mb| set.insert((*mb).clone())).count() as u64;
            Ok((added, added > 0))
        })
        .await
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<u64, KvError> {
        self.update_map(|m| {
            let removed = match m.get_mut(key) {
                None => return Ok((0, false)),
                Some(Entry::Set(set)) => {
                    let n = members.iter().filter(|mb| set.remove(mb.as_str())).count() as u64;
                    if set.is_empty() {
                        m.remove(key);
                    }
                    n
                }
                Some(_) => return Err(KvError::wrong_type(key)),
            };
            Ok((removed, removed > 0))
        })
        .await
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, KvError> {
        Ok(self.read_set(key).await?.into_iter().collect())
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, KvError> {
        Ok(self.read_set(key).await?.contains(member))
    }

    async fn scard(&self, key: &str) -> Result<u64, KvError> {
        Ok(self.read_set(key).await?.len() as u64)
    }

    async fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<u64, KvError> {
        if fields.is_empty() {
            return Ok(0);
        }
        self.update_map(|m| {
            let entry = m.entry(key.to_string()).or_insert_with(|| Entry::Hash(BTreeMap::new()));
            let Entry::Hash(hash) = entry else { return Err(KvError::wrong_type(key)) };
            let created = fields
                .iter()
                .filter(|(f, v)| hash.insert(f.clone(), v.clone()).is_none())
                .count() as u64;
            Ok((created, true))
        })
        .await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, KvError> {
        let map = self.inner.read().await;
        match map.get(key) {
            None => Ok(HashMap::new()),
            Some(Entry::Hash(h)) => Ok(h.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            Some(_) => Err(KvError::wrong_type(key)),
        }
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> Result<u64, KvError> {
        self.update_map(|m| {
            let removed = match m.get_mut(key) {
                None => return Ok((0, false)),
                Some(Entry::Hash(hash)) => {
                    let n = fields.iter().filter(|f| hash.remove(f.as_str()).is_some()).count() as u64;
                    if hash.is_empty() {
                        m.remove(key);
                    }
                    n
                }
                Some(_) => return Err(KvError::wrong_type(key)),
            };
            Ok((removed, removed > 0))
        })
        .await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        let map = self.inner.read().await;
        Ok(map.keys().filter(|k| glob_match(pattern, k)).cloned().collect())
    }

    fn backend_name(&self) -> &'static str { "memory" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::one;

    #[tokio::test]
    async fn empty_writes_create_nothing() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        assert_eq!(store.sadd("category:x", &[]).await?, 0);
        assert_eq!(store.hset("admin:apikeys", &[]).await?, 0);
        assert!(!store.exists("category:x").await?);
        assert_eq!(store.kind("category:x").await?, None);
        assert!(!store.exists("admin:apikeys").await?);
        Ok(())
    }

    #[tokio::test]
    async fn hash_counters_increment() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        assert_eq!(store.hincrby("analytics:b:events", "profile_view", 1).await?, 1);
        assert_eq!(store.hincrby("analytics:b:events", "profile_view", 2).await?, 3);
        assert_eq!(store.kind("analytics:b:events").await?, Some(KeyKind::Hash));
        store.hset("analytics:b:events", &[("label".into(), "x".into())]).await?;
        assert!(store.hincrby("analytics:b:events", "label", 1).await.is_err());
        store.set("plain", "1").await?;
        assert_eq!(store.hincrby("plain", "f", 1).await, Err(KvError::wrong_type("plain")));
        Ok(())
    }

    #[tokio::test]
    async fn strings_sets_and_hashes() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        store.set("business:1", "{}").await?;
        assert_eq!(store.get("business:1").await?.as_deref(), Some("{}"));
        assert_eq!(store.get("missing").await?, None);

        assert_eq!(store.sadd("businesses", &["1".into(), "2".into(), "1".into()]).await?, 2);
        assert_eq!(store.scard("businesses").await?, 2);
        assert!(store.sismember("businesses", "2").await?);
        assert_eq!(store.srem("businesses", &one("2")).await?, 1);
        assert_eq!(store.smembers("businesses").await?, vec!["1".to_string()]);

        assert_eq!(store.hset("h", &[("a".into(), "1".into())]).await?, 1);
        assert_eq!(store.hset("h", &[("a".into(), "2".into())]).await?, 0);
        assert_eq!(store.hgetall("h").await?.get("a").map(String::as_str), Some("2"));
        assert_eq!(store.kind("h").await?, Some(KeyKind::Hash));
        Ok(())
    }

    #[tokio::test]
    async fn wrong_type_is_reported() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        store.set("category:Pet Care", "[\"1\"]").await?;
        assert_eq!(
            store.smembers("category:Pet Care").await,
            Err(KvError::wrong_type("category:Pet Care"))
        );
        assert!(store.sadd("category:Pet Care", &one("1")).await.is_err());
        store.sadd("s", &one("x")).await?;
        assert!(store.get("s").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn emptied_set_disappears() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        store.sadd("s", &one("x")).await?;
        store.srem("s", &one("x")).await?;
        assert!(!store.exists("s").await?);
        assert_eq!(store.del(&["s".to_string(), "nope".to_string()]).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn keys_by_pattern() -> Result<(), anyhow::Error> {
        let store = MemoryStore::new();
        store.set("business:1", "{}").await?;
        store.set("business:1:pages", "{}").await?;
        store.sadd("category:a", &one("1")).await?;
        let mut keys = store.keys("business:*").await?;
        keys.sort();
        assert_eq!(keys, vec!["business:1", "business:1:pages"]);
        assert_eq!(store.keys("category:*").await?, vec!["category:a"]);
        Ok(())
    }

    #[tokio::test]
    async fn snapshot_persists_across_reloads() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("memory_store_{}.json", uuid::Uuid::new_v4()));
        let store = MemoryStore::with_snapshot(&tmp).await?;
        store.set("business:1", "{\"id\":\"1\"}").await?;
        store.sadd("businesses", &one("1")).await?;
        store.hset("admin:apikeys", &[("ops".into(), "k".into())]).await?;

        let reloaded = MemoryStore::with_snapshot(&tmp).await?;
        assert_eq!(reloaded.get("business:1").await?.as_deref(), Some("{\"id\":\"1\"}"));
        assert!(reloaded.sismember("businesses", "1").await?);
        assert_eq!(reloaded.hgetall("admin:apikeys").await?.len(), 1);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
