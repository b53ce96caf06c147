//! # Redis
//!
//! Production backend. All commands go through a `ConnectionManager`, which
//! multiplexes one connection and reconnects on failure. `keys` walks `SCAN`
//! cursors instead of issuing a blocking `KEYS`.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use tracing::info;

use super::{KeyKind, KvError, KvStore};

const SCAN_BATCH: usize = 500;

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

fn map_err(key: &str, e: RedisError) -> KvError {
    if e.code() == Some("WRONGTYPE") {
        KvError::wrong_type(key)
    } else {
        KvError::Backend(e.to_string())
    }
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, KvError> {
        let client = Client::open(redis_url).map_err(|e| KvError::Backend(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| KvError::Backend(e.to_string()))?;
        info!(event = "redis_connected", "connected to redis");
        Ok(Self { conn })
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut conn = self.conn();
        conn.get(key).await.map_err(|e| map_err(key, e))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut conn = self.conn();
        conn.set(key, value).await.map_err(|e| map_err(key, e))
    }

    async fn del(&self, keys: &[String]) -> Result<u64, KvError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn();
        conn.del(keys).await.map_err(|e| map_err(&keys[0], e))
    }

    async fn exists(&self, key: &str) -> Result<bool, KvError> {
        let mut conn = self.conn();
        conn.exists(key).await.map_err(|e| map_err(key, e))
    }

    async fn kind(&self, key: &str) -> Result<Option<KeyKind>, KvError> {
        let mut conn = self.conn();
        let kind: String = redis::cmd("TYPE")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| map_err(key, e))?;
        Ok(match kind.as_str() {
            "string" => Some(KeyKind::String),
            "set" => Some(KeyKind::Set),
            "hash" => Some(KeyKind::Hash),
            "none" => None,
            other => return Err(KvError::Backend(format!("unsupported value type {other:?} at {key:?}"))),
        })
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<u64, KvError> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn();
        conn.sadd(key, members).await.map_err(|e| map_err(key, e))
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<u64, KvError> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn();
        conn.srem(key, members).await.map_err(|e| map_err(key, e))
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, KvError> {
        let mut conn = self.conn();
        conn.smembers(key).await.map_err(|e| map_err(key, e))
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, KvError> {
        let mut conn = self.conn();
        conn.sismember(key, member).await.map_err(|e| map_err(key, e))
    }

    async fn scard(&self, key: &str) -> Result<u64, KvError> {
        let mut conn = self.conn();
        conn.scard(key).await.map_err(|e| map_err(key, e))
    }

    async fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<u64, KvError> {
        if fields.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn();
        redis::cmd("HSET")
            .arg(key)
            .arg(fields)
            .query_async(&mut conn)
            .await
            .map_err(|e| map_err(key, e))
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, KvError> {
        let mut conn = self.conn();
        conn.hgetall(key).await.map_err(|e| map_err(key, e))
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> Result<u64, KvError> {
        if fields.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn();
        conn.hdel(key, fields).await.map_err(|e| map_err(key, e))
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64, KvError> {
        let mut conn = self.conn();
        conn.hincr(key, field, delta).await.map_err(|e| map_err(key, e))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        let mut conn = self.conn();
        let mut cursor: u64 = 0;
        let mut out = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| map_err(pattern, e))?;
            out.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        out.sort();
        out.dedup();
        Ok(out)
    }

    fn backend_name(&self) -> &'static str { "redis" }
}
