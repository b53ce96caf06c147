//! Key-value storage abstraction for the service layer
//!
//! Every service talks to a `KvStore` trait object. Two implementations exist:
//! an in-process store with an optional JSON snapshot file, and Redis.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

pub mod memory_store;
pub mod redis_store;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KvError {
    #[error("WRONGTYPE operation against key {key:?} holding the wrong kind of value")]
    WrongType { key: String },
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl KvError {
    pub fn wrong_type(key: &str) -> Self { Self::WrongType { key: key.to_string() } }
}

/// Value kind held at a key, as reported by Redis `TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    String,
    Set,
    Hash,
}

/// Redis-compatible string, set and hash operations.
///
/// Reads of a missing key yield `None` or an empty collection. Deleting a missing
/// key is not an error. Operating on a key holding another kind fails with
/// `KvError::WrongType`.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), KvError>;
    /// Returns how many of `keys` existed.
    async fn del(&self, keys: &[String]) -> Result<u64, KvError>;
    async fn exists(&self, key: &str) -> Result<bool, KvError>;
    async fn kind(&self, key: &str) -> Result<Option<KeyKind>, KvError>;

    /// Returns how many members were newly added.
    async fn sadd(&self, key: &str, members: &[String]) -> Result<u64, KvError>;
    async fn srem(&self, key: &str, members: &[String]) -> Result<u64, KvError>;
    async fn smembers(&self, key: &str) -> Result<Vec<String>, KvError>;
    async fn sismember(&self, key: &str, member: &str) -> Result<bool, KvError>;
    async fn scard(&self, key: &str) -> Result<u64, KvError>;

    /// Returns how many fields were newly created.
    async fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<u64, KvError>;
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, KvError>;
    async fn hdel(&self, key: &str, fields: &[String]) -> Result<u64, KvError>;
    /// Adds `delta` to an integer field (missing counts as 0); returns the new value.
    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64, KvError>;

    /// Keys matching a Redis glob (`*`, `?`), in no particular order.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError>;

    /// Short backend name for health output.
    fn backend_name(&self) -> &'static str;
}

/// Convenience for single-member set calls.
pub fn one(member: &str) -> [String; 1] {
    [member.to_string()]
}

/// Redis glob match supporting `*`, `?` and `\` escapes.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while ti < t.len() {
        if pi < p.len() {
            match p[pi] {
                '*' => {
                    star = Some((pi, ti));
                    pi += 1;
                    continue;
                }
                '?' => {
                    pi += 1;
                    ti += 1;
                    continue;
                }
                '\\' if pi + 1 < p.len() && p[pi + 1] == t[ti] => {
                    pi += 2;
                    ti += 1;
                    continue;
                }
                c if c != '\\' && c == t[ti] => {
                    pi += 1;
                    ti += 1;
                    continue;
                }
                _ => {}
            }
        }
        match star {
            Some((sp, st)) => {
                pi = sp + 1;
                ti = st + 1;
                star = Some((sp, st + 1));
            }
            None => return false,
        }
    }
    p[pi..].iter().all(|c| *c == '*')
}
