//! Key-value store used as both lock service and metadata cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Client};
use tokio::sync::Mutex;
use tracing::debug;

use mapdrop_common::{MapdropError, MapdropResult};

/// The handful of string commands the metadata cache relies on.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> MapdropResult<Option<String>>;

    /// Store `value` under `key` with no expiry.
    async fn set(&self, key: &str, value: &str) -> MapdropResult<()>;

    /// Atomically set `key` only if it does not exist, expiring after `ttl`.
    /// Returns whether the key was set.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> MapdropResult<bool>;

    /// Move `from` to `to`, replacing any value at `to`.
    async fn rename(&self, from: &str, to: &str) -> MapdropResult<()>;

    async fn delete(&self, key: &str) -> MapdropResult<()>;
}

fn cache_err(op: &str, e: redis::RedisError) -> MapdropError {
    MapdropError::Cache(format!("Redis {} failed: {}", op, e))
}

/// Redis-backed store over a multiplexed connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connect to Redis.
    pub async fn connect(redis_url: &str) -> MapdropResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| MapdropError::Cache(format!("Redis connection failed: {}", e)))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| MapdropError::Cache(format!("Redis connection failed: {}", e)))?;

        Ok(Self { conn })
    }

    pub fn from_connection(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> MapdropResult<Option<String>> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_err("GET", e))
    }

    async fn set(&self, key: &str, value: &str) -> MapdropResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_err("SET", e))
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> MapdropResult<bool> {
        let mut conn = self.conn.clone();
        // Nil reply when the key already exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_err("SET NX EX", e))?;
        Ok(reply.is_some())
    }

    async fn rename(&self, from: &str, to: &str) -> MapdropResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("RENAME")
            .arg(from)
            .arg(to)
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_err("RENAME", e))
    }

    async fn delete(&self, key: &str) -> MapdropResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_err("DEL", e))?;
        Ok(())
    }
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |t| now >= t)
    }
}

/// In-process store with the same semantics as [`RedisStore`].
///
/// Expired keys are dropped lazily on access. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> MapdropResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if entries.get(key).map_or(false, |e| e.is_expired(now)) {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> MapdropResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> MapdropResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if entries.get(key).map_or(false, |e| !e.is_expired(now)) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(true)
    }

    async fn rename(&self, from: &str, to: &str) -> MapdropResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.remove(from) {
            Some(entry) if !entry.is_expired(now) => {
                entries.insert(to.to_string(), entry);
                Ok(())
            }
            _ => {
                debug!(key = from, "Rename of missing key");
                Err(MapdropError::Cache(format!("no such key: {}", from)))
            }
        }
    }

    async fn delete(&self, key: &str) -> MapdropResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
