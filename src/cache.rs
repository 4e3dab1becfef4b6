//! Best-effort Redis cache for expensive aggregations.
//!
//! Cost Explorer queries are slow and billed per call, so tag-cost responses
//! are cached under a key derived from the query. The cache never gates a
//! request: a miss or a Redis failure falls through to the live computation,
//! and write failures are logged and dropped.

use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::CacheSettings;

#[derive(Clone)]
pub struct Cache {
    client: redis::Client,
    prefix: String,
    ttl_secs: u64,
}

impl Cache {
    pub fn new(settings: &CacheSettings) -> Result<Self, redis::RedisError> {
        Ok(Self {
            client: redis::Client::open(settings.redis_url.as_str())?,
            prefix: "devcost".to_string(),
            ttl_secs: settings.ttl_secs,
        })
    }

    fn key(&self, name: &str) -> String {
        format!("{}:{name}", self.prefix)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    /// Look up a cached value. Any failure reads as a miss.
    pub async fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let key = self.key(name);
        let raw: Option<String> = match self.connection().await {
            Ok(mut conn) => match conn.get(&key).await {
                Ok(v) => v,
                Err(e) => {
                    warn!("cache read failed for {key}: {e}");
                    return None;
                }
            },
            Err(e) => {
                warn!("cache connection failed: {e}");
                return None;
            }
        };
        let raw = raw?;
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("cache hit for {key}");
                Some(value)
            }
            Err(e) => {
                warn!("cache entry for {key} is not valid JSON, ignoring: {e}");
                None
            }
        }
    }

    /// Store a value with the configured TTL. Failures are logged and dropped.
    pub async fn put<T: Serialize>(&self, name: &str, value: &T) {
        let key = self.key(name);
        let raw = match serde_json::to_string(value) {
            Ok(r) => r,
            Err(e) => {
                warn!("cache serialization failed for {key}: {e}");
                return;
            }
        };
        match self.connection().await {
            Ok(mut conn) => {
                if let Err(e) = conn.set_ex::<_, _, ()>(&key, raw, self.ttl_secs).await {
                    warn!("cache write failed for {key}: {e}");
                }
            }
            Err(e) => warn!("cache connection failed: {e}"),
        }
    }
}
