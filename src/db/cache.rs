use std::fmt::Display;

use redis::{AsyncCommands, Client};

use crate::models::MediaType;

/// Keys for the TMDB metadata cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Title(MediaType, i64),
    Videos(MediaType, i64),
    Search(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Title(media_type, tmdb_id) => write!(f, "title:{}:{}", media_type, tmdb_id),
            CacheKey::Videos(media_type, tmdb_id) => {
                write!(f, "videos:{}:{}", media_type, tmdb_id)
            }
            CacheKey::Search(query) => write!(f, "search:{}", query.to_lowercase()),
        }
    }
}

/// Creates a Redis client for the metadata cache
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Best-effort cache for short-lived TMDB metadata.
///
/// Reads and writes never surface errors to callers: a failed Redis
/// operation is logged and treated as a miss, so losing the cache degrades
/// latency without taking requests down with it.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
}

impl Cache {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    /// Retrieves and deserializes a cached value, treating every failure
    /// (connection, lookup, corrupt entry) as a miss.
    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let mut conn = match self.redis_client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "Cache unavailable, treating as miss");
                return None;
            }
        };

        let cached: Option<String> = match conn.get(format!("{}", key)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        let json = cached?;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache entry corrupt, treating as miss");
                None
            }
        }
    }

    /// Serializes and stores a value without blocking the caller.
    ///
    /// The Redis write happens on a spawned task; failures are logged and
    /// dropped.
    pub fn put_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let client = self.redis_client.clone();
        let key = format!("{}", key);
        tokio::spawn(async move {
            let result: Result<(), redis::RedisError> = async {
                let mut conn = client.get_multiplexed_async_connection().await?;
                let _: () = conn.set_ex(&key, json, ttl).await?;
                Ok(())
            }
            .await;

            if let Err(e) = result {
                tracing::warn!(key = %key, error = %e, "Cache write failed");
            }
        });
    }
}
