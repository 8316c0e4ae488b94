// db/cache.rs
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// Plans are reference data; they change only through the seed/cleanup scripts.
pub const PLAN_CACHE_TTL: usize = 3600;

pub struct CacheHelper;

impl CacheHelper {
    pub fn plans_key(user_type: &str) -> String {
        format!("plans:{}", user_type)
    }

    pub async fn get<T: DeserializeOwned>(
        redis: &Arc<ConnectionManager>,
        key: &str,
    ) -> Result<Option<T>, redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        let cached: Option<String> = conn.get(key).await?;

        match cached {
            Some(data) => match serde_json::from_str::<T>(&data) {
                Ok(value) => {
                    tracing::debug!("Cache HIT: {}", key);
                    Ok(Some(value))
                }
                Err(_) => {
                    tracing::warn!("Cache deserialization failed for: {}", key);
                    Ok(None)
                }
            },
            None => {
                tracing::debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    pub async fn set<T: Serialize>(
        redis: &Arc<ConnectionManager>,
        key: &str,
        value: &T,
        ttl_seconds: usize,
    ) -> Result<(), redis::RedisError> {
        if let Ok(json) = serde_json::to_string(value) {
            let mut conn = ConnectionManager::clone(redis);
            let _: () = conn.set_ex(key, json, ttl_seconds).await?;
            tracing::debug!("Cache SET: {} (TTL: {}s)", key, ttl_seconds);
        }
        Ok(())
    }

    /// Delete keys matching a pattern with SCAN so Redis is never blocked.
    pub async fn delete_pattern(
        redis: &Arc<ConnectionManager>,
        pattern: &str,
    ) -> Result<usize, redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        let mut cursor: u64 = 0;
        let mut deleted_count = 0;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                deleted_count += keys.len();
                let _: () = conn.del(&keys).await?;
            }

            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        tracing::debug!("Cache DELETE pattern: {} ({} keys)", pattern, deleted_count);
        Ok(deleted_count)
    }

    pub async fn invalidate_plans(redis: &Arc<ConnectionManager>) -> Result<(), redis::RedisError> {
        Self::delete_pattern(redis, "plans:*").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_keys_are_namespaced() {
        assert_eq!(CacheHelper::plans_key("brand"), "plans:brand");
        assert_eq!(CacheHelper::plans_key("all"), "plans:all");
    }
}
