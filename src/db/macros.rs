/// Read-through caching for TMDB metadata lookups.
///
/// Checks the cache for `$key`; on a miss, runs `$block` to fetch the
/// value, schedules a background write with the given TTL, and returns it.
/// Cache reads are best-effort, so a failed read only means the block runs.
///
/// # Arguments
/// * `$cache`: A [`crate::db::Cache`].
/// * `$key`: The [`crate::db::CacheKey`] for the value.
/// * `$ttl`: Time-to-live for the cached value in seconds.
/// * `$block`: Async block computing the value on a miss.
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache.get(&$key).await {
            Some(cached) => Ok(cached),
            None => {
                let value = $block.await?;
                $cache.put_in_background(&$key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
