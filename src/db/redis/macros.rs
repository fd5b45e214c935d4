/// Read-through caching around an async computation.
///
/// Looks `$key` up in `$cache`; on a hit the cached value is returned. On a
/// miss, or when Redis cannot be reached, `$compute` is awaited and its value
/// queued for a background write with `$ttl` seconds to live. Cache failures
/// never fail the request, only the computation's own errors propagate.
///
/// ```rust,ignore
/// let similar = cached!(cache, key, ttl, self.compute(item_id));
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $compute:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Ok(Some(hit)) => {
                tracing::debug!(key = %$key, "Cache hit");
                Ok(hit)
            }
            outcome => {
                if let Err(e) = outcome {
                    tracing::warn!(error = %e, key = %$key, "Cache read failed, computing");
                }
                let value = $compute.await?;
                $cache.set_in_background(&$key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
