/// Cache-aside helper.
///
/// Returns the cached value when present. Otherwise awaits `$block`, writes its
/// successful result back with the given TTL (seconds) and returns it. Errors
/// from `$block` are propagated with `?` and never cached.
///
/// # Example
/// ```rust,ignore
/// let results: Vec<Candidate> = cached!(cache, key, 600, async move {
///     compute_expensive_value().await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
