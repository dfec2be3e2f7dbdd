use std::time::Duration;

use switchboard_core::{Request, Response};

use crate::key::CacheKey;

/// A pluggable cache storage backend (spec §6.2).
///
/// The in-process [`crate::Cache`] is the default; implementing this trait
/// lets a deployment back the cache with something shared across processes
/// (Redis, memcached) without the executor knowing the difference.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: CacheKey) -> Option<Response>;
    /// Inserts `response` under `key`. `ttl` overrides the backend's own
    /// TTL computation (content-class and key-strategy scaling) when
    /// `Some`; pass `None` to let the backend derive it (spec §4.5).
    fn insert(&self, key: CacheKey, response: Response, ttl: Option<Duration>);
    fn key_for(&self, request: &Request, model_id: &str) -> CacheKey;
    fn is_eligible(&self, request: &Request) -> bool;
}
