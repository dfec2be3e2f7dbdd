//! Response cache with pluggable eviction and key-derivation strategies
//! (spec §4.5).
//!
//! [`Cache`] is the in-process implementation, backed by a configurable
//! [`EvictionPolicy`]; it also implements [`CacheBackend`] so the executor
//! can be pointed at an out-of-process implementation (Redis, memcached)
//! without code changes (spec §6.2).

mod backend;
mod classify;
mod config;
mod events;
mod eviction;
mod key;
mod store;

pub use backend::CacheBackend;
pub use classify::ContentClass;
pub use config::{CacheConfig, CacheConfigBuilder};
pub use events::CacheEvent;
pub use eviction::EvictionPolicy;
pub use key::{default_eligibility, CacheKey, KeyStrategy};

use std::sync::Mutex;
use std::time::{Duration, Instant};

use switchboard_core::{Request, Response};

use store::CacheStore;

/// In-process response cache.
pub struct Cache {
    config: CacheConfig,
    store: Mutex<CacheStore<Response>>,
}

impl Cache {
    pub fn new(config: CacheConfig) -> Self {
        let store = Mutex::new(CacheStore::new(
            config.max_size,
            config.default_ttl,
            config.eviction_policy,
        ));
        Self { config, store }
    }

    pub fn len(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.store.lock().unwrap().clear();
    }
}

impl CacheBackend for Cache {
    fn get(&self, key: CacheKey) -> Option<Response> {
        let result = self.store.lock().unwrap().get(&key);
        let event = if result.is_some() {
            CacheEvent::Hit {
                timestamp: Instant::now(),
            }
        } else {
            CacheEvent::Miss {
                timestamp: Instant::now(),
            }
        };
        self.config.event_listeners.emit(&event);
        result.map(|(mut r, _hits)| {
            r.from_cache = true;
            r
        })
    }

    fn insert(&self, key: CacheKey, response: Response, ttl: Option<Duration>) {
        let multiplier = ContentClass::classify(&response).ttl_multiplier();
        let ttl = ttl.or_else(|| self.config.effective_ttl(multiplier));
        let evicted = self.store.lock().unwrap().insert(key, response, ttl);
        self.config.event_listeners.emit(&CacheEvent::Insert {
            timestamp: Instant::now(),
        });
        if evicted.is_some() {
            self.config.event_listeners.emit(&CacheEvent::Eviction {
                timestamp: Instant::now(),
            });
        }
    }

    fn key_for(&self, request: &Request, model_id: &str) -> CacheKey {
        self.config.key_strategy.derive(request, model_id)
    }

    fn is_eligible(&self, request: &Request) -> bool {
        (self.config.eligibility)(request)
    }
}
