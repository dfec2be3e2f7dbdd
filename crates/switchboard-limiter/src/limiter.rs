use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Semaphore;

use switchboard_core::SwitchboardError;

use crate::bucket::TokenBucket;
use crate::config::LimiterConfig;
use crate::error::LimiterError;
use crate::events::{Dimension, LimiterEvent};
use crate::reservation::Reservation;

#[derive(Clone, Copy)]
enum BucketKind {
    Requests,
    Tokens,
}

/// A dimension's pair of independent buckets (spec §4.4): one counts
/// requests, the other counts estimated token volume. Acquisition always
/// tries the request bucket first.
struct DimensionBuckets {
    requests: Mutex<TokenBucket>,
    tokens: Mutex<TokenBucket>,
}

impl DimensionBuckets {
    fn new(request_capacity: f64, request_rate: f64, token_capacity: f64, token_rate: f64) -> Self {
        Self {
            requests: Mutex::new(TokenBucket::new(request_capacity, request_rate)),
            tokens: Mutex::new(TokenBucket::new(token_capacity, token_rate)),
        }
    }

    fn bucket(&self, kind: BucketKind) -> &Mutex<TokenBucket> {
        match kind {
            BucketKind::Requests => &self.requests,
            BucketKind::Tokens => &self.tokens,
        }
    }
}

struct UserBucket {
    buckets: DimensionBuckets,
    last_used: Mutex<Instant>,
}

/// Multi-dimensional limiter: global, per-provider, and per-user token
/// buckets plus a concurrency bulkhead (spec §4.4). Each of the three
/// levels carries both a request-count bucket and a token-volume bucket.
///
/// Acquisition proceeds in a fixed order — global request, global token,
/// provider request, provider token, user request, user token, then the
/// concurrent-call slot — so that two requests contending for overlapping
/// dimensions can never deadlock against each other (spec §5 lock-order
/// requirement). A rejection at any step credits back every bucket already
/// taken by earlier steps (spec §4.4 step 2, best-effort).
pub struct Limiter {
    config: LimiterConfig,
    global: DimensionBuckets,
    providers: DashMap<String, DimensionBuckets>,
    users: DashMap<String, UserBucket>,
    concurrent: Arc<Semaphore>,
}

impl Limiter {
    /// Builds a limiter and starts its background user-bucket GC task.
    ///
    /// The returned `Arc` is required because the GC task holds only a
    /// `Weak` reference back to the limiter — it stops on its own once the
    /// last strong reference is dropped.
    pub fn new(config: LimiterConfig) -> Arc<Self> {
        let limiter = Arc::new(Self {
            global: DimensionBuckets::new(
                config.global_request_capacity,
                config.global_request_rate_per_sec,
                config.global_token_capacity,
                config.global_token_rate_per_sec,
            ),
            providers: DashMap::new(),
            users: DashMap::new(),
            concurrent: Arc::new(Semaphore::new(config.max_concurrent_calls)),
            config,
        });
        Self::spawn_gc(Arc::downgrade(&limiter));
        limiter
    }

    fn spawn_gc(weak: Weak<Limiter>) {
        tokio::spawn(async move {
            loop {
                let Some(limiter) = weak.upgrade() else {
                    return;
                };
                let interval = (limiter.config.user_bucket_ttl / 4).max(Duration::from_millis(10));
                drop(limiter);
                tokio::time::sleep(interval).await;

                let Some(limiter) = weak.upgrade() else {
                    return;
                };
                limiter.collect_idle_users();
            }
        });
    }

    fn collect_idle_users(&self) {
        let ttl = self.config.user_bucket_ttl;
        let now = Instant::now();
        let stale: Vec<String> = self
            .users
            .iter()
            .filter_map(|entry| {
                let last_used = *entry.value().last_used.lock().unwrap();
                if now.duration_since(last_used) > ttl {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect();

        for user_id in stale {
            self.users.remove(&user_id);
            self.config
                .event_listeners
                .emit(&LimiterEvent::UserBucketEvicted {
                    user_id,
                    timestamp: now,
                });
        }
    }

    fn provider_bucket_acquire(&self, provider: &str, kind: BucketKind, cost: f64) -> Result<(), Duration> {
        if let Some(entry) = self.providers.get(provider) {
            return entry.bucket(kind).lock().unwrap().try_acquire(cost);
        }
        self.providers
            .entry(provider.to_string())
            .or_insert_with(|| {
                DimensionBuckets::new(
                    self.config.provider_request_capacity,
                    self.config.provider_request_rate_per_sec,
                    self.config.provider_token_capacity,
                    self.config.provider_token_rate_per_sec,
                )
            })
            .bucket(kind)
            .lock()
            .unwrap()
            .try_acquire(cost)
    }

    fn user_bucket_acquire(&self, user_id: &str, kind: BucketKind, cost: f64) -> Result<(), Duration> {
        let now = Instant::now();
        if let Some(entry) = self.users.get(user_id) {
            *entry.value().last_used.lock().unwrap() = now;
            return entry.value().buckets.bucket(kind).lock().unwrap().try_acquire(cost);
        }
        let entry = self.users.entry(user_id.to_string()).or_insert_with(|| UserBucket {
            buckets: DimensionBuckets::new(
                self.config.user_request_capacity,
                self.config.user_request_rate_per_sec,
                self.config.user_token_capacity,
                self.config.user_token_rate_per_sec,
            ),
            last_used: Mutex::new(now),
        });
        *entry.value().last_used.lock().unwrap() = now;
        entry.value().buckets.bucket(kind).lock().unwrap().try_acquire(cost)
    }

    /// Credits `amount` back to whichever bucket `dimension`/`key` names.
    /// Missing provider/user entries (already evicted) are a no-op — the
    /// credit-back is best-effort, not a guarantee (spec §4.4 step 2).
    fn credit_back(&self, dimension: Dimension, key: &str, amount: f64) {
        match dimension {
            Dimension::GlobalRequest => self.global.requests.lock().unwrap().credit_back(amount),
            Dimension::GlobalToken => self.global.tokens.lock().unwrap().credit_back(amount),
            Dimension::ProviderRequest => {
                if let Some(entry) = self.providers.get(key) {
                    entry.requests.lock().unwrap().credit_back(amount);
                }
            }
            Dimension::ProviderToken => {
                if let Some(entry) = self.providers.get(key) {
                    entry.tokens.lock().unwrap().credit_back(amount);
                }
            }
            Dimension::UserRequest => {
                if let Some(entry) = self.users.get(key) {
                    entry.buckets.requests.lock().unwrap().credit_back(amount);
                }
            }
            Dimension::UserToken => {
                if let Some(entry) = self.users.get(key) {
                    entry.buckets.tokens.lock().unwrap().credit_back(amount);
                }
            }
            Dimension::ConcurrentSlot => {}
        }
    }

    fn rollback(&self, taken: &[(Dimension, String, f64)]) {
        for (dimension, key, amount) in taken.iter().rev() {
            self.credit_back(*dimension, key, *amount);
        }
    }

    /// Acquires a reservation across every configured dimension, in lock
    /// order global → provider → user → concurrent-slot (spec §5, §4.4),
    /// request bucket before token bucket within each level.
    ///
    /// `cost` is the estimated token cost of the request (spec §4.7 step 5:
    /// `estimatedTokens`). A `cost` of zero still charges the request
    /// dimension one unit — only the token dimension is bypassed, per spec
    /// §8's boundary case. Returns as soon as the first dimension rejects
    /// the request, after crediting back every dimension already acquired
    /// by this call (best-effort rollback).
    pub async fn reserve(
        &self,
        provider: &str,
        user_id: Option<&str>,
        cost: f64,
    ) -> Result<Reservation, SwitchboardError> {
        let mut taken: Vec<(Dimension, String, f64)> = Vec::new();

        self.try_step(Dimension::GlobalRequest, "global", 1.0, &mut taken, || {
            self.global.requests.lock().unwrap().try_acquire(1.0)
        })?;
        if cost > 0.0 {
            self.try_step(Dimension::GlobalToken, "global", cost, &mut taken, || {
                self.global.tokens.lock().unwrap().try_acquire(cost)
            })?;
        }

        self.try_step(Dimension::ProviderRequest, provider, 1.0, &mut taken, || {
            self.provider_bucket_acquire(provider, BucketKind::Requests, 1.0)
        })?;
        if cost > 0.0 {
            self.try_step(Dimension::ProviderToken, provider, cost, &mut taken, || {
                self.provider_bucket_acquire(provider, BucketKind::Tokens, cost)
            })?;
        }

        if let Some(user_id) = user_id {
            self.try_step(Dimension::UserRequest, user_id, 1.0, &mut taken, || {
                self.user_bucket_acquire(user_id, BucketKind::Requests, 1.0)
            })?;
            if cost > 0.0 {
                self.try_step(Dimension::UserToken, user_id, cost, &mut taken, || {
                    self.user_bucket_acquire(user_id, BucketKind::Tokens, cost)
                })?;
            }
        }

        let permit = match self.config.concurrent_wait {
            Some(wait) => tokio::time::timeout(wait, Arc::clone(&self.concurrent).acquire_owned())
                .await
                .map_err(|_| {
                    self.rollback(&taken);
                    LimiterError::BulkheadFull {
                        max_concurrent: self.config.max_concurrent_calls,
                    }
                })?
                .expect("semaphore never closed"),
            None => Arc::clone(&self.concurrent)
                .acquire_owned()
                .await
                .expect("semaphore never closed"),
        };

        self.config.event_listeners.emit(&LimiterEvent::Acquired {
            dimension: Dimension::ConcurrentSlot,
            key: provider.to_string(),
            timestamp: Instant::now(),
        });

        Ok(Reservation {
            _concurrent_permit: permit,
        })
    }

    /// Runs one dimension's acquisition attempt. On success, records it in
    /// `taken` so a later failure can credit it back. On failure, rolls back
    /// everything already in `taken` before returning the error.
    fn try_step(
        &self,
        dimension: Dimension,
        key: &str,
        cost: f64,
        taken: &mut Vec<(Dimension, String, f64)>,
        attempt: impl FnOnce() -> Result<(), Duration>,
    ) -> Result<(), SwitchboardError> {
        match attempt() {
            Ok(()) => {
                self.config.event_listeners.emit(&LimiterEvent::Acquired {
                    dimension,
                    key: key.to_string(),
                    timestamp: Instant::now(),
                });
                taken.push((dimension, key.to_string(), cost));
                Ok(())
            }
            Err(retry_after) => {
                self.config.event_listeners.emit(&LimiterEvent::Rejected {
                    dimension,
                    key: key.to_string(),
                    retry_after,
                    timestamp: Instant::now(),
                });
                self.rollback(taken);
                Err(LimiterError::RateLimited {
                    dimension,
                    key: key.to_string(),
                    capacity: cost,
                    retry_after,
                }
                .into())
            }
        }
    }

    pub fn available_concurrent_slots(&self) -> usize {
        self.concurrent.available_permits()
    }

    pub fn active_user_buckets(&self) -> usize {
        self.users.len()
    }
}
