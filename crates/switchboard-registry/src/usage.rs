use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use switchboard_core::{ModelUsage, UsageStats};

/// Per-provider usage accounting (spec §3 `UsageStats`, §4.6 `ProviderStats`
/// feeding selection strategies).
///
/// Counters are monotonic and reset only when a provider is unregistered and
/// re-registered (spec §3 lifecycle). `snapshot()` returns an owned copy, so
/// mutating it never affects the tracker's live state (spec §8: "mutating the
/// returned object MUST NOT affect subsequent snapshots").
#[derive(Default)]
pub struct UsageTracker {
    providers: DashMap<String, Mutex<UsageStats>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, provider: &str) -> dashmap::mapref::one::Ref<'_, String, Mutex<UsageStats>> {
        if !self.providers.contains_key(provider) {
            self.providers
                .entry(provider.to_string())
                .or_insert_with(|| Mutex::new(UsageStats::default()));
        }
        self.providers.get(provider).unwrap()
    }

    /// Records a completed successful request (spec §4.7 step 7: `UpdateUsage`).
    pub fn record_success(&self, provider: &str, model: &str, tokens: u64, cost: f64, latency: Duration) {
        let entry = self.entry(provider);
        let mut stats = entry.lock().unwrap();
        stats.total_requests += 1;
        stats.successful += 1;
        stats.total_tokens += tokens;
        stats.total_cost += cost;
        stats.last_request_time = Some(Instant::now());
        stats.avg_latency = blended_average(stats.avg_latency, stats.successful, latency);

        let model_usage = stats.per_model.entry(model.to_string()).or_default();
        model_usage.requests += 1;
        model_usage.tokens += tokens;
        model_usage.cost += cost;
    }

    /// Records a completed failed request. Failures still count toward
    /// `total_requests` (spec §3 invariant: `totalRequests == successful +
    /// failed`) but contribute no tokens or cost.
    pub fn record_failure(&self, provider: &str) {
        let entry = self.entry(provider);
        let mut stats = entry.lock().unwrap();
        stats.total_requests += 1;
        stats.failed += 1;
        stats.last_request_time = Some(Instant::now());
    }

    pub fn snapshot(&self, provider: &str) -> UsageStats {
        match self.providers.get(provider) {
            Some(entry) => entry.lock().unwrap().clone(),
            None => UsageStats::default(),
        }
    }

    pub fn success_rate(&self, provider: &str) -> f64 {
        let stats = self.snapshot(provider);
        if stats.total_requests == 0 {
            1.0
        } else {
            stats.successful as f64 / stats.total_requests as f64
        }
    }

    pub fn avg_latency(&self, provider: &str) -> Duration {
        self.snapshot(provider).avg_latency
    }

    pub fn total_requests(&self, provider: &str) -> u64 {
        self.snapshot(provider).total_requests
    }

    /// Drops all accumulated counters for `provider` (spec §3: "reset only
    /// on explicit provider close").
    pub fn reset(&self, provider: &str) {
        self.providers.remove(provider);
    }
}

/// Incremental mean: `avg_{n} = avg_{n-1} + (sample - avg_{n-1}) / n`.
fn blended_average(current: Duration, count: u64, sample: Duration) -> Duration {
    if count <= 1 {
        return sample;
    }
    let current = current.as_secs_f64();
    let sample = sample.as_secs_f64();
    let next = current + (sample - current) / count as f64;
    Duration::from_secs_f64(next.max(0.0))
}
