use std::time::{Duration, Instant};

/// A lazily-refilled token bucket.
///
/// Rather than running a background timer, the bucket computes how many
/// tokens have accrued since the last access on every call (spec §4.2:
/// `tokens := min(capacity, tokens + (now - lastRefill) * rate)`). Fractional
/// tokens are preserved between calls so a low `rate` isn't rounded away.
#[derive(Debug)]
pub(crate) struct TokenBucket {
    capacity: f64,
    rate_per_sec: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub(crate) fn new(capacity: f64, rate_per_sec: f64) -> Self {
        Self {
            capacity,
            rate_per_sec,
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.rate_per_sec).min(self.capacity);
            self.last_refill = now;
        }
    }

    /// Attempts to withdraw `cost` tokens. On success, returns `Ok(())`; on
    /// failure, returns the estimated wait before `cost` tokens would be
    /// available, for `SwitchboardError::RateLimit.retry_after` (spec §4.2).
    pub(crate) fn try_acquire(&mut self, cost: f64) -> Result<(), Duration> {
        let now = Instant::now();
        self.refill(now);

        if self.tokens >= cost {
            self.tokens -= cost;
            return Ok(());
        }

        let deficit = cost - self.tokens;
        let wait_secs = if self.rate_per_sec > 0.0 {
            deficit / self.rate_per_sec
        } else {
            f64::INFINITY
        };
        Err(if wait_secs.is_finite() {
            Duration::from_secs_f64(wait_secs)
        } else {
            Duration::from_secs(u64::MAX / 2)
        })
    }

    pub(crate) fn available(&mut self) -> f64 {
        self.refill(Instant::now());
        self.tokens
    }

    /// Credits back previously-withdrawn tokens (spec §4.4 step 2: a
    /// dimension that rejects a reservation triggers a best-effort
    /// credit-back of whatever earlier dimensions already took). Clamped to
    /// `capacity` like a normal refill — overshoot from crediting back more
    /// than was ever taken is harmless.
    pub(crate) fn credit_back(&mut self, amount: f64) {
        self.refill(Instant::now());
        self.tokens = (self.tokens + amount).min(self.capacity);
    }
}
