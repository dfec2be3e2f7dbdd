use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand::Rng;

use switchboard_core::Model;

/// A model a [`SelectionStrategy`] can choose between.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub provider: String,
    pub model: Model,
}

/// Rolling per-provider performance numbers fed to scoring strategies
/// (spec §4.6). Supplied by the caller (the executor, in practice, backed
/// by `UsageStats`) rather than owned by the registry, so the registry
/// stays free of the executor's accounting concerns.
#[derive(Debug, Clone, Copy)]
pub struct ProviderStats {
    pub success_rate: f64,
    pub avg_latency: Duration,
}

impl Default for ProviderStats {
    fn default() -> Self {
        Self {
            success_rate: 1.0,
            avg_latency: Duration::from_millis(200),
        }
    }
}

pub type StatsLookup<'a> = dyn Fn(&str) -> ProviderStats + 'a;

/// How a [`crate::ProviderRegistry`]'s candidate models are ranked when a
/// request doesn't name one explicitly (spec §4.6).
///
/// A closed enum dispatched via `match` rather than `Box<dyn Trait>` per
/// DESIGN NOTES §9 — eight variants is a shallow, fully-known set, and the
/// match keeps `Composite` trivially recursive without needing object
/// safety workarounds.
#[derive(Debug, Clone)]
pub enum SelectionStrategy {
    RoundRobin,
    Random,
    /// Favors the model with the lowest blended input/output cost per 1k tokens.
    CostOptimized,
    /// Favors providers with high recent success rate and low latency.
    PerformanceOptimized,
    /// Favors providers by explicit weight; providers absent from the list
    /// get a small non-zero floor weight rather than being excluded.
    Weighted(Vec<(String, f64)>),
    /// Tries the primary (first entry) while its recent success rate stays
    /// above 0.8, then falls through the remaining entries in order, then
    /// any available candidate (spec §4.6). An unseen provider defaults to
    /// a success rate of 1.0 (see [`ProviderStats::default`]), which is how
    /// "primary never called yet" is treated as healthy without the
    /// selector needing a separate request-count signal.
    Failover(Vec<String>),
    /// `PerformanceOptimized` plus a small exploration term, so a
    /// consistently-losing provider still gets occasional traffic and can
    /// recover its score instead of being frozen out forever.
    Adaptive,
    /// Weighted sum of normalized sub-strategy scores.
    Composite(Vec<(SelectionStrategy, f64)>),
}

/// Holds the mutable state a [`SelectionStrategy`] needs across calls
/// (currently just `RoundRobin`'s cursor).
pub struct Selector {
    strategy: SelectionStrategy,
    round_robin_cursor: AtomicUsize,
}

impl Selector {
    pub fn new(strategy: SelectionStrategy) -> Self {
        Self {
            strategy,
            round_robin_cursor: AtomicUsize::new(0),
        }
    }

    pub fn strategy(&self) -> &SelectionStrategy {
        &self.strategy
    }

    /// Picks one candidate's index, or `None` if `candidates` is empty.
    pub fn select(&self, candidates: &[Candidate], stats: &StatsLookup<'_>) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        self.select_with(&self.strategy, candidates, stats)
    }

    fn select_with(
        &self,
        strategy: &SelectionStrategy,
        candidates: &[Candidate],
        stats: &StatsLookup<'_>,
    ) -> Option<usize> {
        match strategy {
            SelectionStrategy::RoundRobin => {
                let i = self.round_robin_cursor.fetch_add(1, Ordering::Relaxed);
                Some(i % candidates.len())
            }
            SelectionStrategy::Random => Some(rand::thread_rng().gen_range(0..candidates.len())),
            SelectionStrategy::Failover(order) => failover_select(order, candidates, stats),
            SelectionStrategy::Weighted(_) => {
                weighted_random_index(&self.score(strategy, candidates, stats))
            }
            SelectionStrategy::Composite(parts) => {
                // spec §4.6: "weighted random pick among sub-strategies;
                // delegate" — pick one sub-strategy by its weight, then hand
                // the whole decision to it, rather than blending scores.
                let strategy_weights: Vec<f64> = parts.iter().map(|(_, w)| *w).collect();
                let chosen = weighted_random_index(&strategy_weights)?;
                self.select_with(&parts[chosen].0, candidates, stats)
            }
            _ => argmax(&self.score(strategy, candidates, stats)),
        }
    }

    /// Per-candidate scores in an arbitrary but comparable range, used both
    /// directly (for scoring strategies) and as `Composite`'s inputs.
    fn score(
        &self,
        strategy: &SelectionStrategy,
        candidates: &[Candidate],
        stats: &StatsLookup<'_>,
    ) -> Vec<f64> {
        match strategy {
            SelectionStrategy::CostOptimized => candidates
                .iter()
                .map(|c| {
                    let cost = (c.model.input_cost_per_1k + c.model.output_cost_per_1k).max(1e-9);
                    1.0 / cost
                })
                .collect(),
            SelectionStrategy::PerformanceOptimized => candidates
                .iter()
                .map(|c| performance_score(stats(&c.provider)))
                .collect(),
            SelectionStrategy::Adaptive => {
                let mut rng = rand::thread_rng();
                candidates
                    .iter()
                    .map(|c| {
                        let base = performance_score(stats(&c.provider));
                        let exploration: f64 = rng.gen_range(0.0..0.1);
                        base * (1.0 - 0.1) + exploration
                    })
                    .collect()
            }
            SelectionStrategy::Weighted(weights) => candidates
                .iter()
                .map(|c| {
                    weights
                        .iter()
                        .find(|(name, _)| name == &c.provider)
                        .map(|(_, w)| *w)
                        // spec §4.6: "unspecified weight defaults to 1".
                        .unwrap_or(1.0)
                })
                .collect(),
            SelectionStrategy::RoundRobin | SelectionStrategy::Random | SelectionStrategy::Failover(_) => {
                // One-hot: whichever index select_with() would have returned.
                let chosen = self.select_with(strategy, candidates, stats).unwrap_or(0);
                candidates
                    .iter()
                    .enumerate()
                    .map(|(i, _)| if i == chosen { 1.0 } else { 0.0 })
                    .collect()
            }
            // Composite never reaches `score`: `select_with` resolves it by
            // picking one sub-strategy via weighted random and delegating,
            // per spec §4.6 ("weighted-random pick among sub-strategies;
            // delegate").
            SelectionStrategy::Composite(_) => vec![0.0; candidates.len()],
        }
    }
}

/// Implements [`SelectionStrategy::Failover`]: primary if healthy, else the
/// remaining entries in order, else whatever's left.
fn failover_select(order: &[String], candidates: &[Candidate], stats: &StatsLookup<'_>) -> Option<usize> {
    if let Some(primary) = order.first() {
        if let Some(i) = candidates.iter().position(|c| &c.provider == primary) {
            if stats(primary).success_rate > 0.8 {
                return Some(i);
            }
        }
        for fallback in &order[1..] {
            if let Some(i) = candidates.iter().position(|c| &c.provider == fallback) {
                return Some(i);
            }
        }
    }
    Some(0)
}

fn performance_score(stats: ProviderStats) -> f64 {
    let latency_secs = stats.avg_latency.as_secs_f64().max(0.001);
    stats.success_rate / latency_secs
}

/// Picks an index with probability proportional to its weight (spec §4.6
/// "Weighted random over candidates"/"weighted random pick among
/// sub-strategies"). Negative weights are floored to zero; an all-zero
/// weight vector falls back to uniform selection rather than panicking.
fn weighted_random_index(weights: &[f64]) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    if total <= 0.0 {
        return Some(rand::thread_rng().gen_range(0..weights.len()));
    }
    let mut target = rand::thread_rng().gen_range(0.0..total);
    for (i, w) in weights.iter().enumerate() {
        let w = w.max(0.0);
        if target < w {
            return Some(i);
        }
        target -= w;
    }
    Some(weights.len() - 1)
}

fn argmax(scores: &[f64]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}
