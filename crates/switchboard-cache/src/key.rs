use std::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

use switchboard_core::{Payload, Request};

/// A deterministic digest of whatever a [`KeyStrategy`] decides belongs in
/// the cache key. This is `DefaultHasher`-derived — a non-cryptographic
/// digest, since the key only needs to be deterministic, not tamper-resistant
/// (the ambiguity spec §9 leaves open; resolved in `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(pub(crate) u64);

/// Which inputs a [`CacheKey`] is derived from (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Model + full payload + sampling params. The default — two requests
    /// hash identically only if they'd produce the same deterministic
    /// completion request.
    Standard,
    /// Like `Standard`, but normalizes whitespace in text payloads first, so
    /// cosmetically different prompts with the same semantic content share
    /// an entry.
    ContentAware,
    /// Ignores `max_tokens`/`temperature` variance below a threshold — trades
    /// a little precision for a higher hit rate on near-identical requests
    /// from cost-sensitive callers.
    CostOptimized,
    /// Includes `user_id` in the digest, so responses are never shared
    /// across users even when the rest of the request is identical.
    UserSpecific,
}

impl KeyStrategy {
    /// The TTL multiplier this strategy applies on top of the content-class
    /// factor (spec §4.5: "User-specific: ... TTL halved").
    pub fn ttl_scale(&self) -> f64 {
        match self {
            KeyStrategy::UserSpecific => 0.5,
            _ => 1.0,
        }
    }

    pub fn derive(&self, request: &Request, model_id: &str) -> CacheKey {
        let mut hasher = DefaultHasher::new();
        model_id.hash(&mut hasher);

        match self {
            KeyStrategy::Standard => {
                hash_payload(&request.payload, &mut hasher);
                hash_sampling(request, &mut hasher);
            }
            KeyStrategy::ContentAware => {
                hash_payload_normalized(&request.payload, &mut hasher);
                hash_sampling(request, &mut hasher);
            }
            KeyStrategy::CostOptimized => {
                hash_payload(&request.payload, &mut hasher);
                // Deliberately omit sampling params: cost-optimized callers
                // accept a slightly higher chance of a stale-parameter hit.
            }
            KeyStrategy::UserSpecific => {
                hash_payload(&request.payload, &mut hasher);
                hash_sampling(request, &mut hasher);
                request.user_id.hash(&mut hasher);
            }
        }

        CacheKey(hasher.finish())
    }
}

fn hash_payload(payload: &Payload, hasher: &mut impl Hasher) {
    match payload {
        Payload::Text { prompt } => {
            0u8.hash(hasher);
            prompt.hash(hasher);
        }
        Payload::Chat { messages } => {
            1u8.hash(hasher);
            for m in messages {
                m.role.hash(hasher);
                m.content.hash(hasher);
            }
        }
        Payload::Embedding { inputs } => {
            2u8.hash(hasher);
            for i in inputs {
                i.hash(hasher);
            }
        }
    }
}

fn hash_payload_normalized(payload: &Payload, hasher: &mut impl Hasher) {
    fn normalize(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }
    match payload {
        Payload::Text { prompt } => {
            0u8.hash(hasher);
            normalize(prompt).hash(hasher);
        }
        Payload::Chat { messages } => {
            1u8.hash(hasher);
            for m in messages {
                m.role.hash(hasher);
                normalize(&m.content).hash(hasher);
            }
        }
        Payload::Embedding { inputs } => {
            2u8.hash(hasher);
            for i in inputs {
                normalize(i).hash(hasher);
            }
        }
    }
}

fn hash_sampling(request: &Request, hasher: &mut impl Hasher) {
    request.sampling.max_tokens.hash(hasher);
    request.sampling.top_k.hash(hasher);
    request.sampling.stop.hash(hasher);
    // f32 doesn't implement Hash; bit-cast to make sampling temperature/top_p
    // part of the deterministic digest without pulling in a crate just for this.
    request
        .sampling
        .temperature
        .map(f32::to_bits)
        .hash(hasher);
    request.sampling.top_p.map(f32::to_bits).hash(hasher);
}

/// Temperature above which a free-form request is considered too
/// non-deterministic to cache (spec §4.5: "temperature > 0.7 on free-form
/// text").
const UNCACHEABLE_TEMPERATURE: f32 = 0.7;

/// Whether a request is eligible for caching at all (spec §4.5).
///
/// Requests that look non-deterministic (temperature above
/// [`UNCACHEABLE_TEMPERATURE`]) are excluded by default, since caching them
/// would return a stale sample instead of a fresh one; callers may override
/// via [`crate::CacheConfigBuilder::eligibility`].
pub fn default_eligibility(request: &Request) -> bool {
    if request.metadata.get("no_cache").map(String::as_str) == Some("true") {
        return false;
    }
    match request.sampling.temperature {
        Some(t) if t >= UNCACHEABLE_TEMPERATURE => false,
        _ => true,
    }
}
