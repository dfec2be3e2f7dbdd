use switchboard_core::{Response, ResponsePayload};

/// A coarse guess at what kind of content a response contains, used to scale
/// its cache TTL (spec §4.5: "TTL... may be multiplied by a content-class
/// factor — factual ×2, creative ×0.5, code ×3").
///
/// This is a heuristic, not a classifier with any guarantees: it exists only
/// to bias TTL, never to gate eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    Factual,
    Creative,
    Code,
    Neutral,
}

impl ContentClass {
    /// The multiplier this class applies to the strategy's base TTL.
    pub fn ttl_multiplier(&self) -> f64 {
        match self {
            ContentClass::Factual => 2.0,
            ContentClass::Creative => 0.5,
            ContentClass::Code => 3.0,
            ContentClass::Neutral => 1.0,
        }
    }

    pub fn classify(response: &Response) -> Self {
        let text = match &response.payload {
            ResponsePayload::Text { content } => content.as_str(),
            ResponsePayload::Chat { message } => message.content.as_str(),
            ResponsePayload::Embedding { .. } => return ContentClass::Neutral,
        };

        if looks_like_code(text) {
            ContentClass::Code
        } else if looks_like_creative(text) {
            ContentClass::Creative
        } else if looks_like_factual(text) {
            ContentClass::Factual
        } else {
            ContentClass::Neutral
        }
    }
}

fn looks_like_code(text: &str) -> bool {
    text.contains("```")
        || text.contains("fn ")
        || text.contains("def ")
        || text.contains("class ")
        || text.contains("function ")
        || text.contains("{\n")
}

fn looks_like_creative(text: &str) -> bool {
    const MARKERS: [&str; 5] = ["once upon a time", "poem", "story", "imagine", "verse"];
    let lower = text.to_ascii_lowercase();
    MARKERS.iter().any(|m| lower.contains(m))
}

fn looks_like_factual(text: &str) -> bool {
    const MARKERS: [&str; 6] = [
        "according to",
        "defined as",
        "is the capital of",
        "was born",
        "is a type of",
        "refers to",
    ];
    let lower = text.to_ascii_lowercase();
    let has_digit = text.chars().any(|c| c.is_ascii_digit());
    has_digit || MARKERS.iter().any(|m| lower.contains(m))
}
