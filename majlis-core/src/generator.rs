use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::TimingConfig;
use crate::context::ConversationContext;
use crate::models::Personality;
use crate::patterns::{
    generic_responses, normalize, patterns_for, MessagePattern, GRATITUDE_CLAUSE,
    GRATITUDE_KEYWORDS, PLANNING_CLAUSE, PROJECT_KEYWORDS,
};

/// Where the text of a generated response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Pattern,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResponse {
    pub message: String,
    #[serde(with = "duration_millis")]
    pub delay: Duration,
    pub source: ResponseSource,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Produces message text and send delay for a chosen participant.
#[derive(Debug, Clone)]
pub struct ResponseGenerator {
    timing: TimingConfig,
}

impl Default for ResponseGenerator {
    fn default() -> Self {
        Self::new(TimingConfig::default())
    }
}

impl ResponseGenerator {
    pub fn new(timing: TimingConfig) -> Self {
        Self { timing }
    }

    /// Generates a reply to `trigger` in the voice of `personality`.
    ///
    /// Records `trigger` in `context` first, so the current trigger takes
    /// part in the gratitude/project stitching. Returns `None` only if the
    /// personality's tables are empty.
    pub fn respond<R: Rng + ?Sized>(
        &self,
        trigger: &str,
        personality: Personality,
        context: &mut ConversationContext,
        rng: &mut R,
    ) -> Option<GeneratedResponse> {
        context.push(trigger);
        let normalized = normalize(trigger);

        let (text, delay, source) = match best_pattern(&normalized, personality, rng) {
            Some(pattern) => {
                let text = pattern.responses.choose(rng)?;
                let delay = pattern.delay_ms + jitter(rng, self.timing.pattern_jitter_ms);
                (*text, delay, ResponseSource::Pattern)
            }
            None => {
                let text = generic_responses(personality).choose(rng)?;
                let delay =
                    self.timing.fallback_delay_ms + jitter(rng, self.timing.fallback_jitter_ms);
                (*text, delay, ResponseSource::Generic)
            }
        };

        Some(GeneratedResponse {
            message: stitch(text, context),
            delay: Duration::from_millis(delay),
            source,
        })
    }
}

/// Highest-priority matching pattern; ties are broken at random.
fn best_pattern<R: Rng + ?Sized>(
    normalized_trigger: &str,
    personality: Personality,
    rng: &mut R,
) -> Option<&'static MessagePattern> {
    let matching: Vec<&'static MessagePattern> = patterns_for(personality)
        .iter()
        .filter(|p| p.matches(normalized_trigger))
        .collect();

    let top = matching.iter().map(|p| p.priority).max()?;
    let best: Vec<&'static MessagePattern> =
        matching.into_iter().filter(|p| p.priority == top).collect();
    best.choose(rng).copied()
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, max_ms: u64) -> u64 {
    if max_ms == 0 {
        0
    } else {
        rng.gen_range(0..max_ms)
    }
}

/// Cosmetic clauses driven by what the meeting has been talking about.
fn stitch(text: &str, context: &ConversationContext) -> String {
    let mut message = text.to_string();
    if context.mentions_any(GRATITUDE_KEYWORDS) {
        message.push(' ');
        message.push_str(GRATITUDE_CLAUSE);
    }
    if context.mentions_any(PROJECT_KEYWORDS) {
        message.push(' ');
        message.push_str(PLANNING_CLAUSE);
    }
    message
}
