//! Picks which simulated participant answers a trigger.
//!
//! Ranking score = keyword relevance + conversation-type affinity + jitter.
//! Only the keyword component decides whether a candidate is relevant at
//! all: when nobody matched, the speaker is drawn uniformly from every
//! candidate; otherwise it is drawn uniformly from the three best-ranked
//! relevant candidates.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{ConversationType, Personality, VirtualParticipant};
use crate::patterns::{normalize, patterns_for};

/// Upper bound (exclusive) of the per-candidate random jitter.
pub const JITTER_RANGE: f64 = 2.0;

/// Ranking bonus for personalities that suit the configured conversation type.
pub const AFFINITY_BONUS: f64 = 0.5;

/// Maximum number of relevant candidates kept for the final draw.
pub const SHORTLIST_SIZE: usize = 3;

/// Sum over the personality's patterns of `matched keywords × priority`.
pub fn keyword_relevance(normalized_trigger: &str, personality: Personality) -> u32 {
    patterns_for(personality)
        .iter()
        .map(|pattern| pattern.match_count(normalized_trigger) * pattern.priority)
        .sum()
}

#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub participant: &'a VirtualParticipant,
    pub keyword_score: u32,
    pub score: f64,
}

impl ScoredCandidate<'_> {
    pub fn is_relevant(&self) -> bool {
        self.keyword_score > 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceSelector {
    conversation_type: ConversationType,
}

impl RelevanceSelector {
    pub fn new(conversation_type: ConversationType) -> Self {
        Self { conversation_type }
    }

    pub fn conversation_type(&self) -> ConversationType {
        self.conversation_type
    }

    /// Scores every candidate and returns them best first.
    pub fn rank<'a, R: Rng + ?Sized>(
        &self,
        trigger: &str,
        candidates: &[&'a VirtualParticipant],
        rng: &mut R,
    ) -> Vec<ScoredCandidate<'a>> {
        let normalized = normalize(trigger);

        let mut scored: Vec<ScoredCandidate<'a>> = candidates
            .iter()
            .map(|participant| {
                let keyword_score = keyword_relevance(&normalized, participant.personality);
                let affinity = if self.conversation_type.favors(participant.personality) {
                    AFFINITY_BONUS
                } else {
                    0.0
                };
                let jitter = rng.gen_range(0.0..JITTER_RANGE);

                ScoredCandidate {
                    participant,
                    keyword_score,
                    score: keyword_score as f64 + affinity + jitter,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    /// Chooses a speaker among `candidates`, or `None` when there is nobody.
    pub fn select<'a, R: Rng + ?Sized>(
        &self,
        trigger: &str,
        candidates: &[&'a VirtualParticipant],
        rng: &mut R,
    ) -> Option<&'a VirtualParticipant> {
        if candidates.is_empty() {
            return None;
        }

        let ranked = self.rank(trigger, candidates, rng);
        let shortlist: Vec<&'a VirtualParticipant> = ranked
            .iter()
            .filter(|c| c.is_relevant())
            .take(SHORTLIST_SIZE)
            .map(|c| c.participant)
            .collect();

        if shortlist.is_empty() {
            return candidates.choose(rng).copied();
        }

        shortlist.choose(rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParticipantStatus;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn participant(name: &str, personality: Personality) -> VirtualParticipant {
        VirtualParticipant::new(name, "🙂", personality, ParticipantStatus::Active)
    }

    #[test]
    fn test_keyword_relevance_uses_priority() {
        let trigger = normalize("هل يمكننا مراجعة الكود؟");
        assert_eq!(keyword_relevance(&trigger, Personality::Technical), 3);
        assert_eq!(keyword_relevance(&trigger, Personality::Friendly), 0);

        let trigger = normalize("الكود فيه خطأ");
        assert_eq!(keyword_relevance(&trigger, Personality::Technical), 6);
    }

    #[test]
    fn test_select_empty_pool() {
        let selector = RelevanceSelector::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(selector.select("مرحبا", &[], &mut rng).is_none());
    }

    #[test]
    fn test_rank_is_sorted_descending() {
        let people = [
            participant("أ", Personality::Professional),
            participant("ب", Personality::Technical),
            participant("ج", Personality::Creative),
        ];
        let refs: Vec<_> = people.iter().collect();
        let selector = RelevanceSelector::new(ConversationType::Technical);
        let ranked = selector.rank("الكود", &refs, &mut StdRng::seed_from_u64(4));

        assert_eq!(ranked.len(), 3);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(ranked[0].participant.personality, Personality::Technical);
    }

    #[test]
    fn test_relevant_candidate_always_wins_over_irrelevant() {
        let people = [
            participant("أ", Personality::Professional),
            participant("ب", Personality::Technical),
            participant("ج", Personality::Friendly),
        ];
        let refs: Vec<_> = people.iter().collect();
        let selector = RelevanceSelector::new(ConversationType::Formal);
        let mut rng = StdRng::seed_from_u64(2024);

        for _ in 0..200 {
            let chosen = selector
                .select("هل يمكننا مراجعة الكود؟", &refs, &mut rng)
                .unwrap();
            assert_eq!(chosen.personality, Personality::Technical);
        }
    }

    #[test]
    fn test_no_match_falls_back_to_whole_pool() {
        let people: Vec<_> = Personality::ALL
            .iter()
            .map(|p| participant(p.name(), *p))
            .collect();
        let refs: Vec<_> = people.iter().collect();
        let selector = RelevanceSelector::default();
        let mut rng = StdRng::seed_from_u64(8);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..300 {
            let chosen = selector.select("zzz", &refs, &mut rng).unwrap();
            seen.insert(chosen.personality);
        }
        assert_eq!(seen.len(), Personality::ALL.len());
    }

    #[test]
    fn test_rank_marks_every_matching_candidate_relevant() {
        let people: Vec<_> = (0..6)
            .map(|i| participant(&format!("t{}", i), Personality::Technical))
            .collect();
        let refs: Vec<_> = people.iter().collect();
        let selector = RelevanceSelector::default();
        let mut rng = StdRng::seed_from_u64(77);

        let ranked = selector.rank("كود", &refs, &mut rng);
        assert!(ranked.iter().all(|c| c.is_relevant()));
        assert_eq!(ranked.len(), 6);
    }
}
