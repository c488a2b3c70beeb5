use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::{Builder, Uuid};

use crate::error::{MajlisError, MajlisResult};
use crate::models::{ParticipantStatus, Personality, VirtualParticipant};
use crate::patterns::PARTICIPANT_IDENTITIES;

/// Window, in seconds, in which generated participants claim to have joined.
const JOIN_WINDOW_SECS: i64 = 5 * 60;

/// Flat, ordered set of simulated participants for one meeting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipantPool {
    participants: Vec<VirtualParticipant>,
}

impl ParticipantPool {
    pub fn new(participants: Vec<VirtualParticipant>) -> Self {
        Self { participants }
    }

    /// Builds `count` participants, clamped to the identity inventory.
    ///
    /// Personalities are assigned round-robin, statuses are `active` with
    /// probability `active_ratio` and `away` otherwise.
    pub fn generate<R: Rng + ?Sized>(count: usize, active_ratio: f64, rng: &mut R) -> Self {
        let count = count.min(PARTICIPANT_IDENTITIES.len());
        let now = Utc::now();

        let participants = PARTICIPANT_IDENTITIES
            .iter()
            .take(count)
            .enumerate()
            .map(|(index, (name, avatar))| {
                let status = if rng.gen_bool(active_ratio.clamp(0.0, 1.0)) {
                    ParticipantStatus::Active
                } else {
                    ParticipantStatus::Away
                };
                let joined_ago = rng.gen_range(0..JOIN_WINDOW_SECS);
                let id = Builder::from_random_bytes(rng.gen()).into_uuid();

                VirtualParticipant {
                    id,
                    name: name.to_string(),
                    avatar: avatar.to_string(),
                    status,
                    personality: Personality::ALL[index % Personality::ALL.len()],
                    join_time: now - ChronoDuration::seconds(joined_ago),
                }
            })
            .collect();

        Self { participants }
    }

    pub fn all(&self) -> &[VirtualParticipant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&VirtualParticipant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Participants that may currently be selected to speak.
    pub fn active(&self) -> Vec<&VirtualParticipant> {
        self.participants.iter().filter(|p| p.is_active()).collect()
    }

    pub fn set_status(&mut self, id: Uuid, status: ParticipantStatus) -> MajlisResult<()> {
        let participant = self
            .participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| MajlisError::ParticipantNotFound(id.to_string()))?;
        participant.status = status;
        Ok(())
    }

    pub fn counts_by_status(&self) -> HashMap<ParticipantStatus, usize> {
        let mut counts = HashMap::new();
        for participant in &self.participants {
            *counts.entry(participant.status).or_insert(0) += 1;
        }
        counts
    }
}
