use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::MajlisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Active,
    Away,
    Offline,
}

impl ParticipantStatus {
    /// Next status in the active → away → offline → active cycle.
    pub fn cycle(self) -> Self {
        match self {
            ParticipantStatus::Active => ParticipantStatus::Away,
            ParticipantStatus::Away => ParticipantStatus::Offline,
            ParticipantStatus::Offline => ParticipantStatus::Active,
        }
    }
}

impl std::fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParticipantStatus::Active => write!(f, "active"),
            ParticipantStatus::Away => write!(f, "away"),
            ParticipantStatus::Offline => write!(f, "offline"),
        }
    }
}

impl FromStr for ParticipantStatus {
    type Err = MajlisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ParticipantStatus::Active),
            "away" => Ok(ParticipantStatus::Away),
            "offline" => Ok(ParticipantStatus::Offline),
            other => Err(MajlisError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Professional,
    Friendly,
    Technical,
    Creative,
    Manager,
}

impl Personality {
    /// Round-robin order used when assigning personalities to a new pool.
    pub const ALL: [Personality; 5] = [
        Personality::Professional,
        Personality::Friendly,
        Personality::Technical,
        Personality::Creative,
        Personality::Manager,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Personality::Professional => "professional",
            Personality::Friendly => "friendly",
            Personality::Technical => "technical",
            Personality::Creative => "creative",
            Personality::Manager => "manager",
        }
    }
}

impl std::fmt::Display for Personality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Personality {
    type Err = MajlisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Personality::ALL
            .iter()
            .copied()
            .find(|p| p.name() == wanted)
            .ok_or(MajlisError::UnknownPersonality(wanted))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualParticipant {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
    pub status: ParticipantStatus,
    pub personality: Personality,
    pub join_time: DateTime<Utc>,
}

impl VirtualParticipant {
    pub fn new(
        name: impl Into<String>,
        avatar: impl Into<String>,
        personality: Personality,
        status: ParticipantStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            avatar: avatar.into(),
            status,
            personality,
            join_time: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ParticipantStatus::Active
    }
}
