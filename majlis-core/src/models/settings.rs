use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::Personality;
use crate::error::MajlisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageSpeed {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl std::fmt::Display for MessageSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageSpeed::Slow => write!(f, "slow"),
            MessageSpeed::Medium => write!(f, "medium"),
            MessageSpeed::Fast => write!(f, "fast"),
        }
    }
}

impl FromStr for MessageSpeed {
    type Err = MajlisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "slow" => Ok(MessageSpeed::Slow),
            "medium" => Ok(MessageSpeed::Medium),
            "fast" => Ok(MessageSpeed::Fast),
            other => Err(MajlisError::InvalidConfigValue {
                key: "simulation.message_speed".to_string(),
                message: format!("'{}' is not one of slow, medium, fast", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    Formal,
    #[default]
    Friendly,
    Technical,
}

impl ConversationType {
    /// Personalities whose tone suits this kind of conversation.
    pub fn affine_personalities(&self) -> &'static [Personality] {
        match self {
            ConversationType::Formal => &[Personality::Professional, Personality::Manager],
            ConversationType::Friendly => &[Personality::Friendly, Personality::Creative],
            ConversationType::Technical => &[Personality::Technical],
        }
    }

    pub fn favors(&self, personality: Personality) -> bool {
        self.affine_personalities().contains(&personality)
    }
}

impl std::fmt::Display for ConversationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversationType::Formal => write!(f, "formal"),
            ConversationType::Friendly => write!(f, "friendly"),
            ConversationType::Technical => write!(f, "technical"),
        }
    }
}

impl FromStr for ConversationType {
    type Err = MajlisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "formal" => Ok(ConversationType::Formal),
            "friendly" => Ok(ConversationType::Friendly),
            "technical" => Ok(ConversationType::Technical),
            other => Err(MajlisError::InvalidConfigValue {
                key: "simulation.conversation_type".to_string(),
                message: format!("'{}' is not one of formal, friendly, technical", other),
            }),
        }
    }
}

/// Host-facing knobs that may change while a meeting is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SimulationSettings {
    pub message_speed: MessageSpeed,
    pub conversation_type: ConversationType,
}
