use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::VirtualParticipant;

/// Why a message was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Reply,
    FollowUp,
    Welcome,
    Spontaneous,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Reply => write!(f, "reply"),
            MessageKind::FollowUp => write!(f, "follow_up"),
            MessageKind::Welcome => write!(f, "welcome"),
            MessageKind::Spontaneous => write!(f, "spontaneous"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMessage {
    pub participant: VirtualParticipant,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
    pub meeting_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// A participant was chosen and its message is pending.
    Typing {
        participant: VirtualParticipant,
        meeting_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    Message(GeneratedMessage),
}

impl ConversationEvent {
    pub fn meeting_id(&self) -> Uuid {
        match self {
            ConversationEvent::Typing { meeting_id, .. } => *meeting_id,
            ConversationEvent::Message(message) => message.meeting_id,
        }
    }

    pub fn participant(&self) -> &VirtualParticipant {
        match self {
            ConversationEvent::Typing { participant, .. } => participant,
            ConversationEvent::Message(message) => &message.participant,
        }
    }

    pub fn as_message(&self) -> Option<&GeneratedMessage> {
        match self {
            ConversationEvent::Message(message) => Some(message),
            ConversationEvent::Typing { .. } => None,
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self, ConversationEvent::Message(_))
    }
}

/// Delivery collaborator that receives every event an engine produces.
///
/// Delivery is fire-and-forget: the engine never learns whether an event
/// reached anyone.
#[async_trait]
pub trait EventSink: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, event: ConversationEvent);
}

pub type DynEventSink = Arc<dyn EventSink>;

/// Forwards events into an unbounded tokio channel.
pub struct ChannelSink {
    sender: UnboundedSender<ConversationEvent>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<ConversationEvent>) -> Self {
        Self { sender }
    }

    pub fn channel() -> (Self, UnboundedReceiver<ConversationEvent>) {
        let (sender, receiver) = unbounded_channel();
        (Self::new(sender), receiver)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    fn name(&self) -> &str {
        "channel"
    }

    async fn deliver(&self, event: ConversationEvent) {
        if self.sender.send(event).is_err() {
            debug!("Event receiver dropped, discarding event");
        }
    }
}

/// Writes every event to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl EventSink for TracingSink {
    fn name(&self) -> &str {
        "tracing"
    }

    async fn deliver(&self, event: ConversationEvent) {
        match &event {
            ConversationEvent::Typing {
                participant,
                meeting_id,
                ..
            } => {
                debug!(meeting = %meeting_id, participant = %participant.name, "typing");
            }
            ConversationEvent::Message(message) => {
                info!(
                    meeting = %message.meeting_id,
                    participant = %message.participant.name,
                    kind = %message.kind,
                    "{}",
                    message.message
                );
            }
        }
    }
}
