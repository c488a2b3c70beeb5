mod participant;
mod settings;

pub use participant::{ParticipantStatus, Personality, VirtualParticipant};
pub use settings::{ConversationType, MessageSpeed, SimulationSettings};
