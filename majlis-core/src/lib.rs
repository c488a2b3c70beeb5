#![allow(
    clippy::needless_borrows_for_generic_args,
    clippy::manual_range_contains,
    clippy::derivable_impls,
    clippy::len_without_is_empty
)]

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod events;
pub mod generator;
pub mod meeting;
pub mod models;
pub mod patterns;
pub mod pool;
pub mod selector;
pub mod timer;

pub use config::{get_config_dir, LoggingConfig, MajlisConfig, SimulationConfig, TimingConfig};
pub use context::{ConversationContext, CONTEXT_CAPACITY};
pub use engine::{ConversationEngine, EngineState, EngineStats, ScheduledResponse};
pub use error::{CliErrorDisplay, MajlisError, MajlisResult};
pub use events::{
    ChannelSink, ConversationEvent, DynEventSink, EventSink, GeneratedMessage, MessageKind,
    TracingSink,
};
pub use generator::{GeneratedResponse, ResponseGenerator, ResponseSource};
pub use meeting::{MeetingRegistry, MeetingSummary};
pub use models::{
    ConversationType, MessageSpeed, ParticipantStatus, Personality, SimulationSettings,
    VirtualParticipant,
};
pub use patterns::{
    generic_responses, normalize, patterns_for, MessagePattern, PARTICIPANT_IDENTITIES,
    SPONTANEOUS_TOPICS, WELCOME_MESSAGES,
};
pub use pool::ParticipantPool;
pub use selector::{keyword_relevance, RelevanceSelector, ScoredCandidate};
pub use timer::{TaskId, TaskScheduler};
