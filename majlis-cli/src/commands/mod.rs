pub mod participants;
pub mod patterns;
pub mod simulate;

pub use participants::cmd_participants;
pub use patterns::{cmd_patterns, cmd_respond};
pub use simulate::{cmd_chat, cmd_simulate};
