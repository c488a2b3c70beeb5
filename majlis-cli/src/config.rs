use anyhow::{bail, Context, Result};
use clap::Args;
use majlis_core::{ConversationType, MajlisConfig, MessageSpeed};
use std::path::Path;

/// Loads the layered configuration, or only `path` when one is given.
pub fn load_config(path: Option<&Path>) -> Result<MajlisConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            MajlisConfig::load_from_paths(vec![path.to_path_buf()])
                .with_context(|| format!("Failed to load {}", path.display()))
        }
        None => MajlisConfig::load().context("Failed to load configuration"),
    }
}

/// Command-line overrides shared by every command that builds an engine.
#[derive(Debug, Clone, Default, Args)]
pub struct SimulationArgs {
    #[arg(short, long, help = "Message speed (slow, medium, fast)")]
    pub speed: Option<MessageSpeed>,

    #[arg(
        short = 't',
        long = "type",
        help = "Conversation type (formal, friendly, technical)"
    )]
    pub conversation_type: Option<ConversationType>,

    #[arg(short, long, help = "Number of virtual participants")]
    pub participants: Option<usize>,

    #[arg(long, help = "Seed for reproducible runs")]
    pub seed: Option<u64>,
}

impl SimulationArgs {
    pub fn apply(&self, config: &mut MajlisConfig) -> Result<()> {
        if let Some(speed) = self.speed {
            config.simulation.message_speed = speed;
        }
        if let Some(kind) = self.conversation_type {
            config.simulation.conversation_type = kind;
        }
        if let Some(count) = self.participants {
            config.simulation.participant_count = count;
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = Some(seed);
        }

        config.validate()?;
        Ok(())
    }
}
