use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{MajlisError, MajlisResult};
use crate::models::{ConversationType, MessageSpeed, SimulationSettings};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MajlisConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    #[serde(default)]
    pub message_speed: MessageSpeed,

    #[serde(default)]
    pub conversation_type: ConversationType,

    #[serde(default = "default_participant_count")]
    pub participant_count: usize,

    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_active_ratio")]
    pub active_ratio: f64,

    #[serde(default = "default_spontaneous_probability")]
    pub spontaneous_probability: f64,

    #[serde(default = "default_follow_up_probability")]
    pub follow_up_probability: f64,

    #[serde(default = "default_max_follow_up_depth")]
    pub max_follow_up_depth: u32,

    #[serde(default = "default_welcome_limit")]
    pub welcome_limit: usize,
}

/// Delays and intervals, all in milliseconds unless the name says otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    #[serde(default = "default_min_interval_fast")]
    pub min_interval_fast_ms: u64,

    #[serde(default = "default_min_interval_medium")]
    pub min_interval_medium_ms: u64,

    #[serde(default = "default_min_interval_slow")]
    pub min_interval_slow_ms: u64,

    #[serde(default = "default_spontaneous_fast")]
    pub spontaneous_fast_secs: u64,

    #[serde(default = "default_spontaneous_medium")]
    pub spontaneous_medium_secs: u64,

    #[serde(default = "default_spontaneous_slow")]
    pub spontaneous_slow_secs: u64,

    #[serde(default = "default_fallback_delay")]
    pub fallback_delay_ms: u64,

    #[serde(default = "default_fallback_jitter")]
    pub fallback_jitter_ms: u64,

    #[serde(default = "default_pattern_jitter")]
    pub pattern_jitter_ms: u64,

    #[serde(default = "default_follow_up_min")]
    pub follow_up_min_ms: u64,

    #[serde(default = "default_follow_up_max")]
    pub follow_up_max_ms: u64,

    #[serde(default = "default_welcome_stagger")]
    pub welcome_stagger_ms: u64,

    #[serde(default = "default_welcome_jitter")]
    pub welcome_jitter_ms: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_participant_count() -> usize {
    6
}

fn default_active_ratio() -> f64 {
    0.8
}

fn default_spontaneous_probability() -> f64 {
    0.3
}

fn default_follow_up_probability() -> f64 {
    0.4
}

fn default_max_follow_up_depth() -> u32 {
    2
}

fn default_welcome_limit() -> usize {
    3
}

fn default_min_interval_fast() -> u64 {
    2000
}

fn default_min_interval_medium() -> u64 {
    4000
}

fn default_min_interval_slow() -> u64 {
    8000
}

fn default_spontaneous_fast() -> u64 {
    8
}

fn default_spontaneous_medium() -> u64 {
    15
}

fn default_spontaneous_slow() -> u64 {
    25
}

fn default_fallback_delay() -> u64 {
    3000
}

fn default_fallback_jitter() -> u64 {
    2000
}

fn default_pattern_jitter() -> u64 {
    1000
}

fn default_follow_up_min() -> u64 {
    3000
}

fn default_follow_up_max() -> u64 {
    5000
}

fn default_welcome_stagger() -> u64 {
    2000
}

fn default_welcome_jitter() -> u64 {
    1000
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            message_speed: MessageSpeed::default(),
            conversation_type: ConversationType::default(),
            participant_count: default_participant_count(),
            seed: None,
            active_ratio: default_active_ratio(),
            spontaneous_probability: default_spontaneous_probability(),
            follow_up_probability: default_follow_up_probability(),
            max_follow_up_depth: default_max_follow_up_depth(),
            welcome_limit: default_welcome_limit(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_interval_fast_ms: default_min_interval_fast(),
            min_interval_medium_ms: default_min_interval_medium(),
            min_interval_slow_ms: default_min_interval_slow(),
            spontaneous_fast_secs: default_spontaneous_fast(),
            spontaneous_medium_secs: default_spontaneous_medium(),
            spontaneous_slow_secs: default_spontaneous_slow(),
            fallback_delay_ms: default_fallback_delay(),
            fallback_jitter_ms: default_fallback_jitter(),
            pattern_jitter_ms: default_pattern_jitter(),
            follow_up_min_ms: default_follow_up_min(),
            follow_up_max_ms: default_follow_up_max(),
            welcome_stagger_ms: default_welcome_stagger(),
            welcome_jitter_ms: default_welcome_jitter(),
        }
    }
}

impl SimulationConfig {
    pub fn settings(&self) -> SimulationSettings {
        SimulationSettings {
            message_speed: self.message_speed,
            conversation_type: self.conversation_type,
        }
    }
}

impl TimingConfig {
    /// Minimum gap between two accepted responses at the given speed.
    pub fn min_interval(&self, speed: MessageSpeed) -> Duration {
        Duration::from_millis(match speed {
            MessageSpeed::Fast => self.min_interval_fast_ms,
            MessageSpeed::Medium => self.min_interval_medium_ms,
            MessageSpeed::Slow => self.min_interval_slow_ms,
        })
    }

    /// Period of the spontaneous-topic ticker at the given speed.
    pub fn spontaneous_interval(&self, speed: MessageSpeed) -> Duration {
        Duration::from_secs(match speed {
            MessageSpeed::Fast => self.spontaneous_fast_secs,
            MessageSpeed::Medium => self.spontaneous_medium_secs,
            MessageSpeed::Slow => self.spontaneous_slow_secs,
        })
    }
}

impl MajlisConfig {
    pub fn load() -> MajlisResult<Self> {
        Self::load_from_paths(get_config_paths())
    }

    pub fn load_from_paths(paths: Vec<PathBuf>) -> MajlisResult<Self> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("MAJLIS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut majlis_config: MajlisConfig = config.try_deserialize()?;

        majlis_config.apply_env_overrides()?;
        majlis_config.validate()?;

        Ok(majlis_config)
    }

    fn apply_env_overrides(&mut self) -> MajlisResult<()> {
        if let Ok(level) = std::env::var("MAJLIS_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }

        if let Ok(speed) = std::env::var("MAJLIS_MESSAGE_SPEED") {
            self.simulation.message_speed =
                speed.parse().map_err(|_| MajlisError::InvalidEnvVar {
                    name: "MAJLIS_MESSAGE_SPEED".to_string(),
                    message: format!("'{}' is not one of slow, medium, fast", speed),
                })?;
        }

        if let Ok(kind) = std::env::var("MAJLIS_CONVERSATION_TYPE") {
            self.simulation.conversation_type =
                kind.parse().map_err(|_| MajlisError::InvalidEnvVar {
                    name: "MAJLIS_CONVERSATION_TYPE".to_string(),
                    message: format!("'{}' is not one of formal, friendly, technical", kind),
                })?;
        }

        if let Ok(seed) = std::env::var("MAJLIS_SEED") {
            let parsed = seed.parse().map_err(|_| MajlisError::InvalidEnvVar {
                name: "MAJLIS_SEED".to_string(),
                message: format!("'{}' is not an unsigned integer", seed),
            })?;
            self.simulation.seed = Some(parsed);
        }

        Ok(())
    }

    pub fn validate(&self) -> MajlisResult<()> {
        let probabilities = [
            ("simulation.active_ratio", self.simulation.active_ratio),
            (
                "simulation.spontaneous_probability",
                self.simulation.spontaneous_probability,
            ),
            (
                "simulation.follow_up_probability",
                self.simulation.follow_up_probability,
            ),
        ];
        for (key, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(MajlisError::InvalidConfigValue {
                    key: key.to_string(),
                    message: format!("{} is outside [0, 1]", value),
                });
            }
        }

        if self.simulation.participant_count == 0 {
            return Err(MajlisError::InvalidConfigValue {
                key: "simulation.participant_count".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.timing.follow_up_min_ms > self.timing.follow_up_max_ms {
            return Err(MajlisError::InvalidConfigValue {
                key: "timing.follow_up_min_ms".to_string(),
                message: "Cannot be greater than follow_up_max_ms".to_string(),
            });
        }

        if self.timing.welcome_stagger_ms == 0 {
            return Err(MajlisError::InvalidConfigValue {
                key: "timing.welcome_stagger_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.timing.welcome_jitter_ms > self.timing.welcome_stagger_ms {
            return Err(MajlisError::InvalidConfigValue {
                key: "timing.welcome_jitter_ms".to_string(),
                message: "Cannot be greater than welcome_stagger_ms".to_string(),
            });
        }

        let periods = [
            ("timing.spontaneous_fast_secs", self.timing.spontaneous_fast_secs),
            (
                "timing.spontaneous_medium_secs",
                self.timing.spontaneous_medium_secs,
            ),
            ("timing.spontaneous_slow_secs", self.timing.spontaneous_slow_secs),
        ];
        for (key, value) in periods {
            if value == 0 {
                return Err(MajlisError::InvalidConfigValue {
                    key: key.to_string(),
                    message: "Must be greater than 0".to_string(),
                });
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level_lower = self.logging.level.to_lowercase();
        if !valid_levels.contains(&level_lower.as_str()) && !level_lower.contains('=') {
            return Err(MajlisError::InvalidConfigValue {
                key: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        Ok(())
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join("default.toml"));
        paths.push(cwd.join("config").join("local.toml"));
        paths.push(cwd.join("majlis.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("majlis").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".majlis").join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".env"));
        paths.push(cwd.join(".env.local"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".majlis").join(".env"));
    }

    for path in paths {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("majlis"))
}
