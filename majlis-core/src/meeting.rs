use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::MajlisConfig;
use crate::engine::{ConversationEngine, EngineState};
use crate::error::{MajlisError, MajlisResult};
use crate::events::DynEventSink;
use crate::models::SimulationSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingSummary {
    pub id: Uuid,
    pub state: EngineState,
    pub participants: usize,
    pub active_participants: usize,
    pub opened_at: DateTime<Utc>,
}

struct MeetingEntry {
    engine: ConversationEngine,
    opened_at: DateTime<Utc>,
}

/// One conversation engine per open meeting, all delivering to one sink.
pub struct MeetingRegistry {
    config: MajlisConfig,
    sink: DynEventSink,
    meetings: RwLock<HashMap<Uuid, MeetingEntry>>,
    opened: AtomicU64,
}

impl MeetingRegistry {
    pub fn new(config: MajlisConfig, sink: DynEventSink) -> Self {
        Self {
            config,
            sink,
            meetings: RwLock::new(HashMap::new()),
            opened: AtomicU64::new(0),
        }
    }

    /// Creates an engine, starts its spontaneous ticker and schedules the
    /// welcome sequence.
    pub async fn open(&self, settings: Option<SimulationSettings>) -> MajlisResult<Uuid> {
        let mut config = self.config.clone();
        if let Some(settings) = settings {
            config.simulation.message_speed = settings.message_speed;
            config.simulation.conversation_type = settings.conversation_type;
        }

        // Each meeting gets its own stream when a base seed is configured.
        let ordinal = self.opened.fetch_add(1, Ordering::Relaxed);
        if let Some(seed) = config.simulation.seed {
            config.simulation.seed = Some(seed.wrapping_add(ordinal));
        }

        let engine = ConversationEngine::from_config(&config, self.sink.clone());
        engine.start().await?;
        engine.start_meeting().await?;

        let id = engine.meeting_id();
        self.meetings.write().await.insert(
            id,
            MeetingEntry {
                engine,
                opened_at: Utc::now(),
            },
        );

        info!("Opened meeting {}", id);
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> MajlisResult<ConversationEngine> {
        self.meetings
            .read()
            .await
            .get(&id)
            .map(|entry| entry.engine.clone())
            .ok_or_else(|| MajlisError::MeetingNotFound(id.to_string()))
    }

    pub async fn close(&self, id: Uuid) -> MajlisResult<()> {
        let entry = self.meetings.write().await.remove(&id);
        match entry {
            Some(entry) => {
                entry.engine.destroy().await;
                info!("Closed meeting {}", id);
                Ok(())
            }
            None => {
                warn!("Attempted to close unknown meeting {}", id);
                Err(MajlisError::MeetingNotFound(id.to_string()))
            }
        }
    }

    pub async fn close_all(&self) -> usize {
        let entries: Vec<MeetingEntry> = self
            .meetings
            .write()
            .await
            .drain()
            .map(|(_, entry)| entry)
            .collect();

        for entry in &entries {
            entry.engine.destroy().await;
        }
        if !entries.is_empty() {
            info!("Closed {} meetings", entries.len());
        }
        entries.len()
    }

    pub async fn list(&self) -> Vec<MeetingSummary> {
        let engines: Vec<(ConversationEngine, DateTime<Utc>)> = self
            .meetings
            .read()
            .await
            .values()
            .map(|entry| (entry.engine.clone(), entry.opened_at))
            .collect();

        let mut summaries = Vec::with_capacity(engines.len());
        for (engine, opened_at) in engines {
            summaries.push(MeetingSummary {
                id: engine.meeting_id(),
                state: engine.state().await,
                participants: engine.participants().await.len(),
                active_participants: engine.active_participants().await.len(),
                opened_at,
            });
        }
        summaries.sort_by_key(|s| s.opened_at);
        summaries
    }

    pub async fn len(&self) -> usize {
        self.meetings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.meetings.read().await.is_empty()
    }
}
