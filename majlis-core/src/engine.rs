//! The per-meeting conversation state machine.
//!
//! A [`ConversationEngine`] owns the participant pool, the rolling context,
//! the interval gate and every timer it arms. States move
//! `Idle -> Listening -> Generating -> Cooldown -> Listening` and end in
//! `Stopped`. Generating and Cooldown only exist while the engine lock is
//! held, so observers normally see `Listening`.
//!
//! Every deferred emission carries the session generation it was scheduled
//! under. `destroy` and `reset_participants` bump the generation while
//! holding the engine lock, so an emission that already woke up cannot
//! deliver into a reset or closed session.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::config::{MajlisConfig, SimulationConfig, TimingConfig};
use crate::context::ConversationContext;
use crate::error::{MajlisError, MajlisResult};
use crate::events::{ConversationEvent, DynEventSink, GeneratedMessage, MessageKind};
use crate::generator::{ResponseGenerator, ResponseSource};
use crate::models::{ParticipantStatus, SimulationSettings, VirtualParticipant};
use crate::patterns::{SPONTANEOUS_TOPICS, WELCOME_MESSAGES};
use crate::pool::ParticipantPool;
use crate::selector::RelevanceSelector;
use crate::timer::{TaskId, TaskScheduler};

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    Listening,
    Generating,
    Cooldown,
    Stopped,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Listening => write!(f, "listening"),
            EngineState::Generating => write!(f, "generating"),
            EngineState::Cooldown => write!(f, "cooldown"),
            EngineState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Counters for one engine, reset only when the engine is recreated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub triggers_received: u64,
    pub triggers_accepted: u64,
    pub dropped_by_gate: u64,
    pub dropped_no_selection: u64,
    pub messages_emitted: u64,
    pub follow_ups_emitted: u64,
    pub welcomes_emitted: u64,
    pub started_at: DateTime<Utc>,
}

impl Default for EngineStats {
    fn default() -> Self {
        Self {
            triggers_received: 0,
            triggers_accepted: 0,
            dropped_by_gate: 0,
            dropped_no_selection: 0,
            messages_emitted: 0,
            follow_ups_emitted: 0,
            welcomes_emitted: 0,
            started_at: Utc::now(),
        }
    }
}

/// A message that has been accepted and is waiting for its delay.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledResponse {
    pub participant: VirtualParticipant,
    pub message: String,
    pub delay: Duration,
    pub kind: MessageKind,
    pub source: ResponseSource,
}

#[derive(Debug, Clone)]
struct PendingMessage {
    participant: VirtualParticipant,
    message: String,
    kind: MessageKind,
    depth: u32,
    generation: u64,
}

struct EngineInner {
    pool: ParticipantPool,
    context: ConversationContext,
    last_response: Option<Instant>,
    rng: StdRng,
    state: EngineState,
    settings: SimulationSettings,
    generation: u64,
    ticker: Option<TaskId>,
    stats: EngineStats,
}

impl EngineInner {
    fn transition(&mut self, next: EngineState) {
        if self.state != next {
            trace!(from = %self.state, to = %next, "Engine state transition");
            self.state = next;
        }
    }

    fn resting_state(&self) -> EngineState {
        if self.pool.is_empty() {
            EngineState::Idle
        } else {
            EngineState::Listening
        }
    }
}

struct EngineShared {
    meeting_id: Uuid,
    simulation: SimulationConfig,
    timing: TimingConfig,
    generator: ResponseGenerator,
    inner: Mutex<EngineInner>,
    timers: TaskScheduler,
    sink: DynEventSink,
}

impl Drop for EngineShared {
    fn drop(&mut self) {
        self.timers.cancel_all();
    }
}

/// Handle to one meeting's simulated conversation. Cloning shares the engine.
#[derive(Clone)]
pub struct ConversationEngine {
    shared: Arc<EngineShared>,
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("meeting_id", &self.shared.meeting_id)
            .field("sink", &self.shared.sink.name())
            .field("pending_tasks", &self.shared.timers.pending())
            .finish()
    }
}

impl ConversationEngine {
    pub fn new(
        config: &MajlisConfig,
        pool: ParticipantPool,
        sink: DynEventSink,
        rng: StdRng,
    ) -> Self {
        let mut inner = EngineInner {
            pool,
            context: ConversationContext::new(),
            last_response: None,
            rng,
            state: EngineState::Idle,
            settings: config.simulation.settings(),
            generation: 0,
            ticker: None,
            stats: EngineStats::default(),
        };
        let resting = inner.resting_state();
        inner.transition(resting);

        let meeting_id = Uuid::new_v4();
        debug!(
            meeting = %meeting_id,
            participants = inner.pool.len(),
            state = %inner.state,
            "Created conversation engine"
        );

        Self {
            shared: Arc::new(EngineShared {
                meeting_id,
                simulation: config.simulation.clone(),
                timing: config.timing.clone(),
                generator: ResponseGenerator::new(config.timing.clone()),
                inner: Mutex::new(inner),
                timers: TaskScheduler::new(),
                sink,
            }),
        }
    }

    /// Seeds the random source from `simulation.seed` when set and
    /// generates a fresh pool of `simulation.participant_count`.
    pub fn from_config(config: &MajlisConfig, sink: DynEventSink) -> Self {
        let mut rng = match config.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let pool = ParticipantPool::generate(
            config.simulation.participant_count,
            config.simulation.active_ratio,
            &mut rng,
        );
        Self::new(config, pool, sink, rng)
    }

    pub fn meeting_id(&self) -> Uuid {
        self.shared.meeting_id
    }

    /// Starts the spontaneous-topic ticker.
    pub async fn start(&self) -> MajlisResult<()> {
        let mut inner = self.shared.inner.lock().await;
        if inner.state == EngineState::Stopped {
            return Err(MajlisError::EngineStopped);
        }
        if inner.ticker.is_some() {
            return Err(MajlisError::EngineAlreadyRunning);
        }

        self.shared.arm_ticker(&mut inner);
        info!(
            meeting = %self.shared.meeting_id,
            speed = %inner.settings.message_speed,
            "Conversation engine started"
        );
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.shared.inner.lock().await.ticker.is_some()
    }

    /// Schedules welcome messages from up to `welcome_limit` active
    /// participants at strictly increasing offsets.
    pub async fn start_meeting(&self) -> MajlisResult<Vec<ScheduledResponse>> {
        let shared = &self.shared;
        let mut guard = shared.inner.lock().await;
        let inner = &mut *guard;
        if inner.state == EngineState::Stopped {
            return Err(MajlisError::EngineStopped);
        }

        let limit = shared.simulation.welcome_limit;
        let greeters: Vec<VirtualParticipant> = inner
            .pool
            .active()
            .choose_multiple(&mut inner.rng, limit)
            .map(|p| (*p).clone())
            .collect();

        // Jitter stays below one stagger step so offsets strictly increase.
        let stagger = shared.timing.welcome_stagger_ms.max(1);
        let jitter_max = shared.timing.welcome_jitter_ms.min(stagger);
        let mut scheduled = Vec::with_capacity(greeters.len());

        for (index, participant) in greeters.into_iter().enumerate() {
            let Some(text) = WELCOME_MESSAGES.choose(&mut inner.rng) else {
                break;
            };
            let jitter = if jitter_max == 0 {
                0
            } else {
                inner.rng.gen_range(0..jitter_max)
            };
            let delay = Duration::from_millis(index as u64 * stagger + jitter);

            shared.schedule_emission(
                PendingMessage {
                    participant: participant.clone(),
                    message: text.to_string(),
                    kind: MessageKind::Welcome,
                    depth: 0,
                    generation: inner.generation,
                },
                delay,
            );
            scheduled.push(ScheduledResponse {
                participant,
                message: text.to_string(),
                delay,
                kind: MessageKind::Welcome,
                source: ResponseSource::Generic,
            });
        }

        info!(
            meeting = %shared.meeting_id,
            greeters = scheduled.len(),
            "Scheduled welcome sequence"
        );
        Ok(scheduled)
    }

    /// Feeds a chat message into the engine. `None` means the trigger was
    /// dropped: engine stopped, interval gate closed, or nobody to answer.
    pub async fn submit_trigger(&self, text: &str) -> Option<ScheduledResponse> {
        let mut guard = self.shared.inner.lock().await;
        self.shared
            .accept(&mut guard, text, MessageKind::Reply)
            .await
    }

    /// One firing of the spontaneous-topic timer.
    pub async fn spontaneous_tick(&self) -> Option<ScheduledResponse> {
        self.shared.spontaneous_tick().await
    }

    pub async fn set_participant_status(
        &self,
        id: Uuid,
        status: ParticipantStatus,
    ) -> MajlisResult<()> {
        let mut inner = self.shared.inner.lock().await;
        if inner.state == EngineState::Stopped {
            return Err(MajlisError::EngineStopped);
        }
        inner.pool.set_status(id, status)?;
        debug!(participant = %id, status = %status, "Participant status changed");
        Ok(())
    }

    /// Cycles a participant through active, away and offline.
    pub async fn toggle_participant(&self, id: Uuid) -> MajlisResult<ParticipantStatus> {
        let mut inner = self.shared.inner.lock().await;
        if inner.state == EngineState::Stopped {
            return Err(MajlisError::EngineStopped);
        }
        let current = inner
            .pool
            .get(id)
            .map(|p| p.status)
            .ok_or_else(|| MajlisError::ParticipantNotFound(id.to_string()))?;
        let next = current.cycle();
        inner.pool.set_status(id, next)?;
        debug!(participant = %id, from = %current, to = %next, "Participant toggled");
        Ok(next)
    }

    /// Applies new speed/type settings; a running ticker is re-armed with
    /// the new period.
    pub async fn update_settings(&self, settings: SimulationSettings) -> MajlisResult<()> {
        let mut inner = self.shared.inner.lock().await;
        if inner.state == EngineState::Stopped {
            return Err(MajlisError::EngineStopped);
        }

        inner.settings = settings;
        if let Some(ticker) = inner.ticker.take() {
            self.shared.timers.cancel(ticker);
            self.shared.arm_ticker(&mut inner);
        }
        info!(
            meeting = %self.shared.meeting_id,
            speed = %settings.message_speed,
            conversation_type = %settings.conversation_type,
            "Simulation settings updated"
        );
        Ok(())
    }

    /// Cancels every pending timer and replaces the pool with `count` fresh
    /// participants. Context and the interval gate start over.
    pub async fn reset_participants(&self, count: usize) -> MajlisResult<Vec<VirtualParticipant>> {
        let shared = &self.shared;
        let mut guard = shared.inner.lock().await;
        let inner = &mut *guard;
        if inner.state == EngineState::Stopped {
            return Err(MajlisError::EngineStopped);
        }

        inner.generation += 1;
        let was_running = inner.ticker.take().is_some();
        let cancelled = shared.timers.cancel_all();

        inner.pool =
            ParticipantPool::generate(count, shared.simulation.active_ratio, &mut inner.rng);
        inner.context.clear();
        inner.last_response = None;
        let resting = inner.resting_state();
        inner.transition(resting);

        if was_running {
            shared.arm_ticker(inner);
        }

        info!(
            meeting = %shared.meeting_id,
            participants = inner.pool.len(),
            cancelled,
            "Participants reset"
        );
        Ok(inner.pool.all().to_vec())
    }

    /// Stops the engine for good. Nothing is delivered after this returns.
    pub async fn destroy(&self) {
        let mut inner = self.shared.inner.lock().await;
        if inner.state == EngineState::Stopped {
            return;
        }

        inner.generation += 1;
        inner.ticker = None;
        inner.transition(EngineState::Stopped);
        let cancelled = self.shared.timers.cancel_all();

        info!(
            meeting = %self.shared.meeting_id,
            cancelled,
            "Conversation engine destroyed"
        );
    }

    pub async fn state(&self) -> EngineState {
        self.shared.inner.lock().await.state
    }

    pub async fn settings(&self) -> SimulationSettings {
        self.shared.inner.lock().await.settings
    }

    pub async fn participants(&self) -> Vec<VirtualParticipant> {
        self.shared.inner.lock().await.pool.all().to_vec()
    }

    pub async fn active_participants(&self) -> Vec<VirtualParticipant> {
        let inner = self.shared.inner.lock().await;
        inner.pool.active().into_iter().cloned().collect()
    }

    pub async fn context(&self) -> Vec<String> {
        let inner = self.shared.inner.lock().await;
        inner.context.entries().map(String::from).collect()
    }

    pub async fn stats(&self) -> EngineStats {
        self.shared.inner.lock().await.stats.clone()
    }

    /// Number of timers (emissions and ticker) still armed.
    pub fn pending_tasks(&self) -> usize {
        self.shared.timers.pending()
    }
}

impl EngineShared {
    fn arm_ticker(self: &Arc<Self>, inner: &mut EngineInner) {
        let period = self.timing.spontaneous_interval(inner.settings.message_speed);
        let weak = Arc::downgrade(self);
        let id = self.timers.schedule_every(period, move || {
            let weak = weak.clone();
            async move {
                if let Some(shared) = weak.upgrade() {
                    shared.spontaneous_tick().await;
                }
            }
        });
        inner.ticker = Some(id);
    }

    async fn spontaneous_tick(self: &Arc<Self>) -> Option<ScheduledResponse> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        if inner.state == EngineState::Stopped {
            return None;
        }

        if !inner
            .rng
            .gen_bool(self.simulation.spontaneous_probability.clamp(0.0, 1.0))
        {
            trace!(meeting = %self.meeting_id, "Spontaneous tick skipped");
            return None;
        }
        let topic = *SPONTANEOUS_TOPICS.choose(&mut inner.rng)?;
        debug!(meeting = %self.meeting_id, topic, "Spontaneous topic fired");

        self.accept(inner, topic, MessageKind::Spontaneous).await
    }

    /// Runs one trigger through gate, selection and generation, and
    /// schedules the resulting message.
    async fn accept(
        self: &Arc<Self>,
        inner: &mut EngineInner,
        trigger: &str,
        kind: MessageKind,
    ) -> Option<ScheduledResponse> {
        if inner.state == EngineState::Stopped {
            return None;
        }
        inner.stats.triggers_received += 1;

        let now = Instant::now();
        let min_interval = self.timing.min_interval(inner.settings.message_speed);
        if let Some(last) = inner.last_response {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < min_interval {
                inner.stats.dropped_by_gate += 1;
                debug!(
                    meeting = %self.meeting_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    min_interval_ms = min_interval.as_millis() as u64,
                    "Trigger dropped by interval gate"
                );
                return None;
            }
        }

        inner.transition(EngineState::Generating);

        let selector = RelevanceSelector::new(inner.settings.conversation_type);
        let active = inner.pool.active();
        let chosen = selector.select(trigger, &active, &mut inner.rng).cloned();
        let Some(participant) = chosen else {
            inner.stats.dropped_no_selection += 1;
            debug!(meeting = %self.meeting_id, "No active participant to answer trigger");
            let resting = inner.resting_state();
            inner.transition(resting);
            return None;
        };

        let Some(response) = self.generator.respond(
            trigger,
            participant.personality,
            &mut inner.context,
            &mut inner.rng,
        ) else {
            inner.stats.dropped_no_selection += 1;
            inner.transition(EngineState::Listening);
            return None;
        };

        inner.last_response = Some(now);
        inner.stats.triggers_accepted += 1;
        inner.transition(EngineState::Cooldown);

        debug!(
            meeting = %self.meeting_id,
            participant = %participant.name,
            personality = %participant.personality,
            delay_ms = response.delay.as_millis() as u64,
            kind = %kind,
            "Response accepted"
        );

        self.sink
            .deliver(ConversationEvent::Typing {
                participant: participant.clone(),
                meeting_id: self.meeting_id,
                timestamp: Utc::now(),
            })
            .await;

        self.schedule_emission(
            PendingMessage {
                participant: participant.clone(),
                message: response.message.clone(),
                kind,
                depth: 0,
                generation: inner.generation,
            },
            response.delay,
        );
        inner.transition(EngineState::Listening);

        Some(ScheduledResponse {
            participant,
            message: response.message,
            delay: response.delay,
            kind,
            source: response.source,
        })
    }

    fn schedule_emission(self: &Arc<Self>, pending: PendingMessage, delay: Duration) -> TaskId {
        let weak = Arc::downgrade(self);
        self.timers.schedule_after(delay, async move {
            if let Some(shared) = weak.upgrade() {
                shared.emit(pending).await;
            }
        })
    }

    fn emit(self: Arc<Self>, pending: PendingMessage) -> BoxFuture {
        Box::pin(async move {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;
            if inner.state == EngineState::Stopped || inner.generation != pending.generation {
                trace!(meeting = %self.meeting_id, "Discarding emission from a closed session");
                return;
            }

            inner.stats.messages_emitted += 1;
            match pending.kind {
                MessageKind::FollowUp => inner.stats.follow_ups_emitted += 1,
                MessageKind::Welcome => inner.stats.welcomes_emitted += 1,
                MessageKind::Reply | MessageKind::Spontaneous => {}
            }

            self.sink
                .deliver(ConversationEvent::Message(GeneratedMessage {
                    participant: pending.participant.clone(),
                    message: pending.message.clone(),
                    timestamp: Utc::now(),
                    kind: pending.kind,
                    meeting_id: self.meeting_id,
                }))
                .await;

            if pending.kind != MessageKind::Welcome {
                self.chain_follow_up(inner, &pending).await;
            }
        })
    }

    /// Treats an emitted message as a new trigger for somebody else.
    /// Bypasses the interval gate.
    async fn chain_follow_up(self: &Arc<Self>, inner: &mut EngineInner, after: &PendingMessage) {
        if after.depth >= self.simulation.max_follow_up_depth {
            return;
        }
        if !inner
            .rng
            .gen_bool(self.simulation.follow_up_probability.clamp(0.0, 1.0))
        {
            return;
        }

        let selector = RelevanceSelector::new(inner.settings.conversation_type);
        let candidates: Vec<&VirtualParticipant> = inner
            .pool
            .active()
            .into_iter()
            .filter(|p| p.id != after.participant.id)
            .collect();
        let Some(participant) = selector
            .select(&after.message, &candidates, &mut inner.rng)
            .cloned()
        else {
            trace!(meeting = %self.meeting_id, "No one left to follow up");
            return;
        };

        let Some(response) = self.generator.respond(
            &after.message,
            participant.personality,
            &mut inner.context,
            &mut inner.rng,
        ) else {
            return;
        };

        let (min, max) = (self.timing.follow_up_min_ms, self.timing.follow_up_max_ms);
        let delay = Duration::from_millis(inner.rng.gen_range(min..=max));

        debug!(
            meeting = %self.meeting_id,
            participant = %participant.name,
            replying_to = %after.participant.name,
            depth = after.depth + 1,
            delay_ms = delay.as_millis() as u64,
            "Follow-up scheduled"
        );

        self.sink
            .deliver(ConversationEvent::Typing {
                participant: participant.clone(),
                meeting_id: self.meeting_id,
                timestamp: Utc::now(),
            })
            .await;

        self.schedule_emission(
            PendingMessage {
                participant,
                message: response.message,
                kind: MessageKind::FollowUp,
                depth: after.depth + 1,
                generation: inner.generation,
            },
            delay,
        );
    }
}
