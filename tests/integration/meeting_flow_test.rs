use async_trait::async_trait;
use majlis_core::{
    ConversationEngine, ConversationEvent, ConversationType, EngineState, EventSink, MajlisConfig,
    MeetingRegistry, MessageKind, MessageSpeed, ParticipantPool, ParticipantStatus,
    SimulationSettings,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<ConversationEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<ConversationEvent> {
        self.events.lock().unwrap().clone()
    }

    fn messages_for(&self, meeting: Uuid) -> Vec<ConversationEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.is_message() && e.meeting_id() == meeting)
            .collect()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn deliver(&self, event: ConversationEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn lively_config() -> MajlisConfig {
    let mut config = MajlisConfig::default();
    config.simulation.seed = Some(2024);
    config.simulation.active_ratio = 1.0;
    config.simulation.spontaneous_probability = 1.0;
    config.simulation.message_speed = MessageSpeed::Fast;
    config
}

mod registry_flow_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_meetings_deliver_independently() {
        let sink = Arc::new(RecordingSink::default());
        let registry = MeetingRegistry::new(lively_config(), sink.clone());

        let first = registry.open(None).await.unwrap();
        let second = registry.open(None).await.unwrap();

        sleep(Duration::from_secs(12)).await;
        assert!(!sink.messages_for(first).is_empty());
        assert!(!sink.messages_for(second).is_empty());

        registry.close(first).await.unwrap();
        let closed_count = sink.messages_for(first).len();
        let open_count = sink.messages_for(second).len();

        sleep(Duration::from_secs(60)).await;
        assert_eq!(sink.messages_for(first).len(), closed_count);
        assert!(sink.messages_for(second).len() > open_count);

        assert_eq!(registry.close_all().await, 1);
        let total = sink.events().len();
        sleep(Duration::from_secs(60)).await;
        assert_eq!(sink.events().len(), total);
    }

    #[tokio::test(start_paused = true)]
    async fn test_welcome_then_ambient_conversation() {
        let sink = Arc::new(RecordingSink::default());
        let registry = MeetingRegistry::new(lively_config(), sink.clone());
        let meeting = registry.open(None).await.unwrap();

        sleep(Duration::from_secs(30)).await;
        let kinds: Vec<MessageKind> = sink
            .messages_for(meeting)
            .iter()
            .filter_map(|e| e.as_message().map(|m| m.kind))
            .collect();

        let welcomes = kinds.iter().filter(|k| **k == MessageKind::Welcome).count();
        assert_eq!(welcomes, 3);
        assert!(kinds.contains(&MessageKind::Spontaneous));
        assert_eq!(kinds[0], MessageKind::Welcome);

        registry.close(meeting).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_override_per_meeting() {
        let sink = Arc::new(RecordingSink::default());
        let registry = MeetingRegistry::new(MajlisConfig::default(), sink);

        let id = registry
            .open(Some(SimulationSettings {
                message_speed: MessageSpeed::Slow,
                conversation_type: ConversationType::Formal,
            }))
            .await
            .unwrap();
        let engine = registry.get(id).await.unwrap();
        let settings = engine.settings().await;

        assert_eq!(settings.message_speed, MessageSpeed::Slow);
        assert_eq!(settings.conversation_type, ConversationType::Formal);
        assert_eq!(registry.list().await[0].state, EngineState::Listening);
    }
}

mod host_flow_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_host_toggles_and_resets_during_meeting() {
        let sink = Arc::new(RecordingSink::default());
        let mut config = lively_config();
        config.simulation.spontaneous_probability = 0.0;
        config.simulation.follow_up_probability = 0.0;

        let mut rng = StdRng::seed_from_u64(1);
        let pool = ParticipantPool::generate(3, 1.0, &mut rng);
        let engine = ConversationEngine::new(&config, pool, sink.clone(), rng);
        engine.start().await.unwrap();

        for participant in engine.participants().await {
            let status = engine.toggle_participant(participant.id).await.unwrap();
            assert_eq!(status, ParticipantStatus::Away);
        }
        assert!(engine.submit_trigger("مرحبا").await.is_none());

        let mut responders: HashMap<Uuid, usize> = HashMap::new();
        let fresh = engine.reset_participants(5).await.unwrap();
        let active = fresh.iter().filter(|p| p.status == ParticipantStatus::Active).count();
        assert_eq!(active, 5);

        for round in 0..5 {
            let response = engine
                .submit_trigger(&format!("جولة {}", round))
                .await
                .expect("gate reopens between rounds");
            *responders.entry(response.participant.id).or_default() += 1;
            sleep(Duration::from_secs(3)).await;
        }
        assert!(responders.keys().all(|id| fresh.iter().any(|p| p.id == *id)));

        sleep(Duration::from_secs(10)).await;
        let stats = engine.stats().await;
        assert_eq!(stats.triggers_accepted, 5);
        assert_eq!(stats.messages_emitted, 5);
        assert_eq!(stats.dropped_no_selection, 1);

        engine.destroy().await;
        assert_eq!(engine.pending_tasks(), 0);
    }
}
