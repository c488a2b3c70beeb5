use anyhow::Result;
use colored::Colorize;
use majlis_core::{
    ChannelSink, ConversationEngine, ConversationEvent, EngineStats, MajlisConfig, MessageKind,
    TracingSink, VirtualParticipant,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::sleep;
use tracing::{debug, info};

use super::participants::print_participant_table;

pub async fn cmd_simulate(config: MajlisConfig, duration_secs: u64, format: &str) -> Result<()> {
    if format == "log" {
        return simulate_to_log(config, duration_secs).await;
    }

    let json = format == "json";
    let (sink, mut events) = ChannelSink::channel();
    let engine = ConversationEngine::from_config(&config, Arc::new(sink));

    if !json {
        print_meeting_header(&engine, &config).await;
    }

    engine.start().await?;
    engine.start_meeting().await?;

    let deadline = sleep(Duration::from_secs(duration_secs));
    tokio::pin!(deadline);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = &mut interrupted => {
                debug!("Interrupted, closing meeting");
                break;
            }
            Some(event) = events.recv() => print_event(&event, json)?,
        }
    }

    engine.destroy().await;
    drain_events(&mut events, json)?;

    if !json {
        print_stats(&engine.stats().await);
    }
    Ok(())
}

/// Runs the meeting with events written to the tracing log instead of stdout.
async fn simulate_to_log(config: MajlisConfig, duration_secs: u64) -> Result<()> {
    let engine = ConversationEngine::from_config(&config, Arc::new(TracingSink));
    engine.start().await?;
    engine.start_meeting().await?;

    tokio::select! {
        _ = sleep(Duration::from_secs(duration_secs)) => {}
        _ = tokio::signal::ctrl_c() => debug!("Interrupted, closing meeting"),
    }

    engine.destroy().await;
    let stats = engine.stats().await;
    info!(
        meeting = %engine.meeting_id(),
        triggers_accepted = stats.triggers_accepted,
        messages_emitted = stats.messages_emitted,
        follow_ups_emitted = stats.follow_ups_emitted,
        "Meeting closed"
    );
    Ok(())
}

pub async fn cmd_chat(config: MajlisConfig, linger_secs: u64, format: &str) -> Result<()> {
    let json = format == "json";
    let (sink, mut events) = ChannelSink::channel();
    let engine = ConversationEngine::from_config(&config, Arc::new(sink));

    if !json {
        print_meeting_header(&engine, &config).await;
        println!(
            "  {} Type a message and press enter. {} lists commands.",
            "→".blue(),
            "/help".cyan()
        );
        println!();
    }

    engine.start().await?;
    engine.start_meeting().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Some(command) = line.strip_prefix('/') {
                    if !run_chat_command(&engine, command, json).await? {
                        break;
                    }
                    continue;
                }
                drain_events(&mut events, json)?;
                if engine.submit_trigger(line).await.is_none() && !json {
                    println!("  {}", "(no one answered)".dimmed());
                }
            }
            Some(event) = events.recv() => print_event(&event, json)?,
        }
    }

    if linger_secs > 0 {
        let linger = sleep(Duration::from_secs(linger_secs));
        tokio::pin!(linger);
        loop {
            tokio::select! {
                _ = &mut linger => break,
                Some(event) = events.recv() => print_event(&event, json)?,
            }
        }
    }

    engine.destroy().await;
    drain_events(&mut events, json)?;

    if !json {
        print_stats(&engine.stats().await);
    }
    Ok(())
}

/// Returns false when the session should end.
async fn run_chat_command(engine: &ConversationEngine, command: &str, json: bool) -> Result<bool> {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    match (name, arg) {
        ("quit" | "exit", _) => return Ok(false),
        ("participants", _) => {
            let participants = engine.participants().await;
            if json {
                println!("{}", serde_json::to_string(&participants)?);
            } else {
                print_participant_table(&participants);
            }
        }
        ("toggle", Some(index)) => {
            let participants = engine.participants().await;
            let Some(participant) = index
                .parse::<usize>()
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| participants.get(i))
            else {
                println!("  {} No participant #{}", "!".yellow(), index);
                return Ok(true);
            };
            let status = engine.toggle_participant(participant.id).await?;
            println!("  {} {} is now {}", "✓".green(), participant.name, status);
        }
        ("speed", Some(value)) => {
            let mut settings = engine.settings().await;
            settings.message_speed = value.parse()?;
            engine.update_settings(settings).await?;
            println!("  {} Speed set to {}", "✓".green(), settings.message_speed);
        }
        ("type", Some(value)) => {
            let mut settings = engine.settings().await;
            settings.conversation_type = value.parse()?;
            engine.update_settings(settings).await?;
            println!(
                "  {} Conversation type set to {}",
                "✓".green(),
                settings.conversation_type
            );
        }
        ("reset", count) => {
            let count = match count {
                Some(value) => value.parse()?,
                None => engine.participants().await.len(),
            };
            let participants = engine.reset_participants(count).await?;
            println!(
                "  {} Pool reset with {} participants",
                "✓".green(),
                participants.len()
            );
        }
        ("stats", _) => {
            let stats = engine.stats().await;
            if json {
                println!("{}", serde_json::to_string(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
        _ => print_chat_help(),
    }
    Ok(true)
}

fn print_chat_help() {
    println!("  {}", "Commands".yellow().bold());
    println!("    /participants        List the virtual participants");
    println!("    /toggle <n>          Cycle participant n through active, away, offline");
    println!("    /speed <speed>       slow, medium or fast");
    println!("    /type <type>         formal, friendly or technical");
    println!("    /reset [count]       Regenerate the participant pool");
    println!("    /stats               Show engine counters");
    println!("    /quit                End the meeting");
}

async fn print_meeting_header(engine: &ConversationEngine, config: &MajlisConfig) {
    println!("{}", "Majlis Meeting".cyan().bold());
    println!("{}", "═".repeat(60).dimmed());
    println!("  {:<20} {}", "Meeting:".bold(), engine.meeting_id());
    println!(
        "  {:<20} {}",
        "Speed:".bold(),
        config.simulation.message_speed
    );
    println!(
        "  {:<20} {}",
        "Conversation type:".bold(),
        config.simulation.conversation_type
    );
    if let Some(seed) = config.simulation.seed {
        println!("  {:<20} {}", "Seed:".bold(), seed);
    }
    println!();
    print_participant_table(&engine.participants().await);
    println!();
}

fn drain_events(events: &mut UnboundedReceiver<ConversationEvent>, json: bool) -> Result<()> {
    while let Ok(event) = events.try_recv() {
        print_event(&event, json)?;
    }
    Ok(())
}

pub fn print_event(event: &ConversationEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        ConversationEvent::Typing { participant, .. } => {
            println!("  {}", format!("{} is typing…", speaker(participant)).dimmed());
        }
        ConversationEvent::Message(message) => {
            let kind = match message.kind {
                MessageKind::Reply => "reply".green(),
                MessageKind::FollowUp => "follow-up".magenta(),
                MessageKind::Welcome => "welcome".cyan(),
                MessageKind::Spontaneous => "topic".yellow(),
            };
            println!(
                "{} {} [{}] {}",
                message.timestamp.format("%H:%M:%S").to_string().dimmed(),
                speaker(&message.participant).bold(),
                kind,
                message.message
            );
        }
    }
    Ok(())
}

fn speaker(participant: &VirtualParticipant) -> String {
    format!("{} {}", participant.avatar, participant.name)
}

fn print_stats(stats: &EngineStats) {
    println!();
    println!("{}", "Session Summary".cyan().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!("  Triggers received:   {:>6}", stats.triggers_received);
    println!("  Accepted:            {:>6}", stats.triggers_accepted);
    println!("  Dropped (interval):  {:>6}", stats.dropped_by_gate);
    println!("  Dropped (no one):    {:>6}", stats.dropped_no_selection);
    println!("  Messages emitted:    {:>6}", stats.messages_emitted);
    println!("  Follow-ups:          {:>6}", stats.follow_ups_emitted);
    println!("  Welcomes:            {:>6}", stats.welcomes_emitted);
}
