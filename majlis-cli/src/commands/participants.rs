use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use majlis_core::{MajlisConfig, ParticipantPool, ParticipantStatus, VirtualParticipant};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub fn cmd_participants(config: &MajlisConfig, format: &str) -> Result<()> {
    let mut rng = match config.simulation.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let pool = ParticipantPool::generate(
        config.simulation.participant_count,
        config.simulation.active_ratio,
        &mut rng,
    );

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(pool.all())?);
        return Ok(());
    }

    println!("{}", "Virtual Participants".cyan().bold());
    println!("{}", "═".repeat(60).dimmed());
    println!();
    print_participant_table(pool.all());

    let counts = pool.counts_by_status();
    println!();
    println!(
        "  Total: {}  Active: {}  Away: {}  Offline: {}",
        pool.len(),
        counts.get(&ParticipantStatus::Active).unwrap_or(&0),
        counts.get(&ParticipantStatus::Away).unwrap_or(&0),
        counts.get(&ParticipantStatus::Offline).unwrap_or(&0),
    );
    Ok(())
}

pub fn print_participant_table(participants: &[VirtualParticipant]) {
    if participants.is_empty() {
        println!("{}", "No participants.".yellow());
        return;
    }

    let now = Utc::now();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").fg(Color::Cyan),
            Cell::new("Name").fg(Color::Cyan),
            Cell::new("Personality").fg(Color::Cyan),
            Cell::new("Status").fg(Color::Cyan),
            Cell::new("Joined").fg(Color::Cyan),
        ]);

    for (index, participant) in participants.iter().enumerate() {
        let status_color = match participant.status {
            ParticipantStatus::Active => Color::Green,
            ParticipantStatus::Away => Color::Yellow,
            ParticipantStatus::Offline => Color::DarkGrey,
        };
        let minutes = (now - participant.join_time).num_minutes().max(0);

        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(format!("{} {}", participant.avatar, participant.name)),
            Cell::new(participant.personality.to_string()),
            Cell::new(participant.status.to_string()).fg(status_color),
            Cell::new(format!("{}m ago", minutes)),
        ]);
    }

    println!("{}", table);
}
