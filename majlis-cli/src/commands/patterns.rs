use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use majlis_core::{
    generic_responses, keyword_relevance, normalize, patterns_for, ConversationContext,
    MajlisConfig, Personality, ResponseGenerator,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub fn cmd_patterns(personality: Option<Personality>, format: &str) -> Result<()> {
    let personalities: Vec<Personality> = match personality {
        Some(p) => vec![p],
        None => Personality::ALL.to_vec(),
    };

    if format == "json" {
        let output: Vec<_> = personalities
            .iter()
            .map(|p| {
                serde_json::json!({
                    "personality": p,
                    "patterns": patterns_for(*p),
                    "generic_responses": generic_responses(*p),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "Message Patterns".cyan().bold());
    println!("{}", "═".repeat(80).dimmed());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Personality").fg(Color::Cyan),
            Cell::new("Keywords").fg(Color::Cyan),
            Cell::new("Priority").fg(Color::Cyan),
            Cell::new("Delay").fg(Color::Cyan),
            Cell::new("Responses").fg(Color::Cyan),
        ]);

    for p in &personalities {
        for pattern in patterns_for(*p) {
            table.add_row(vec![
                Cell::new(p.to_string()),
                Cell::new(pattern.triggers.join("، ")),
                Cell::new(pattern.priority),
                Cell::new(format!("{}ms", pattern.delay_ms)),
                Cell::new(pattern.responses.len()),
            ]);
        }
        table.add_row(vec![
            Cell::new(p.to_string()),
            Cell::new("(generic)").fg(Color::DarkGrey),
            Cell::new("-"),
            Cell::new("fallback"),
            Cell::new(generic_responses(*p).len()),
        ]);
    }

    println!("{}", table);
    Ok(())
}

pub fn cmd_respond(
    config: &MajlisConfig,
    trigger: &str,
    personality: Personality,
    format: &str,
) -> Result<()> {
    let mut rng = match config.simulation.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let generator = ResponseGenerator::new(config.timing.clone());
    let mut context = ConversationContext::new();

    let Some(response) = generator.respond(trigger, personality, &mut context, &mut rng) else {
        anyhow::bail!("No response available for {}", personality);
    };

    let normalized = normalize(trigger);
    if format == "json" {
        let relevance: serde_json::Map<String, serde_json::Value> = Personality::ALL
            .iter()
            .map(|p| {
                (
                    p.name().to_string(),
                    keyword_relevance(&normalized, *p).into(),
                )
            })
            .collect();
        let output = serde_json::json!({
            "personality": personality,
            "message": response.message,
            "delay_ms": response.delay.as_millis() as u64,
            "source": response.source,
            "relevance": relevance,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} {}", "→".blue(), response.message.bold());
    println!();
    println!(
        "  {:<14} {}",
        "Personality:".dimmed(),
        personality.to_string().cyan()
    );
    println!(
        "  {:<14} {}ms",
        "Delay:".dimmed(),
        response.delay.as_millis()
    );
    println!("  {:<14} {:?}", "Source:".dimmed(), response.source);
    println!();
    println!("  {}", "Keyword relevance".yellow().bold());
    for p in Personality::ALL {
        println!("    {:<14} {:>3}", p.name(), keyword_relevance(&normalized, p));
    }
    Ok(())
}
