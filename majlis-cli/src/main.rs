#![allow(clippy::needless_borrows_for_generic_args, clippy::useless_format)]

use clap::{Parser, Subcommand};
use colored::Colorize;
use majlis_core::{CliErrorDisplay, MajlisConfig, MajlisError, Personality};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;

use commands::{cmd_chat, cmd_participants, cmd_patterns, cmd_respond, cmd_simulate};
use config::{load_config, SimulationArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");
const REPOSITORY: &str = env!("CARGO_PKG_REPOSITORY");

#[derive(Parser)]
#[command(name = "majlis")]
#[command(version = VERSION)]
#[command(about = "Majlis - simulated meeting chat with rule-based virtual participants")]
#[command(long_about = r#"
Majlis runs a meeting chat populated by virtual participants. Each one has
a personality that decides how it answers; who speaks, when, and what they
say comes from keyword relevance, randomized delays and a small scheduler.

Use 'majlis simulate' to watch an ambient meeting, or 'majlis chat' to talk
to the participants yourself.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true, help = "Use this config file only")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run a meeting and print the simulated conversation")]
    Simulate {
        #[command(flatten)]
        simulation: SimulationArgs,

        #[arg(short, long, default_value = "60", help = "Run time in seconds")]
        duration: u64,

        #[arg(
            short,
            long,
            default_value = "text",
            help = "Output format (text, json, log)"
        )]
        format: String,
    },

    #[command(about = "Chat with the virtual participants from stdin")]
    Chat {
        #[command(flatten)]
        simulation: SimulationArgs,

        #[arg(
            long,
            default_value = "6",
            help = "Seconds to keep listening after input ends"
        )]
        linger: u64,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Generate and show a participant pool")]
    Participants {
        #[command(flatten)]
        simulation: SimulationArgs,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Generate a single response to a trigger")]
    Respond {
        #[arg(help = "Trigger text")]
        trigger: String,

        #[arg(short = 'P', long, help = "Personality that answers")]
        personality: Personality,

        #[arg(long, help = "Seed for a reproducible response")]
        seed: Option<u64>,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "List the message pattern tables")]
    Patterns {
        #[arg(short = 'P', long, help = "Only this personality")]
        personality: Option<Personality>,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Show the effective configuration")]
    Config {
        #[arg(short, long, default_value = "text", help = "Output format (text, toml, json)")]
        format: String,
    },

    #[command(about = "Show version information")]
    Version {
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            print_error(&e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(cli.verbose, &config);

    match run(cli, config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn print_error(error: &anyhow::Error) {
    match error.chain().find_map(|e| e.downcast_ref::<MajlisError>()) {
        Some(majlis) => eprint!("{}: {}", "Error".red().bold(), CliErrorDisplay::new(majlis)),
        None => eprintln!("{}: {:#}", "Error".red().bold(), error),
    }
}

fn init_logging(verbose: bool, config: &MajlisConfig) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run(cli: Cli, mut config: MajlisConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Simulate {
            simulation,
            duration,
            format,
        } => {
            simulation.apply(&mut config)?;
            cmd_simulate(config, duration, &format).await
        }
        Commands::Chat {
            simulation,
            linger,
            format,
        } => {
            simulation.apply(&mut config)?;
            cmd_chat(config, linger, &format).await
        }
        Commands::Participants { simulation, format } => {
            simulation.apply(&mut config)?;
            cmd_participants(&config, &format)
        }
        Commands::Respond {
            trigger,
            personality,
            seed,
            format,
        } => {
            if seed.is_some() {
                config.simulation.seed = seed;
            }
            cmd_respond(&config, &trigger, personality, &format)
        }
        Commands::Patterns {
            personality,
            format,
        } => cmd_patterns(personality, &format),
        Commands::Config { format } => cmd_config(&config, &format),
        Commands::Version { detailed } => cmd_version(detailed),
    }
}

fn cmd_config(config: &MajlisConfig, format: &str) -> anyhow::Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(config)?),
        "toml" => print!("{}", toml::to_string_pretty(config)?),
        _ => {
            println!("{}", "Majlis Configuration".cyan().bold());
            println!("{}", "═".repeat(40).dimmed());
            println!();

            println!("  {}", "Logging".yellow().bold());
            println!("    Level:               {}", config.logging.level);
            println!("    JSON format:         {}", config.logging.json_format);
            println!();

            let sim = &config.simulation;
            println!("  {}", "Simulation".yellow().bold());
            println!("    Message speed:       {}", sim.message_speed);
            println!("    Conversation type:   {}", sim.conversation_type);
            println!("    Participants:        {}", sim.participant_count);
            println!(
                "    Seed:                {}",
                sim.seed
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "random".to_string())
            );
            println!("    Active ratio:        {}", sim.active_ratio);
            println!("    Spontaneous chance:  {}", sim.spontaneous_probability);
            println!("    Follow-up chance:    {}", sim.follow_up_probability);
            println!("    Follow-up depth:     {}", sim.max_follow_up_depth);
            println!("    Welcome limit:       {}", sim.welcome_limit);
            println!();

            let timing = &config.timing;
            println!("  {}", "Timing".yellow().bold());
            println!(
                "    Min interval:        {}ms / {}ms / {}ms (fast / medium / slow)",
                timing.min_interval_fast_ms, timing.min_interval_medium_ms, timing.min_interval_slow_ms
            );
            println!(
                "    Spontaneous every:   {}s / {}s / {}s (fast / medium / slow)",
                timing.spontaneous_fast_secs,
                timing.spontaneous_medium_secs,
                timing.spontaneous_slow_secs
            );
            println!(
                "    Fallback delay:      {}ms + up to {}ms",
                timing.fallback_delay_ms, timing.fallback_jitter_ms
            );
            println!(
                "    Follow-up delay:     {}ms - {}ms",
                timing.follow_up_min_ms, timing.follow_up_max_ms
            );
            println!(
                "    Welcome stagger:     {}ms + up to {}ms",
                timing.welcome_stagger_ms, timing.welcome_jitter_ms
            );

            if let Some(dir) = majlis_core::get_config_dir() {
                println!();
                println!(
                    "  {} {}",
                    "User config:".dimmed(),
                    dir.join("config.toml").display()
                );
            }
        }
    }
    Ok(())
}

fn cmd_version(detailed: bool) -> anyhow::Result<()> {
    if detailed {
        println!("{}", "Majlis Version Information".cyan().bold());
        println!("{}", "═".repeat(40).dimmed());
        println!("  {:<15} {}", "Version:".bold(), VERSION);
        println!("  {:<15} {}", "Name:".bold(), NAME);
        println!("  {:<15} Apache-2.0", "License:".bold());
        println!("  {:<15} {}", "Repository:".bold(), REPOSITORY);
        println!();
        println!("  {}", "Personalities:".bold());
        for personality in Personality::ALL {
            println!("    • {}", personality);
        }
        println!();
        println!("  {}", "Build Information:".bold());
        println!("    Rust Edition: 2021");
        #[cfg(debug_assertions)]
        println!("    Build:        Debug");
        #[cfg(not(debug_assertions))]
        println!("    Build:        Release");
    } else {
        println!("majlis {}", VERSION);
    }

    Ok(())
}
