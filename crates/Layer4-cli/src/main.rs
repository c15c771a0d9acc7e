//! Skillflow CLI - Main entry point

mod cli;

use clap::{Parser, Subcommand};
use skillflow_foundation::SkillflowConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Skillflow - turn skills into processes and run them
#[derive(Parser, Debug)]
#[command(name = "skillflow")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Skills directory (overrides config)
    #[arg(long, global = true)]
    skills_dir: Option<PathBuf>,

    /// Model to use
    #[arg(long, global = true)]
    model: Option<String>,

    /// Base URL of the completion endpoint
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// API key (overrides env and config)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the skills in the catalog
    Skills,
    /// Show the full instructions of a skill
    Show {
        /// Skill name
        name: String,
    },
    /// Add a skill to the catalog
    Add {
        /// Directory name under the skills directory
        dir: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        /// File holding the skill body
        #[arg(long)]
        body: PathBuf,
    },
    /// Show which skill would handle a request
    Match {
        /// The request
        input: String,
    },
    /// Select a skill for a request and run it
    Run {
        /// The request
        input: String,
        /// Run this skill instead of selecting one
        #[arg(long)]
        skill: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let mut config = SkillflowConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        SkillflowConfig::default()
    });

    if let Some(dir) = args.skills_dir {
        config.skills_dir = Some(dir);
    }
    if let Some(model) = args.model {
        config.provider.model = Some(model);
    }
    if let Some(base_url) = args.base_url {
        config.provider.base_url = Some(base_url);
    }
    if let Some(api_key) = args.api_key {
        config.provider.api_key = Some(api_key);
    }

    match args.command {
        Command::Skills => cli::list_skills(&config),
        Command::Show { name } => cli::show_skill(&config, &name),
        Command::Add {
            dir,
            name,
            description,
            body,
        } => cli::add_skill(&config, &dir, &name, &description, &body),
        Command::Match { input } => cli::match_skill(config, &input).await,
        Command::Run { input, skill } => cli::run(config, &input, skill.as_deref()).await,
    }
}
