//! hifz CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "hifz", version, about = "Progressive recall engine for Quran memorization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate passage TOML files
    Validate {
        /// Path to passage file or directory
        #[arg(long)]
        passage: PathBuf,
    },

    /// Show which words random_blank hides for a unit
    Preview {
        /// Unit key (e.g. "2:255")
        #[arg(long)]
        unit: String,

        /// Number of words in the unit
        #[arg(long)]
        words: usize,

        /// Difficulty, 1-5 (default: from config)
        #[arg(long)]
        difficulty: Option<i32>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Replay a session scenario and print the render plan of its current unit
    Resolve {
        /// Passage TOML file
        #[arg(long)]
        passage: PathBuf,

        /// Session scenario TOML file
        #[arg(long)]
        session: PathBuf,

        /// Score this recitation of the current unit before rendering
        #[arg(long)]
        recite: Option<String>,

        /// Output format: text, json (default: from config)
        #[arg(long)]
        format: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config, example passage and session
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hifz=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { passage } => commands::validate::execute(passage),
        Commands::Preview {
            unit,
            words,
            difficulty,
            config,
        } => commands::preview::execute(unit, words, difficulty, config),
        Commands::Resolve {
            passage,
            session,
            recite,
            format,
            config,
        } => commands::resolve::execute(passage, session, recite, format, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
