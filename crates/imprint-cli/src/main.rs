//! Imprint CLI - Headless Fingerprinting Toolkit
//!
//! Features:
//! - Fingerprint a local asset through the full generation pipeline
//! - Probe media streams (frame rate, frame count, dimensions, duration)
//! - Compare two perceptual hashes by Hamming distance

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

/// Imprint CLI - content fingerprinting toolkit
#[derive(Parser)]
#[command(name = "imprint")]
#[command(author = "Imprint Media")]
#[command(version)]
#[command(about = "Content fingerprinting and similarity toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fingerprint a local file through the generation pipeline
    Hash {
        /// Input file
        input: PathBuf,

        /// Asset type (image, audio, video, text); guessed from the
        /// extension when omitted
        #[arg(short = 't', long = "type")]
        declared_type: Option<String>,

        /// User id recorded on the fingerprint
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Probe a media file's stream properties
    Probe {
        /// Input video file
        input: PathBuf,
    },

    /// Hamming distance between two hex-encoded perceptual hashes
    Compare {
        /// First hash
        left: String,

        /// Second hash
        right: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt().with_env_filter(level).init();
    imprint_core::init();

    match cli.command {
        Commands::Hash {
            input,
            declared_type,
            user,
        } => {
            commands::hash(&input, declared_type, &user, cli.json).await?;
        }
        Commands::Probe { input } => {
            commands::probe(&input, cli.json)?;
        }
        Commands::Compare { left, right } => {
            commands::compare(&left, &right, cli.json)?;
        }
    }

    Ok(())
}
