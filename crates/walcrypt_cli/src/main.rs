//! walcrypt CLI
//!
//! Command-line tools for encrypted WAL segments.
//!
//! # Commands
//!
//! - `keygen` - Generate a WAL key file
//! - `inspect` - Display a segment's long page header
//! - `decrypt` - Write a plaintext copy of a segment
//! - `encrypt` - Write an encrypted copy of a plaintext segment

mod commands;

use clap::{Parser, Subcommand};
use commands::SegmentArgs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Tools for encrypted WAL segments.
#[derive(Parser)]
#[command(name = "walcrypt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random WAL key file
    Keygen {
        /// Where to write the key (must not exist)
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Display a segment's long page header
    Inspect {
        /// Segment file
        segment: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write a plaintext copy of a segment
    Decrypt {
        #[command(flatten)]
        args: SegmentArgs,
    },

    /// Write an encrypted copy of a plaintext segment
    Encrypt {
        #[command(flatten)]
        args: SegmentArgs,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Keygen { out } => {
            commands::keygen::run(&out)?;
        }
        Commands::Inspect { segment, format } => {
            commands::inspect::run(&segment, &format)?;
        }
        Commands::Decrypt { args } => {
            commands::decrypt::run(&args)?;
        }
        Commands::Encrypt { args } => {
            commands::encrypt::run(&args)?;
        }
        Commands::Version => {
            println!("walcrypt CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("walcrypt core v{}", walcrypt_core::VERSION);
        }
    }

    Ok(())
}
