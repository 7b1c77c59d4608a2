//! CLI module for Dubba.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dubba - AI Dubbing Review and Assembly
///
/// A local-first CLI tool for reviewing AI-dubbed utterances and assembling
/// the final dubbed track. The name "Dubba" comes from the Swedish word for
/// "to dub."
#[derive(Parser, Debug)]
#[command(name = "dubba")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Apply a batch of review edits to the utterance ledger
    Apply {
        /// JSON file with create/update/delete operations
        operations: PathBuf,
    },

    /// Show the ledger and which utterances drifted since last fingerprinted
    Status,

    /// Cut per-utterance chunks from a source audio file
    Extract {
        /// Source audio file (wav, mp3, flac, m4a, ogg)
        audio: PathBuf,
    },

    /// Compose dubbed vocals and mix them with the background track
    Assemble,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
