//! CLI module for scriptrag.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// scriptrag - drama script parsing for retrieval
///
/// Turns raw episode scripts into scene-level JSON documents and splits them
/// into cited chunks for a question answering index.
#[derive(Parser, Debug)]
#[command(name = "scriptrag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SCRIPTRAG_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse every script in a directory into per-episode JSON documents
    Prepare {
        /// Directory of raw scripts (default: pipeline.input_dir)
        #[arg(short, long)]
        input: Option<String>,

        /// Directory for episode JSON files (default: pipeline.output_dir)
        #[arg(short, long)]
        output: Option<String>,

        /// Number of files processed concurrently
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Parse a single script file and print the episode JSON
    Parse {
        /// Script file to parse
        file: String,

        /// Episode number to use instead of the one in the file name
        #[arg(short, long)]
        episode: Option<u32>,
    },

    /// Split processed episodes into chunks with citation metadata (JSON Lines)
    Chunk {
        /// Directory of episode JSON files (default: pipeline.output_dir)
        #[arg(short, long)]
        input: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,

        /// Maximum chunk length in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters shared between consecutive chunks
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },

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

    /// Show configuration file path
    Path,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
