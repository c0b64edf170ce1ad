//! Command-line argument parsing for bidrag
//!
//! Global flags override the config file; subcommands pick the phase.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// bidrag - semantic search and grounded answers over procurement bids
#[derive(Parser, Debug)]
#[command(name = "bidrag")]
#[command(version)]
#[command(about = "Search past procurement bids and get grounded summaries from a local model", long_about = None)]
pub struct Args {
    /// Ollama model to use
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Ollama host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Ollama port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Qdrant gRPC URL
    #[arg(long, global = true)]
    pub qdrant_url: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand, `chat` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Embed the corpus and rebuild the vector index
    Build {
        /// Corpus JSON file (defaults to the configured path)
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// Start the interactive question loop
    Chat,

    /// Check Ollama, the model and the index
    Doctor,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Subcommand to run
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat)
    }

    /// Apply command-line overrides on top of the loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.ollama.model = model.clone();
        }
        if let Some(host) = &self.host {
            config.ollama.host = host.clone();
        }
        if let Some(port) = self.port {
            config.ollama.port = port;
        }
        if let Some(url) = &self.qdrant_url {
            config.qdrant.url = url.clone();
        }
        if let Some(Commands::Build {
            corpus: Some(path),
        }) = &self.command
        {
            config.data.corpus_path = path.clone();
        }
    }
}

impl Verbosity {
    /// Default `tracing` filter, overridden by `RUST_LOG`
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
            Verbosity::VeryVerbose => "debug",
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
