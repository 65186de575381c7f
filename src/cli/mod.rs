//! CLI module for intent-memo
//!
//! Provides subcommands for talking to the memoizing assistant:
//! - `chat`: interactive line-oriented session (default)
//! - `ask`: answer a single query and exit
//! - `stats`: print cache occupancy

pub mod ask;
pub mod chat;
pub mod stats;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::warn;

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// intent-memo - memoizing response layer for a conversational assistant
#[derive(Parser)]
#[command(name = "intent-memo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Overrides applied on top of file and environment configuration
#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Start in simulation mode
    #[arg(long, global = true)]
    pub simulation: bool,

    /// Cache snapshot path (`:memory:` keeps nothing on disk)
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Interactive session (default)
    Chat,

    /// Answer one query and exit
    Ask(ask::AskArgs),

    /// Print cache occupancy as JSON
    Stats,
}

/// Loads configuration, applies CLI overrides and initializes logging
pub fn init(global: &GlobalArgs) -> AppConfig {
    dotenvy::dotenv().ok();

    let loaded = AppConfig::load();
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => AppConfig::default(),
    };

    if global.simulation {
        config.simulation.enabled = true;
    }
    if let Some(path) = &global.store {
        config.cache.store_path = path.clone();
    }

    logging::init_logging(&config.logging);

    if let Err(e) = loaded {
        warn!(error = %e, "Invalid configuration, using defaults");
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "intent-memo",
            "ask",
            "what",
            "is",
            "phishing",
            "--store",
            ":memory:",
        ])
        .unwrap();

        assert_eq!(cli.global.store, Some(PathBuf::from(":memory:")));
        match cli.command {
            Some(Command::Ask(args)) => assert_eq!(args.query(), "what is phishing"),
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_defaults_to_chat() {
        let cli = Cli::try_parse_from(["intent-memo", "--simulation"]).unwrap();
        assert!(cli.global.simulation);
        assert!(cli.command.is_none());
    }
}
