//! CLI - Command-line argument parsing
//!
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FlashGuard CLI
#[derive(Debug, Parser)]
#[command(name = "flashguardctl")]
#[command(about = "FlashGuard - evidence-gated evacuation dispatch", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Config file (overrides $FLASHGUARD_CONFIG and defaults)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Evidence table (TOML); the embedded reference table is used otherwise
    #[arg(long, global = true, value_name = "PATH")]
    pub table: Option<PathBuf>,

    /// Output JSON envelopes only
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append dispatch decisions to this JSONL file
    #[arg(long, global = true, value_name = "PATH")]
    pub audit_log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the sensor truth for a location
    Check {
        location: String,
    },

    /// Show citizen reports for a location (informational, never gates)
    Signal {
        location: String,
    },

    /// Request an evacuation dispatch
    Dispatch {
        location: String,
        /// Action plan to dispatch when authorized
        action_plan: String,
    },

    /// Resolve a location from free text and show its status board
    Ask {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Invoke an operation by name with JSON arguments
    Tool {
        /// check_primary_truth, check_secondary_signal or request_dispatch
        name: String,
        /// JSON object of arguments
        #[arg(default_value = "{}")]
        args: String,
    },

    /// List locations in the evidence table
    Locations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dispatch() {
        let cli = Cli::try_parse_from(["flashguardctl", "dispatch", "Bulacan", "Evacuate"]).unwrap();
        match cli.command {
            Commands::Dispatch { location, action_plan } => {
                assert_eq!(location, "Bulacan");
                assert_eq!(action_plan, "Evacuate");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["flashguardctl", "check", "Pasig", "--json", "-v"]).unwrap();
        assert!(cli.json);
        assert!(cli.verbose);
    }

    #[test]
    fn test_ask_joins_words() {
        let cli = Cli::try_parse_from(["flashguardctl", "ask", "check", "marikina", "please"]).unwrap();
        match cli.command {
            Commands::Ask { text } => assert_eq!(text.join(" "), "check marikina please"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_tool_args_default() {
        let cli = Cli::try_parse_from(["flashguardctl", "tool", "check_primary_truth"]).unwrap();
        match cli.command {
            Commands::Tool { args, .. } => assert_eq!(args, "{}"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_requires_plan() {
        assert!(Cli::try_parse_from(["flashguardctl", "dispatch", "Bulacan"]).is_err());
    }
}
