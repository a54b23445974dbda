//! FlashGuard Control - CLI for the evacuation dispatch gate
//!
//! stdout carries results (human or `--json`); diagnostics go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use flashguard_common::FlashGuardConfig;
use flashguardctl::cli::Cli;
use flashguardctl::commands::Session;
use flashguardctl::errors::{exit_code_for, EXIT_INVOCATION_MISUSE, EXIT_SUCCESS};
use flashguardctl::logging::init_tracing;
use owo_colors::OwoColorize;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also arrive here
            let _ = e.print();
            let code = if e.use_stderr() {
                EXIT_INVOCATION_MISUSE
            } else {
                EXIT_SUCCESS
            };
            std::process::exit(code);
        }
    };

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".bright_red(), e);
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> Result<i32> {
    let config = FlashGuardConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(&config.logging.level, cli.verbose);

    let session = Session::from_config(cli, &config)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    session.execute(&cli.command, &mut out)
}
