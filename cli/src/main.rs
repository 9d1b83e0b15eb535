// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # orgdeploy CLI
//!
//! The `orgdeploy` binary provisions a multi-agent organization onto a
//! workspace runtime.
//!
//! ## Commands
//!
//! - `orgdeploy deploy <MANIFEST>` - Provision the organization and wait for governance
//! - `orgdeploy bootstrap <MANIFEST>` - Create the workspace and register its agents
//! - `orgdeploy plan <MANIFEST>` - Show what a deployment would issue
//! - `orgdeploy config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;

use commands::{BootstrapArgs, ConfigCommand, DeployArgs, PlanArgs};

/// Deploy multi-agent organizations onto a workspace runtime
#[derive(Parser)]
#[command(name = "orgdeploy")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "ORGDEPLOY_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "ORGDEPLOY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision an organization
    #[command(name = "deploy")]
    Deploy(DeployArgs),

    /// Create the workspace and bring the manifest's agents into it
    #[command(name = "bootstrap")]
    Bootstrap(BootstrapArgs),

    /// Print the requests a deployment would issue, without contacting the runtime
    #[command(name = "plan")]
    Plan(PlanArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Deploy(args)) => commands::deploy::execute(args, cli.config).await,
        Some(Commands::Bootstrap(args)) => commands::bootstrap::execute(args, cli.config).await,
        Some(Commands::Plan(args)) => commands::plan::execute(args, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
