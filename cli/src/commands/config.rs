// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use orgdeploy_core::domain::deployer_config::{DeployerConfigManifest, SettlingStrategy};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./orgdeploy-config.yaml)
        #[arg(short, long, default_value = "./orgdeploy-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(&output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let manifest = DeployerConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. ORGDEPLOY_CONFIG_PATH: {}",
            std::env::var("ORGDEPLOY_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./orgdeploy-config.yaml");
        println!("  4. ~/.orgdeploy/config.yaml");
        println!("  5. /etc/orgdeploy/config.yaml");
        println!();
    }

    let config = &manifest.spec;
    println!("{}", format!("Current configuration ({}):", manifest.metadata.name).bold());
    println!();

    println!("{}", "Runtime:".bold());
    println!("  URL: {}", config.runtime.url);
    println!("  Workspace: {}", config.runtime.workspace);
    println!("  Caller identity: {}", config.runtime.caller_identity);
    if let Some(timeout) = config.runtime.request_timeout_seconds {
        println!("  Request timeout: {}s", timeout);
    }
    println!();

    println!("{}", "Organization:".bold());
    println!("  Specification backend: {}", config.specification.backend_url);
    println!("  Board class: {}", config.organization.org_board_class);
    println!("  Coordination group: {}", config.organization.coordination_group);
    println!("  Role prefix: {}", config.organization.role_prefix);
    println!("  Normative board: {}", config.organization.normative_board);
    println!();

    println!("{}", "Settling:".bold());
    match config.settling.strategy {
        SettlingStrategy::FixedDelay => {
            println!("  Strategy: fixed delay of {} ms", config.settling.delay_ms);
        }
        SettlingStrategy::ReadinessProbe => {
            println!("  Strategy: readiness probe");
            println!("  Minimum delay: {} ms", config.settling.delay_ms);
            println!(
                "  Probes: up to {} every {} ms",
                config.settling.max_probe_attempts, config.settling.probe_interval_ms
            );
        }
    }
    println!();

    println!("{}", "Bootstrap:".bold());
    println!("  Agent identity base: {}", config.bootstrap.agent_identity_base);
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = DeployerConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn sample(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    }
}

async fn generate(output: &Path, with_examples: bool) -> Result<()> {
    std::fs::write(output, sample(with_examples))
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
