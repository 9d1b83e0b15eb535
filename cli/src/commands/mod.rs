// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the orgdeploy CLI

pub mod bootstrap;
pub mod config;
pub mod deploy;
pub mod plan;

pub use self::bootstrap::BootstrapArgs;
pub use self::config::ConfigCommand;
pub use self::deploy::DeployArgs;
pub use self::plan::PlanArgs;

use anyhow::{Context, Result};
use colored::Colorize;
use orgdeploy_core::domain::deployer_config::{DeployerConfig, DeployerConfigManifest};
use orgdeploy_core::domain::events::DeploymentEvent;
use orgdeploy_core::infrastructure::event_bus::{EventBus, EventBusError};
use orgdeploy_core::infrastructure::runtime_client::HttpProvisioningClient;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Load, override and validate the deployer configuration.
pub(crate) fn load_config(config_override: Option<PathBuf>) -> Result<DeployerConfig> {
    let manifest = DeployerConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    manifest
        .validate()
        .context("Configuration validation failed")?;
    Ok(manifest.spec)
}

pub(crate) fn build_client(config: &DeployerConfig) -> Result<Arc<HttpProvisioningClient>> {
    let client = HttpProvisioningClient::new(
        config.runtime.clone(),
        config.bootstrap.clone(),
        config.organization.org_board_class.clone(),
    )
    .context("Failed to build runtime client")?;
    Ok(Arc::new(client))
}

/// Print deployment events as they arrive until the bus closes.
pub(crate) fn spawn_event_printer(event_bus: &EventBus) -> JoinHandle<()> {
    let mut events = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    })
}

fn print_event(event: &DeploymentEvent) {
    match event {
        DeploymentEvent::DeploymentStarted {
            deployment_id,
            organization,
            group_count,
            ..
        } => println!(
            "{} {} ({} groups) [{}]",
            "▶".cyan(),
            organization.bold(),
            group_count,
            deployment_id.to_string().dimmed()
        ),
        DeploymentEvent::PhaseCompleted {
            phase, operations, ..
        } => println!("  {} {} ({} operations)", "✓".green(), phase, operations),
        DeploymentEvent::PhaseFailed { phase, error, .. } => {
            println!("  {} {}: {}", "✗".red(), phase, error)
        }
        DeploymentEvent::DeploymentIssued { organization, .. } => println!(
            "  {} {} issued, governance activation pending",
            "…".yellow(),
            organization
        ),
        DeploymentEvent::GovernanceActivated { scheme_target, .. } => println!(
            "  {} governance active on '{}'",
            "✓".green(),
            scheme_target
        ),
        DeploymentEvent::GovernanceFailed { error, .. } => {
            println!("  {} governance activation: {}", "✗".red(), error)
        }
    }
}
