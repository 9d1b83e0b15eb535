// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Workspace bootstrap command

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use orgdeploy_core::application::{BootstrapWorkspaceUseCase, StandardBootstrapWorkspaceUseCase};
use orgdeploy_core::infrastructure::event_bus::EventBus;
use orgdeploy_core::infrastructure::OrganizationManifest;

use super::{build_client, load_config, spawn_event_printer};

#[derive(Args)]
pub struct BootstrapArgs {
    /// Organization manifest listing the agents and their plan files
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,
}

pub async fn execute(args: BootstrapArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_override)?;
    let manifest = OrganizationManifest::parse_file(&args.manifest)
        .with_context(|| format!("Failed to load organization manifest {:?}", args.manifest))?;
    let agents = manifest
        .load_agents()
        .context("Failed to read agent plans")?;

    let client = build_client(&config)?;
    let event_bus = Arc::new(EventBus::with_default_capacity());
    let printer = spawn_event_printer(&event_bus);

    let use_case = StandardBootstrapWorkspaceUseCase::new(client, event_bus);
    let result = use_case
        .bootstrap_workspace(&manifest.organization, &agents)
        .await;
    drop(use_case);
    printer.await.ok();

    let receipt = result.context("Workspace bootstrap failed")?;
    println!(
        "{}",
        format!(
            "✓ Workspace '{}' ready with {} agents",
            config.runtime.workspace, receipt.agents
        )
        .green()
    );
    Ok(())
}
