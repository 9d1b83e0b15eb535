// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Organization deployment command
//!
//! Runs phases 1-5 against the runtime, then keeps the process alive until the
//! deferred governance activation has reported.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use orgdeploy_core::application::{
    BootstrapWorkspaceUseCase, DeployOrganizationUseCase, StandardBootstrapWorkspaceUseCase,
    StandardDeployOrganizationUseCase,
};
use orgdeploy_core::domain::deployer_config::DeployerConfig;
use orgdeploy_core::infrastructure::event_bus::EventBus;
use orgdeploy_core::infrastructure::OrganizationManifest;

use super::{build_client, load_config, spawn_event_printer};

#[derive(Args)]
pub struct DeployArgs {
    /// Organization manifest (YAML)
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Create the workspace and register the manifest's agents first
    #[arg(long)]
    pub bootstrap: bool,
}

pub async fn execute(args: DeployArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_override)?;
    let manifest = OrganizationManifest::parse_file(&args.manifest)
        .with_context(|| format!("Failed to load organization manifest {:?}", args.manifest))?;

    let event_bus = Arc::new(EventBus::with_default_capacity());
    let printer = spawn_event_printer(&event_bus);

    let result = run(&args, config, &manifest, event_bus).await;

    // All senders are gone once `run` returns; let the printer drain.
    printer.await.ok();
    result
}

async fn run(
    args: &DeployArgs,
    config: DeployerConfig,
    manifest: &OrganizationManifest,
    event_bus: Arc<EventBus>,
) -> Result<()> {
    let client = build_client(&config)?;

    if args.bootstrap {
        let agents = manifest
            .load_agents()
            .context("Failed to read agent plans")?;
        StandardBootstrapWorkspaceUseCase::new(client.clone(), event_bus.clone())
            .bootstrap_workspace(&manifest.organization, &agents)
            .await
            .context("Workspace bootstrap failed")?;
    }

    let use_case = StandardDeployOrganizationUseCase::new(client, Arc::new(config), event_bus);
    let receipt = use_case
        .deploy_organization(&manifest.to_batch())
        .await
        .context("Deployment failed")?;

    receipt
        .governance
        .wait()
        .await
        .context("Governance activation failed")?;

    println!(
        "{}",
        format!("✓ Organization '{}' deployed", receipt.organization).green()
    );
    Ok(())
}
