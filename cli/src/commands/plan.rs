// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Dry-run command: shows what `deploy` would issue, phase by phase.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use orgdeploy_core::application::notification_fanout::NotificationFanout;
use orgdeploy_core::domain::deployer_config::{DeployerConfig, SettlingStrategy};
use orgdeploy_core::domain::organization::{runtime_id, DeploymentBatch};
use orgdeploy_core::domain::resolver::{attachment_pairs, resolve_subgroups};
use orgdeploy_core::infrastructure::OrganizationManifest;

use super::load_config;

#[derive(Args)]
pub struct PlanArgs {
    /// Organization manifest (YAML)
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,
}

pub async fn execute(args: PlanArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_override)?;
    let manifest = OrganizationManifest::parse_file(&args.manifest)
        .with_context(|| format!("Failed to load organization manifest {:?}", args.manifest))?;

    println!("{}", format!("Deployment plan for '{}':", manifest.organization).bold());
    for line in render_plan(&manifest.to_batch(), &config) {
        println!("{}", line);
    }
    Ok(())
}

/// One header line per phase followed by its requests.
fn render_plan(batch: &DeploymentBatch, config: &DeployerConfig) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("1. organization artifact".to_string());
    lines.push(format!(
        "   {} <- {}",
        batch.organization,
        config.specification.specification_url(&batch.organization)
    ));

    lines.push(format!("2. group artifacts ({})", batch.groups.len()));
    for entity in &batch.groups {
        lines.push(format!("   {} ({})", entity.group.runtime_id(), entity.group.name));
    }

    let attachments = attachment_pairs(&resolve_subgroups(&batch.groups));
    lines.push(format!("3. subgroup attachments ({})", attachments.len()));
    for (parent, subgroup) in &attachments {
        lines.push(format!("   {} -> {}", runtime_id(subgroup), runtime_id(parent)));
    }

    let notifications = NotificationFanout::new(&config.runtime, &config.organization).requests(batch);
    lines.push(format!("4. role notifications ({})", notifications.len()));
    for request in &notifications {
        lines.push(format!("   {}", request));
    }

    lines.push("5. scheme".to_string());
    lines.push(format!("   create {} ({})", batch.scheme.id, batch.scheme.name));
    lines.push(format!(
        "   {}: attach to '{}', create {}",
        settling_condition(config, &batch.scheme.id),
        batch.scheme_target(),
        config.organization.normative_board
    ));

    lines
}

/// When the deferred governance step fires under the configured strategy.
fn settling_condition(config: &DeployerConfig, scheme_id: &str) -> String {
    let settling = &config.settling;
    let wait_ms = settling.policy().minimum_wait().as_millis();
    match settling.strategy {
        SettlingStrategy::FixedDelay => format!("after {} ms", wait_ms),
        SettlingStrategy::ReadinessProbe => format!(
            "after at least {} ms, once '{}' reports ready (every {} ms, at most {} checks)",
            wait_ms, scheme_id, settling.probe_interval_ms, settling.max_probe_attempts
        ),
    }
}
