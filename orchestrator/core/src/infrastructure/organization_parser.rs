// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Organization Manifest YAML Parser
//!
//! Parses the organization manifest handed to the CLI into a
//! [`DeploymentBatch`] and, for bootstrapping, the agents with their plan
//! scripts.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external YAML → Domain objects
//! - **Anti-Corruption:** Translates YAML schema to domain model
//!
//! # Manifest Format
//!
//! ```yaml
//! organization: smart-farming
//! scheme: { id: orgscheme, name: orgScheme }
//! groups:
//!   - name: FarmGroup
//!     subgroups: [FieldGroup, AnimalsGroup]
//!   - name: FieldGroup
//!     roles:
//!       SoilPlower: [agent7]
//! agents:
//!   - name: agent7
//!     plans: [plans/agent7.asl, plans/adopt-role.asl]
//! ```
//!
//! Plan paths are relative to the manifest's directory.

use crate::domain::agent::AgentSpec;
use crate::domain::organization::{DeploymentBatch, EntityGroup, Group, RoleAssignment, SchemeSpec};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Separator placed between concatenated plan files.
const PLAN_SEPARATOR: &str = "\n\n";

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse organization manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid organization manifest: {0}")]
    Invalid(String),
}

// ============================================================================
// YAML Schema (External Representation)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationManifest {
    pub organization: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<SchemeSpec>,

    #[serde(default)]
    pub groups: Vec<GroupManifest>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<AgentManifest>,

    /// Directory plan paths resolve against; set by [`Self::parse_file`].
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupManifest {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subgroups: Vec<String>,

    /// Role name → agent names
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub roles: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentManifest {
    pub name: String,

    #[serde(default)]
    pub plans: Vec<PathBuf>,
}

// ============================================================================
// Parser API
// ============================================================================

impl OrganizationManifest {
    pub fn parse_yaml(yaml: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_yaml::from_str(yaml)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut manifest = Self::parse_yaml(&yaml)?;
        manifest.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.organization.trim().is_empty() {
            return Err(ManifestError::Invalid("organization must not be empty".to_string()));
        }

        for group in &self.groups {
            if group.name.trim().is_empty() {
                return Err(ManifestError::Invalid("group name must not be empty".to_string()));
            }
            if let Some(role) = group.roles.keys().find(|role| role.trim().is_empty()) {
                return Err(ManifestError::Invalid(format!(
                    "group '{}' has an empty role name '{}'",
                    group.name, role
                )));
            }
            for (role, agents) in &group.roles {
                if agents.iter().any(|agent| agent.trim().is_empty()) {
                    return Err(ManifestError::Invalid(format!(
                        "role '{}' in group '{}' lists an empty agent name",
                        role, group.name
                    )));
                }
            }
        }

        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.name.trim().is_empty() {
                return Err(ManifestError::Invalid("agent name must not be empty".to_string()));
            }
            if !seen.insert(agent.name.as_str()) {
                return Err(ManifestError::Invalid(format!(
                    "agent '{}' is declared twice",
                    agent.name
                )));
            }
        }

        Ok(())
    }

    /// Domain batch. Duplicate agents within a role collapse.
    pub fn to_batch(&self) -> DeploymentBatch {
        let groups = self
            .groups
            .iter()
            .map(|group| {
                let players: RoleAssignment = group
                    .roles
                    .iter()
                    .map(|(role, agents)| {
                        (role.clone(), agents.iter().cloned().collect::<BTreeSet<_>>())
                    })
                    .collect();
                EntityGroup::new(
                    Group::new(group.name.clone()).with_subgroups(group.subgroups.iter().cloned()),
                    players,
                )
            })
            .collect();

        let batch = DeploymentBatch::new(self.organization.clone(), groups);
        match &self.scheme {
            Some(scheme) => batch.with_scheme(scheme.clone()),
            None => batch,
        }
    }

    /// Agents with their plan files read and concatenated in declaration order.
    pub fn load_agents(&self) -> Result<Vec<AgentSpec>, ManifestError> {
        self.agents
            .iter()
            .map(|agent| {
                let scripts = agent
                    .plans
                    .iter()
                    .map(|plan| {
                        let path = self.base_dir.join(plan);
                        fs::read_to_string(&path).map_err(|source| ManifestError::Io { path, source })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AgentSpec::new(agent.name.clone(), scripts.join(PLAN_SEPARATOR)))
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
