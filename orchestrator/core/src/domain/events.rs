// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of one deployment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentId(pub Uuid);

impl DeploymentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DeploymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered stages of an organization deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentPhase {
    OrganizationArtifact,
    GroupArtifacts,
    SubgroupAttachment,
    RoleNotification,
    SchemeCreation,
    /// Deferred: runs after the settling policy, off the caller's path.
    GovernanceActivation,
    /// Workspace bootstrap stages.
    WorkspaceCreation,
    AgentRegistration,
    WorkspaceJoin,
}

impl DeploymentPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrganizationArtifact => "organization_artifact",
            Self::GroupArtifacts => "group_artifacts",
            Self::SubgroupAttachment => "subgroup_attachment",
            Self::RoleNotification => "role_notification",
            Self::SchemeCreation => "scheme_creation",
            Self::GovernanceActivation => "governance_activation",
            Self::WorkspaceCreation => "workspace_creation",
            Self::AgentRegistration => "agent_registration",
            Self::WorkspaceJoin => "workspace_join",
        }
    }
}

impl fmt::Display for DeploymentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeploymentEvent {
    DeploymentStarted {
        deployment_id: DeploymentId,
        organization: String,
        group_count: usize,
        started_at: DateTime<Utc>,
    },
    PhaseCompleted {
        deployment_id: DeploymentId,
        phase: DeploymentPhase,
        operations: usize,
        completed_at: DateTime<Utc>,
    },
    PhaseFailed {
        deployment_id: DeploymentId,
        phase: DeploymentPhase,
        error: String,
        failed_at: DateTime<Utc>,
    },
    /// Phases 1-5 issued; governance activation still pending.
    DeploymentIssued {
        deployment_id: DeploymentId,
        organization: String,
        issued_at: DateTime<Utc>,
    },
    GovernanceActivated {
        deployment_id: DeploymentId,
        scheme_target: String,
        activated_at: DateTime<Utc>,
    },
    GovernanceFailed {
        deployment_id: DeploymentId,
        error: String,
        failed_at: DateTime<Utc>,
    },
}

impl DeploymentEvent {
    pub fn deployment_id(&self) -> DeploymentId {
        match self {
            Self::DeploymentStarted { deployment_id, .. }
            | Self::PhaseCompleted { deployment_id, .. }
            | Self::PhaseFailed { deployment_id, .. }
            | Self::DeploymentIssued { deployment_id, .. }
            | Self::GovernanceActivated { deployment_id, .. }
            | Self::GovernanceFailed { deployment_id, .. } => *deployment_id,
        }
    }
}
