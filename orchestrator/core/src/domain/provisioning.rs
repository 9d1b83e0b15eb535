// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Provisioning
//!
//! Domain interface to the workspace runtime (Anti-Corruption Layer).
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Typed request shapes and the port the orchestrator calls
//!
//! The HTTP adapter lives in `infrastructure/runtime_client.rs`. Every request
//! either succeeds or fails as a whole; no partial effects are observable
//! through this interface.

use crate::domain::notification::RoleNotification;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One provisioning operation against the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProvisioningRequest {
    /// Create the organization board, initialised from a specification endpoint.
    CreateOrganization {
        organization: String,
        specification_url: String,
    },
    /// Create a group artifact under the organization.
    CreateGroup {
        organization: String,
        group_id: String,
        group_name: String,
    },
    /// Make `subgroup_id` a child of `parent_id`.
    AttachSubgroup {
        parent_id: String,
        subgroup_id: String,
    },
    /// Tell an agent which role it plays in which group.
    NotifyAgent {
        agent: String,
        notification: RoleNotification,
    },
    /// Create the normative scheme under the organization.
    CreateScheme {
        organization: String,
        scheme_id: String,
        scheme_name: String,
    },
    /// Attach an existing scheme to a group.
    AttachScheme {
        group_id: String,
        scheme_id: String,
    },
    /// Create the normative board of the organization.
    CreateNormativeBoard {
        organization: String,
        board_name: String,
    },
    /// Create the workspace itself.
    CreateWorkspace,
    /// Register an agent with its plan script.
    DeployAgent { agent: String, script: String },
    /// Join a registered agent to the workspace.
    JoinWorkspace { agent: String },
}

impl ProvisioningRequest {
    /// Stable operation name used in logs and events.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::CreateOrganization { .. } => "create_organization",
            Self::CreateGroup { .. } => "create_group",
            Self::AttachSubgroup { .. } => "attach_subgroup",
            Self::NotifyAgent { .. } => "notify_agent",
            Self::CreateScheme { .. } => "create_scheme",
            Self::AttachScheme { .. } => "attach_scheme",
            Self::CreateNormativeBoard { .. } => "create_normative_board",
            Self::CreateWorkspace => "create_workspace",
            Self::DeployAgent { .. } => "deploy_agent",
            Self::JoinWorkspace { .. } => "join_workspace",
        }
    }

    /// The remote resource this request targets.
    pub fn target(&self) -> &str {
        match self {
            Self::CreateOrganization { organization, .. }
            | Self::CreateScheme { organization, .. }
            | Self::CreateNormativeBoard { organization, .. } => organization,
            Self::CreateGroup { group_id, .. } | Self::AttachScheme { group_id, .. } => group_id,
            Self::AttachSubgroup { subgroup_id, .. } => subgroup_id,
            Self::NotifyAgent { agent, .. }
            | Self::DeployAgent { agent, .. }
            | Self::JoinWorkspace { agent } => agent,
            Self::CreateWorkspace => "workspace",
        }
    }
}

impl fmt::Display for ProvisioningRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.operation(), self.target())
    }
}

/// Port to the workspace runtime.
#[async_trait]
pub trait ProvisioningClient: Send + Sync {
    /// Issue one request and report success or failure.
    async fn provision(&self, request: ProvisioningRequest) -> Result<(), ProvisioningError>;

    /// Whether the runtime has finished registering `artifact`.
    async fn probe_artifact(&self, artifact: &str) -> Result<bool, ProvisioningError>;
}

/// Errors that can occur during provisioning
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisioningError {
    #[error("Transport error during {operation}: {message}")]
    Transport { operation: String, message: String },

    #[error("Runtime rejected {operation} with HTTP {status}: {body}")]
    Rejected {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Artifact '{artifact}' not ready after {attempts} probes")]
    NotReady { artifact: String, attempts: u32 },
}
