// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod phase;
pub mod notification_fanout;
pub mod deploy_organization;
pub mod bootstrap_workspace;

// Re-export use cases for convenience
pub use deploy_organization::{DeployOrganizationUseCase, StandardDeployOrganizationUseCase, DeploymentReceipt, GovernanceHandle};
pub use bootstrap_workspace::{BootstrapWorkspaceUseCase, StandardBootstrapWorkspaceUseCase, BootstrapReceipt};
pub use phase::{DeploymentError, PhaseReport};
