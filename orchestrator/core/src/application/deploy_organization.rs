// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deploy Organization Use Case
//!
//! Application service turning a [`DeploymentBatch`] into an ordered sequence
//! of provisioning phases against the workspace runtime.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Sequence phases, parallelize within them, schedule
//!   governance activation after the settling policy
//! - **Collaborators:**
//!   - Domain: DeploymentBatch, subgroup resolver, SettlingPolicy
//!   - Infrastructure: ProvisioningClient, EventBus
//!
//! # Phases
//!
//! 1. Organization artifact
//! 2. Group artifacts (concurrent)
//! 3. Subgroup attachment (concurrent, all depths at once)
//! 4. Role notification (concurrent, collect-all)
//! 5. Scheme creation, then a spawned governance task: settle, attach the
//!    scheme to the first group, create the normative board.
//!
//! Phases other than 4 report their first failure without waiting for
//! requests still in flight.
//!
//! The caller gets its receipt once phase 5's scheme creation is done. The
//! governance task reports through [`GovernanceHandle`] and the event bus.

use crate::application::notification_fanout::NotificationFanout;
use crate::application::phase::{DeploymentError, PhaseRunner};
use crate::domain::deployer_config::DeployerConfig;
use crate::domain::events::{DeploymentEvent, DeploymentId, DeploymentPhase};
use crate::domain::organization::{runtime_id, DeploymentBatch};
use crate::domain::provisioning::{ProvisioningClient, ProvisioningError, ProvisioningRequest};
use crate::domain::resolver::{attachment_pairs, resolve_subgroups};
use crate::domain::settling::SettlingPolicy;
use crate::infrastructure::event_bus::EventBus;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Returned once phases 1-5 have been issued.
#[derive(Debug)]
pub struct DeploymentReceipt {
    pub deployment_id: DeploymentId,
    pub organization: String,
    /// Operations issued per phase, in phase order.
    pub phase_operations: Vec<(DeploymentPhase, usize)>,
    pub governance: GovernanceHandle,
}

/// Result channel of the deferred governance activation.
///
/// Dropping the handle detaches the task; it still runs to completion.
#[derive(Debug)]
pub struct GovernanceHandle {
    deployment_id: DeploymentId,
    task: JoinHandle<Result<(), DeploymentError>>,
}

impl GovernanceHandle {
    pub fn deployment_id(&self) -> DeploymentId {
        self.deployment_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the scheme attachment and board creation to finish.
    pub async fn wait(self) -> Result<(), DeploymentError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(DeploymentError::GovernanceAborted(e.to_string())),
        }
    }
}

/// Deploy Organization Use Case
#[async_trait]
pub trait DeployOrganizationUseCase: Send + Sync {
    /// Provision the organization described by `batch`.
    ///
    /// # Errors
    ///
    /// - `PhaseFailed`: a request of phases 1-5 failed; later phases were not issued
    async fn deploy_organization(
        &self,
        batch: &DeploymentBatch,
    ) -> Result<DeploymentReceipt, DeploymentError>;
}

/// Standard implementation of DeployOrganizationUseCase
pub struct StandardDeployOrganizationUseCase {
    client: Arc<dyn ProvisioningClient>,
    config: Arc<DeployerConfig>,
    settling: SettlingPolicy,
    event_bus: Arc<EventBus>,
}

impl StandardDeployOrganizationUseCase {
    pub fn new(
        client: Arc<dyn ProvisioningClient>,
        config: Arc<DeployerConfig>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let settling = config.settling.policy();
        Self {
            client,
            config,
            settling,
            event_bus,
        }
    }

    pub fn with_settling_policy(mut self, settling: SettlingPolicy) -> Self {
        self.settling = settling;
        self
    }

    fn group_requests(batch: &DeploymentBatch) -> Vec<ProvisioningRequest> {
        batch
            .groups
            .iter()
            .map(|entity| ProvisioningRequest::CreateGroup {
                organization: batch.organization.clone(),
                group_id: entity.group.runtime_id(),
                group_name: entity.group.name.clone(),
            })
            .collect()
    }

    fn attachment_requests(batch: &DeploymentBatch) -> Vec<ProvisioningRequest> {
        attachment_pairs(&resolve_subgroups(&batch.groups))
            .into_iter()
            .map(|(parent, subgroup)| ProvisioningRequest::AttachSubgroup {
                parent_id: runtime_id(&parent),
                subgroup_id: runtime_id(&subgroup),
            })
            .collect()
    }

    fn spawn_governance(&self, deployment_id: DeploymentId, batch: &DeploymentBatch) -> GovernanceHandle {
        let activation = GovernanceActivation {
            client: self.client.clone(),
            event_bus: self.event_bus.clone(),
            settling: self.settling.clone(),
            deployment_id,
            organization: batch.organization.clone(),
            scheme_id: batch.scheme.id.clone(),
            scheme_target: batch.scheme_target(),
            board_name: self.config.organization.normative_board.clone(),
        };

        GovernanceHandle {
            deployment_id,
            task: tokio::spawn(activation.run()),
        }
    }
}

#[async_trait]
impl DeployOrganizationUseCase for StandardDeployOrganizationUseCase {
    async fn deploy_organization(
        &self,
        batch: &DeploymentBatch,
    ) -> Result<DeploymentReceipt, DeploymentError> {
        let deployment_id = DeploymentId::new();
        info!(
            %deployment_id,
            organization = %batch.organization,
            groups = batch.groups.len(),
            "Deploying organization"
        );
        self.event_bus.publish(DeploymentEvent::DeploymentStarted {
            deployment_id,
            organization: batch.organization.clone(),
            group_count: batch.groups.len(),
            started_at: Utc::now(),
        });

        let runner = PhaseRunner::new(self.client.clone(), &self.event_bus, deployment_id);
        let mut phase_operations = Vec::with_capacity(5);

        // Phase 1: organization board
        let organization = vec![ProvisioningRequest::CreateOrganization {
            organization: batch.organization.clone(),
            specification_url: self.config.specification.specification_url(&batch.organization),
        }];
        let issued = runner.run(DeploymentPhase::OrganizationArtifact, organization).await?;
        phase_operations.push((DeploymentPhase::OrganizationArtifact, issued));

        // Phase 2: group artifacts
        let issued = runner
            .run(DeploymentPhase::GroupArtifacts, Self::group_requests(batch))
            .await?;
        phase_operations.push((DeploymentPhase::GroupArtifacts, issued));

        // Phase 3: subgroup attachment
        let issued = runner
            .run(DeploymentPhase::SubgroupAttachment, Self::attachment_requests(batch))
            .await?;
        phase_operations.push((DeploymentPhase::SubgroupAttachment, issued));

        // Phase 4: role notifications
        info!(
            %deployment_id,
            notifications = batch.notification_count(),
            "Notifying role players"
        );
        let fanout = NotificationFanout::new(&self.config.runtime, &self.config.organization);
        let issued = runner.record(fanout.dispatch(self.client.as_ref(), batch).await)?;
        phase_operations.push((DeploymentPhase::RoleNotification, issued));

        // Phase 5: scheme, then deferred governance activation
        let scheme = vec![ProvisioningRequest::CreateScheme {
            organization: batch.organization.clone(),
            scheme_id: batch.scheme.id.clone(),
            scheme_name: batch.scheme.name.clone(),
        }];
        let issued = runner.run(DeploymentPhase::SchemeCreation, scheme).await?;
        phase_operations.push((DeploymentPhase::SchemeCreation, issued));

        let governance = self.spawn_governance(deployment_id, batch);

        info!(
            %deployment_id,
            settling_ms = self.settling.minimum_wait().as_millis() as u64,
            "Organization issued; governance activation scheduled"
        );
        self.event_bus.publish(DeploymentEvent::DeploymentIssued {
            deployment_id,
            organization: batch.organization.clone(),
            issued_at: Utc::now(),
        });

        Ok(DeploymentReceipt {
            deployment_id,
            organization: batch.organization.clone(),
            phase_operations,
            governance,
        })
    }
}

/// Owned state of the deferred governance step.
struct GovernanceActivation {
    client: Arc<dyn ProvisioningClient>,
    event_bus: Arc<EventBus>,
    settling: SettlingPolicy,
    deployment_id: DeploymentId,
    organization: String,
    scheme_id: String,
    scheme_target: String,
    board_name: String,
}

impl GovernanceActivation {
    async fn run(self) -> Result<(), DeploymentError> {
        let result = self
            .activate()
            .await
            .map_err(|source| DeploymentError::PhaseFailed {
                phase: DeploymentPhase::GovernanceActivation,
                source,
            });

        match &result {
            Ok(()) => {
                info!(
                    deployment_id = %self.deployment_id,
                    scheme_target = %self.scheme_target,
                    "Governance activated"
                );
                self.event_bus.publish(DeploymentEvent::GovernanceActivated {
                    deployment_id: self.deployment_id,
                    scheme_target: self.scheme_target.clone(),
                    activated_at: Utc::now(),
                });
            }
            Err(e) => {
                error!(deployment_id = %self.deployment_id, error = %e, "Governance activation failed");
                self.event_bus.publish(DeploymentEvent::GovernanceFailed {
                    deployment_id: self.deployment_id,
                    error: e.to_string(),
                    failed_at: Utc::now(),
                });
            }
        }
        result
    }

    async fn activate(&self) -> Result<(), ProvisioningError> {
        self.settling
            .settle(self.client.as_ref(), &self.scheme_id)
            .await?;

        self.client
            .provision(ProvisioningRequest::AttachScheme {
                group_id: self.scheme_target.clone(),
                scheme_id: self.scheme_id.clone(),
            })
            .await?;

        self.client
            .provision(ProvisioningRequest::CreateNormativeBoard {
                organization: self.organization.clone(),
                board_name: self.board_name.clone(),
            })
            .await
    }
}
