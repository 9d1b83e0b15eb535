// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Role notification fan-out
//!
//! Every (group, role, agent) triple of a batch becomes one independent
//! `NotifyAgent` request. Notifications carry no ordering; a failed one does
//! not stop the others from being delivered.

use crate::application::phase::{collect_phase, PhaseReport};
use crate::domain::deployer_config::{OrganizationConventions, RuntimeTarget};
use crate::domain::events::DeploymentPhase;
use crate::domain::notification::notifications_for_batch;
use crate::domain::organization::DeploymentBatch;
use crate::domain::provisioning::{ProvisioningClient, ProvisioningRequest};

pub struct NotificationFanout<'a> {
    runtime: &'a RuntimeTarget,
    conventions: &'a OrganizationConventions,
}

impl<'a> NotificationFanout<'a> {
    pub fn new(runtime: &'a RuntimeTarget, conventions: &'a OrganizationConventions) -> Self {
        Self {
            runtime,
            conventions,
        }
    }

    /// One `NotifyAgent` request per (role, agent) pair in the batch.
    pub fn requests(&self, batch: &DeploymentBatch) -> Vec<ProvisioningRequest> {
        notifications_for_batch(batch, self.runtime, self.conventions)
            .into_iter()
            .map(|addressed| ProvisioningRequest::NotifyAgent {
                agent: addressed.agent,
                notification: addressed.notification,
            })
            .collect()
    }

    /// Send every notification concurrently and collect all outcomes.
    pub async fn dispatch(
        &self,
        client: &dyn ProvisioningClient,
        batch: &DeploymentBatch,
    ) -> PhaseReport {
        collect_phase(client, DeploymentPhase::RoleNotification, self.requests(batch)).await
    }
}
