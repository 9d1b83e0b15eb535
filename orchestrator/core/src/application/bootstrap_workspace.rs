// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Bootstrap Workspace Use Case
//!
//! Prepares an empty runtime for an organization deployment: creates the
//! workspace, registers every agent with its plan script and joins them to
//! the workspace.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Collaborators:** ProvisioningClient, EventBus
//!
//! Phases run in order; agents are registered and joined concurrently.

use crate::application::phase::{DeploymentError, PhaseRunner};
use crate::domain::agent::AgentSpec;
use crate::domain::events::{DeploymentEvent, DeploymentId, DeploymentPhase};
use crate::domain::provisioning::{ProvisioningClient, ProvisioningRequest};
use crate::infrastructure::event_bus::EventBus;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReceipt {
    pub deployment_id: DeploymentId,
    pub agents: usize,
}

#[async_trait]
pub trait BootstrapWorkspaceUseCase: Send + Sync {
    /// Create the workspace and bring `agents` into it.
    ///
    /// # Errors
    ///
    /// - `PhaseFailed`: workspace creation, registration or join failed
    async fn bootstrap_workspace(
        &self,
        organization: &str,
        agents: &[AgentSpec],
    ) -> Result<BootstrapReceipt, DeploymentError>;
}

pub struct StandardBootstrapWorkspaceUseCase {
    client: Arc<dyn ProvisioningClient>,
    event_bus: Arc<EventBus>,
}

impl StandardBootstrapWorkspaceUseCase {
    pub fn new(client: Arc<dyn ProvisioningClient>, event_bus: Arc<EventBus>) -> Self {
        Self { client, event_bus }
    }
}

#[async_trait]
impl BootstrapWorkspaceUseCase for StandardBootstrapWorkspaceUseCase {
    async fn bootstrap_workspace(
        &self,
        organization: &str,
        agents: &[AgentSpec],
    ) -> Result<BootstrapReceipt, DeploymentError> {
        let deployment_id = DeploymentId::new();
        info!(%deployment_id, organization, agents = agents.len(), "Bootstrapping workspace");
        self.event_bus.publish(DeploymentEvent::DeploymentStarted {
            deployment_id,
            organization: organization.to_string(),
            group_count: 0,
            started_at: Utc::now(),
        });

        let runner = PhaseRunner::new(self.client.clone(), &self.event_bus, deployment_id);

        runner
            .run(
                DeploymentPhase::WorkspaceCreation,
                vec![ProvisioningRequest::CreateWorkspace],
            )
            .await?;

        let registrations = agents
            .iter()
            .map(|agent| ProvisioningRequest::DeployAgent {
                agent: agent.name.clone(),
                script: agent.script.clone(),
            })
            .collect();
        runner
            .run(DeploymentPhase::AgentRegistration, registrations)
            .await?;

        let joins = agents
            .iter()
            .map(|agent| ProvisioningRequest::JoinWorkspace {
                agent: agent.name.clone(),
            })
            .collect();
        runner.run(DeploymentPhase::WorkspaceJoin, joins).await?;

        Ok(BootstrapReceipt {
            deployment_id,
            agents: agents.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provisioning::ProvisioningError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        reject_deploy_of: Option<&'static str>,
        calls: Mutex<Vec<(&'static str, String)>>,
    }

    #[async_trait]
    impl ProvisioningClient for Recorder {
        async fn provision(&self, request: ProvisioningRequest) -> Result<(), ProvisioningError> {
            let operation = request.operation();
            let target = request.target().to_string();
            self.calls.lock().unwrap().push((operation, target.clone()));
            if operation == "deploy_agent" && self.reject_deploy_of == Some(target.as_str()) {
                return Err(ProvisioningError::Rejected {
                    operation: operation.to_string(),
                    status: 409,
                    body: "agent exists".to_string(),
                });
            }
            Ok(())
        }

        async fn probe_artifact(&self, _artifact: &str) -> Result<bool, ProvisioningError> {
            Ok(true)
        }
    }

    fn agents() -> Vec<AgentSpec> {
        vec![
            AgentSpec::new("agent0", "+!plough <- true."),
            AgentSpec::new("agent1", "+!sow <- true."),
        ]
    }

    #[tokio::test]
    async fn test_bootstrap_orders_phases() {
        let client = Arc::new(Recorder::default());
        let use_case = StandardBootstrapWorkspaceUseCase::new(client.clone(), Arc::new(EventBus::new(32)));

        let receipt = use_case.bootstrap_workspace("smart-farming", &agents()).await.unwrap();
        assert_eq!(receipt.agents, 2);

        let calls = client.calls.lock().unwrap().clone();
        let operations: Vec<&str> = calls.iter().map(|(op, _)| *op).collect();
        assert_eq!(
            operations,
            vec!["create_workspace", "deploy_agent", "deploy_agent", "join_workspace", "join_workspace"]
        );
    }

    #[tokio::test]
    async fn test_failed_registration_skips_join() {
        let client = Arc::new(Recorder {
            reject_deploy_of: Some("agent1"),
            ..Recorder::default()
        });
        let bus = Arc::new(EventBus::new(32));
        let mut events = bus.subscribe();
        let use_case = StandardBootstrapWorkspaceUseCase::new(client.clone(), bus);

        let err = use_case.bootstrap_workspace("smart-farming", &agents()).await.unwrap_err();
        assert_eq!(err.phase(), Some(DeploymentPhase::AgentRegistration));

        let calls = client.calls.lock().unwrap().clone();
        assert!(calls.iter().all(|(op, _)| *op != "join_workspace"));
        // Both registrations were still attempted.
        assert_eq!(calls.iter().filter(|(op, _)| *op == "deploy_agent").count(), 2);

        let mut saw_failure = false;
        while let Ok(event) = events.try_recv() {
            if let DeploymentEvent::PhaseFailed { phase, .. } = event {
                assert_eq!(phase, DeploymentPhase::AgentRegistration);
                saw_failure = true;
            }
        }
        assert!(saw_failure);
    }

    #[tokio::test]
    async fn test_no_agents_only_creates_workspace() {
        let client = Arc::new(Recorder::default());
        let use_case = StandardBootstrapWorkspaceUseCase::new(client.clone(), Arc::new(EventBus::new(32)));

        use_case.bootstrap_workspace("smart-farming", &[]).await.unwrap();

        assert_eq!(client.calls.lock().unwrap().len(), 1);
    }
}
