// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Phase execution
//!
//! A phase is a set of independent provisioning requests issued concurrently.
//! Two completion policies exist:
//!
//! - [`execute_phase`]: the phase fails as soon as one request fails. Requests
//!   already in flight are left to finish on their own tasks.
//! - [`collect_phase`]: every request is driven to completion before the
//!   phase reports; the first failure in completion order is reported.
//!
//! # Architecture
//!
//! - **Layer:** Application
//! - **Collaborators:** ProvisioningClient (domain port), EventBus

use crate::domain::events::{DeploymentEvent, DeploymentId, DeploymentPhase};
use crate::domain::provisioning::{ProvisioningClient, ProvisioningError, ProvisioningRequest};
use crate::infrastructure::event_bus::EventBus;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Errors surfaced by deployment and bootstrap use cases
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeploymentError {
    #[error("Phase {phase} failed: {source}")]
    PhaseFailed {
        phase: DeploymentPhase,
        #[source]
        source: ProvisioningError,
    },

    #[error("Governance activation task aborted: {0}")]
    GovernanceAborted(String),
}

impl DeploymentError {
    /// Phase the failure belongs to, if any
    pub fn phase(&self) -> Option<DeploymentPhase> {
        match self {
            Self::PhaseFailed { phase, .. } => Some(*phase),
            Self::GovernanceAborted(_) => Some(DeploymentPhase::GovernanceActivation),
        }
    }
}

/// Outcome of one phase after all of its requests resolved
#[derive(Debug)]
pub struct PhaseReport {
    pub phase: DeploymentPhase,
    pub operations: usize,
    /// Failures in completion order
    pub failures: Vec<ProvisioningError>,
}

impl PhaseReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> Result<usize, DeploymentError> {
        match self.failures.into_iter().next() {
            None => Ok(self.operations),
            Some(source) => Err(DeploymentError::PhaseFailed {
                phase: self.phase,
                source,
            }),
        }
    }
}

/// Issue `requests` concurrently and stop at the first failure.
///
/// Each request runs on its own task, so siblings of a failed request still
/// reach the runtime; the phase just does not wait for them.
pub async fn execute_phase(
    client: Arc<dyn ProvisioningClient>,
    phase: DeploymentPhase,
    requests: Vec<ProvisioningRequest>,
) -> PhaseReport {
    let operations = requests.len();
    let mut pending: FuturesUnordered<_> = requests
        .into_iter()
        .map(|request| {
            let client = client.clone();
            let label = request.to_string();
            let operation = request.operation();
            let task = tokio::spawn(async move { client.provision(request).await });
            async move {
                let result = task.await.unwrap_or_else(|e| {
                    Err(ProvisioningError::Transport {
                        operation: operation.to_string(),
                        message: format!("request task aborted: {e}"),
                    })
                });
                (label, result)
            }
        })
        .collect();

    let mut failures = Vec::new();
    while let Some((label, result)) = pending.next().await {
        match result {
            Ok(()) => debug!(%phase, request = %label, "Request succeeded"),
            Err(e) => {
                warn!(%phase, request = %label, error = %e, outstanding = pending.len(), "Request failed");
                failures.push(e);
                break;
            }
        }
    }

    PhaseReport {
        phase,
        operations,
        failures,
    }
}

/// Issue `requests` concurrently and wait for every one of them.
pub async fn collect_phase(
    client: &dyn ProvisioningClient,
    phase: DeploymentPhase,
    requests: Vec<ProvisioningRequest>,
) -> PhaseReport {
    let operations = requests.len();
    let mut pending: FuturesUnordered<_> = requests
        .into_iter()
        .map(|request| async move {
            let label = request.to_string();
            (label, client.provision(request).await)
        })
        .collect();

    let mut failures = Vec::new();
    while let Some((label, result)) = pending.next().await {
        match result {
            Ok(()) => debug!(%phase, request = %label, "Request succeeded"),
            Err(e) => {
                warn!(%phase, request = %label, error = %e, "Request failed");
                failures.push(e);
            }
        }
    }

    PhaseReport {
        phase,
        operations,
        failures,
    }
}

/// Runs phases of one deployment and reports them on the event bus.
pub struct PhaseRunner<'a> {
    client: Arc<dyn ProvisioningClient>,
    event_bus: &'a EventBus,
    deployment_id: DeploymentId,
}

impl<'a> PhaseRunner<'a> {
    pub fn new(
        client: Arc<dyn ProvisioningClient>,
        event_bus: &'a EventBus,
        deployment_id: DeploymentId,
    ) -> Self {
        Self {
            client,
            event_bus,
            deployment_id,
        }
    }

    pub async fn run(
        &self,
        phase: DeploymentPhase,
        requests: Vec<ProvisioningRequest>,
    ) -> Result<usize, DeploymentError> {
        info!(deployment_id = %self.deployment_id, %phase, operations = requests.len(), "Starting phase");
        let report = execute_phase(self.client.clone(), phase, requests).await;
        self.record(report)
    }

    /// Publish the outcome of a phase executed elsewhere.
    pub fn record(&self, report: PhaseReport) -> Result<usize, DeploymentError> {
        let phase = report.phase;
        let failure_count = report.failures.len();

        match report.into_result() {
            Ok(operations) => {
                self.event_bus.publish(DeploymentEvent::PhaseCompleted {
                    deployment_id: self.deployment_id,
                    phase,
                    operations,
                    completed_at: Utc::now(),
                });
                Ok(operations)
            }
            Err(e) => {
                warn!(deployment_id = %self.deployment_id, %phase, failures = failure_count, "Phase failed");
                self.event_bus.publish(DeploymentEvent::PhaseFailed {
                    deployment_id: self.deployment_id,
                    phase,
                    error: e.to_string(),
                    failed_at: Utc::now(),
                });
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fails every request whose target is listed; slow targets finish late,
    /// stuck targets never answer.
    #[derive(Default)]
    struct ScriptedClient {
        failing: Vec<&'static str>,
        slow: Vec<&'static str>,
        stuck: Vec<&'static str>,
        completed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProvisioningClient for ScriptedClient {
        async fn provision(&self, request: ProvisioningRequest) -> Result<(), ProvisioningError> {
            let target = request.target().to_string();
            if self.stuck.contains(&target.as_str()) {
                std::future::pending::<()>().await;
            }
            if self.slow.contains(&target.as_str()) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.completed.lock().unwrap().push(target.clone());
            if self.failing.contains(&target.as_str()) {
                return Err(ProvisioningError::Rejected {
                    operation: request.operation().to_string(),
                    status: 500,
                    body: target,
                });
            }
            Ok(())
        }

        async fn probe_artifact(&self, _artifact: &str) -> Result<bool, ProvisioningError> {
            Ok(true)
        }
    }

    fn join(agent: &str) -> ProvisioningRequest {
        ProvisioningRequest::JoinWorkspace { agent: agent.to_string() }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_returns_without_waiting_for_stuck_sibling() {
        let client = Arc::new(ScriptedClient {
            failing: vec!["a"],
            stuck: vec!["b"],
            ..ScriptedClient::default()
        });

        let report = tokio::time::timeout(
            Duration::from_secs(3600),
            execute_phase(client.clone(), DeploymentPhase::GroupArtifacts, vec![join("a"), join("b")]),
        )
        .await
        .expect("phase must report the failure without waiting for 'b'");

        assert_eq!(report.operations, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_siblings_of_failed_request_still_run() {
        let client = Arc::new(ScriptedClient {
            failing: vec!["a1"],
            slow: vec!["a2", "a3"],
            ..ScriptedClient::default()
        });

        let report = execute_phase(
            client.clone(),
            DeploymentPhase::WorkspaceJoin,
            vec![join("a1"), join("a2"), join("a3")],
        )
        .await;
        assert_eq!(report.failures.len(), 1);
        assert_eq!(client.completed.lock().unwrap().clone(), vec!["a1"]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(client.completed.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_collect_phase_waits_for_every_request() {
        let client = ScriptedClient {
            failing: vec!["a1"],
            slow: vec!["a2", "a3"],
            ..ScriptedClient::default()
        };

        let report = collect_phase(
            &client,
            DeploymentPhase::RoleNotification,
            vec![join("a1"), join("a2"), join("a3")],
        )
        .await;

        assert_eq!(report.operations, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(client.completed.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_failure_in_completion_order() {
        let client = ScriptedClient {
            failing: vec!["slow", "fast"],
            slow: vec!["slow"],
            ..ScriptedClient::default()
        };

        let err = collect_phase(
            &client,
            DeploymentPhase::RoleNotification,
            vec![join("slow"), join("fast")],
        )
        .await
        .into_result()
        .unwrap_err();

        match err {
            DeploymentError::PhaseFailed { phase, source: ProvisioningError::Rejected { body, .. } } => {
                assert_eq!(phase, DeploymentPhase::RoleNotification);
                assert_eq!(body, "fast");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_phase_succeeds() {
        let client = Arc::new(ScriptedClient::default());
        let bus = EventBus::new(8);
        let mut events = bus.subscribe();
        let runner = PhaseRunner::new(client, &bus, DeploymentId::new());

        let operations = runner.run(DeploymentPhase::SubgroupAttachment, vec![]).await.unwrap();

        assert_eq!(operations, 0);
        assert!(matches!(
            events.recv().await.unwrap(),
            DeploymentEvent::PhaseCompleted { operations: 0, .. }
        ));
    }
}
