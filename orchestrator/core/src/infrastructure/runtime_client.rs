// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// HTTP Provisioning Client
//
// Anti-Corruption Layer for the workspace runtime's HTTP API.
// Maps each ProvisioningRequest onto a method, URL, headers and payload.

use crate::domain::deployer_config::{BootstrapConfig, RuntimeTarget};
use crate::domain::provisioning::{ProvisioningClient, ProvisioningError, ProvisioningRequest};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

pub const AGENT_WEBID_HEADER: &str = "X-Agent-WebID";
pub const AGENT_NAME_HEADER: &str = "X-Agent-Name";
pub const SLUG_HEADER: &str = "Slug";

/// Request body as it goes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

/// Fully resolved HTTP exchange for one provisioning request.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedRequest {
    pub method: Method,
    pub url: String,
    pub identity: String,
    pub headers: Vec<(&'static str, String)>,
    pub payload: Payload,
}

pub struct HttpProvisioningClient {
    client: reqwest::Client,
    runtime: RuntimeTarget,
    bootstrap: BootstrapConfig,
    org_board_class: String,
}

impl HttpProvisioningClient {
    pub fn new(
        runtime: RuntimeTarget,
        bootstrap: BootstrapConfig,
        org_board_class: impl Into<String>,
    ) -> Result<Self, ProvisioningError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = runtime.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ProvisioningError::Transport {
            operation: "build_client".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            client,
            runtime,
            bootstrap,
            org_board_class: org_board_class.into(),
        })
    }

    /// Resolve a request into its HTTP form without sending it.
    pub fn route(&self, request: &ProvisioningRequest) -> RoutedRequest {
        let runtime = &self.runtime;
        let caller = runtime.caller_identity.clone();
        let post_json = |url: String, body: Value| RoutedRequest {
            method: Method::POST,
            url,
            identity: caller.clone(),
            headers: Vec::new(),
            payload: Payload::Json(body),
        };

        match request {
            ProvisioningRequest::CreateOrganization {
                organization,
                specification_url,
            } => post_json(
                runtime.artifacts_url(),
                json!({
                    "artifactClass": self.org_board_class,
                    "artifactName": organization,
                    "initParams": [specification_url],
                }),
            ),
            ProvisioningRequest::CreateGroup {
                organization,
                group_id,
                group_name,
            } => post_json(
                runtime.artifact_operation_url(organization, "createGroup"),
                json!([group_id, group_name]),
            ),
            ProvisioningRequest::AttachSubgroup {
                parent_id,
                subgroup_id,
            } => post_json(
                runtime.artifact_operation_url(subgroup_id, "setParentGroup"),
                json!([parent_id]),
            ),
            ProvisioningRequest::NotifyAgent { agent, notification } => post_json(
                format!("{}/message", runtime.agent_url(agent)),
                serde_json::to_value(notification).unwrap_or(Value::Null),
            ),
            ProvisioningRequest::CreateScheme {
                organization,
                scheme_id,
                scheme_name,
            } => post_json(
                runtime.artifact_operation_url(organization, "createScheme"),
                json!([scheme_id, scheme_name]),
            ),
            ProvisioningRequest::AttachScheme { group_id, scheme_id } => post_json(
                runtime.artifact_operation_url(group_id, "addScheme"),
                json!([scheme_id]),
            ),
            ProvisioningRequest::CreateNormativeBoard {
                organization,
                board_name,
            } => post_json(
                runtime.artifact_operation_url(organization, "createNormativeBoard"),
                json!([board_name]),
            ),
            ProvisioningRequest::CreateWorkspace => RoutedRequest {
                method: Method::POST,
                url: runtime.workspaces_url(),
                identity: caller.clone(),
                headers: vec![(SLUG_HEADER, runtime.workspace.clone())],
                payload: Payload::Json(json!({})),
            },
            ProvisioningRequest::DeployAgent { agent, script } => RoutedRequest {
                method: Method::POST,
                url: runtime.agents_url(),
                identity: self.bootstrap.agent_identity(agent),
                headers: vec![(AGENT_NAME_HEADER, agent.clone())],
                payload: Payload::Text(script.clone()),
            },
            ProvisioningRequest::JoinWorkspace { agent } => RoutedRequest {
                method: Method::PUT,
                url: format!("{}/join", runtime.workspace_url()),
                identity: runtime.agent_url(agent),
                headers: Vec::new(),
                payload: Payload::Json(json!({})),
            },
        }
    }

    fn transport_error(operation: &str, e: reqwest::Error) -> ProvisioningError {
        ProvisioningError::Transport {
            operation: operation.to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl ProvisioningClient for HttpProvisioningClient {
    async fn provision(&self, request: ProvisioningRequest) -> Result<(), ProvisioningError> {
        let operation = request.operation();
        let routed = self.route(&request);
        debug!(operation, method = %routed.method, url = %routed.url, "Issuing provisioning request");

        let mut builder = self
            .client
            .request(routed.method, &routed.url)
            .header(AGENT_WEBID_HEADER, routed.identity);
        for (name, value) in routed.headers {
            builder = builder.header(name, value);
        }
        builder = match routed.payload {
            Payload::Json(body) => builder.json(&body),
            Payload::Text(body) => builder.header(CONTENT_TYPE, "text/plain").body(body),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| Self::transport_error(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProvisioningError::Rejected {
                operation: operation.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    async fn probe_artifact(&self, artifact: &str) -> Result<bool, ProvisioningError> {
        let url = self.runtime.artifact_url(artifact);
        let response = self
            .client
            .get(&url)
            .header(AGENT_WEBID_HEADER, &self.runtime.caller_identity)
            .send()
            .await
            .map_err(|e| Self::transport_error("probe_artifact", e))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(ProvisioningError::Rejected {
                operation: "probe_artifact".to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}
