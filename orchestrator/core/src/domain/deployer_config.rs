// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Deployer Configuration Types
//
// Defines the configuration schema for the organization deployer, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Runtime target (base URL, workspace, caller identity)
// - Organization conventions (board class, coordination group, role prefix)
// - Settling policy for the deferred governance step
// - Agent bootstrap identities

use crate::domain::settling::{SettlingPolicy, MIN_SETTLING_DELAY_MS};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "orgdeploy/v1";
pub const KIND: &str = "DeployerConfig";

/// Bytes escaped inside a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Top-level Kubernetes-style deployer configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployerConfigManifest {
    /// API version (must be "orgdeploy/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "DeployerConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: DeployerConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable environment name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployerConfigSpec {
    #[serde(default)]
    pub runtime: RuntimeTarget,

    #[serde(default)]
    pub specification: SpecificationConfig,

    #[serde(default)]
    pub organization: OrganizationConventions,

    #[serde(default)]
    pub settling: SettlingConfig,

    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Where the workspace runtime lives and who we are when talking to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeTarget {
    /// Runtime base URL (e.g. "http://localhost:8080")
    #[serde(default = "default_runtime_url")]
    pub url: String,

    /// Workspace identifier all artifacts are created in
    #[serde(default = "default_workspace")]
    pub workspace: String,

    /// Identity sent in the X-Agent-WebID header of provisioning calls
    #[serde(default = "default_caller_identity")]
    pub caller_identity: String,

    /// Per-request timeout; unset means no client-side timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_seconds: Option<u64>,
}

impl RuntimeTarget {
    fn base(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// URL of the workspace (`{url}/workspaces/{workspace}`)
    pub fn workspace_url(&self) -> String {
        format!("{}/workspaces/{}", self.base(), segment(&self.workspace))
    }

    /// URL of the workspace collection (`{url}/workspaces/`)
    pub fn workspaces_url(&self) -> String {
        format!("{}/workspaces/", self.base())
    }

    /// URL of the artifact collection (`{url}/workspaces/{workspace}/artifacts/`)
    pub fn artifacts_url(&self) -> String {
        format!("{}/artifacts/", self.workspace_url())
    }

    /// Full address of an artifact in the workspace. The name is escaped as
    /// one path segment.
    pub fn artifact_url(&self, artifact: &str) -> String {
        format!("{}/artifacts/{}", self.workspace_url(), segment(artifact))
    }

    /// URL of an operation exposed by an artifact
    pub fn artifact_operation_url(&self, artifact: &str, operation: &str) -> String {
        format!("{}/{}", self.artifact_url(artifact), operation)
    }

    /// Full address of an agent
    pub fn agent_url(&self, agent: &str) -> String {
        format!("{}/agents/{}", self.base(), segment(agent))
    }

    /// URL of the agent collection (`{url}/agents/`)
    pub fn agents_url(&self) -> String {
        format!("{}/agents/", self.base())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds.map(Duration::from_secs)
    }
}

impl Default for RuntimeTarget {
    fn default() -> Self {
        Self {
            url: default_runtime_url(),
            workspace: default_workspace(),
            caller_identity: default_caller_identity(),
            request_timeout_seconds: None,
        }
    }
}

/// Backend serving organization specifications to the runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecificationConfig {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
}

impl SpecificationConfig {
    /// Specification endpoint the organization artifact is initialised with
    pub fn specification_url(&self, organization: &str) -> String {
        format!(
            "{}/specifications/{}",
            self.backend_url.trim_end_matches('/'),
            segment(organization)
        )
    }
}

impl Default for SpecificationConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
        }
    }
}

/// Naming conventions the runtime and the agents' plans agree on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConventions {
    /// Artifact class of the organization board
    #[serde(default = "default_org_board_class")]
    pub org_board_class: String,

    /// Well-known group every notified agent also focuses on.
    /// Not derived from the batch.
    #[serde(default = "default_coordination_group")]
    pub coordination_group: String,

    /// Prefix the runtime expects on role identifiers
    #[serde(default = "default_role_prefix")]
    pub role_prefix: String,

    /// Artifact name of the normative board created after settling
    #[serde(default = "default_normative_board")]
    pub normative_board: String,
}

impl Default for OrganizationConventions {
    fn default() -> Self {
        Self {
            org_board_class: default_org_board_class(),
            coordination_group: default_coordination_group(),
            role_prefix: default_role_prefix(),
            normative_board: default_normative_board(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettlingStrategy {
    FixedDelay,
    ReadinessProbe,
}

/// How long to wait before attaching the scheme and creating the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlingConfig {
    #[serde(default = "default_settling_strategy")]
    pub strategy: SettlingStrategy,

    /// Fixed delay, or minimum delay before the first probe (milliseconds)
    #[serde(default = "default_settling_delay_ms")]
    pub delay_ms: u64,

    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,

    #[serde(default = "default_max_probe_attempts")]
    pub max_probe_attempts: u32,
}

impl SettlingConfig {
    pub fn policy(&self) -> SettlingPolicy {
        let delay = Duration::from_millis(self.delay_ms);
        match self.strategy {
            SettlingStrategy::FixedDelay => SettlingPolicy::FixedDelay { delay },
            SettlingStrategy::ReadinessProbe => SettlingPolicy::ReadinessProbe {
                min_delay: delay,
                interval: Duration::from_millis(self.probe_interval_ms),
                max_attempts: self.max_probe_attempts,
            },
        }
    }
}

impl Default for SettlingConfig {
    fn default() -> Self {
        Self {
            strategy: default_settling_strategy(),
            delay_ms: default_settling_delay_ms(),
            probe_interval_ms: default_probe_interval_ms(),
            max_probe_attempts: default_max_probe_attempts(),
        }
    }
}

/// Identities used while bootstrapping agents into the workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Agents are registered as `{agent_identity_base}{name}`
    #[serde(default = "default_agent_identity_base")]
    pub agent_identity_base: String,
}

impl BootstrapConfig {
    pub fn agent_identity(&self, agent: &str) -> String {
        format!("{}{}", self.agent_identity_base, agent)
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            agent_identity_base: default_agent_identity_base(),
        }
    }
}

/// Alias used throughout the crate
pub type DeployerConfig = DeployerConfigSpec;

impl Default for DeployerConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "local".to_string(),
                labels: None,
            },
            spec: DeployerConfigSpec::default(),
        }
    }
}

impl DeployerConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover configuration file using precedence order
    /// 1. ORGDEPLOY_CONFIG_PATH environment variable
    /// 2. ./orgdeploy-config.yaml (working directory)
    /// 3. ~/.orgdeploy/config.yaml (user home)
    /// 4. /etc/orgdeploy/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("ORGDEPLOY_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./orgdeploy-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".orgdeploy").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/orgdeploy/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path: fail if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("ORGDEPLOY_RUNTIME_URL") {
            tracing::info!("Environment override: ORGDEPLOY_RUNTIME_URL={}", url);
            self.spec.runtime.url = url;
        }

        if let Some(workspace) = lookup("ORGDEPLOY_WORKSPACE") {
            tracing::info!("Environment override: ORGDEPLOY_WORKSPACE={}", workspace);
            self.spec.runtime.workspace = workspace;
        }

        if let Some(val) = lookup("ORGDEPLOY_SETTLING_DELAY_MS") {
            match val.parse::<u64>() {
                Ok(delay_ms) => {
                    tracing::info!("Environment override: ORGDEPLOY_SETTLING_DELAY_MS={}", delay_ms);
                    self.spec.settling.delay_ms = delay_ms;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for ORGDEPLOY_SETTLING_DELAY_MS: '{}'. Expected milliseconds. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let spec = &self.spec;
        url::Url::parse(&spec.runtime.url)
            .map_err(|e| anyhow::anyhow!("spec.runtime.url '{}' is not a valid URL: {}", spec.runtime.url, e))?;
        url::Url::parse(&spec.specification.backend_url).map_err(|e| {
            anyhow::anyhow!(
                "spec.specification.backend_url '{}' is not a valid URL: {}",
                spec.specification.backend_url,
                e
            )
        })?;

        if spec.runtime.workspace.is_empty() {
            anyhow::bail!("spec.runtime.workspace cannot be empty");
        }

        if spec.runtime.caller_identity.is_empty() {
            anyhow::bail!("spec.runtime.caller_identity cannot be empty");
        }

        if spec.organization.coordination_group.is_empty() {
            anyhow::bail!("spec.organization.coordination_group cannot be empty");
        }

        if spec.settling.delay_ms < MIN_SETTLING_DELAY_MS {
            anyhow::bail!(
                "spec.settling.delay_ms must be at least {} (got {})",
                MIN_SETTLING_DELAY_MS,
                spec.settling.delay_ms
            );
        }

        if spec.settling.strategy == SettlingStrategy::ReadinessProbe {
            if spec.settling.max_probe_attempts == 0 {
                anyhow::bail!("spec.settling.max_probe_attempts must be at least 1");
            }
            if spec.settling.probe_interval_ms == 0 {
                anyhow::bail!("spec.settling.probe_interval_ms must be greater than 0");
            }
        }

        Ok(())
    }
}


fn default_runtime_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_workspace() -> String {
    "102".to_string()
}

fn default_caller_identity() -> String {
    "https://example.com/web-ide#me".to_string()
}

fn default_backend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_org_board_class() -> String {
    "http://example.org/OrgBoard".to_string()
}

fn default_coordination_group() -> String {
    "farmgroup".to_string()
}

fn default_role_prefix() -> String {
    "role_".to_string()
}

fn default_normative_board() -> String {
    "normativeboard".to_string()
}

fn default_settling_strategy() -> SettlingStrategy {
    SettlingStrategy::FixedDelay
}

fn default_settling_delay_ms() -> u64 {
    MIN_SETTLING_DELAY_MS
}

fn default_probe_interval_ms() -> u64 {
    500
}

fn default_max_probe_attempts() -> u32 {
    20
}

fn default_agent_identity_base() -> String {
    "http://example.org/".to_string()
}
