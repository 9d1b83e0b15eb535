// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Settling policy for the deferred governance step.
//!
//! The runtime registers freshly created artifacts asynchronously. Attaching the
//! scheme or creating the normative board before registration finishes may hit
//! an artifact that does not exist yet, so the orchestrator waits on a
//! [`SettlingPolicy`] first.

use crate::domain::provisioning::{ProvisioningClient, ProvisioningError};
use std::time::Duration;
use tracing::debug;

/// Lower bound for any settling wait, in milliseconds.
pub const MIN_SETTLING_DELAY_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlingPolicy {
    /// Sleep for a fixed wall-clock delay, at least `MIN_SETTLING_DELAY_MS`.
    FixedDelay { delay: Duration },

    /// Sleep for `min_delay`, then poll the runtime until the artifact is
    /// registered or `max_attempts` probes have reported it missing.
    ReadinessProbe {
        min_delay: Duration,
        interval: Duration,
        max_attempts: u32,
    },
}

impl Default for SettlingPolicy {
    fn default() -> Self {
        Self::FixedDelay {
            delay: Duration::from_millis(MIN_SETTLING_DELAY_MS),
        }
    }
}

impl SettlingPolicy {
    /// Wait until `artifact` can be operated on.
    pub async fn settle(
        &self,
        client: &dyn ProvisioningClient,
        artifact: &str,
    ) -> Result<(), ProvisioningError> {
        match self {
            Self::FixedDelay { delay } => {
                let delay = floor_delay(*delay);
                debug!(artifact, delay_ms = delay.as_millis() as u64, "Settling with fixed delay");
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Self::ReadinessProbe {
                min_delay,
                interval,
                max_attempts,
            } => {
                tokio::time::sleep(*min_delay).await;
                for attempt in 1..=*max_attempts {
                    if client.probe_artifact(artifact).await? {
                        debug!(artifact, attempt, "Artifact reported ready");
                        return Ok(());
                    }
                    if attempt < *max_attempts {
                        tokio::time::sleep(*interval).await;
                    }
                }
                Err(ProvisioningError::NotReady {
                    artifact: artifact.to_string(),
                    attempts: *max_attempts,
                })
            }
        }
    }

    /// Shortest time `settle` can take.
    pub fn minimum_wait(&self) -> Duration {
        match self {
            Self::FixedDelay { delay } => floor_delay(*delay),
            Self::ReadinessProbe { min_delay, .. } => *min_delay,
        }
    }
}

/// Fixed delays are raised to [`MIN_SETTLING_DELAY_MS`].
fn floor_delay(delay: Duration) -> Duration {
    delay.max(Duration::from_millis(MIN_SETTLING_DELAY_MS))
}
