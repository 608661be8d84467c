use std::time::Duration;

use async_trait::async_trait;

use crate::configuration::RolloutConfig;
use crate::kubernetes::model::{AvailableCondition, DeploymentId, RolloutStatusSource};

/// Fixed-interval bounded retry: one initial read plus at most `max_retries` re-reads.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    /// Upper bound on time spent sleeping between reads.
    pub fn worst_case_wait(&self) -> Duration {
        self.interval * self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RolloutConfig::default())
    }
}

impl From<&RolloutConfig> for RetryPolicy {
    fn from(config: &RolloutConfig) -> Self {
        RetryPolicy {
            max_retries: config.max_retries,
            interval: Duration::from_secs(config.interval_seconds),
        }
    }
}

#[async_trait]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RolloutOutcome {
    Healthy { retries: u32 },
    /// Retry budget exhausted. `last_status` is the raw value of the final read.
    Unhealthy { retries: u32, last_status: String },
}

impl RolloutOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, RolloutOutcome::Healthy { .. })
    }

    pub fn retries(&self) -> u32 {
        match self {
            RolloutOutcome::Healthy { retries } | RolloutOutcome::Unhealthy { retries, .. } => {
                *retries
            }
        }
    }
}

pub struct RolloutMonitor<'a> {
    status_source: &'a (dyn RolloutStatusSource + Send + Sync),
    sleeper: &'a (dyn Sleeper + Send + Sync),
    policy: RetryPolicy,
}

impl<'a> RolloutMonitor<'a> {
    pub fn new(
        status_source: &'a (dyn RolloutStatusSource + Send + Sync),
        sleeper: &'a (dyn Sleeper + Send + Sync),
        policy: RetryPolicy,
    ) -> RolloutMonitor<'a> {
        RolloutMonitor {
            status_source,
            sleeper,
            policy,
        }
    }

    /// Polls the "Available" condition until it is `True` or the retry budget runs out.
    ///
    /// An unhealthy outcome is only a warning. A failed status read is returned as an error
    /// and ends polling immediately.
    pub async fn watch(&self, deployment_id: &DeploymentId) -> anyhow::Result<RolloutOutcome> {
        tracing::debug!(
            max_retries = self.policy.max_retries,
            max_wait = ?self.policy.worst_case_wait(),
            "Checking deployment status."
        );
        let mut status = self.status_source.available_condition(deployment_id).await?;
        let mut retries = 0;
        while !status.is_available() && retries < self.policy.max_retries {
            self.sleeper.sleep(self.policy.interval).await;
            status = self.status_source.available_condition(deployment_id).await?;
            retries += 1;
            tracing::info!(retries, "Retrying deployment status check...");
        }

        let deployment = &deployment_id.deployment;
        match status {
            AvailableCondition::True => {
                tracing::info!("Deployment {deployment} is healthy.");
                Ok(RolloutOutcome::Healthy { retries })
            }
            AvailableCondition::NotTrue(last_status) => {
                tracing::warn!(%last_status, "Deployment {deployment} is not healthy.");
                Ok(RolloutOutcome::Unhealthy {
                    retries,
                    last_status,
                })
            }
        }
    }
}
