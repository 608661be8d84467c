use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::configuration::ClusterTarget;
use crate::kubernetes::model::{
    AvailableCondition, ClusterConnector, ClusterInfo, DeploymentId, RolloutStatusSource,
};

/// Replays a fixed sequence of raw statuses, then keeps returning the last one.
pub struct StatusSequence {
    statuses: Mutex<VecDeque<&'static str>>,
    reads: Mutex<usize>,
}

impl StatusSequence {
    pub fn new(statuses: &[&'static str]) -> StatusSequence {
        StatusSequence {
            statuses: Mutex::new(statuses.iter().copied().collect()),
            reads: Mutex::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        *self.reads.lock().unwrap()
    }
}

#[async_trait]
impl RolloutStatusSource for StatusSequence {
    async fn available_condition(
        &self,
        _deployment_id: &DeploymentId,
    ) -> anyhow::Result<AvailableCondition> {
        *self.reads.lock().unwrap() += 1;
        let mut statuses = self.statuses.lock().unwrap();
        let raw = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().copied()
        };
        Ok(AvailableCondition::from_raw(raw.unwrap_or_default()))
    }
}

/// Fails on the read with the given 1-based index, answers "False" before that.
pub struct FailOnRead(pub usize, pub Mutex<usize>);

#[async_trait]
impl RolloutStatusSource for FailOnRead {
    async fn available_condition(
        &self,
        _deployment_id: &DeploymentId,
    ) -> anyhow::Result<AvailableCondition> {
        let mut reads = self.1.lock().unwrap();
        *reads += 1;
        if *reads >= self.0 {
            anyhow::bail!("deployments.apps \"api\" is forbidden")
        }
        Ok(AvailableCondition::NotTrue("False".to_owned()))
    }
}

pub struct AlwaysConnects;

#[async_trait]
impl ClusterConnector for AlwaysConnects {
    async fn connect(&self, _target: &ClusterTarget) -> anyhow::Result<ClusterInfo> {
        Ok(ClusterInfo {
            cluster_url: "https://127.0.0.1:6443/".to_owned(),
            default_namespace: "default".to_owned(),
        })
    }
}

pub struct NeverConnects;

#[async_trait]
impl ClusterConnector for NeverConnects {
    async fn connect(&self, _target: &ClusterTarget) -> anyhow::Result<ClusterInfo> {
        anyhow::bail!("invalid kube-config file: no configuration has been provided")
    }
}
