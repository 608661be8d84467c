use async_trait::async_trait;
use std::fmt::{Display, Formatter};

use crate::configuration::ClusterTarget;

const MAX_LABEL_LEN: usize = 63;

/// RFC 1123 label: lower case alphanumerics and '-', alphanumeric at both ends.
fn is_dns_label(value: &str) -> bool {
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    !value.is_empty()
        && value.len() <= MAX_LABEL_LEN
        && value.chars().all(|c| alnum(c) || c == '-')
        && value.starts_with(alnum)
        && value.ends_with(alnum)
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Namespace(String);

impl Namespace {
    pub fn parse(namespace: &str) -> Option<Namespace> {
        is_dns_label(namespace).then(|| Namespace(namespace.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct DeploymentName(String);

impl DeploymentName {
    pub fn parse(name: &str) -> Option<DeploymentName> {
        is_dns_label(name).then(|| DeploymentName(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for DeploymentName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct DeploymentId {
    pub namespace: Namespace,
    pub deployment: DeploymentName,
}

/// Status of the Deployment's "Available" condition as reported by the cluster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AvailableCondition {
    True,
    /// Anything else, including "False", "Unknown" or a missing condition (empty).
    NotTrue(String),
}

impl AvailableCondition {
    pub fn from_raw(raw: &str) -> AvailableCondition {
        match raw.trim() {
            "True" => AvailableCondition::True,
            other => AvailableCondition::NotTrue(other.to_owned()),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AvailableCondition::True)
    }
}

#[async_trait]
pub trait RolloutStatusSource {
    /// Reads the current status. A failed read is fatal for the rollout check.
    async fn available_condition(
        &self,
        deployment_id: &DeploymentId,
    ) -> anyhow::Result<AvailableCondition>;
}

/// What a successful connection resolved to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterInfo {
    pub cluster_url: String,
    pub default_namespace: String,
}

#[async_trait]
pub trait ClusterConnector {
    async fn connect(&self, target: &ClusterTarget) -> anyhow::Result<ClusterInfo>;
}
