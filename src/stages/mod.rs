use std::fmt::{Display, Formatter};

use crate::process::CommandError;

pub mod helm;
pub mod operator;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    ConnectCluster,
    EnsureHelm,
    DeployOperator,
    VerifyOperator,
    ApplyDeployment,
    ApplyAutoscaler,
    MonitorRollout,
    ApplyService,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::ConnectCluster => "connect-cluster",
            Stage::EnsureHelm => "ensure-helm",
            Stage::DeployOperator => "deploy-operator",
            Stage::VerifyOperator => "verify-operator",
            Stage::ApplyDeployment => "apply-deployment",
            Stage::ApplyAutoscaler => "apply-autoscaler",
            Stage::MonitorRollout => "monitor-rollout",
            Stage::ApplyService => "apply-service",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Every fatal failure. Any of these stops the pipeline and exits with status 1.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("Failed to connect to cluster: {0:#}")]
    Connection(anyhow::Error),
    #[error("Helm is installed but not usable: {0}")]
    HelmBroken(#[source] CommandError),
    #[error("Error occurred during Helm installation: {0}")]
    HelmInstall(#[source] CommandError),
    #[error("Failed to install operator {release}: {source}")]
    OperatorInstall {
        release: String,
        #[source]
        source: CommandError,
    },
    #[error("Error verifying operator installation: {0}")]
    OperatorQuery(#[source] CommandError),
    #[error("Operator pod '{marker}' is not running.")]
    OperatorNotRunning { marker: String },
    #[error("Failed to create {kind} {name}: {source}")]
    Apply {
        stage: Stage,
        kind: &'static str,
        name: String,
        #[source]
        source: CommandError,
    },
    #[error("Error checking deployment status: {0:#}")]
    StatusQuery(anyhow::Error),
}

impl StageError {
    pub fn stage(&self) -> Stage {
        match self {
            StageError::Connection(_) => Stage::ConnectCluster,
            StageError::HelmBroken(_) | StageError::HelmInstall(_) => Stage::EnsureHelm,
            StageError::OperatorInstall { .. } => Stage::DeployOperator,
            StageError::OperatorQuery(_) | StageError::OperatorNotRunning { .. } => {
                Stage::VerifyOperator
            }
            StageError::Apply { stage, .. } => *stage,
            StageError::StatusQuery(_) => Stage::MonitorRollout,
        }
    }
}
