use std::sync::Arc;

use tracing::Instrument;

use crate::configuration::{ClusterTarget, OperatorConfig, ToolingConfig};
use crate::kubernetes::kubectl::Kubectl;
use crate::kubernetes::model::{ClusterConnector, ClusterInfo, DeploymentId, RolloutStatusSource};
use crate::manifest::{AutoscalerSpec, DeploymentSpec, Manifest, ServiceSpec};
use crate::process::SharedRunner;
use crate::rollout::{RetryPolicy, RolloutMonitor, RolloutOutcome, Sleeper};
use crate::stages::helm::{Helm, HelmPresence};
use crate::stages::{operator, Stage, StageError};

pub type SharedConnector = Arc<dyn ClusterConnector + Send + Sync + 'static>;
pub type SharedStatusSource = Arc<dyn RolloutStatusSource + Send + Sync + 'static>;
pub type SharedSleeper = Arc<dyn Sleeper + Send + Sync + 'static>;

/// The three manifests submitted for one application.
#[derive(Clone, Debug)]
pub struct DeployRequest {
    pub deployment: DeploymentSpec,
    pub autoscaler: AutoscalerSpec,
    pub service: ServiceSpec,
}

impl DeployRequest {
    fn id(&self) -> &DeploymentId {
        &self.deployment.id
    }
}

#[derive(Debug)]
pub struct PipelineReport {
    pub cluster: ClusterInfo,
    pub helm: HelmPresence,
    pub rollout: RolloutOutcome,
}

pub struct Pipeline {
    target: ClusterTarget,
    operator: OperatorConfig,
    policy: RetryPolicy,
    connector: SharedConnector,
    status_source: SharedStatusSource,
    sleeper: SharedSleeper,
    helm: Helm,
    kubectl: Kubectl,
}

impl Pipeline {
    pub fn new(
        config: ToolingConfig,
        target: ClusterTarget,
        runner: SharedRunner,
        connector: SharedConnector,
        status_source: SharedStatusSource,
        sleeper: SharedSleeper,
    ) -> Pipeline {
        let ToolingConfig {
            kubectl,
            helm,
            operator,
            rollout,
        } = config;
        Pipeline {
            policy: RetryPolicy::from(&rollout),
            helm: Helm::new(runner.clone(), helm, target.clone()),
            kubectl: Kubectl::new(runner, &kubectl.binary, target.clone()),
            target,
            operator,
            connector,
            status_source,
            sleeper,
        }
    }

    /// Runs every stage in order and stops at the first fatal error.
    ///
    /// An unhealthy rollout is reported in the result, it does not stop the pipeline.
    pub async fn run(&self, request: &DeployRequest) -> Result<PipelineReport, StageError> {
        let id = request.id();

        let cluster = self
            .connect()
            .instrument(stage_span(Stage::ConnectCluster, id))
            .await?;
        let helm = self
            .helm
            .ensure_installed()
            .instrument(stage_span(Stage::EnsureHelm, id))
            .await?;
        operator::deploy(&self.helm, &self.operator)
            .instrument(stage_span(Stage::DeployOperator, id))
            .await?;
        operator::verify(&self.kubectl, &self.operator)
            .instrument(stage_span(Stage::VerifyOperator, id))
            .await?;

        self.apply(Stage::ApplyDeployment, &request.deployment, id)
            .await?;
        self.apply(Stage::ApplyAutoscaler, &request.autoscaler, id)
            .await?;
        let rollout = self
            .monitor(id)
            .instrument(stage_span(Stage::MonitorRollout, id))
            .await?;
        self.apply(Stage::ApplyService, &request.service, id).await?;

        Ok(PipelineReport {
            cluster,
            helm,
            rollout,
        })
    }

    async fn connect(&self) -> Result<ClusterInfo, StageError> {
        let cluster = self
            .connector
            .connect(&self.target)
            .await
            .map_err(StageError::Connection)?;
        tracing::info!(
            cluster_url = %cluster.cluster_url,
            default_namespace = %cluster.default_namespace,
            "Successfully connected to Kubernetes cluster."
        );
        Ok(cluster)
    }

    async fn apply(
        &self,
        stage: Stage,
        manifest: &(dyn Manifest + Sync),
        id: &DeploymentId,
    ) -> Result<(), StageError> {
        async {
            self.kubectl
                .apply(manifest, id.namespace.as_str())
                .await
                .map_err(|source| StageError::Apply {
                    stage,
                    kind: manifest.kind(),
                    name: manifest.name(),
                    source,
                })?;
            tracing::info!("{} {} created successfully.", manifest.kind(), manifest.name());
            Ok::<(), StageError>(())
        }
        .instrument(stage_span(stage, id))
        .await
    }

    async fn monitor(&self, id: &DeploymentId) -> Result<RolloutOutcome, StageError> {
        RolloutMonitor::new(&*self.status_source, &*self.sleeper, self.policy)
            .watch(id)
            .await
            .map_err(StageError::StatusQuery)
    }
}

fn stage_span(stage: Stage, id: &DeploymentId) -> tracing::Span {
    tracing::info_span!(
        "stage",
        stage = stage.name(),
        namespace = %id.namespace,
        app = %id.deployment
    )
}

/// Process exit status for a finished run. An unhealthy rollout still counts as success.
pub fn exit_status(result: &Result<PipelineReport, StageError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
