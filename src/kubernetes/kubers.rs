use async_trait::async_trait;

use k8s_openapi::api::apps::v1::Deployment;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use tokio::sync::OnceCell;

use crate::configuration::ClusterTarget;
use crate::kubernetes::model::{
    AvailableCondition, ClusterConnector, ClusterInfo, DeploymentId, RolloutStatusSource,
};

async fn load_config(target: &ClusterTarget) -> anyhow::Result<Config> {
    let context_options = KubeConfigOptions {
        context: target.context.clone(),
        ..Default::default()
    };
    let config = match &target.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)?;
            Config::from_custom_kubeconfig(kubeconfig, &context_options).await?
        }
        None => Config::from_kubeconfig(&context_options).await?,
    };
    Ok(config)
}

/// Status of the "Available" condition, empty when the deployment has not reported it yet.
fn available_status(deployment: &Deployment) -> &str {
    deployment
        .status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == "Available"))
        .map(|condition| condition.status.as_str())
        .unwrap_or_default()
}

/// Loads kubeconfig credentials and builds a client from them.
pub struct KubeRsConnector;

#[async_trait]
impl ClusterConnector for KubeRsConnector {
    async fn connect(&self, target: &ClusterTarget) -> anyhow::Result<ClusterInfo> {
        let config = load_config(target).await?;
        let info = ClusterInfo {
            cluster_url: config.cluster_url.to_string(),
            default_namespace: config.default_namespace.clone(),
        };
        Client::try_from(config)?;
        Ok(info)
    }
}

/// Reads rollout status straight from the API server instead of shelling out.
///
/// The client is built on the first read and reused for every poll after it.
pub struct KubeRsStatus {
    target: ClusterTarget,
    client: OnceCell<Client>,
}

impl KubeRsStatus {
    pub fn new(target: ClusterTarget) -> KubeRsStatus {
        KubeRsStatus {
            target,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> anyhow::Result<Client> {
        let client = self
            .client
            .get_or_try_init(|| async {
                let config = load_config(&self.target).await?;
                Ok::<_, anyhow::Error>(Client::try_from(config)?)
            })
            .await?;
        Ok(client.clone())
    }
}

#[async_trait]
impl RolloutStatusSource for KubeRsStatus {
    async fn available_condition(
        &self,
        deployment_id: &DeploymentId,
    ) -> anyhow::Result<AvailableCondition> {
        let deployment: Deployment =
            Api::namespaced(self.client().await?, deployment_id.namespace.as_str())
                .get(deployment_id.deployment.as_str())
                .await?;
        Ok(AvailableCondition::from_raw(available_status(&deployment)))
    }
}
