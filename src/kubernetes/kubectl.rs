use async_trait::async_trait;

use crate::configuration::ClusterTarget;
use crate::kubernetes::model::{AvailableCondition, DeploymentId, RolloutStatusSource};
use crate::manifest::Manifest;
use crate::process::{CommandError, CommandOutput, Invocation, SharedRunner};

const AVAILABLE_STATUS_JSONPATH: &str =
    r#"jsonpath={.status.conditions[?(@.type=="Available")].status}"#;

/// Cluster CLI wrapper. Every call goes through the shared command runner.
pub struct Kubectl {
    runner: SharedRunner,
    binary: String,
    target: ClusterTarget,
}

impl Kubectl {
    pub fn new(runner: SharedRunner, binary: &str, target: ClusterTarget) -> Kubectl {
        Kubectl {
            runner,
            binary: binary.to_owned(),
            target,
        }
    }

    fn invocation<'a, I: IntoIterator<Item = &'a str>>(&self, args: I) -> Invocation {
        Invocation::new(&self.binary)
            .args(args)
            .args(self.target.kubectl_flags())
    }

    /// `kubectl apply -f - --namespace <ns>` with the rendered manifest on stdin.
    pub async fn apply(
        &self,
        manifest: &(dyn Manifest + Sync),
        namespace: &str,
    ) -> Result<CommandOutput, CommandError> {
        let invocation = self
            .invocation(["apply", "-f", "-", "--namespace", namespace])
            .stdin(manifest.render());
        self.runner.run_checked(&invocation).await
    }

    /// Pod listing as printed by `kubectl get pods`.
    pub async fn get_pods(&self, namespace: Option<&str>) -> Result<String, CommandError> {
        let invocation = match namespace {
            Some(namespace) => self.invocation(["get", "pods", "-n", namespace]),
            None => self.invocation(["get", "pods"]),
        };
        Ok(self.runner.run_checked(&invocation).await?.stdout)
    }
}

#[async_trait]
impl RolloutStatusSource for Kubectl {
    async fn available_condition(
        &self,
        deployment_id: &DeploymentId,
    ) -> anyhow::Result<AvailableCondition> {
        let invocation = self.invocation([
            "get",
            "deployment",
            deployment_id.deployment.as_str(),
            "-n",
            deployment_id.namespace.as_str(),
            "-o",
            AVAILABLE_STATUS_JSONPATH,
        ]);
        let output = self.runner.run_checked(&invocation).await?;
        Ok(AvailableCondition::from_raw(&output.stdout))
    }
}
