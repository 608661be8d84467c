use std::path::PathBuf;

use clap::Parser;

use crate::configuration::ClusterTarget;
use crate::kubernetes::model::{DeploymentId, DeploymentName, Namespace};
use crate::kubernetes::StatusBackend;
use crate::manifest::{AutoscalerSpec, DeploymentSpec, Resources, ServiceSpec, ServiceType};
use crate::pipeline::DeployRequest;

fn parse_namespace(value: &str) -> Result<Namespace, String> {
    Namespace::parse(value).ok_or_else(|| {
        format!("'{value}' is not a valid namespace (RFC 1123 label expected).")
    })
}

fn parse_app_name(value: &str) -> Result<DeploymentName, String> {
    DeploymentName::parse(value).ok_or_else(|| {
        format!("'{value}' is not a valid application name (RFC 1123 label expected).")
    })
}

/// Kubernetes deployment automation.
#[derive(Debug, Parser)]
#[command(name = "kube_rollout", disable_version_flag = true)]
pub struct Cli {
    /// Namespace for the deployment
    #[arg(long, value_parser = parse_namespace)]
    pub namespace: Namespace,
    /// Name of the application
    #[arg(long, value_parser = parse_app_name)]
    pub app_name: DeploymentName,
    /// Container image for the application
    #[arg(long)]
    pub image: String,
    /// Version of the container image
    #[arg(long)]
    pub version: String,
    /// CPU requests for the application
    #[arg(long, default_value = "100m")]
    pub cpu_req: String,
    /// Memory requests for the application
    #[arg(long, default_value = "128Mi")]
    pub mem_req: String,
    /// CPU limits for the application
    #[arg(long, default_value = "500m")]
    pub cpu_lim: String,
    /// Memory limits for the application
    #[arg(long, default_value = "512Mi")]
    pub mem_lim: String,
    /// Target CPU utilization for HPA
    #[arg(long, default_value_t = 80, value_parser = clap::value_parser!(u32).range(1..))]
    pub cpu_util: u32,
    /// Target memory utilization for HPA
    #[arg(long, default_value_t = 80, value_parser = clap::value_parser!(u32).range(1..))]
    pub mem_util: u32,
    /// Port for the service
    #[arg(long, default_value_t = 80, value_parser = clap::value_parser!(u16).range(1..))]
    pub svc_port: u16,
    /// Port for the container
    #[arg(long, default_value_t = 8080, value_parser = clap::value_parser!(u16).range(1..))]
    pub container_port: u16,
    /// Type of the service exposing the deployment
    #[arg(long, value_enum, default_value_t = ServiceType::NodePort)]
    pub service_type: ServiceType,
    /// Kubeconfig file, default resolution when omitted
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context, current context when omitted
    #[arg(long)]
    pub context: Option<String>,
    /// YAML file overriding tooling defaults (binaries, operator chart, rollout polling)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Where rollout status is read from
    #[arg(long, value_enum, default_value_t = StatusBackend::Kubectl)]
    pub status_backend: StatusBackend,
}

impl Cli {
    pub fn deployment_id(&self) -> DeploymentId {
        DeploymentId {
            namespace: self.namespace.clone(),
            deployment: self.app_name.clone(),
        }
    }

    pub fn cluster_target(&self) -> ClusterTarget {
        ClusterTarget {
            kubeconfig: self.kubeconfig.clone(),
            context: self.context.clone(),
        }
    }

    pub fn deployment_spec(&self) -> DeploymentSpec {
        DeploymentSpec {
            id: self.deployment_id(),
            image: self.image.clone(),
            version: self.version.clone(),
            resources: Resources {
                cpu_request: self.cpu_req.clone(),
                memory_request: self.mem_req.clone(),
                cpu_limit: self.cpu_lim.clone(),
                memory_limit: self.mem_lim.clone(),
            },
            container_port: self.container_port,
        }
    }

    pub fn autoscaler_spec(&self) -> AutoscalerSpec {
        AutoscalerSpec {
            target: self.deployment_id(),
            cpu_utilization: self.cpu_util,
            memory_utilization: self.mem_util,
        }
    }

    pub fn service_spec(&self) -> ServiceSpec {
        ServiceSpec {
            target: self.deployment_id(),
            service_type: self.service_type,
            port: self.svc_port,
            target_port: self.container_port,
        }
    }

    pub fn deploy_request(&self) -> DeployRequest {
        DeployRequest {
            deployment: self.deployment_spec(),
            autoscaler: self.autoscaler_spec(),
            service: self.service_spec(),
        }
    }
}
