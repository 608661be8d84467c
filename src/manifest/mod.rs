use std::fmt::{Display, Formatter};

use crate::kubernetes::model::DeploymentId;

pub const MIN_REPLICAS: u32 = 1;
pub const MAX_REPLICAS: u32 = 5;

/// Something `kubectl apply` can take on stdin.
pub trait Manifest {
    fn kind(&self) -> &'static str;
    fn name(&self) -> String;
    fn render(&self) -> String;
}

#[derive(Clone, Debug)]
pub struct Resources {
    pub cpu_request: String,
    pub memory_request: String,
    pub cpu_limit: String,
    pub memory_limit: String,
}

#[derive(Clone, Debug)]
pub struct DeploymentSpec {
    pub id: DeploymentId,
    pub image: String,
    pub version: String,
    pub resources: Resources,
    pub container_port: u16,
}

impl Manifest for DeploymentSpec {
    fn kind(&self) -> &'static str {
        "Deployment"
    }

    fn name(&self) -> String {
        self.id.deployment.to_string()
    }

    fn render(&self) -> String {
        let DeploymentSpec {
            id,
            image,
            version,
            resources,
            container_port,
        } = self;
        let (app, namespace) = (&id.deployment, &id.namespace);
        format!(
            r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: {app}
  namespace: {namespace}
spec:
  replicas: 1
  selector:
    matchLabels:
      app: {app}
  template:
    metadata:
      labels:
        app: {app}
    spec:
      containers:
      - name: {app}
        image: {image}:{version}
        resources:
          requests:
            memory: {memory_request}
            cpu: {cpu_request}
          limits:
            memory: {memory_limit}
            cpu: {cpu_limit}
        ports:
        - containerPort: {container_port}
"#,
            memory_request = resources.memory_request,
            cpu_request = resources.cpu_request,
            memory_limit = resources.memory_limit,
            cpu_limit = resources.cpu_limit,
        )
    }
}

#[derive(Clone, Debug)]
pub struct AutoscalerSpec {
    pub target: DeploymentId,
    pub cpu_utilization: u32,
    pub memory_utilization: u32,
}

impl Manifest for AutoscalerSpec {
    fn kind(&self) -> &'static str {
        "HorizontalPodAutoscaler"
    }

    fn name(&self) -> String {
        format!("{}-hpa", self.target.deployment)
    }

    fn render(&self) -> String {
        let (app, namespace) = (&self.target.deployment, &self.target.namespace);
        format!(
            r#"apiVersion: autoscaling/v2
kind: HorizontalPodAutoscaler
metadata:
  name: {name}
  namespace: {namespace}
spec:
  scaleTargetRef:
    apiVersion: apps/v1
    kind: Deployment
    name: {app}
  minReplicas: {MIN_REPLICAS}
  maxReplicas: {MAX_REPLICAS}
  metrics:
  - type: Resource
    resource:
      name: cpu
      target:
        type: Utilization
        averageUtilization: {cpu}
  - type: Resource
    resource:
      name: memory
      target:
        type: Utilization
        averageUtilization: {memory}
"#,
            name = self.name(),
            cpu = self.cpu_utilization,
            memory = self.memory_utilization,
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ServiceType {
    #[value(name = "ClusterIP")]
    ClusterIp,
    #[value(name = "NodePort")]
    NodePort,
    #[value(name = "LoadBalancer")]
    LoadBalancer,
}

impl Display for ServiceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ServiceType::ClusterIp => "ClusterIP",
            ServiceType::NodePort => "NodePort",
            ServiceType::LoadBalancer => "LoadBalancer",
        })
    }
}

#[derive(Clone, Debug)]
pub struct ServiceSpec {
    pub target: DeploymentId,
    pub service_type: ServiceType,
    pub port: u16,
    pub target_port: u16,
}

impl Manifest for ServiceSpec {
    fn kind(&self) -> &'static str {
        "Service"
    }

    fn name(&self) -> String {
        format!("{}-svc", self.target.deployment)
    }

    fn render(&self) -> String {
        let (app, namespace) = (&self.target.deployment, &self.target.namespace);
        format!(
            r#"apiVersion: v1
kind: Service
metadata:
  name: {name}
  namespace: {namespace}
spec:
  selector:
    app: {app}
  type: {service_type}
  ports:
    - protocol: TCP
      port: {port}
      targetPort: {target_port}
"#,
            name = self.name(),
            service_type = self.service_type,
            port = self.port,
            target_port = self.target_port,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::model::{DeploymentName, Namespace};

    fn id(namespace: &str, app: &str) -> DeploymentId {
        DeploymentId {
            namespace: Namespace::parse(namespace).unwrap(),
            deployment: DeploymentName::parse(app).unwrap(),
        }
    }

    fn deployment() -> DeploymentSpec {
        DeploymentSpec {
            id: id("prod", "api"),
            image: "registry.example.com/team/api".to_owned(),
            version: "1.4.2".to_owned(),
            resources: Resources {
                cpu_request: "100m".to_owned(),
                memory_request: "128Mi".to_owned(),
                cpu_limit: "500m".to_owned(),
                memory_limit: "512Mi".to_owned(),
            },
            container_port: 8080,
        }
    }

    fn yaml(manifest: &dyn Manifest) -> serde_yaml::Value {
        serde_yaml::from_str(&manifest.render()).unwrap()
    }

    #[test]
    fn deployment_substitutes_arguments_verbatim() {
        let doc = yaml(&deployment());
        assert_eq!(doc["apiVersion"], "apps/v1");
        assert_eq!(doc["kind"], "Deployment");
        assert_eq!(doc["metadata"]["name"], "api");
        assert_eq!(doc["metadata"]["namespace"], "prod");
        assert_eq!(doc["spec"]["replicas"], 1);
        assert_eq!(doc["spec"]["selector"]["matchLabels"]["app"], "api");

        let container = &doc["spec"]["template"]["spec"]["containers"][0];
        assert_eq!(container["name"], "api");
        assert_eq!(container["image"], "registry.example.com/team/api:1.4.2");
        assert_eq!(container["resources"]["requests"]["cpu"], "100m");
        assert_eq!(container["resources"]["requests"]["memory"], "128Mi");
        assert_eq!(container["resources"]["limits"]["cpu"], "500m");
        assert_eq!(container["resources"]["limits"]["memory"], "512Mi");
        assert_eq!(container["ports"][0]["containerPort"], 8080);
    }

    #[test]
    fn deployment_renders_a_single_document() {
        let rendered = deployment().render();
        assert_eq!(rendered.matches("kind: ").count(), 1);
        assert!(!rendered.contains("\n---"));
    }

    #[test]
    fn autoscaler_uses_utilization_targets() {
        let hpa = AutoscalerSpec {
            target: id("prod", "api"),
            cpu_utilization: 80,
            memory_utilization: 65,
        };
        assert_eq!(hpa.name(), "api-hpa");

        let doc = yaml(&hpa);
        assert_eq!(doc["apiVersion"], "autoscaling/v2");
        assert_eq!(doc["metadata"]["name"], "api-hpa");
        assert_eq!(doc["metadata"]["namespace"], "prod");
        assert_eq!(doc["spec"]["scaleTargetRef"]["kind"], "Deployment");
        assert_eq!(doc["spec"]["scaleTargetRef"]["name"], "api");
        assert_eq!(doc["spec"]["minReplicas"], 1);
        assert_eq!(doc["spec"]["maxReplicas"], 5);

        let metrics = &doc["spec"]["metrics"];
        assert_eq!(metrics[0]["resource"]["name"], "cpu");
        assert_eq!(metrics[0]["resource"]["target"]["averageUtilization"], 80);
        assert_eq!(metrics[1]["resource"]["name"], "memory");
        assert_eq!(metrics[1]["resource"]["target"]["averageUtilization"], 65);
    }

    #[test]
    fn autoscaler_cpu_target_is_literal() {
        let hpa = AutoscalerSpec {
            target: id("prod", "api"),
            cpu_utilization: 80,
            memory_utilization: 80,
        };
        assert!(hpa
            .render()
            .contains("name: cpu\n      target:\n        type: Utilization\n        averageUtilization: 80\n"));
    }

    #[test]
    fn service_exposes_container_port() {
        let service = ServiceSpec {
            target: id("staging", "web"),
            service_type: ServiceType::NodePort,
            port: 80,
            target_port: 8080,
        };
        assert_eq!(service.kind(), "Service");
        assert_eq!(service.name(), "web-svc");

        let doc = yaml(&service);
        assert_eq!(doc["apiVersion"], "v1");
        assert_eq!(doc["metadata"]["name"], "web-svc");
        assert_eq!(doc["metadata"]["namespace"], "staging");
        assert_eq!(doc["spec"]["selector"]["app"], "web");
        assert_eq!(doc["spec"]["type"], "NodePort");
        assert_eq!(doc["spec"]["ports"][0]["protocol"], "TCP");
        assert_eq!(doc["spec"]["ports"][0]["port"], 80);
        assert_eq!(doc["spec"]["ports"][0]["targetPort"], 8080);
    }

    #[test]
    fn service_type_renders_kubernetes_spelling() {
        assert_eq!(ServiceType::ClusterIp.to_string(), "ClusterIP");
        assert_eq!(ServiceType::LoadBalancer.to_string(), "LoadBalancer");
    }
}
