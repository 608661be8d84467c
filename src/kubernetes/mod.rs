pub mod kubectl;
pub mod kubers;
pub mod model;
#[cfg(test)]
pub mod stubs;

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum StatusBackend {
    /// `kubectl get deployment` with a JSONPath query.
    Kubectl,
    /// Kubernetes API through the kube client.
    KubeApi,
}
