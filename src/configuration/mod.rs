use std::path::{Path, PathBuf};

use serde::Deserialize;

pub mod cli;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Couldn't read tooling configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid tooling configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct KubectlConfig {
    pub binary: String,
}

impl Default for KubectlConfig {
    fn default() -> Self {
        KubectlConfig {
            binary: "kubectl".to_owned(),
        }
    }
}

/// Where the helm binary comes from when it is missing.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HelmConfig {
    pub binary: String,
    pub archive_url: String,
    pub archive_name: String,
    pub extracted_dir: String,
    pub install_path: String,
}

impl Default for HelmConfig {
    fn default() -> Self {
        HelmConfig {
            binary: "helm".to_owned(),
            archive_url: "https://get.helm.sh/helm-v3.9.0-linux-amd64.tar.gz".to_owned(),
            archive_name: "helm-v3.9.0-linux-amd64.tar.gz".to_owned(),
            extracted_dir: "linux-amd64".to_owned(),
            install_path: "/usr/local/bin/helm".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OperatorConfig {
    pub repo_name: String,
    pub repo_url: String,
    pub chart: String,
    pub release: String,
    /// Helm and kubectl defaults apply when unset.
    pub namespace: Option<String>,
    /// Substring of `kubectl get pods` output proving the operator runs.
    pub pod_marker: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        OperatorConfig {
            repo_name: "keda".to_owned(),
            repo_url: "https://kedacore.github.io/charts".to_owned(),
            chart: "keda/keda".to_owned(),
            release: "keda".to_owned(),
            namespace: None,
            pod_marker: "keda-operator".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RolloutConfig {
    pub max_retries: u32,
    pub interval_seconds: u64,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        RolloutConfig {
            max_retries: 4,
            interval_seconds: 10,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolingConfig {
    pub kubectl: KubectlConfig,
    pub helm: HelmConfig,
    pub operator: OperatorConfig,
    pub rollout: RolloutConfig,
}

/// Kubeconfig file and context used for the kube client, kubectl and helm alike.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterTarget {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

impl ClusterTarget {
    pub fn kubectl_flags(&self) -> Vec<String> {
        self.flags("--context")
    }

    pub fn helm_flags(&self) -> Vec<String> {
        self.flags("--kube-context")
    }

    fn flags(&self, context_flag: &str) -> Vec<String> {
        let mut flags = Vec::new();
        if let Some(kubeconfig) = &self.kubeconfig {
            flags.push("--kubeconfig".to_owned());
            flags.push(kubeconfig.display().to_string());
        }
        if let Some(context) = &self.context {
            flags.push(context_flag.to_owned());
            flags.push(context.clone());
        }
        flags
    }
}

pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<ToolingConfig, ConfigError> {
    let path = path.as_ref();
    let conf_file = std::fs::File::open(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    };
    // Merge keys (`<<: *anchor`) are not resolved by serde_yaml on its own.
    let mut yaml_value: serde_yaml::Value =
        serde_yaml::from_reader(conf_file).map_err(parse_error)?;
    yaml_value.apply_merge().map_err(parse_error)?;
    if yaml_value.is_null() {
        return Ok(ToolingConfig::default());
    }
    serde_yaml::from_value(yaml_value).map_err(parse_error)
}

/// Built-in defaults unless a file is given.
pub fn load(path: Option<&Path>) -> Result<ToolingConfig, ConfigError> {
    match path {
        Some(path) => load_from_yaml(path),
        None => Ok(ToolingConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_keda_install() {
        let config = load(None).unwrap();
        assert_eq!(config.kubectl.binary, "kubectl");
        assert_eq!(config.helm.binary, "helm");
        assert_eq!(config.operator.chart, "keda/keda");
        assert_eq!(config.operator.pod_marker, "keda-operator");
        assert_eq!(config.operator.namespace, None);
        assert_eq!(config.rollout.max_retries, 4);
        assert_eq!(config.rollout.interval_seconds, 10);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = write_config(
            r#"
operator:
  namespace: keda
rollout:
  interval_seconds: 3
"#,
        );
        let config = load_from_yaml(file.path()).unwrap();
        assert_eq!(config.operator.namespace.as_deref(), Some("keda"));
        assert_eq!(config.operator.release, "keda");
        assert_eq!(config.rollout.interval_seconds, 3);
        assert_eq!(config.rollout.max_retries, 4);
        assert_eq!(config.helm, HelmConfig::default());
    }

    #[test]
    fn merge_keys_are_applied() {
        let file = write_config(
            r#"
operator:
  <<: { repo_name: kedacore, release: keda-prod }
  namespace: keda
"#,
        );
        let config = load_from_yaml(file.path()).unwrap();
        assert_eq!(config.operator.repo_name, "kedacore");
        assert_eq!(config.operator.release, "keda-prod");
        assert_eq!(config.operator.namespace.as_deref(), Some("keda"));
        assert_eq!(config.operator.chart, "keda/keda");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let file = write_config("rollout:\n  max_retrys: 2\n");
        assert!(matches!(
            load_from_yaml(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            load_from_yaml("/nonexistent/kube_rollout.yaml"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn cluster_target_flags() {
        assert!(ClusterTarget::default().kubectl_flags().is_empty());

        let target = ClusterTarget {
            kubeconfig: Some(PathBuf::from("/etc/kube/config")),
            context: Some("prod-eu".to_owned()),
        };
        assert_eq!(
            target.kubectl_flags(),
            ["--kubeconfig", "/etc/kube/config", "--context", "prod-eu"]
        );
        assert_eq!(
            target.helm_flags(),
            ["--kubeconfig", "/etc/kube/config", "--kube-context", "prod-eu"]
        );
    }
}
