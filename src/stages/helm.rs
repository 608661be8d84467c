use crate::configuration::{ClusterTarget, HelmConfig};
use crate::process::{CommandError, Invocation, SharedRunner};
use crate::stages::StageError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HelmPresence {
    AlreadyInstalled,
    Installed,
}

/// Package-manager CLI wrapper.
pub struct Helm {
    runner: SharedRunner,
    config: HelmConfig,
    target: ClusterTarget,
}

impl Helm {
    pub fn new(runner: SharedRunner, config: HelmConfig, target: ClusterTarget) -> Helm {
        Helm {
            runner,
            config,
            target,
        }
    }

    fn invocation<'a, I: IntoIterator<Item = &'a str>>(&self, args: I) -> Invocation {
        Invocation::new(&self.config.binary).args(args)
    }

    fn version(&self) -> Invocation {
        self.invocation(["version"])
    }

    /// Download, unpack, move into place, clean up, then check it runs.
    fn install_steps(&self) -> Vec<Invocation> {
        let HelmConfig {
            archive_url,
            archive_name,
            extracted_dir,
            install_path,
            ..
        } = &self.config;
        let extracted_binary = format!("{extracted_dir}/helm");
        vec![
            Invocation::new("curl").args([
                "-fsSL",
                archive_url.as_str(),
                "-o",
                archive_name.as_str(),
            ]),
            Invocation::new("tar").args(["-zxvf", archive_name.as_str()]),
            Invocation::new("sudo").args(["mv", extracted_binary.as_str(), install_path.as_str()]),
            Invocation::new("rm").args(["-rf", archive_name.as_str(), extracted_dir.as_str()]),
            self.version(),
        ]
    }

    /// Makes sure `helm version` runs, installing helm when the binary is missing.
    pub async fn ensure_installed(&self) -> Result<HelmPresence, StageError> {
        match self.runner.run_checked(&self.version()).await {
            Ok(_) => {
                tracing::info!("Helm is already installed.");
                Ok(HelmPresence::AlreadyInstalled)
            }
            Err(CommandError::NotFound { .. }) => {
                tracing::info!("Helm not found. Installing Helm...");
                for step in self.install_steps() {
                    self.runner
                        .run_checked(&step)
                        .await
                        .map_err(StageError::HelmInstall)?;
                }
                tracing::info!("Helm installed successfully.");
                Ok(HelmPresence::Installed)
            }
            Err(e) => Err(StageError::HelmBroken(e)),
        }
    }

    pub async fn repo_add(&self, name: &str, url: &str) -> Result<(), CommandError> {
        self.runner
            .run_checked(&self.invocation(["repo", "add", name, url]))
            .await
            .map(drop)
    }

    pub async fn repo_update(&self) -> Result<(), CommandError> {
        self.runner
            .run_checked(&self.invocation(["repo", "update"]))
            .await
            .map(drop)
    }

    /// `helm install <release> <chart>`, into `namespace` (created on demand) when given.
    pub async fn install(
        &self,
        release: &str,
        chart: &str,
        namespace: Option<&str>,
    ) -> Result<(), CommandError> {
        let mut invocation = self.invocation(["install", release, chart]);
        if let Some(namespace) = namespace {
            invocation = invocation.args(["--namespace", namespace, "--create-namespace"]);
        }
        let invocation = invocation.args(self.target.helm_flags());
        self.runner.run_checked(&invocation).await.map(drop)
    }
}
