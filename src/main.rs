mod configuration;
mod kubernetes;
mod manifest;
mod pipeline;
mod process;
mod rollout;
mod stages;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::configuration::cli::Cli;
use crate::kubernetes::kubectl::Kubectl;
use crate::kubernetes::kubers::{KubeRsConnector, KubeRsStatus};
use crate::kubernetes::StatusBackend;
use crate::pipeline::{exit_status, Pipeline, SharedStatusSource};
use crate::process::{AsyncProcessRunner, SharedRunner};
use crate::rollout::TokioSleeper;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_logging();

    let cli = Cli::parse();
    let config = configuration::load(cli.config.as_deref())?;
    let target = cli.cluster_target();

    let runner: SharedRunner = Arc::new(AsyncProcessRunner);
    let status_source: SharedStatusSource = match cli.status_backend {
        StatusBackend::Kubectl => Arc::new(Kubectl::new(
            runner.clone(),
            &config.kubectl.binary,
            target.clone(),
        )),
        StatusBackend::KubeApi => Arc::new(KubeRsStatus::new(target.clone())),
    };

    let pipeline = Pipeline::new(
        config,
        target,
        runner,
        Arc::new(KubeRsConnector),
        status_source,
        Arc::new(TokioSleeper),
    );

    let result = pipeline.run(&cli.deploy_request()).await;
    match &result {
        Ok(report) => tracing::info!(
            cluster_url = %report.cluster.cluster_url,
            helm = ?report.helm,
            rollout_retries = report.rollout.retries(),
            healthy = report.rollout.is_healthy(),
            "Deployment of {} finished.",
            cli.app_name
        ),
        Err(error) => tracing::error!(stage = %error.stage(), "{error}"),
    }
    Ok(ExitCode::from(exit_status(&result)))
}
