use crate::configuration::OperatorConfig;
use crate::kubernetes::kubectl::Kubectl;
use crate::stages::helm::Helm;
use crate::stages::StageError;

/// Adds the chart repository, refreshes it and installs the operator release.
pub async fn deploy(helm: &Helm, operator: &OperatorConfig) -> Result<(), StageError> {
    let install_error = |source| StageError::OperatorInstall {
        release: operator.release.clone(),
        source,
    };
    helm.repo_add(&operator.repo_name, &operator.repo_url)
        .await
        .map_err(install_error)?;
    helm.repo_update().await.map_err(install_error)?;
    helm.install(
        &operator.release,
        &operator.chart,
        operator.namespace.as_deref(),
    )
    .await
    .map_err(install_error)?;
    tracing::info!(release = %operator.release, "Operator installed successfully.");
    Ok(())
}

/// The operator counts as running when its pod marker shows up in the pod listing.
pub async fn verify(kubectl: &Kubectl, operator: &OperatorConfig) -> Result<(), StageError> {
    let pods = kubectl
        .get_pods(operator.namespace.as_deref())
        .await
        .map_err(StageError::OperatorQuery)?;
    if pods.contains(&operator.pod_marker) {
        tracing::info!(marker = %operator.pod_marker, "Operator is running.");
        Ok(())
    } else {
        Err(StageError::OperatorNotRunning {
            marker: operator.pod_marker.clone(),
        })
    }
}
