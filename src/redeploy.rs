use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use log::{error, info, warn};

use crate::client::ControlPlane;
use crate::errors::Error;
use crate::RedeployConfig;

/// Annotation kubectl writes for `rollout restart`; changing its value makes
/// the deployment controller roll all pods under the deployment.
pub const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// Label naming the deployment which owns a pod.
pub const APP_LABEL: &str = "app";

/// Outcome counts of a single redeploy pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    pub matched: usize,
    pub restarted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Case-insensitive substring containment of `needle` within `name`.
pub fn matches(name: &str, needle: &str) -> bool {
    name.to_lowercase().contains(&needle.to_lowercase())
}

/// Name of the deployment owning this pod, read off the `app` label.
/// `None` when the label is missing or empty; the pod is then skipped.
pub fn deployment_name(pod: &Pod) -> Option<&str> {
    pod.metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(APP_LABEL))
        .map(|name| name.as_str())
        .filter(|name| !name.is_empty())
}

/// Set the restart annotation on the deployment's pod template, creating the
/// annotation map if the template has none. Touches nothing else.
pub fn stamp_restarted_at(deployment: &mut Deployment, at: DateTime<Utc>) {
    let spec = deployment.spec.get_or_insert_with(Default::default);
    let metadata = spec.template.metadata.get_or_insert_with(Default::default);
    let annotations = metadata.annotations.get_or_insert_with(BTreeMap::new);
    annotations.insert(
        RESTARTED_AT_ANNOTATION.to_owned(),
        at.to_rfc3339_opts(SecondsFormat::Secs, true),
    );
}

/// Trigger a rolling restart of the named deployment. Fetch, stamp the
/// restart annotation with the current time, write the whole object back.
/// One attempt only; conflict handling is left to the caller.
pub async fn restart<C: ControlPlane + ?Sized>(
    control_plane: &C,
    namespace: &str,
    name: &str,
) -> Result<(), Error> {
    let mut deployment = control_plane.get_deployment(namespace, name).await?;
    stamp_restarted_at(&mut deployment, Utc::now());
    control_plane.update_deployment(namespace, name, deployment).await?;
    Ok(())
}

/// One redeploy pass: list pods, restart the owning deployment of every pod
/// whose name contains the configured needle. A listing failure aborts the
/// pass; everything after that is reported per pod and the loop carries on.
pub async fn run<C: ControlPlane + ?Sized>(
    control_plane: &C,
    config: &RedeployConfig,
) -> Result<RunReport, Error> {
    let pods = control_plane.list_pods(config.namespace.as_deref()).await?;

    let mut report = RunReport::default();
    for pod in &pods {
        let name = match pod.metadata.name.as_deref() {
            Some(name) => name,
            None => continue,
        };
        if !matches(name, &config.needle) {
            continue;
        }
        let namespace = pod.metadata.namespace.as_deref().unwrap_or_default();
        info!("Found pod: {}/{}", namespace, name);
        report.matched += 1;

        match deployment_name(pod) {
            Some(deployment) => {
                info!("Redeploying associated deployment: {}/{}", namespace, deployment);
                match restart(control_plane, namespace, deployment).await {
                    Ok(()) => report.restarted += 1,
                    Err(err) => {
                        error!("Failed to restart deployment {}/{}: {}", namespace, deployment, err);
                        report.failed += 1;
                    }
                }
            }
            None => {
                warn!("Pod {}/{} does not have an associated deployment", namespace, name);
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}
