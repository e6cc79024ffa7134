use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to reach the control plane: {0}")]
    Connectivity(#[source] kube::Error),

    #[error("Deployment '{namespace}/{name}' does not exist")]
    DeploymentNotFound { namespace: String, name: String },

    #[error("Update of deployment '{namespace}/{name}' was rejected: {source}")]
    Conflict {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },
}
