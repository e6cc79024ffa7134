use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, ListParams, PostParams},
    client::Client,
    core::ErrorResponse,
};
use log::debug;

use crate::errors::Error;

/// The three control-plane operations the redeploy pass needs. Connection
/// bootstrapping stays with the caller; implementations only get to classify
/// failures into the crate's error taxonomy.
#[async_trait]
pub trait ControlPlane {
    /// List pods in the given namespace, or across all namespaces when `None`.
    /// Always returns the complete list or fails as a whole.
    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>, Error>;

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, Error>;

    async fn update_deployment(
        &self,
        namespace: &str,
        name: &str,
        deployment: Deployment,
    ) -> Result<Deployment, Error>;
}

/// `ControlPlane` backed by a real Kubernetes API server.
#[derive(Clone)]
pub struct KubeControlPlane {
    client: Client,
}

impl KubeControlPlane {
    pub fn new(client: Client) -> Self {
        KubeControlPlane { client }
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ControlPlane for KubeControlPlane {
    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>, Error> {
        let api: Api<Pod> = match namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        };

        // Follow continue tokens so callers always see the full list, even
        // when the API server truncates large result sets.
        let mut pods = Vec::new();
        let mut params = ListParams::default();
        loop {
            let page = api.list(&params).await.map_err(Error::Connectivity)?;
            pods.extend(page.items);
            match page.metadata.continue_ {
                Some(token) if !token.is_empty() => params.continue_token = Some(token),
                _ => break,
            }
        }
        debug!("Listed {} pods", pods.len());
        Ok(pods)
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, Error> {
        self.deployments(namespace).get(name).await.map_err(|err| match err {
            kube::Error::Api(ErrorResponse { code: 404, .. }) => Error::DeploymentNotFound {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
            },
            other => Error::Connectivity(other),
        })
    }

    async fn update_deployment(
        &self,
        namespace: &str,
        name: &str,
        deployment: Deployment,
    ) -> Result<Deployment, Error> {
        self.deployments(namespace)
            .replace(name, &PostParams::default(), &deployment)
            .await
            .map_err(|err| match err {
                kube::Error::Api(ErrorResponse { code: 409, .. }) => Error::Conflict {
                    namespace: namespace.to_owned(),
                    name: name.to_owned(),
                    source: err,
                },
                kube::Error::Api(ErrorResponse { code: 404, .. }) => Error::DeploymentNotFound {
                    namespace: namespace.to_owned(),
                    name: name.to_owned(),
                },
                other => Error::Connectivity(other),
            })
    }
}
