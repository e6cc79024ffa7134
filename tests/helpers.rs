use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::ErrorResponse;

use k8s_redeploy::errors::Error;
use k8s_redeploy::ControlPlane;

// Build a pod with the given labels
pub fn pod(namespace: &str, name: &str, labels: Vec<(&str, &str)>) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            labels: Some(
                labels
                    .into_iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect(),
            ),
            ..ObjectMeta::default()
        },
        ..Pod::default()
    }
}

// Build a bare deployment
pub fn deployment(namespace: &str, name: &str) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            ..ObjectMeta::default()
        },
        ..Deployment::default()
    }
}

/// In-memory `ControlPlane`: a fixed pod list and a mutable deployment store,
/// recording every update call.
pub struct FakeControlPlane {
    pub pods: Vec<Pod>,
    pub deployments: Mutex<BTreeMap<(String, String), Deployment>>,
    pub updates: Mutex<Vec<(String, String)>>,
    pub fail_listing: bool,
}

impl FakeControlPlane {
    pub fn new(pods: Vec<Pod>, deployments: Vec<Deployment>) -> Self {
        let deployments = deployments
            .into_iter()
            .map(|deployment| {
                let key = (
                    deployment.metadata.namespace.clone().unwrap_or_default(),
                    deployment.metadata.name.clone().unwrap_or_default(),
                );
                (key, deployment)
            })
            .collect();
        FakeControlPlane {
            pods,
            deployments: Mutex::new(deployments),
            updates: Mutex::new(Vec::new()),
            fail_listing: false,
        }
    }

    pub fn unreachable() -> Self {
        let mut fake = FakeControlPlane::new(vec![], vec![]);
        fake.fail_listing = true;
        fake
    }

    pub fn recorded_updates(&self) -> Vec<(String, String)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn stored_deployment(&self, namespace: &str, name: &str) -> Deployment {
        self.deployments
            .lock()
            .unwrap()
            .get(&(namespace.to_owned(), name.to_owned()))
            .cloned()
            .expect("deployment not present in fake store")
    }
}

fn unreachable_error() -> Error {
    Error::Connectivity(kube::Error::Api(ErrorResponse {
        status: "Failure".to_owned(),
        message: "connection refused".to_owned(),
        reason: "ServiceUnavailable".to_owned(),
        code: 503,
    }))
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>, Error> {
        if self.fail_listing {
            return Err(unreachable_error());
        }
        Ok(self
            .pods
            .iter()
            .filter(|pod| match namespace {
                Some(namespace) => pod.metadata.namespace.as_deref() == Some(namespace),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, Error> {
        self.deployments
            .lock()
            .unwrap()
            .get(&(namespace.to_owned(), name.to_owned()))
            .cloned()
            .ok_or_else(|| Error::DeploymentNotFound {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
            })
    }

    async fn update_deployment(
        &self,
        namespace: &str,
        name: &str,
        deployment: Deployment,
    ) -> Result<Deployment, Error> {
        self.updates
            .lock()
            .unwrap()
            .push((namespace.to_owned(), name.to_owned()));

        let mut deployments = self.deployments.lock().unwrap();
        let key = (namespace.to_owned(), name.to_owned());
        if !deployments.contains_key(&key) {
            return Err(Error::DeploymentNotFound {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
            });
        }
        deployments.insert(key, deployment.clone());
        Ok(deployment)
    }
}
