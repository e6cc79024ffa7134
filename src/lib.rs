use serde::Deserialize;

pub mod client;
pub mod errors;
pub mod redeploy;

pub use client::{ControlPlane, KubeControlPlane};
pub use redeploy::{run, RunReport};

fn default_needle() -> String {
    "database".to_owned()
}

/// Runtime configuration, read from the environment.
///
/// `NEEDLE` is the substring to look for in pod names; `NAMESPACE` restricts
/// the pass to one namespace, all namespaces when unset.
#[derive(Deserialize, Debug, Clone)]
pub struct RedeployConfig {
    #[serde(default = "default_needle")]
    pub needle: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl Default for RedeployConfig {
    fn default() -> Self {
        RedeployConfig {
            needle: default_needle(),
            namespace: None,
        }
    }
}
