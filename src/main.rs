use k8s_redeploy::{errors::Error, run, KubeControlPlane, RedeployConfig};
use kube::client::Client;
use log::{debug, info};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match envy::from_env::<RedeployConfig>() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Failed to load environment config: {:#?}", error);
            std::process::exit(1);
        }
    };
    debug!("Environment config: {:?}", &config);

    if let Err(error) = redeploy_matching(&config).await {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}

/// Build the kube client, run one redeploy pass and log the outcome.
/// The client lives only for the duration of the pass, error paths included.
async fn redeploy_matching(config: &RedeployConfig) -> Result<(), Error> {
    let client = Client::try_default().await.map_err(Error::Connectivity)?;
    let control_plane = KubeControlPlane::new(client);

    let report = run(&control_plane, config).await?;
    info!(
        "Done: {} pods matched '{}', {} deployments restarted, {} skipped, {} failed",
        report.matched, config.needle, report.restarted, report.skipped, report.failed
    );
    Ok(())
}
