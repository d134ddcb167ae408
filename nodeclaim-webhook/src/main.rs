//! Validating admission webhook server for DriverConfig node selectors.

use std::{convert::Infallible, net::SocketAddr, path::PathBuf};

use clap::Parser;
use kube::{core::admission::AdmissionReview, Client};
use nodeclaim::{ApiClusterView, ConflictPolicy, DriverConfig, NodeSelectorValidator};
use tracing::info;
use warp::{Filter, Reply};

#[derive(Parser)]
#[command(version, about = "Rejects DriverConfigs whose node selectors overlap")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8443")]
    listen: SocketAddr,

    /// Conflict policy: "reserved-default" or "uniform".
    ///
    /// Must be identical across webhook replicas.
    #[arg(long, default_value = "reserved-default")]
    policy: ConflictPolicy,

    /// Path to the PEM-encoded TLS certificate for the webhook service.
    #[arg(long, requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// Path to the PEM-encoded TLS private key.
    #[arg(long, requires = "tls_cert")]
    tls_key: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let client = Client::try_default().await?;
    let validator = NodeSelectorValidator::with_policy(ApiClusterView::new(client), args.policy);

    let with_validator = warp::any().map(move || validator.clone());
    let routes = warp::path("validate")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_validator)
        .and_then(handle)
        .with(warp::trace::request());

    // The apiserver only calls webhooks over HTTPS. The cert pair must match
    // the CA bundle registered in the ValidatingWebhookConfiguration; running
    // without one is only useful behind an upstream TLS terminator.
    match (args.tls_cert, args.tls_key) {
        (Some(cert), Some(key)) => {
            info!(addr = %args.listen, policy = ?args.policy, "serving with tls");
            warp::serve(routes)
                .tls()
                .cert_path(cert)
                .key_path(key)
                .run(args.listen)
                .await;
        }
        _ => {
            info!(addr = %args.listen, policy = ?args.policy, "serving without tls");
            warp::serve(routes).run(args.listen).await;
        }
    }
    Ok(())
}

async fn handle(
    body: AdmissionReview<DriverConfig>,
    validator: NodeSelectorValidator<ApiClusterView>,
) -> Result<impl Reply, Infallible> {
    Ok(warp::reply::json(&nodeclaim::webhook::review(&validator, body).await))
}
