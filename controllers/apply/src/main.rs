//! kapply
//!
//! One-shot declarative reconciliation of Kubernetes resource objects:
//! load desired definitions, converge the cluster to match them
//! (create/patch/delete as needed, optionally waiting for readiness),
//! and print a summary of exactly what changed.

mod cli;
mod error;
mod source;

use clap::Parser;
use cli::Cli;
use cluster_client::KubeClusterClient;
use reconcile_engine::Reconciler;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let options = cli.reconcile_options();
    let definitions = source::load_definitions(&cli)?;
    info!("Reconciling {} object(s)", definitions.len());

    let client = KubeClusterClient::try_default().await?;
    let reconciler = Reconciler::new(Box::new(client));
    let summary = reconciler.reconcile_all(definitions, &options).await?;

    println!("{}", serde_json::to_string_pretty(&summary.to_json())?);
    if summary.failed {
        std::process::exit(1);
    }
    Ok(())
}
