use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use kube::CustomResourceExt;
use tokio::sync::watch;
use tracing::info;

use hpatuner_api::HpaTuner;
use hpatuner_controller::ControllerMetrics;
use hpatunerd::config::{self, Cli, Command, RunArgs};
use hpatunerd::server::{ProbeState, build_router};
use hpatunerd::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Crd => {
            println!("{}", serde_json::to_string_pretty(&HpaTuner::crd())?);
            Ok(())
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    logging::init(args.log_json);

    let settings = args.resolve()?;
    let controller = settings.controller;

    info!(
        namespace = controller.namespace.as_deref().unwrap_or("<all>"),
        probe_addr = %settings.probe_addr,
        "starting hpatunerd"
    );

    // ── Kubernetes client ──────────────────────────────────────

    let mut kube_config = kube::Config::infer()
        .await
        .context("inferring kubernetes config")?;
    config::apply_api_timeout(&mut kube_config, controller.api_timeout);
    let client = kube::Client::try_from(kube_config).context("building kubernetes client")?;

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Controller ─────────────────────────────────────────────

    let telemetry = Arc::new(ControllerMetrics::new());
    let probes = ProbeState::new(telemetry.clone());

    let controller_handle = tokio::spawn(hpatuner_controller::runtime::run(
        client,
        controller,
        telemetry,
        shutdown_rx,
    ));
    probes.set_ready(true);

    // ── Probe server ───────────────────────────────────────────

    let listener = tokio::net::TcpListener::bind(settings.probe_addr)
        .await
        .with_context(|| format!("binding probe server to {}", settings.probe_addr))?;
    info!(addr = %settings.probe_addr, "probe server listening");

    let ready = probes.clone();
    axum::serve(listener, build_router(probes))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            ready.set_ready(false);
            let _ = shutdown_tx.send(true);
        })
        .await?;

    let _ = controller_handle.await;

    info!("hpatunerd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
