// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration,
};
use k8s_openapi::api::core::v1::Secret;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Resource, ResourceExt,
};
use std::fmt::Debug;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info};
use webhook_certs::{
    config::Args,
    constants::{MANAGED_BY_LABEL, MANAGED_BY_VALUE, METRICS_SERVER_PATH},
    context::Context,
    element::WebhookConfigElement,
    metrics::gather_metrics,
    reconcilers::{reconcile_webhook_config, SyncOutcome},
};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

fn main() -> Result<()> {
    let args = Args::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(args.worker_threads)
        .thread_name("webhook-certs")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    // Format: timestamp file:line LEVEL message
    //
    // Respects RUST_LOG (default: info) and RUST_LOG_FORMAT (json or text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting webhook certificate controller");
    debug!(?args, "Parsed arguments");

    debug!("Initializing Kubernetes client");
    let client = kube::Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let metrics_addr = args.metrics_addr();
    let ctx = Arc::new(Context::new(client, args));

    info!("Starting all controllers");

    // Controllers should never exit - if one does, log it and exit the process
    tokio::select! {
        result = run_metrics_server(metrics_addr) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("metrics server exited unexpectedly without error")
        }
        result = run_controller::<MutatingWebhookConfiguration>(ctx.clone()) => {
            error!("CRITICAL: MutatingWebhookConfiguration controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("MutatingWebhookConfiguration controller exited unexpectedly without error")
        }
        result = run_controller::<ValidatingWebhookConfiguration>(ctx.clone()) => {
            error!("CRITICAL: ValidatingWebhookConfiguration controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("ValidatingWebhookConfiguration controller exited unexpectedly without error")
        }
        () = shutdown_signal() => {
            info!("Shutdown signal received, stopping controllers");
            Ok(())
        }
    }
}

/// Resolve on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// Run the controller for one webhook configuration kind.
///
/// Secrets carrying the managed-by label and an owner reference back to a
/// configuration trigger a re-sync of that configuration.
async fn run_controller<K>(ctx: Arc<Context>) -> Result<()>
where
    K: Resource<DynamicType = ()>
        + Clone
        + Debug
        + serde::de::DeserializeOwned
        + Send
        + Sync
        + 'static,
    WebhookConfigElement: From<K>,
{
    info!("Starting {} controller", K::kind(&()));

    let api = Api::<K>::all(ctx.client.clone());
    let secrets = Api::<Secret>::all(ctx.client.clone());
    let managed_secrets =
        Config::default().labels(&format!("{MANAGED_BY_LABEL}={MANAGED_BY_VALUE}"));

    Controller::new(api, Config::default())
        .owns(secrets, managed_secrets)
        .run(reconcile_wrapper::<K>, error_policy::<K>, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper shared by both webhook configuration kinds
async fn reconcile_wrapper<K>(resource: Arc<K>, ctx: Arc<Context>) -> Result<Action, ReconcileError>
where
    K: Resource<DynamicType = ()> + Clone,
    WebhookConfigElement: From<K>,
{
    let element = WebhookConfigElement::from((*resource).clone());
    debug!(
        kind = %element.kind(),
        name = %element.name(),
        "Reconcile wrapper called"
    );

    match reconcile_webhook_config(&ctx.syncer, &element).await {
        Ok(SyncOutcome::Updated) => {
            info!(
                "Successfully reconciled {}: {} (CA bundles updated)",
                element.kind().kind_name(),
                resource.name_any()
            );
            Ok(Action::requeue(ctx.args.requeue_interval()))
        }
        Ok(SyncOutcome::Unchanged) => {
            debug!(
                "{} {} already in sync",
                element.kind().kind_name(),
                resource.name_any()
            );
            Ok(Action::requeue(ctx.args.requeue_interval()))
        }
        Err(e) => {
            error!(
                "Failed to reconcile {} {}: {}",
                element.kind().kind_name(),
                resource.name_any(),
                e
            );
            Err(anyhow::Error::from(e).into())
        }
    }
}

/// Error policy for both controllers
fn error_policy<K>(_resource: Arc<K>, _err: &ReconcileError, ctx: Arc<Context>) -> Action {
    Action::requeue(ctx.args.error_requeue())
}

/// Serve Prometheus metrics until the listener fails.
async fn run_metrics_server(addr: SocketAddr) -> Result<()> {
    let app = Router::new()
        .route(METRICS_SERVER_PATH, get(metrics_handler))
        .route("/healthz", get(|| async { "ok" }));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Metrics server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler() -> Response {
    match gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
