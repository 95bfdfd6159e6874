//! HTTP server facade for Libris with Axum, error normalization, and OpenAPI output.

use std::future::Future;

use anyhow::Context;
use axum::{routing::get, Json};
use serde_json::{json, Map, Value};

use libris_kernel::{settings::Settings, ModuleRegistry};

pub mod error;
pub mod router;

use error::ErrorPolicy;
use router::RouterBuilder;

/// Start the HTTP server and serve until `shutdown` resolves
pub async fn start_server(
    registry: &ModuleRegistry,
    settings: &Settings,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let address = settings.server.address();
    tracing::info!("starting HTTP server on {}", address);

    let app = build_router(registry, settings).context("failed to build HTTP router")?;

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind to {address}"))?;

    tracing::info!("HTTP server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<axum::Router> {
    let base_path = normalize_base_path(&settings.server.base_path)?;
    let mut router_builder = RouterBuilder::new(base_path);

    let mut endpoints = Map::new();
    for module in registry.modules() {
        let module_name = module.name();
        let mount = router_builder.module_path(module_name);

        tracing::info!(module = module_name, "mounting module routes under {}", mount);
        endpoints.insert(module_name.to_string(), Value::String(mount));
        router_builder = router_builder.mount_module(module_name, module.routes());
    }
    endpoints.insert("docs".to_string(), json!("/docs/openapi.json"));

    let metadata = json!({
        "message": "Library API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints,
    });

    let router = router_builder
        .route("/", get(move || async move { Json(metadata.clone()) }))
        .route("/healthz", get(health_check))
        .with_openapi(registry)
        .with_not_found_fallback()
        .with_panic_recovery()
        .with_timeout(settings.server.request_timeout_ms)
        .with_error_normalizer(ErrorPolicy::from_settings(settings))
        .with_tracing()
        .with_request_id()
        .with_cors()
        .build();

    Ok(router)
}

/// `""`, `"/"` → `""`; `"api/"` → `"/api"`
fn normalize_base_path(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.contains(['{', '}', '*']) || trimmed.chars().any(char::is_whitespace) {
        anyhow::bail!("invalid server.base_path '{raw}'");
    }
    if trimmed.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("/{trimmed}"))
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Resolve on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
