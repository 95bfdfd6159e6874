//! Libris application library
//!
//! Wires the authors and books modules onto one in-memory catalog and serves
//! them through the shared HTTP stack.

pub mod modules;
pub mod utils;

use std::future::Future;

use anyhow::Context;
use axum::Router;
use libris_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub use modules::catalog::{Catalog, CatalogError};

/// Registry holding every application module over `catalog`
pub fn registry(catalog: &Catalog) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, catalog).context("failed to register modules")?;
    Ok(registry)
}

/// The complete HTTP application over `catalog`, without running module hooks
pub fn build_app(settings: &Settings, catalog: Catalog) -> anyhow::Result<Router> {
    let registry = registry(&catalog)?;
    libris_http::build_router(&registry, settings)
}

/// Init and start every module, serve until Ctrl-C or SIGTERM, then stop
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    run_until(settings, libris_http::shutdown_signal()).await
}

pub async fn run_until(
    settings: Settings,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let catalog = Catalog::new();
    let registry = registry(&catalog)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;
    tracing::info!(modules = registry.len(), env = ?settings.environment, "libris started");

    let served = libris_http::start_server(&registry, &settings, shutdown).await;

    // Modules are stopped even when the server failed.
    let stopped = registry.stop_all().await;
    served?;
    stopped
}
