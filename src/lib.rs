//! Methodology-driven tutoring gateway.
//!
//! A question travels through the scope gate, gets its prompt context
//! augmented with formatting rules and session memory, is answered by an LLM
//! generator, and comes back as markdown plus navigable segments.

pub mod api;
pub mod config;
pub mod engine;
pub mod llm;
pub mod memory;
pub mod postprocessing;
pub mod preprocessing;
pub mod telemetry;

use crate::api::AppState;
use crate::config::Config;
use crate::engine::Orchestrator;
use crate::llm::ProviderRegistry;
use crate::memory::{InMemoryStore, PocketBaseStore, SessionStore};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

/// Wire the configured store and provider registry into the shared state.
pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let store: Arc<dyn SessionStore> = match &config.store.pocketbase_url {
        Some(url) => {
            info!(url = %url, "Persisting sessions to PocketBase");
            Arc::new(
                PocketBaseStore::new(url, &config.store)
                    .context("failed to build PocketBase client")?,
            )
        }
        None => {
            info!("No PocketBase URL configured, keeping sessions in memory");
            Arc::new(InMemoryStore::new())
        }
    };

    let generators =
        ProviderRegistry::new(config.llm.clone()).context("failed to build LLM client")?;

    Ok(Arc::new(AppState {
        orchestrator: Orchestrator::new(config, store),
        generators: Arc::new(generators),
    }))
}

pub fn build_router(config: &Config) -> anyhow::Result<axum::Router> {
    let state = build_state(config)?;
    Ok(api::router(state, config.server.permissive_cors))
}

/// Serve until `shutdown` resolves.
pub async fn run<F>(config: Config, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = build_router(&config)?;
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;

    info!(
        addr = %config.server.bind_addr,
        provider = %config.llm.default_provider,
        "methodica listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;
    info!("methodica stopped");
    Ok(())
}
