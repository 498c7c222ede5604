//! HTTP surface. Every route lives under `/agno`.
//!
//! - `GET  /agno/health`
//! - `GET  /agno/methodologies`
//! - `POST /agno/ask`
//! - `POST /agno/worked-example`
//!
//! The POST routes accept `?provider=...&model_id=...` to pick the generator.

pub mod error;
pub mod handlers;

pub use error::ApiError;

use crate::engine::Orchestrator;
use crate::llm::GeneratorSource;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub orchestrator: Orchestrator,
    pub generators: Arc<dyn GeneratorSource>,
}

pub fn router(state: Arc<AppState>, permissive_cors: bool) -> Router {
    let agno = Router::new()
        .route("/health", get(handlers::health))
        .route("/methodologies", get(handlers::methodologies))
        .route("/ask", post(handlers::ask))
        .route("/worked-example", post(handlers::worked_example))
        .with_state(state);

    let app = Router::new()
        .nest("/agno", agno)
        .layer(TraceLayer::new_for_http());
    if permissive_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
