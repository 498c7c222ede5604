//! Generator collaborators: an OpenAI-compatible chat client per provider,
//! the provider registry, and the two-call "team" used when final code is
//! requested.
//!
//! ```text
//! query + context ─▶ prompts.rs ─▶ client.rs (retry, status mapping) ─▶ markdown
//!                                    ▲
//!                          team.rs ──┘ explanation call + final-code call
//! ```

pub mod client;
pub mod prompts;
pub mod team;

pub use client::{ChatClient, ProviderRegistry};
pub use team::{ArtifactFlags, Extras, Team};

use crate::preprocessing::Methodology;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),
    #[error("Provider '{0}' is not configured")]
    UnknownProvider(String),
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
    #[error("Request timeout - the API took too long to respond")]
    Timeout,
    #[error("Connection error - unable to reach the API")]
    Connect,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Authentication failed - check your API key")]
    Unauthorized,
    #[error("Access forbidden - insufficient permissions")]
    Forbidden,
    #[error("Rate limit exceeded - too many requests")]
    RateLimited,
    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Failed to parse API response as JSON: {0}")]
    Parse(String),
    #[error("API returned empty response")]
    EmptyResponse,
    #[error("API returned empty content")]
    EmptyContent,
    #[error("All {attempts} attempts failed. Last error: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<GenerationError>,
    },
}

impl GenerationError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Timeout
                | GenerationError::Connect
                | GenerationError::Network(_)
                | GenerationError::RateLimited
                | GenerationError::Server { .. }
                | GenerationError::EmptyResponse
                | GenerationError::EmptyContent
        )
    }

    /// Caused by the request itself rather than the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GenerationError::InvalidInput(_) | GenerationError::UnknownProvider(_)
        )
    }
}

/// Maps a question, optional context and methodology to markdown.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        query: &str,
        context: Option<&str>,
        methodology: Methodology,
    ) -> Result<String, GenerationError>;
}

/// Picks a generator for a request's optional provider/model override.
pub trait GeneratorSource: Send + Sync {
    fn resolve(
        &self,
        provider: Option<&str>,
        model_id: Option<&str>,
    ) -> Result<Arc<dyn Generator>, GenerationError>;
}
