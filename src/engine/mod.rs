//! Public façade for the engine layer.

pub mod core;
pub mod orchestrator;
pub mod types;

pub use orchestrator::Orchestrator;
pub use types::{AskRequest, TutorResponse, UserContext};

use crate::llm::GenerationError;
use crate::preprocessing::InvalidMethodology;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    InvalidMethodology(#[from] InvalidMethodology),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl EngineError {
    /// Failures the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        match self {
            EngineError::InvalidMethodology(_) => true,
            EngineError::Generation(e) => e.is_client_error(),
        }
    }
}
