//! Request and response shapes of a tutoring call.

use crate::llm::Extras;
use crate::postprocessing::Segment;
use crate::preprocessing::LearnerSignals;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UserContext {
    pub user_id: String,
    #[serde(default)]
    pub current_topic: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub learning_progress: Option<Map<String, Value>>,
    #[serde(default)]
    pub previous_interactions: Option<Vec<String>>,
}

impl UserContext {
    pub fn signals(&self) -> LearnerSignals {
        LearnerSignals {
            has_topic: self
                .current_topic
                .as_deref()
                .is_some_and(|t| !t.is_empty()),
            has_progress: self
                .learning_progress
                .as_ref()
                .is_some_and(|p| !p.is_empty()),
        }
    }
}

fn default_true() -> Option<bool> {
    Some(true)
}

fn default_max_lines() -> Option<usize> {
    Some(150)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AskRequest {
    /// Validated against `Methodology` by the orchestrator, so unknown values
    /// can be reported back verbatim.
    pub methodology: String,
    pub user_query: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub user_context: Option<UserContext>,
    #[serde(default = "default_true")]
    pub include_final_code: Option<bool>,
    /// Accepted for compatibility; diagrams are never generated.
    #[serde(default)]
    pub include_diagram: Option<bool>,
    #[serde(default)]
    pub diagram_type: Option<String>,
    #[serde(default = "default_max_lines")]
    pub max_final_code_lines: Option<usize>,
}

impl AskRequest {
    pub fn new(methodology: &str, user_query: &str) -> Self {
        Self {
            methodology: methodology.to_string(),
            user_query: user_query.to_string(),
            context: None,
            user_context: None,
            include_final_code: default_true(),
            include_diagram: None,
            diagram_type: None,
            max_final_code_lines: default_max_lines(),
        }
    }

    pub fn wants_final_code(&self) -> bool {
        self.include_final_code.unwrap_or(true)
    }

    /// Requested line bound, falling back to `default` when unset or zero.
    pub fn max_lines_or(&self, default: usize) -> usize {
        self.max_final_code_lines
            .filter(|n| *n > 0)
            .unwrap_or(default)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_context
            .as_ref()
            .map(|u| u.user_id.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn learner_signals(&self) -> LearnerSignals {
        self.user_context
            .as_ref()
            .map(UserContext::signals)
            .unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TutorResponse {
    pub response: String,
    pub methodology: String,
    pub is_xml_formatted: bool,
    pub metadata: Map<String, Value>,
    pub extras: Option<Extras>,
    pub segments: Option<Vec<Segment>>,
}

impl TutorResponse {
    /// Empty extras and segment lists are reported as absent.
    pub fn new(
        response: String,
        methodology: &str,
        metadata: Map<String, Value>,
        extras: Extras,
        segments: Vec<Segment>,
    ) -> Self {
        Self {
            response,
            methodology: methodology.to_string(),
            is_xml_formatted: false,
            metadata,
            extras: (!extras.is_empty()).then_some(extras),
            segments: (!segments.is_empty()).then_some(segments),
        }
    }
}
