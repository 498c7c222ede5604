//! Response assembly helpers shared by the orchestrator paths.

use super::types::{AskRequest, TutorResponse};
use crate::llm::Extras;
use crate::memory::LearningSession;
use crate::postprocessing::FinalCode;
use crate::preprocessing::{Methodology, Rejection};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::time::Duration;

pub const SUGGESTED_NEXT_STEPS: [&str; 3] = [
    "Tente resolver um problema similar",
    "Identifique os padrões principais",
    "Pratique com variações do exemplo",
];

/// Canned answer for a query the gate turned away.
pub fn rejection_response(rejection: Rejection, methodology: &str) -> TutorResponse {
    let mut metadata = Map::new();
    metadata.insert("rejected_reason".into(), json!(rejection.as_str()));
    metadata.insert("response_format".into(), json!("markdown"));
    TutorResponse::new(
        rejection.message().to_string(),
        methodology,
        metadata,
        Extras::default(),
        Vec::new(),
    )
}

pub fn success_metadata(
    request: &AskRequest,
    methodology: Methodology,
    elapsed: Duration,
    final_code: Option<&FinalCode>,
) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("processing_time".into(), json!(elapsed.as_secs_f64()));
    metadata.insert("methodology_used".into(), json!(methodology.as_str()));
    metadata.insert("context_provided".into(), json!(request.context.is_some()));
    metadata.insert(
        "user_context_provided".into(),
        json!(request.user_context.is_some()),
    );
    metadata.insert("response_format".into(), json!("markdown"));
    if let Some(fc) = final_code {
        metadata.insert("final_code_lines".into(), json!(fc.line_count));
        metadata.insert("final_code_truncated".into(), json!(fc.truncated));
    }
    if methodology == Methodology::WorkedExamples {
        metadata.insert("suggested_next_steps".into(), json!(SUGGESTED_NEXT_STEPS));
    }
    metadata
}

/// Interaction log for one answered question, or `None` without a user id.
pub fn session_record(
    request: &AskRequest,
    methodology: Methodology,
    response: &str,
    started: DateTime<Utc>,
    response_chars: usize,
) -> Option<LearningSession> {
    let user_id = request.user_id()?;
    let mut session = LearningSession::lesson(user_id, format!("agno:{}", methodology))
        .started_at(started);
    let excerpt: String = response.chars().take(response_chars).collect();
    session.interactions = vec![
        json!({"role": "user", "message": request.user_query}),
        json!({"role": "system", "methodology": methodology.as_str(), "content": excerpt}),
    ];
    session.close(Utc::now());
    Some(session)
}
