use super::error::ApiError;
use super::AppState;
use crate::engine::{AskRequest, TutorResponse};
use crate::preprocessing::Methodology;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, instrument};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MethodologyInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub recommended_for: Vec<String>,
    pub is_xml_formatted: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MethodologiesResponse {
    pub methodologies: Vec<String>,
    pub methodology_info: Vec<MethodologyInfo>,
}

/// Optional generator override on the POST routes.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProviderParams {
    pub provider: Option<String>,
    pub model_id: Option<String>,
}

pub async fn health() -> Json<HealthResponse> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "agno".to_string(),
        timestamp,
    })
}

pub async fn methodologies() -> Json<MethodologiesResponse> {
    let methodology_info = Methodology::ALL
        .iter()
        .map(|m| {
            let profile = m.profile();
            MethodologyInfo {
                id: m.as_str().to_string(),
                name: profile.display_name.to_string(),
                description: profile.summary.to_string(),
                recommended_for: profile.use_cases.iter().map(|s| s.to_string()).collect(),
                is_xml_formatted: profile.xml_formatted,
            }
        })
        .collect();

    Json(MethodologiesResponse {
        methodologies: Methodology::ALL
            .iter()
            .map(|m| m.as_str().to_string())
            .collect(),
        methodology_info,
    })
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProviderParams>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<TutorResponse>, ApiError> {
    let Json(request) = payload?;
    answer(&state, &params, request).await
}

pub async fn worked_example(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProviderParams>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<TutorResponse>, ApiError> {
    let Json(mut request) = payload?;
    request.methodology = Methodology::WorkedExamples.as_str().to_string();
    answer(&state, &params, request).await
}

#[instrument(skip_all, fields(provider = ?params.provider))]
async fn answer(
    state: &AppState,
    params: &ProviderParams,
    request: AskRequest,
) -> Result<Json<TutorResponse>, ApiError> {
    let generator = state
        .generators
        .resolve(params.provider.as_deref(), params.model_id.as_deref())?;
    let response = state.orchestrator.ask(&request, generator).await?;
    info!(methodology = %response.methodology, "Answer delivered");
    Ok(Json(response))
}
