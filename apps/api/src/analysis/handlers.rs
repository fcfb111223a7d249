//! Axum route handlers for the Analysis API.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::models::{AnalyzeRequest, GrievanceInput};
use crate::analysis::response::check_integrity;
use crate::errors::AppError;
use crate::state::AppState;

/// Response header naming the model that produced the analysis.
pub const MODEL_HEADER: &str = "x-analysis-model";

#[derive(Debug, Serialize)]
pub struct ModelListResponse {
    pub models: Vec<String>,
}

/// POST /api/analyze
///
/// Validates the grievance, runs the model-fallback pipeline, and returns the
/// structured report. Required fields are checked before any provider call.
pub async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    let input = GrievanceInput::from_request(request)?;

    let span = info_span!("analysis", analysis_id = %Uuid::new_v4());
    run_analysis(state, input).instrument(span).await
}

async fn run_analysis(state: AppState, input: GrievanceInput) -> Result<Response, AppError> {
    info!(
        "Analyzing grievance: category={}, description_chars={}",
        input.category(),
        input.description().chars().count()
    );

    let analysis = state.analysis.analyze_grievance(input).await?;

    let issues = check_integrity(&analysis.result);
    for issue in &issues {
        warn!("Integrity issue in response from {}: {}", analysis.model, issue);
    }
    if state.config.strict_integrity && !issues.is_empty() {
        let reasons: Vec<String> = issues.iter().map(ToString::to_string).collect();
        return Err(AppError::MalformedResponse {
            model: analysis.model.to_string(),
            reason: reasons.join("; "),
            raw: serde_json::to_string(&analysis.result).unwrap_or_default(),
        });
    }

    let mut response = Json(analysis.result).into_response();
    if let Ok(value) = HeaderValue::from_str(analysis.model.as_str()) {
        response.headers_mut().insert(MODEL_HEADER, value);
    }
    Ok(response)
}

/// GET /api/provider/models
///
/// Lists the models the configured key can reach. Useful when every candidate
/// fails and the operator needs to know what to put in `GEMINI_MODELS`.
pub async fn handle_list_models(
    State(state): State<AppState>,
) -> Result<Json<ModelListResponse>, AppError> {
    if !state.llm.has_api_key() {
        warn!("Listing models without GEMINI_API_KEY; expect an auth error");
    }
    let models = state.llm.list_models().await?;
    if models.is_empty() {
        warn!("API key is valid but has no models assigned");
    }
    Ok(Json(ModelListResponse { models }))
}
