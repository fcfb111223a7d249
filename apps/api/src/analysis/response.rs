//! Response normalization — turns an untrusted completion into an `AnalysisResult`.
//!
//! Stages, each callable on its own:
//! 1. `sanitize`       — strip markdown code fences and surrounding whitespace
//! 2. `parse_value`    — strict JSON parse into a generic `Value`
//! 3. `decode_result`  — typed decode; missing or null fields default, wrong types fail
//! 4. `check_integrity` — opt-in cross-field checks, reported not enforced

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use crate::analysis::models::AnalysisResult;

/// Minimum number of action options the prompt asks for.
pub const MIN_ACTIONS: usize = 3;

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("model returned empty text")]
    Empty,

    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("JSON does not match the analysis schema: {0}")]
    Schema(#[source] serde_json::Error),
}

/// A cross-field inconsistency in an otherwise well-formed result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrityIssue {
    #[error("recommendation.actionId '{0}' does not match any action id")]
    DanglingActionId(String),

    #[error("expected at least {min} actions, got {0}", min = MIN_ACTIONS)]
    TooFewActions(usize),

    #[error("duplicate action id '{0}'")]
    DuplicateActionId(String),
}

/// Strips ```json ... ``` or ``` ... ``` fences and surrounding whitespace.
pub fn sanitize(raw: &str) -> &str {
    let text = raw.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```JSON"))
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text)
        .trim();
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// Strict syntactic parse. Empty input is its own error, not a JSON error.
pub fn parse_value(sanitized: &str) -> Result<Value, ResponseError> {
    if sanitized.is_empty() {
        return Err(ResponseError::Empty);
    }
    serde_json::from_str(sanitized).map_err(ResponseError::InvalidJson)
}

/// Decodes a parsed value into the typed result.
pub fn decode_result(value: Value) -> Result<AnalysisResult, ResponseError> {
    if !value.is_object() {
        return Err(ResponseError::NotAnObject(json_kind(&value)));
    }
    serde_json::from_value(value).map_err(ResponseError::Schema)
}

/// Runs all three stages over raw completion text.
pub fn normalize(raw: &str) -> Result<AnalysisResult, ResponseError> {
    decode_result(parse_value(sanitize(raw))?)
}

/// Reports cross-field problems. Never fails; the caller decides what to do.
pub fn check_integrity(result: &AnalysisResult) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    if result.actions.len() < MIN_ACTIONS {
        issues.push(IntegrityIssue::TooFewActions(result.actions.len()));
    }

    let mut seen = HashSet::new();
    for action in &result.actions {
        if !seen.insert(action.id.as_str()) {
            issues.push(IntegrityIssue::DuplicateActionId(action.id.clone()));
        }
    }

    if result.recommended_action().is_none() {
        issues.push(IntegrityIssue::DanglingActionId(
            result.recommendation.action_id.clone(),
        ));
    }

    issues
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
