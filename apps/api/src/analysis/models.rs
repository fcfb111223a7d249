//! Grievance input and the structured analysis report returned by the model.
//!
//! Wire names are camelCase to match the JSON schema embedded in the prompt.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::warn;

// ────────────────────────────────────────────────────────────────────────────
// Input
// ────────────────────────────────────────────────────────────────────────────

/// Raw request body for `POST /api/analyze`. Every field is optional on the
/// wire so that missing required fields surface as `InvalidInput`, not as a
/// body-rejection from the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub category: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub department: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
#[error("Missing required fields: {}", .missing.join(", "))]
pub struct InputError {
    pub missing: Vec<&'static str>,
}

/// A validated grievance. `category` and `description` are never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct GrievanceInput {
    category: String,
    city: Option<String>,
    state: Option<String>,
    department: Option<String>,
    description: String,
}

impl GrievanceInput {
    /// Validates and trims a request. Reports every missing required field at once.
    pub fn from_request(request: AnalyzeRequest) -> Result<Self, InputError> {
        let category = non_blank(request.category);
        let description = non_blank(request.description);

        match (category, description) {
            (Some(category), Some(description)) => Ok(Self {
                category,
                city: non_blank(request.city),
                state: non_blank(request.state),
                department: non_blank(request.department),
                description,
            }),
            (category, description) => {
                let mut missing = Vec::new();
                if category.is_none() {
                    missing.push("category");
                }
                if description.is_none() {
                    missing.push("description");
                }
                Err(InputError { missing })
            }
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

/// Closed three-value scale used for urgency and confidence.
///
/// Decoding is lenient: case is ignored, and `null` or a value outside the
/// scale falls back to `Medium` with a warning instead of failing the response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(Level::default());
        };
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Level::Low,
            "medium" => Level::Medium,
            "high" => Level::High,
            _ => {
                warn!("Unrecognized level {:?}, using {:?}", raw, Level::default());
                Level::default()
            }
        })
    }
}

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeveledReason {
    pub level: Level,
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IssueAnalysis {
    #[serde(deserialize_with = "null_as_default")]
    pub issue_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub intent: String,
    #[serde(deserialize_with = "null_as_default")]
    pub entities: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub urgency: LeveledReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionOption {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pros: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub cons: Vec<String>,
}

/// The recommendation rewritten for a non-technical reader, in all three languages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifiedExplanation {
    #[serde(deserialize_with = "null_as_default")]
    pub en: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hi: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hinglish: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Recommendation {
    /// Should name one of `AnalysisResult::actions`; see `recommended_action`.
    #[serde(deserialize_with = "null_as_default")]
    pub action_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tradeoff_analysis: String,
    #[serde(deserialize_with = "null_as_default")]
    pub confidence: LeveledReason,
    /// "If I were in your situation..." first-person narrative.
    #[serde(deserialize_with = "null_as_default")]
    pub empathetic_path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub simplified_explanation: SimplifiedExplanation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplaintDraft {
    #[serde(deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmissionGuide {
    #[serde(deserialize_with = "null_as_default")]
    pub authority_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timeline: String,
    #[serde(deserialize_with = "null_as_default")]
    pub escalation: String,
}

/// Full decision report for one grievance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(deserialize_with = "null_as_default")]
    pub analysis: IssueAnalysis,
    #[serde(deserialize_with = "null_as_default")]
    pub actions: Vec<ActionOption>,
    #[serde(deserialize_with = "null_as_default")]
    pub recommendation: Recommendation,
    #[serde(deserialize_with = "null_as_default")]
    pub evidence_checklist: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub draft: ComplaintDraft,
    #[serde(deserialize_with = "null_as_default")]
    pub risks: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub submission_guide: SubmissionGuide,
}

impl AnalysisResult {
    /// Looks up the recommended action. `None` means the model produced a
    /// dangling `actionId`; callers must handle it rather than index blindly.
    pub fn recommended_action(&self) -> Option<&ActionOption> {
        self.actions
            .iter()
            .find(|a| a.id == self.recommendation.action_id)
    }
}
