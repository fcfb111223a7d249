//! Resilient completion service — ordered model fallback plus response normalization.
//!
//! Flow: for each candidate in preference order, call the provider once.
//!       First success stops the loop → sanitize → parse → decode.
//!
//! The loop is strictly sequential: at most one provider call is in flight,
//! and a candidate that answered is never second-guessed by a later one.
//! A parse failure is reported as-is; it is not retried on the next model.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::analysis::models::{AnalysisResult, GrievanceInput};
use crate::analysis::prompts::build_analysis_prompt;
use crate::analysis::response::{normalize, ResponseError};
use crate::llm_client::candidates::{CandidateList, ModelCandidate};
use crate::llm_client::CompletionProvider;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Every candidate failed at the call layer.
    #[error("all {attempts} candidate models failed; last error: {last_cause}")]
    ProviderUnavailable { attempts: usize, last_cause: String },

    /// A candidate answered, but the text is not a usable analysis.
    /// `raw` is for server-side diagnosis only.
    #[error("model {model} returned an unusable response: {reason}")]
    MalformedResponse {
        model: ModelCandidate,
        reason: ResponseError,
        raw: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Succeeded { chars: usize },
    Failed { cause: String },
}

/// One provider call within a single invocation. Never leaves the service.
#[derive(Debug, Clone)]
struct CompletionAttempt {
    candidate: ModelCandidate,
    outcome: AttemptOutcome,
    elapsed: Duration,
}

/// Raw text from the first candidate that answered.
#[derive(Debug, Clone)]
pub struct Completion {
    pub model: ModelCandidate,
    pub text: String,
}

/// A normalized result and the model that produced it.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub model: ModelCandidate,
    pub result: AnalysisResult,
}

/// Holds the read-only provider handle and candidate order. Share via `Arc`.
pub struct AnalysisService {
    provider: Arc<dyn CompletionProvider>,
    candidates: CandidateList,
}

impl AnalysisService {
    pub fn new(provider: Arc<dyn CompletionProvider>, candidates: CandidateList) -> Self {
        Self {
            provider,
            candidates,
        }
    }

    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    /// Builds the prompt for `input` and runs the full pipeline.
    pub async fn analyze_grievance(&self, input: GrievanceInput) -> Result<Analysis, AnalysisError> {
        let prompt = build_analysis_prompt(&input);
        self.analyze(&prompt).await
    }

    /// Fallback loop followed by normalization of the winning text.
    pub async fn analyze(&self, prompt: &str) -> Result<Analysis, AnalysisError> {
        let Completion { model, text } = self.complete(prompt).await?;

        match normalize(&text) {
            Ok(result) => Ok(Analysis { model, result }),
            Err(reason) => {
                error!(
                    "Model {} returned unusable output ({}). Raw text: {}",
                    model, reason, text
                );
                Err(AnalysisError::MalformedResponse {
                    model,
                    reason,
                    raw: text,
                })
            }
        }
    }

    /// Tries each candidate once, in order, stopping at the first successful call.
    pub async fn complete(&self, prompt: &str) -> Result<Completion, AnalysisError> {
        let mut attempts: Vec<CompletionAttempt> = Vec::with_capacity(self.candidates.len());

        for candidate in self.candidates.iter() {
            info!("Attempting generation with model: {}", candidate);
            let started = Instant::now();

            match self.provider.complete(candidate, prompt).await {
                Ok(text) => {
                    let elapsed = started.elapsed();
                    info!(
                        "Success with model: {} ({}ms, {} chars)",
                        candidate,
                        elapsed.as_millis(),
                        text.len()
                    );
                    attempts.push(CompletionAttempt {
                        candidate: candidate.clone(),
                        outcome: AttemptOutcome::Succeeded { chars: text.len() },
                        elapsed,
                    });
                    log_attempts(&attempts);
                    return Ok(Completion {
                        model: candidate.clone(),
                        text,
                    });
                }
                Err(e) => {
                    warn!("Model {} failed: {}", candidate, e);
                    attempts.push(CompletionAttempt {
                        candidate: candidate.clone(),
                        outcome: AttemptOutcome::Failed {
                            cause: e.to_string(),
                        },
                        elapsed: started.elapsed(),
                    });
                }
            }
        }

        log_attempts(&attempts);
        let last_cause = attempts
            .last()
            .and_then(|a| match &a.outcome {
                AttemptOutcome::Failed { cause } => Some(cause.clone()),
                AttemptOutcome::Succeeded { .. } => None,
            })
            .unwrap_or_else(|| "no candidate models configured".to_string());

        error!(
            "All {} models failed. Last error: {}",
            attempts.len(),
            last_cause
        );
        Err(AnalysisError::ProviderUnavailable {
            attempts: attempts.len(),
            last_cause,
        })
    }
}

fn log_attempts(attempts: &[CompletionAttempt]) {
    let summary: Vec<String> = attempts
        .iter()
        .map(|a| {
            let status = match &a.outcome {
                AttemptOutcome::Succeeded { chars } => format!("ok:{chars}"),
                AttemptOutcome::Failed { .. } => "failed".to_string(),
            };
            format!("{}={}({}ms)", a.candidate, status, a.elapsed.as_millis())
        })
        .collect();
    info!("Completion attempts: [{}]", summary.join(", "));
}
