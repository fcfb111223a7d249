use std::sync::Arc;

use crate::analysis::service::AnalysisService;
use crate::config::Config;
use crate::llm_client::GeminiClient;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Direct provider handle for operator endpoints (model listing).
    pub llm: GeminiClient,
    /// Fallback pipeline. Holds its own `Arc<dyn CompletionProvider>`.
    pub analysis: Arc<AnalysisService>,
}
