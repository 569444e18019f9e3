use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionModel;
use crate::sheets::SheetSink;

/// Shared application state injected into all route handlers via Axum extractors.
/// Read-only after startup; nothing per-submission lives here.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Model boundary. Default: `LlmClient` (Anthropic Messages API).
    pub model: Arc<dyn CompletionModel>,
    /// Row destination. `LogOnlySink` when no spreadsheet is configured.
    pub sheet: Arc<dyn SheetSink>,
}
