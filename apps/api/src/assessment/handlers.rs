//! Axum route handlers for the Assessment API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::assessment::models::{InterviewInput, ParsedAnswer};
use crate::assessment::parser::parse;
use crate::assessment::pipeline::run_assessment;
use crate::assessment::prompts::PromptTemplate;
use crate::assessment::sheet_row::SheetRow;
use crate::auth::Credentials;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub interviewer_name: String,
    pub candidate_name: String,
    pub transcript: String,
    /// Falls back to the configured default template.
    pub template: Option<PromptTemplate>,
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub submission_id: Uuid,
    pub template: PromptTemplate,
    pub analysis: String,
    pub parsed: ParsedAnswer,
    pub row: SheetRow,
    pub saved: bool,
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub response_text: String,
    pub template: Option<PromptTemplate>,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub template: PromptTemplate,
    pub parsed: ParsedAnswer,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub authenticated: bool,
    pub username: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/auth/login
///
/// Checks a username/password against the configured staff table.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<LoginResponse>, AppError> {
    state.config.credentials.authorize(Some(&credentials))?;
    info!(username = %credentials.username, "Staff login");

    Ok(Json(LoginResponse {
        authenticated: true,
        username: credentials.username,
    }))
}

/// POST /api/v1/interviews/analyze
///
/// Full pipeline: prompt → model → parse → sheet append.
/// Always returns the parsed record when the model answered, even if the
/// sheet append failed (`saved: false`).
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    state
        .config
        .credentials
        .authorize(request.credentials.as_ref())?;

    let input = InterviewInput::new(
        request.interviewer_name,
        request.candidate_name,
        request.transcript,
    )?;
    let template = request.template.unwrap_or(state.config.default_template);

    let outcome = run_assessment(
        state.model.as_ref(),
        state.sheet.as_ref(),
        &input,
        template,
        state.config.include_timestamp,
    )
    .await?;

    Ok(Json(AnalyzeResponse {
        submission_id: outcome.submission_id,
        template: outcome.template,
        analysis: outcome.analysis,
        parsed: outcome.parsed,
        row: outcome.row,
        saved: outcome.saved,
    }))
}

/// POST /api/v1/interviews/parse
///
/// Runs only the response parser over pasted model output. No model call,
/// no sheet append.
pub async fn handle_parse(
    State(state): State<AppState>,
    Json(request): Json<ParseRequest>,
) -> Json<ParseResponse> {
    let template = request.template.unwrap_or(state.config.default_template);
    let rubric = template.rubric();
    let parsed = parse(
        &request.response_text,
        template.question_count(),
        rubric.as_ref(),
    );

    Json(ParseResponse { template, parsed })
}
