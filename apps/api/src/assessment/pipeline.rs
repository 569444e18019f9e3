//! Assessment pipeline — one submission from transcript to spreadsheet row.
//!
//! Flow: build_prompt → model.complete → parse → build_sheet_row → append_row.
//!
//! Only the model call can fail the submission. Parsing degrades to empty
//! fields and a failed append is reported as `saved: false`.

use chrono::Local;
use tracing::{info, warn};
use uuid::Uuid;

use crate::assessment::models::{InterviewInput, ParsedAnswer};
use crate::assessment::parser::parse;
use crate::assessment::prompts::{build_prompt, PromptTemplate, ASSESSMENT_SYSTEM};
use crate::assessment::sheet_row::{build_sheet_row, format_timestamp, SheetRow};
use crate::errors::AppError;
use crate::llm_client::CompletionModel;
use crate::sheets::SheetSink;

#[derive(Debug, Clone)]
pub struct AssessmentOutcome {
    pub submission_id: Uuid,
    pub template: PromptTemplate,
    /// The model's raw text, shown to the user as-is.
    pub analysis: String,
    pub parsed: ParsedAnswer,
    pub row: SheetRow,
    pub saved: bool,
}

pub async fn run_assessment(
    model: &dyn CompletionModel,
    sheet: &dyn SheetSink,
    input: &InterviewInput,
    template: PromptTemplate,
    include_timestamp: bool,
) -> Result<AssessmentOutcome, AppError> {
    let submission_id = Uuid::new_v4();
    info!(
        %submission_id,
        template = template.as_str(),
        model = model.name(),
        transcript_chars = input.transcript.chars().count(),
        "Assessing interview"
    );

    let prompt = build_prompt(template, input);
    let analysis = model
        .complete(&prompt, ASSESSMENT_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Assessment call failed: {e}")))?;

    let rubric = template.rubric();
    let parsed = parse(&analysis, template.question_count(), rubric.as_ref());

    let empty_answers = parsed
        .free_text_answers
        .iter()
        .filter(|a| a.is_empty())
        .count();
    if empty_answers > 0 {
        warn!(%submission_id, empty_answers, "Some answers could not be located in the model response");
    }

    let timestamp = include_timestamp.then(|| format_timestamp(&Local::now()));
    let row = build_sheet_row(input, &parsed, rubric.as_ref(), timestamp.as_deref());

    let saved = sheet.append_row(&row).await;
    info!(
        %submission_id,
        saved,
        total_score = parsed.total_score,
        columns = row.cells().len(),
        "Assessment complete"
    );

    Ok(AssessmentOutcome {
        submission_id,
        template,
        analysis,
        parsed,
        row,
        saved,
    })
}
