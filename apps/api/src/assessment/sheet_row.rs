//! Spreadsheet row layout for one assessed interview.
//!
//! Column order: [timestamp], interviewer, candidate, transcript, answers...,
//! then (score, explanation) per rubric category, the bonus pair and the total.

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::assessment::models::{InterviewInput, ParsedAnswer, Rubric};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single spreadsheet cell. Serialized untagged so the row goes over the
/// wire as a plain JSON array of strings and numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(i64),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SheetRow(pub Vec<Cell>);

impl SheetRow {
    pub fn cells(&self) -> &[Cell] {
        &self.0
    }
}

pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn build_sheet_row(
    input: &InterviewInput,
    parsed: &ParsedAnswer,
    rubric: Option<&Rubric>,
    timestamp: Option<&str>,
) -> SheetRow {
    let mut cells: Vec<Cell> = Vec::new();

    if let Some(ts) = timestamp {
        cells.push(ts.into());
    }
    cells.push(input.interviewer_name.as_str().into());
    cells.push(input.candidate_name.as_str().into());
    cells.push(input.transcript.as_str().into());
    cells.extend(parsed.free_text_answers.iter().map(|a| Cell::from(a.as_str())));

    if let Some(rubric) = rubric {
        for category in rubric.all_categories() {
            let score = match parsed.rubric_scores.get(category) {
                Some(&score) => Cell::Number(i64::from(score)),
                None => Cell::Text(String::new()),
            };
            let explanation = parsed
                .rubric_explanations
                .get(category)
                .cloned()
                .unwrap_or_default();
            cells.push(score);
            cells.push(explanation.into());
        }
        cells.push(Cell::Number(i64::from(parsed.total_score)));
    }

    SheetRow(cells)
}
