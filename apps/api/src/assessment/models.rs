use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::AppError;

/// One interview submission. Built once per request and only ever borrowed
/// afterwards by the prompt and row builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewInput {
    pub interviewer_name: String,
    pub candidate_name: String,
    pub transcript: String,
}

impl InterviewInput {
    /// Rejects a submission with any blank field before the model is called.
    pub fn new(
        interviewer_name: impl Into<String>,
        candidate_name: impl Into<String>,
        transcript: impl Into<String>,
    ) -> Result<Self, AppError> {
        let input = Self {
            interviewer_name: interviewer_name.into(),
            candidate_name: candidate_name.into(),
            transcript: transcript.into(),
        };

        if input.interviewer_name.trim().is_empty()
            || input.candidate_name.trim().is_empty()
            || input.transcript.trim().is_empty()
        {
            return Err(AppError::Validation(
                "Please fill in all fields.".to_string(),
            ));
        }

        Ok(input)
    }
}

/// A fixed set of scored categories plus a bonus category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rubric {
    pub categories: Vec<String>,
    pub bonus: String,
}

impl Rubric {
    pub fn new<S: Into<String>>(categories: impl IntoIterator<Item = S>, bonus: S) -> Self {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            bonus: bonus.into(),
        }
    }

    /// Declared categories followed by the bonus, in row order.
    pub fn all_categories(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.bonus.as_str()))
    }
}

/// Structured fields recovered from a model response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedAnswer {
    /// One entry per expected open question, empty when the section was missing.
    pub free_text_answers: Vec<String>,
    /// Only categories whose score parsed to 1..=5.
    pub rubric_scores: BTreeMap<String, u8>,
    /// Every expected category, empty when missing.
    pub rubric_explanations: BTreeMap<String, String>,
    /// Recomputed from `rubric_scores`; never taken from the model text.
    pub total_score: u32,
}
