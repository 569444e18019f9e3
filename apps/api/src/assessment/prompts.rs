// Prompt templates for interview assessment.
// The marker format each template asks for is what `parser.rs` matches on:
// change one, change the other.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::assessment::models::{InterviewInput, Rubric};

/// System prompt shared by both templates.
pub const ASSESSMENT_SYSTEM: &str = "You help a small team review candidates for walking \
    tour guide roles. You write short, honest notes to teammates. \
    Follow the requested answer format exactly.";

/// Four open questions, no scoring. Replace `{candidate_name}` and `{transcript}`.
pub const REFLECTION_PROMPT_TEMPLATE: &str = r#"You're a member of a team reviewing candidates for walking tour guide roles. Based on the conversation transcript below, help us reflect on the call with {candidate_name}.

Please answer these in a natural, human tone, as if you're casually writing a note to your teammate. Avoid using em-dashes.
Do not include any intros. Start each answer with the question in bold, numbered exactly like this: **Q1. <question>** and put your answer on the next line.

**Q1. What stood out to you about {candidate_name} during the call?** (Mention anything interesting or memorable they shared.)
**Q2. Do you think they're ready to lead a tour soon, or would it be better to wait and assign them to a future one?** Give a reason why.
**Q3. What's {candidate_name}'s plan for the tour?** (Mention anything interesting or places they brought up during the interview.)
**Q4. On a scale of 1 to 5, how strong is their potential to be a great guide?** Add a short explanation with the rating.

Here's the transcript to base your thoughts on:
{transcript}"#;

/// Three open questions plus the scoring rubric.
/// Replace `{candidate_name}`, `{rubric_block}` and `{transcript}`.
pub const RUBRIC_PROMPT_TEMPLATE: &str = r#"You're a member of a team reviewing candidates for walking tour guide roles. Based on the conversation transcript below, help us assess the call with {candidate_name}.

Please answer in a natural, human tone, as if you're casually writing a note to your teammate. Avoid using em-dashes.
Do not include any intros. Start each answer with the question in bold, numbered exactly like this: **Q1. <question>** and put your answer on the next line.

**Q1. What stood out to you about {candidate_name} during the call?** (Mention anything interesting or memorable they shared.)
**Q2. Do you think they're ready to lead a tour soon, or would it be better to wait and assign them to a future one?** Give a reason why.
**Q3. What's {candidate_name}'s plan for the tour?** (Mention anything interesting or places they brought up during the interview.)

Then score {candidate_name} on each category below from 1 to 5. Use exactly this layout for every category, in this order:

**<Category>**
Score: <1-5>/5
Explanation: <one or two sentences>

Categories:
{rubric_block}

Do not add a total, we compute it ourselves.

Here's the transcript to base your thoughts on:
{transcript}"#;

pub const RUBRIC_CATEGORIES: [&str; 5] = [
    "Communication Skills",
    "Local Knowledge",
    "Storytelling",
    "Enthusiasm",
    "Professionalism",
];

pub const BONUS_CATEGORY: &str = "Bonus";

const BONUS_HINT: &str = "anything that goes beyond the role, e.g. extra languages or a memorable idea";

/// The prompt variants. Each one fixes the number of open questions and
/// whether a rubric is requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptTemplate {
    #[default]
    Reflection,
    Rubric,
}

impl PromptTemplate {
    pub fn question_count(self) -> usize {
        match self {
            PromptTemplate::Reflection => 4,
            PromptTemplate::Rubric => 3,
        }
    }

    pub fn rubric(self) -> Option<Rubric> {
        match self {
            PromptTemplate::Reflection => None,
            PromptTemplate::Rubric => Some(Rubric::new(RUBRIC_CATEGORIES, BONUS_CATEGORY)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PromptTemplate::Reflection => "reflection",
            PromptTemplate::Rubric => "rubric",
        }
    }
}

impl FromStr for PromptTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reflection" => Ok(PromptTemplate::Reflection),
            "rubric" => Ok(PromptTemplate::Rubric),
            other => Err(format!(
                "unknown prompt template '{other}' (expected 'reflection' or 'rubric')"
            )),
        }
    }
}

/// Fills in the chosen template for one submission.
pub fn build_prompt(template: PromptTemplate, input: &InterviewInput) -> String {
    let (body, block) = match template {
        PromptTemplate::Reflection => (REFLECTION_PROMPT_TEMPLATE, String::new()),
        PromptTemplate::Rubric => (RUBRIC_PROMPT_TEMPLATE, rubric_block()),
    };

    fill_placeholders(
        body,
        &[
            ("{candidate_name}", input.candidate_name.as_str()),
            ("{rubric_block}", block.as_str()),
            ("{transcript}", input.transcript.as_str()),
        ],
    )
}

/// Substitutes every placeholder in one pass over the template, so values are
/// never scanned for placeholders themselves.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn rubric_block() -> String {
    RUBRIC_CATEGORIES
        .iter()
        .map(|c| format!("- {c}"))
        .chain(std::iter::once(format!("- {BONUS_CATEGORY} ({BONUS_HINT})")))
        .collect::<Vec<_>>()
        .join("\n")
}
