//! Response Parser — turns a free-text model answer into `ParsedAnswer`.
//!
//! The model's formatting is only loosely controlled by the prompt, so every
//! marker is matched leniently and every miss degrades to an empty field.
//! Nothing in here returns an error or panics on any input.
//!
//! Markers recognised (see `prompts.rs`, the two must stay in step):
//! - questions: `**Q1.** answer`, `**1. Restated question?**\nanswer`,
//!   `### 2) ...`, `Q3: ...`, `**Question 4**`, or bare `1. ...` when
//!   nothing stronger exists
//! - rubric headers: a line starting with the category name, optionally
//!   bulleted, numbered or emphasised, e.g. `**Communication Skills**` or
//!   `**1. Communication Skills**`
//! - inside a category: `Score: 4/5` and `Explanation: ...`

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::assessment::models::{ParsedAnswer, Rubric};

const MIN_SCORE: u32 = 1;
const MAX_SCORE: u32 = 5;

static QUESTION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?P<heading>#{1,6}[ \t]*)?(?P<open>\*\*|__|\*|_)?[ \t]*(?P<prefix>q(?:uestion)?[ \t]*)?(?P<num>\d{1,2})(?P<punct>[ \t]*[.):])?(?P<rest>[^\n]*)",
    )
    .unwrap()
});

static DECLARED_TOTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?:[-+*][ \t]+)?(?:#{1,6}[ \t]*)?(?:\*\*|__|\*|_)?[ \t]*total(?:[ \t]+score)?[ \t]*(?:\*\*|__|\*|_)?[ \t]*[:=\-]",
    )
    .unwrap()
});

static SCORE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bscore\b[ \t]*(?:\*\*|__|\*|_)?[ \t]*[:=\-]?[ \t]*(?:\*\*|__|\*|_)?[ \t]*(\d+)",
    )
    .unwrap()
});

// A line that opens with a `Score` label, used to end a preceding explanation.
static SCORE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^[ \t]*(?:[-+*][ \t]+)?(?:\*\*|__|\*|_)?[ \t]*score\b").unwrap()
});

static BARE_SCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d+)[ \t]*/[ \t]*5\b").unwrap());

static EXPLANATION_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bexplanation\b[ \t]*(?:\*\*|__|\*|_)?[ \t]*[:\-–]?[ \t]*(?:\*\*|__|\*|_)?")
        .unwrap()
});

/// Parses `raw` into `expected_free_text` answers and, when `rubric` is
/// given, per-category scores, explanations and the recomputed total.
pub fn parse(raw: &str, expected_free_text: usize, rubric: Option<&Rubric>) -> ParsedAnswer {
    let text = raw.replace("\r\n", "\n");

    let headers = rubric
        .map(|r| find_category_headers(&text, r))
        .unwrap_or_default();
    let markers = find_question_markers(&text, expected_free_text, &headers);

    let mut boundaries: Vec<usize> = markers
        .iter()
        .map(|m| m.line_start)
        .chain(headers.values().map(|h| h.line_start))
        .chain(DECLARED_TOTAL.find_iter(&text).map(|m| m.start()))
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    let section_end = |line_start: usize| {
        boundaries
            .iter()
            .copied()
            .find(|&b| b > line_start)
            .unwrap_or(text.len())
    };

    let free_text_answers = (1..=expected_free_text)
        .map(|number| match markers.iter().find(|m| m.number == number) {
            Some(marker) => marker.body(&text, section_end(marker.line_start)),
            None => {
                debug!(question = number, "Question section missing from model response");
                String::new()
            }
        })
        .collect();

    let mut parsed = ParsedAnswer {
        free_text_answers,
        ..ParsedAnswer::default()
    };

    if let Some(rubric) = rubric {
        for category in rubric.all_categories() {
            let Some(header) = headers.get(category) else {
                debug!(category, "Rubric category missing from model response");
                parsed
                    .rubric_explanations
                    .insert(category.to_string(), String::new());
                continue;
            };

            let end = section_end(header.line_start).max(header.content_start);
            let section = &text[header.content_start..end];

            match extract_score(section) {
                Some(score) => {
                    parsed.rubric_scores.insert(category.to_string(), score);
                }
                None => debug!(category, "No usable score for rubric category"),
            }
            parsed
                .rubric_explanations
                .insert(category.to_string(), extract_explanation(section));
        }
    }

    parsed.total_score = parsed.rubric_scores.values().map(|&s| u32::from(s)).sum();
    parsed
}

// ────────────────────────────────────────────────────────────────────────────
// Question segmentation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct QuestionMarker {
    number: usize,
    line_start: usize,
    body_start: usize,
    /// Emphasised, headed or `Q`-prefixed. Bare numbered lines are ignored
    /// whenever at least one strong marker exists.
    strong: bool,
    /// An unwrapped marker line ending in `?`: the model restated the question.
    restated_label: bool,
}

impl QuestionMarker {
    fn body(&self, text: &str, end: usize) -> String {
        if end <= self.body_start {
            return String::new();
        }
        let mut section = &text[self.body_start..end];

        if self.restated_label {
            if let Some((_, after)) = section.split_once('\n') {
                if !after.trim().is_empty() {
                    section = after;
                }
            }
        }

        section.trim().to_string()
    }
}

fn find_question_markers(
    text: &str,
    expected: usize,
    headers: &HashMap<String, CategoryHeader>,
) -> Vec<QuestionMarker> {
    let candidates: Vec<QuestionMarker> = QUESTION_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.name("num")?.as_str().parse::<usize>().ok()?;
            let rest = caps.name("rest")?;
            let open = caps.name("open").map(|m| m.as_str());
            let prefixed = caps.name("prefix").is_some();
            let headed = caps.name("heading").is_some();

            if caps.name("punct").is_none()
                && !unpunctuated_marker(open, prefixed, headed, rest.as_str())
            {
                return None;
            }

            let (label_len, restated_label) = split_label(open, rest.as_str());

            Some(QuestionMarker {
                number,
                line_start: whole.start(),
                body_start: rest.start() + label_len,
                strong: open.is_some() || prefixed || headed,
                restated_label,
            })
        })
        .filter(|m| m.number >= 1)
        .filter(|m| !headers.values().any(|h| h.line_start == m.line_start))
        .collect();

    let any_strong = candidates.iter().any(|m| m.strong);

    let mut seen = Vec::new();
    candidates
        .into_iter()
        .filter(|m| m.strong || !any_strong)
        .filter(|m| m.number <= expected || m.strong)
        .filter(|m| {
            if seen.contains(&m.number) {
                false
            } else {
                seen.push(m.number);
                true
            }
        })
        .collect()
}

/// A number with no `.`, `)` or `:` after it only counts as a marker when it
/// is framed: `**Q1** ...`, `**Question 2**`, `### Q3`, a lone `Q4` line, or
/// `**5**`. Anything else is ordinary text that happens to start with a digit.
fn unpunctuated_marker(open: Option<&str>, prefixed: bool, headed: bool, rest: &str) -> bool {
    let at_boundary = rest.is_empty()
        || rest.starts_with(|c: char| c.is_whitespace() || c == '*' || c == '_');
    if !at_boundary {
        return false;
    }

    let closes_at_once = open.is_some_and(|token| rest.trim_start().starts_with(token));
    let framed = open.is_some() || headed || rest.trim().is_empty();
    closes_at_once || (prefixed && framed)
}

/// Returns how many bytes of the marker line's remainder are a restated
/// label, and whether the remainder itself looks like a restated question.
fn split_label(open: Option<&str>, rest: &str) -> (usize, bool) {
    let consumed = open
        .and_then(|token| rest.find(token).map(|idx| idx + token.len()))
        .unwrap_or(0);

    // `**1.** **What stood out?**` puts the question in a second bold span.
    let tail = &rest[consumed..];
    let leading_ws = tail.len() - tail.trim_start().len();
    let trimmed = &tail[leading_ws..];
    for token in ["**", "__"] {
        let Some(inner) = trimmed.strip_prefix(token) else {
            continue;
        };
        let Some(close) = inner.find(token) else {
            continue;
        };
        if consumed == 0 || inner[..close].trim_end().ends_with('?') {
            return (consumed + leading_ws + token.len() + close + token.len(), false);
        }
    }

    if consumed > 0 {
        return (consumed, false);
    }
    (0, rest.trim_end().ends_with('?'))
}

// ────────────────────────────────────────────────────────────────────────────
// Rubric extraction
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct CategoryHeader {
    line_start: usize,
    content_start: usize,
}

/// First header line for every rubric category present in the text.
fn find_category_headers(text: &str, rubric: &Rubric) -> HashMap<String, CategoryHeader> {
    let mut headers = HashMap::new();

    for category in rubric.all_categories() {
        let Some(pattern) = category_header_pattern(category) else {
            continue;
        };
        if let Some(m) = pattern.find(text) {
            headers.insert(
                category.to_string(),
                CategoryHeader {
                    line_start: m.start(),
                    content_start: m.end(),
                },
            );
        }
    }

    headers
}

fn category_header_pattern(category: &str) -> Option<Regex> {
    let name = category
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"[ \t]+");
    if name.is_empty() {
        return None;
    }

    let pattern = format!(
        r"(?mi)^[ \t]*(?:[-+*][ \t]+)?(?:#{{1,6}}[ \t]*)?(?:\*\*|__|\*|_)?[ \t]*(?:\d{{1,2}}[.)][ \t]*)?(?:\*\*|__|\*|_)?[ \t]*{name}[ \t]*(?:\*\*|__|\*|_)?[ \t]*(?:$|[:(\-–])"
    );
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            debug!(category, "Could not build header pattern: {e}");
            None
        }
    }
}

/// First integer after a `Score` label, falling back to a bare `N/5` token.
/// Anything outside 1..=5 counts as absent.
fn extract_score(section: &str) -> Option<u8> {
    let token = SCORE_LABEL
        .captures(section)
        .or_else(|| BARE_SCORE.captures(section))?
        .get(1)?
        .as_str();

    let value = token.parse::<u32>().ok()?;
    if (MIN_SCORE..=MAX_SCORE).contains(&value) {
        u8::try_from(value).ok()
    } else {
        None
    }
}

/// Text after the `Explanation` label up to any later `Score` line, or the
/// section minus its score lines.
fn extract_explanation(section: &str) -> String {
    if let Some(m) = EXPLANATION_LABEL.find(section) {
        let after = &section[m.end()..];
        let first_line_end = after.find('\n').unwrap_or(after.len());
        let end = SCORE_LINE
            .find_at(after, first_line_end)
            .map_or(after.len(), |s| s.start());
        return after[..end].trim().to_string();
    }

    section
        .lines()
        .filter(|line| !SCORE_LABEL.is_match(line) && !BARE_SCORE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_start_matches(|c: char| c == '*' || c == '_' || c == ':' || c.is_whitespace())
        .trim_end()
        .to_string()
}
