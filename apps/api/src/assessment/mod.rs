// Interview assessment: prompt templates, response parsing, sheet rows.
// All model calls go through llm_client; all rows go through sheets.

pub mod handlers;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod sheet_row;
