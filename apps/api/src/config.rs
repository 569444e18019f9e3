use anyhow::{anyhow, Context, Result};

use crate::assessment::prompts::PromptTemplate;
use crate::auth::CredentialTable;
use crate::llm_client::DEFAULT_MODEL;

/// Spreadsheet destination. Absent when rows should only be logged.
#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    pub range: String,
    pub access_token: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub llm_model: String,
    pub sheet: Option<SheetConfig>,
    pub include_timestamp: bool,
    pub default_template: PromptTemplate,
    pub credentials: CredentialTable,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let sheet = match lookup("GOOGLE_SHEETS_SPREADSHEET_ID").filter(|v| !v.trim().is_empty()) {
            Some(spreadsheet_id) => Some(SheetConfig {
                spreadsheet_id,
                range: lookup("GOOGLE_SHEETS_RANGE").unwrap_or_else(|| "Sheet1!A1".to_string()),
                access_token: require("GOOGLE_SHEETS_ACCESS_TOKEN")?,
            }),
            None => None,
        };

        Ok(Config {
            anthropic_api_key: require("ANTHROPIC_API_KEY")?,
            llm_model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            sheet,
            include_timestamp: parse_bool(
                "SHEET_INCLUDE_TIMESTAMP",
                lookup("SHEET_INCLUDE_TIMESTAMP"),
                true,
            )?,
            default_template: lookup("PROMPT_TEMPLATE")
                .map(|v| v.parse::<PromptTemplate>())
                .transpose()
                .map_err(|e| anyhow!(e))
                .context("PROMPT_TEMPLATE is invalid")?
                .unwrap_or_default(),
            credentials: CredentialTable::parse(&lookup("STAFF_CREDENTIALS").unwrap_or_default())
                .map_err(|e| anyhow!(e))
                .context("STAFF_CREDENTIALS is invalid")?,
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(anyhow!("{key} must be true or false, got '{v}'")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.llm_model, DEFAULT_MODEL);
        assert!(config.sheet.is_none());
        assert!(config.include_timestamp);
        assert_eq!(config.default_template, PromptTemplate::Reflection);
        assert!(!config.credentials.is_enabled());
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_missing_api_key_fails() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_sheet_requires_token() {
        let err = Config::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("GOOGLE_SHEETS_SPREADSHEET_ID", "abc"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("GOOGLE_SHEETS_ACCESS_TOKEN"));
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("LLM_MODEL", "claude-haiku-4-5"),
            ("GOOGLE_SHEETS_SPREADSHEET_ID", "abc"),
            ("GOOGLE_SHEETS_ACCESS_TOKEN", "tok"),
            ("GOOGLE_SHEETS_RANGE", "Interviews!A1"),
            ("SHEET_INCLUDE_TIMESTAMP", "no"),
            ("PROMPT_TEMPLATE", "rubric"),
            ("STAFF_CREDENTIALS", "alice:pw"),
            ("PORT", "9000"),
        ]))
        .unwrap();

        let sheet = config.sheet.unwrap();
        assert_eq!(sheet.spreadsheet_id, "abc");
        assert_eq!(sheet.range, "Interviews!A1");
        assert!(!config.include_timestamp);
        assert_eq!(config.default_template, PromptTemplate::Rubric);
        assert!(config.credentials.verify("alice", "pw"));
        assert_eq!(config.port, 9000);
        assert_eq!(config.llm_model, "claude-haiku-4-5");
    }

    #[test]
    fn test_bad_values_fail() {
        for (key, value) in [
            ("PORT", "eighty"),
            ("PROMPT_TEMPLATE", "haiku"),
            ("SHEET_INCLUDE_TIMESTAMP", "maybe"),
            ("STAFF_CREDENTIALS", "nopassword"),
        ] {
            let result = Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "sk-test"), (key, value)]));
            assert!(result.is_err(), "{key}={value} should be rejected");
        }
    }
}
