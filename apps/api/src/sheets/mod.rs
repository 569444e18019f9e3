//! Sheet sink — the append-only tabular store assessed interviews land in.
//!
//! Callers only learn whether the append went through. Failures are logged
//! here and never propagate: a lost row must not fail the submission.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::assessment::sheet_row::SheetRow;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait SheetSink: Send + Sync {
    /// Appends one row. Returns `true` when the store accepted it.
    async fn append_row(&self, row: &SheetRow) -> bool;

    fn describe(&self) -> String;
}

#[derive(Debug, Serialize)]
struct AppendRequest<'a> {
    values: [&'a SheetRow; 1],
}

/// Google Sheets `values:append` client authenticated with a bearer token.
#[derive(Clone)]
pub struct GoogleSheetsSink {
    client: Client,
    api_base: String,
    spreadsheet_id: String,
    range: String,
    access_token: String,
}

impl GoogleSheetsSink {
    pub fn new(
        spreadsheet_id: String,
        range: String,
        access_token: String,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_base: SHEETS_API_BASE.to_string(),
            spreadsheet_id,
            range,
            access_token,
        })
    }

    #[cfg(test)]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn append_url(&self) -> String {
        format!(
            "{}/{}/values/{}:append",
            self.api_base, self.spreadsheet_id, self.range
        )
    }
}

#[async_trait]
impl SheetSink for GoogleSheetsSink {
    async fn append_row(&self, row: &SheetRow) -> bool {
        let response = self
            .client
            .post(self.append_url())
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(&self.access_token)
            .json(&AppendRequest { values: [row] })
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => true,
            Ok(r) => {
                let status = r.status();
                let body = r.text().await.unwrap_or_default();
                warn!("Sheet append rejected ({status}): {body}");
                false
            }
            Err(e) => {
                warn!("Sheet append failed: {e}");
                false
            }
        }
    }

    fn describe(&self) -> String {
        format!("google-sheets ({} {})", self.spreadsheet_id, self.range)
    }
}

/// Used when no spreadsheet is configured. Logs the row width and reports
/// the row as not saved.
pub struct LogOnlySink;

#[async_trait]
impl SheetSink for LogOnlySink {
    async fn append_row(&self, row: &SheetRow) -> bool {
        info!(
            "No spreadsheet configured; dropping {}-column row",
            row.cells().len()
        );
        false
    }

    fn describe(&self) -> String {
        "log-only".to_string()
    }
}
