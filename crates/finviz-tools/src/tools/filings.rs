use crate::format;
use crate::tool::{parse_args, Tool, ToolOutput};
use crate::validate;
use async_trait::async_trait;
use finviz_client::filings::{INSIDER_FORMS, MAJOR_FORMS};
use finviz_client::FinvizClient;
use finviz_core::FinvizError;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SecFilingsArgs {
    ticker: String,
    form_types: Vec<String>,
    days_back: u32,
    max_results: u32,
    sort_order: String,
}

impl Default for SecFilingsArgs {
    fn default() -> Self {
        Self {
            ticker: String::new(),
            form_types: Vec::new(),
            days_back: 30,
            max_results: 50,
            sort_order: "desc".to_string(),
        }
    }
}

pub struct SecFilingsTool {
    client: FinvizClient,
}

impl SecFilingsTool {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SecFilingsTool {
    fn name(&self) -> &'static str {
        "get_sec_filings"
    }

    fn description(&self) -> &'static str {
        "Recent SEC filings for a stock from the Finviz filings export"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {"type": "string"},
                "form_types": {"type": "array", "items": {"type": "string"}, "description": "e.g. 10-K, 8-K; empty for all"},
                "days_back": {"type": "integer", "minimum": 1, "maximum": 365, "default": 30},
                "max_results": {"type": "integer", "minimum": 1, "maximum": 1000, "default": 50},
                "sort_order": {"type": "string", "enum": ["asc", "desc"], "default": "desc"}
            },
            "required": ["ticker"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let args: SecFilingsArgs = parse_args(args)?;
        let ticker = validate::ticker(&args.ticker)?;
        let days_back = validate::days_back(args.days_back)?;
        let max_results = validate::max_results(args.max_results)?;
        let order = validate::sort_order(&args.sort_order)?;

        let filings = self
            .client
            .get_sec_filings(&ticker, &args.form_types, days_back, Some(max_results as usize), order)
            .await?;
        ToolOutput::with_records(format::filings(&ticker, &filings), &filings)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TickerWindowArgs {
    ticker: String,
    days_back: Option<u32>,
}

fn ticker_window_schema(default_days: u32) -> Value {
    json!({
        "type": "object",
        "properties": {
            "ticker": {"type": "string"},
            "days_back": {"type": "integer", "minimum": 1, "maximum": 365, "default": default_days}
        },
        "required": ["ticker"]
    })
}

/// Parse `{ticker, days_back}`, filling an absent `days_back` with `default_days`.
fn ticker_window(args: Value, default_days: u32) -> Result<(String, u32), FinvizError> {
    let args: TickerWindowArgs = parse_args(args)?;
    let days_back = validate::days_back(args.days_back.unwrap_or(default_days))?;
    Ok((validate::ticker(&args.ticker)?, days_back))
}

pub struct MajorFilingsTool {
    client: FinvizClient,
}

impl MajorFilingsTool {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for MajorFilingsTool {
    fn name(&self) -> &'static str {
        "get_major_sec_filings"
    }

    fn description(&self) -> &'static str {
        "Major corporate filings: 10-K, 10-Q, 8-K, DEF 14A, SC 13G and SC 13D"
    }

    fn input_schema(&self) -> Value {
        ticker_window_schema(90)
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let (ticker, days_back) = ticker_window(args, 90)?;
        let filings = self.client.get_major_filings(&ticker, days_back).await?;
        let title = format!("{} ({})", ticker, MAJOR_FORMS.join(", "));
        ToolOutput::with_records(format::filings(&title, &filings), &filings)
    }
}

pub struct InsiderFilingsTool {
    client: FinvizClient,
}

impl InsiderFilingsTool {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for InsiderFilingsTool {
    fn name(&self) -> &'static str {
        "get_insider_sec_filings"
    }

    fn description(&self) -> &'static str {
        "Insider ownership filings: forms 3, 4, 5 and 11-K"
    }

    fn input_schema(&self) -> Value {
        ticker_window_schema(30)
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let (ticker, days_back) = ticker_window(args, 30)?;
        let filings = self.client.get_insider_filings(&ticker, days_back).await?;
        let title = format!("{} (forms {})", ticker, INSIDER_FORMS.join(", "));
        ToolOutput::with_records(format::filings(&title, &filings), &filings)
    }
}

pub struct FilingSummaryTool {
    client: FinvizClient,
}

impl FilingSummaryTool {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for FilingSummaryTool {
    fn name(&self) -> &'static str {
        "get_sec_filing_summary"
    }

    fn description(&self) -> &'static str {
        "Count of recent SEC filings by form, plus the latest filing"
    }

    fn input_schema(&self) -> Value {
        ticker_window_schema(90)
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let (ticker, days_back) = ticker_window(args, 90)?;
        let summary = self.client.get_filing_summary(&ticker, days_back).await?;
        ToolOutput::with_records(format::filing_summary(&summary), &summary)
    }
}
