use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of `company_tickers.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerEntry {
    pub cik_str: u64,
    pub ticker: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Submissions {
    #[serde(default)]
    pub name: Option<String>,
    pub filings: SubmissionFilings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionFilings {
    pub recent: RecentFilings,
}

/// Parallel arrays: index `i` of every field describes the same filing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecentFilings {
    pub accession_number: Vec<String>,
    pub filing_date: Vec<String>,
    pub report_date: Vec<String>,
    pub form: Vec<String>,
    pub primary_document: Vec<String>,
    pub primary_doc_description: Vec<String>,
}

/// Identifies one filing document to download.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilingRef {
    pub ticker: String,
    pub accession_number: String,
    pub primary_document: String,
}

impl FilingRef {
    pub fn new(ticker: &str, accession_number: &str, primary_document: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            accession_number: accession_number.to_string(),
            primary_document: primary_document.to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.ticker.trim().is_empty()
            && !self.accession_number.trim().is_empty()
            && !self.primary_document.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingContent {
    pub ticker: String,
    pub cik: String,
    pub accession_number: String,
    pub primary_document: String,
    pub document_url: String,
    pub content: String,
    /// Length in characters of `content`, including any truncation notice.
    pub content_length: usize,
    pub truncated: bool,
    pub retrieved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Success,
    Error,
}

/// Per-item outcome of a multi-document download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingContentResult {
    pub filing: FilingRef,
    pub status: ContentStatus,
    pub content: Option<FilingContent>,
    pub error: Option<String>,
}

impl FilingContentResult {
    pub fn success(filing: FilingRef, content: FilingContent) -> Self {
        Self {
            filing,
            status: ContentStatus::Success,
            content: Some(content),
            error: None,
        }
    }

    pub fn failure(filing: FilingRef, error: impl Into<String>) -> Self {
        Self {
            filing,
            status: ContentStatus::Error,
            content: None,
            error: Some(error.into()),
        }
    }
}
