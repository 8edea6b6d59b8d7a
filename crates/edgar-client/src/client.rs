use crate::config::EdgarConfig;
use crate::models::{FilingContent, FilingContentResult, FilingRef, Submissions, TickerEntry};
use chrono::{NaiveDate, Utc};
use finviz_client::{Fetcher, RateLimiter, ReqwestTransport, RetryPolicy};
use finviz_core::{FinvizError, HttpTransport, SecFilingRecord};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
const DATA_BASE_URL: &str = "https://data.sec.gov";
const ARCHIVES_BASE_URL: &str = "https://www.sec.gov/Archives/edgar/data";

pub const TRUNCATION_NOTICE: &str = "\n\n[Content truncated due to length limit]";
pub const DEFAULT_DOCUMENT_LENGTH: usize = 50_000;
pub const DEFAULT_MULTI_DOCUMENT_LENGTH: usize = 20_000;
/// Pause between documents in a multi-document download.
pub const DOCUMENT_DELAY: Duration = Duration::from_millis(200);

/// SEC EDGAR REST client. The ticker to CIK table is loaded once per instance.
#[derive(Clone)]
pub struct EdgarClient {
    fetcher: Fetcher,
    ciks: Arc<Mutex<Option<HashMap<String, String>>>>,
}

impl EdgarClient {
    pub fn new(config: EdgarConfig) -> Result<Self, FinvizError> {
        let transport = Arc::new(ReqwestTransport::with_user_agent(config.timeout, &config.user_agent)?);
        Ok(Self::with_transport(&config, transport))
    }

    pub fn from_env() -> Result<Self, FinvizError> {
        Self::new(EdgarConfig::from_env()?)
    }

    pub fn with_transport(config: &EdgarConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let fetcher = Fetcher::new(
            transport,
            RateLimiter::per_minute(config.requests_per_minute),
            RetryPolicy::new(config.max_retries, config.backoff_base),
        );
        Self {
            fetcher,
            ciks: Arc::new(Mutex::new(None)),
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, FinvizError> {
        match self.fetcher.get(url, &[]).await {
            Ok(response) => Ok(response.body),
            Err(FinvizError::Http { status: 404, .. }) => Err(FinvizError::NotFound(url.to_string())),
            Err(FinvizError::Authentication(message)) => Err(FinvizError::EdgarAccess(message)),
            Err(e) => Err(e),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FinvizError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| FinvizError::Parse(format!("{}: {}", url, e)))
    }

    /// Zero-padded 10 digit CIK for `ticker`.
    pub async fn get_cik(&self, ticker: &str) -> Result<String, FinvizError> {
        let ticker = normalize_ticker(ticker)?;
        let mut ciks = self.ciks.lock().await;
        if ciks.is_none() {
            let entries: HashMap<String, TickerEntry> = self.get_json(TICKERS_URL).await?;
            let table: HashMap<String, String> = entries
                .into_values()
                .map(|e| (e.ticker.to_ascii_uppercase(), format!("{:010}", e.cik_str)))
                .collect();
            tracing::debug!("Loaded {} ticker to CIK mappings", table.len());
            *ciks = Some(table);
        }

        ciks.as_ref()
            .and_then(|table| table.get(&ticker).cloned())
            .ok_or_else(|| FinvizError::NotFound(format!("no CIK for ticker {}", ticker)))
    }

    /// Recent filings from the submissions feed, filtered by form and filing date
    /// (both bounds inclusive), newest first as published, at most `max_count`.
    pub async fn get_company_filings(
        &self,
        ticker: &str,
        form_types: &[String],
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        max_count: usize,
    ) -> Result<Vec<SecFilingRecord>, FinvizError> {
        let ticker = normalize_ticker(ticker)?;
        let cik = self.get_cik(&ticker).await?;
        let submissions: Submissions = self
            .get_json(&format!("{}/submissions/CIK{}.json", DATA_BASE_URL, cik))
            .await?;

        let filings = recent_filings(&ticker, &cik, &submissions);
        let filings: Vec<SecFilingRecord> = filings
            .into_iter()
            .filter(|f| form_types.is_empty() || form_types.iter().any(|t| t.trim().eq_ignore_ascii_case(&f.form)))
            .filter(|f| date_from.map_or(true, |from| f.filing_date >= from))
            .filter(|f| date_to.map_or(true, |to| f.filing_date <= to))
            .take(max_count)
            .collect();

        tracing::info!("Retrieved {} EDGAR filings for {} (CIK {})", filings.len(), ticker, cik);
        Ok(filings)
    }

    pub async fn get_company_facts(&self, ticker: &str) -> Result<Value, FinvizError> {
        let cik = self.get_cik(ticker).await?;
        self.get_json(&format!("{}/api/xbrl/companyfacts/CIK{}.json", DATA_BASE_URL, cik))
            .await
    }

    /// One XBRL concept (e.g. `Assets`) in one taxonomy (`us-gaap`, `dei`, `ifrs-full`).
    pub async fn get_company_concept(&self, ticker: &str, concept: &str, taxonomy: &str) -> Result<Value, FinvizError> {
        let concept = concept.trim();
        if concept.is_empty() || !concept.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FinvizError::validation("concept", format!("invalid XBRL concept '{}'", concept)));
        }
        let taxonomy = taxonomy.trim();
        if taxonomy.is_empty() || !taxonomy.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(FinvizError::validation("taxonomy", format!("invalid taxonomy '{}'", taxonomy)));
        }

        let cik = self.get_cik(ticker).await?;
        self.get_json(&format!(
            "{}/api/xbrl/companyconcept/CIK{}/{}/{}.json",
            DATA_BASE_URL, cik, taxonomy, concept
        ))
        .await
    }

    pub async fn get_filing_document_content(
        &self,
        ticker: &str,
        accession_number: &str,
        primary_document: &str,
        max_length: usize,
    ) -> Result<FilingContent, FinvizError> {
        let ticker = normalize_ticker(ticker)?;
        let cik = self.get_cik(&ticker).await?;
        let document_url = document_url(&cik, accession_number, primary_document);

        let body = self.get_text(&document_url).await?;
        let (content, truncated) = truncate_content(body, max_length);
        tracing::info!("Retrieved {} characters of {}", content.chars().count(), document_url);

        Ok(FilingContent {
            ticker,
            cik,
            accession_number: accession_number.trim().to_string(),
            primary_document: primary_document.trim().to_string(),
            document_url,
            content_length: content.chars().count(),
            content,
            truncated,
            retrieved_at: Utc::now(),
        })
    }

    /// Download several documents one after another. Failures are reported per item.
    pub async fn get_multiple_filing_contents(
        &self,
        filings: &[FilingRef],
        max_length: usize,
    ) -> Vec<FilingContentResult> {
        let mut results = Vec::with_capacity(filings.len());
        for (i, filing) in filings.iter().enumerate() {
            tracing::debug!("Processing filing {}/{}", i + 1, filings.len());
            if !filing.is_complete() {
                results.push(FilingContentResult::failure(
                    filing.clone(),
                    "ticker, accession_number and primary_document are required",
                ));
                continue;
            }
            if i > 0 {
                tokio::time::sleep(DOCUMENT_DELAY).await;
            }

            let result = match self
                .get_filing_document_content(&filing.ticker, &filing.accession_number, &filing.primary_document, max_length)
                .await
            {
                Ok(content) => FilingContentResult::success(filing.clone(), content),
                Err(e) => {
                    tracing::warn!("Failed to fetch {}/{}: {}", filing.accession_number, filing.primary_document, e);
                    FilingContentResult::failure(filing.clone(), e.to_string())
                }
            };
            results.push(result);
        }
        results
    }
}

fn normalize_ticker(ticker: &str) -> Result<String, FinvizError> {
    let ticker = ticker.trim().to_ascii_uppercase();
    if ticker.is_empty() {
        return Err(FinvizError::validation("ticker", "must not be empty"));
    }
    Ok(ticker)
}

pub fn document_url(cik: &str, accession_number: &str, primary_document: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        ARCHIVES_BASE_URL,
        cik,
        accession_number.trim().replace('-', ""),
        primary_document.trim()
    )
}

pub fn index_url(cik: &str, accession_number: &str) -> String {
    let accession = accession_number.trim();
    format!(
        "{}/{}/{}/{}-index.html",
        ARCHIVES_BASE_URL,
        cik,
        accession.replace('-', ""),
        accession
    )
}

/// Cut `content` to `max_length` characters and append the truncation notice.
pub fn truncate_content(content: String, max_length: usize) -> (String, bool) {
    match content.char_indices().nth(max_length) {
        Some((idx, _)) => {
            let mut cut = content[..idx].to_string();
            cut.push_str(TRUNCATION_NOTICE);
            (cut, true)
        }
        None => (content, false),
    }
}

/// Zip the parallel arrays of the submissions feed. Rows without a form or a
/// parseable filing date are skipped.
fn recent_filings(ticker: &str, cik: &str, submissions: &Submissions) -> Vec<SecFilingRecord> {
    let recent = &submissions.filings.recent;
    let at = |values: &Vec<String>, i: usize| values.get(i).map(|v| v.trim().to_string()).unwrap_or_default();

    let mut filings = Vec::with_capacity(recent.form.len());
    for i in 0..recent.form.len() {
        let form = at(&recent.form, i);
        let raw_date = at(&recent.filing_date, i);
        let filing_date = match NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                tracing::warn!("Skipping EDGAR row {} for {}: bad filing date '{}'", i, ticker, raw_date);
                continue;
            }
        };
        if form.is_empty() {
            continue;
        }

        let accession = at(&recent.accession_number, i);
        let primary = at(&recent.primary_document, i);
        let (filing_url, document_url) = if accession.is_empty() {
            (None, None)
        } else {
            (
                Some(index_url(cik, &accession)),
                (!primary.is_empty()).then(|| document_url(cik, &accession, &primary)),
            )
        };

        filings.push(SecFilingRecord {
            ticker: ticker.to_string(),
            filing_date,
            report_date: NaiveDate::parse_from_str(&at(&recent.report_date, i), "%Y-%m-%d").ok(),
            form,
            description: at(&recent.primary_doc_description, i),
            filing_url,
            document_url,
            accession_number: (!accession.is_empty()).then_some(accession),
            primary_document: (!primary.is_empty()).then_some(primary),
        });
    }
    filings
}
