use crate::client::{FinvizClient, FILINGS_EXPORT_PATH};
use crate::filter::SortOrder;
use crate::parser;
use chrono::{Duration, NaiveDate, Utc};
use finviz_core::{FilingSummary, FinvizError, SecFilingRecord};

pub const MAJOR_FORMS: &[&str] = &["10-K", "10-Q", "8-K", "DEF 14A", "SC 13G", "SC 13D"];
pub const INSIDER_FORMS: &[&str] = &["3", "4", "5", "11-K"];

pub const MAX_FILINGS_DAYS_BACK: u32 = 3650;

/// Narrow a filings list: form filter (case-insensitive, empty keeps all), filing
/// date on or after `since`, ordered by filing date, at most `max_results`.
pub fn select_filings(
    mut filings: Vec<SecFilingRecord>,
    form_types: &[String],
    since: NaiveDate,
    max_results: Option<usize>,
    order: SortOrder,
) -> Vec<SecFilingRecord> {
    filings.retain(|f| {
        f.filing_date >= since
            && (form_types.is_empty() || form_types.iter().any(|t| t.trim().eq_ignore_ascii_case(&f.form)))
    });
    match order {
        SortOrder::Asc => filings.sort_by(|a, b| a.filing_date.cmp(&b.filing_date)),
        SortOrder::Desc => filings.sort_by(|a, b| b.filing_date.cmp(&a.filing_date)),
    }
    if let Some(limit) = max_results {
        filings.truncate(limit);
    }
    filings
}

fn forms(list: &[&str]) -> Vec<String> {
    list.iter().map(|f| f.to_string()).collect()
}

impl FinvizClient {
    pub async fn get_sec_filings(
        &self,
        ticker: &str,
        form_types: &[String],
        days_back: u32,
        max_results: Option<usize>,
        order: SortOrder,
    ) -> Result<Vec<SecFilingRecord>, FinvizError> {
        let ticker = ticker.trim().to_ascii_uppercase();
        if ticker.is_empty() {
            return Err(FinvizError::validation("ticker", "must not be empty"));
        }
        if days_back == 0 || days_back > MAX_FILINGS_DAYS_BACK {
            return Err(FinvizError::validation(
                "days_back",
                format!("must be between 1 and {}, got {}", MAX_FILINGS_DAYS_BACK, days_back),
            ));
        }

        let params = vec![
            ("t".to_string(), ticker.clone()),
            ("o".to_string(), "-filingDate".to_string()),
        ];
        let body = self.get_body(FILINGS_EXPORT_PATH, params).await?;
        let filings = parser::parse_filings_csv(&body, &ticker)?.records;

        let since = Utc::now().date_naive() - Duration::days(days_back as i64);
        let filings = select_filings(filings, form_types, since, max_results, order);
        tracing::info!("Retrieved {} SEC filings for {}", filings.len(), ticker);
        Ok(filings)
    }

    pub async fn get_major_filings(&self, ticker: &str, days_back: u32) -> Result<Vec<SecFilingRecord>, FinvizError> {
        self.get_sec_filings(ticker, &forms(MAJOR_FORMS), days_back, None, SortOrder::Desc)
            .await
    }

    /// Forms 3, 4, 5 and 11-K.
    pub async fn get_insider_filings(&self, ticker: &str, days_back: u32) -> Result<Vec<SecFilingRecord>, FinvizError> {
        self.get_sec_filings(ticker, &forms(INSIDER_FORMS), days_back, None, SortOrder::Desc)
            .await
    }

    pub async fn get_filing_summary(&self, ticker: &str, days_back: u32) -> Result<FilingSummary, FinvizError> {
        let filings = self
            .get_sec_filings(ticker, &[], days_back, None, SortOrder::Desc)
            .await?;
        Ok(FilingSummary::from_filings(
            &ticker.trim().to_ascii_uppercase(),
            days_back,
            &filings,
        ))
    }
}
