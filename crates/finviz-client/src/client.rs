use crate::catalog;
use crate::config::FinvizConfig;
use crate::fetch::{Fetcher, RetryPolicy};
use crate::filter::{self, CompiledQuery, FilterRequest, SortOrder, MAX_RESULTS_LIMIT};
use crate::parser::{self, ParseOutcome};
use crate::rate_limit::RateLimiter;
use crate::transport::ReqwestTransport;
use finviz_core::{FinvizError, HttpTransport, StockRecord};
use std::cmp::Ordering;
use std::sync::Arc;

pub const SCREENER_EXPORT_PATH: &str = "/export.ashx";
pub const NEWS_EXPORT_PATH: &str = "/news_export.ashx";
pub const GROUPS_PATH: &str = "/groups.ashx";
pub const FILINGS_EXPORT_PATH: &str = "/export/latest-filings";

/// Finviz Elite client. One instance owns one rate limiter; clones share it.
#[derive(Clone)]
pub struct FinvizClient {
    fetcher: Fetcher,
    base_url: String,
    api_key: Option<String>,
}

impl FinvizClient {
    pub fn new(config: FinvizConfig) -> Result<Self, FinvizError> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        Ok(Self::with_transport(&config, transport))
    }

    pub fn from_env() -> Result<Self, FinvizError> {
        Self::new(FinvizConfig::from_env()?)
    }

    pub fn with_transport(config: &FinvizConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let fetcher = Fetcher::new(
            transport,
            RateLimiter::per_minute(config.requests_per_minute),
            RetryPolicy::new(config.max_retries, config.backoff_base),
        );
        Self {
            fetcher,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` with `params` plus credentials, returning the body of a 2xx response.
    pub(crate) async fn get_body(&self, path: &str, mut params: Vec<(String, String)>) -> Result<String, FinvizError> {
        if let Some(ref key) = self.api_key {
            params.push(("auth".to_string(), key.clone()));
        }
        let response = self.fetcher.get(&self.url(path), &params).await?;
        Ok(response.body)
    }

    /// Run a compiled screener query and parse the export.
    pub async fn fetch_query(&self, query: &CompiledQuery) -> Result<ParseOutcome<StockRecord>, FinvizError> {
        let body = self.get_body(SCREENER_EXPORT_PATH, query.to_params()).await?;
        parser::parse_stock_csv(&body)
    }

    /// Compile, fetch and parse one page, then apply the client-side steps:
    /// sector exclusion, sort and truncation.
    pub async fn screen(&self, request: &FilterRequest) -> Result<Vec<StockRecord>, FinvizError> {
        let query = filter::compile(request)?;
        let excluded = excluded_sector_codes(&request.exclude_sectors)?;

        let outcome = self.fetch_query(&query).await?;
        let mut records = finish(outcome.records, request, &excluded);
        if let Some(limit) = request.max_results {
            records.truncate(limit as usize);
        }

        tracing::info!("Screen returned {} stocks ({})", records.len(), query.filter_param().unwrap_or_default());
        Ok(records)
    }

    /// Page through the export with `r=` offsets until a short page or `max_rows`.
    pub async fn screen_pages(&self, request: &FilterRequest, max_rows: u32) -> Result<Vec<StockRecord>, FinvizError> {
        if max_rows == 0 {
            return Err(FinvizError::validation("max_rows", "must be at least 1"));
        }
        let mut query = filter::compile(request)?;
        let excluded = excluded_sector_codes(&request.exclude_sectors)?;

        let start = request.offset.unwrap_or(0);
        let mut offset = start;
        let mut rows: Vec<StockRecord> = Vec::new();
        loop {
            let remaining = max_rows - (offset - start);
            let page_size = remaining.min(MAX_RESULTS_LIMIT);
            query.limit = Some(page_size);
            query.first_row = Some(offset + 1);

            // Paging follows the rows the server sent, not the rows that parsed.
            let page = self.fetch_query(&query).await?;
            let fetched = page.rows_read as u32;
            tracing::debug!(
                "Fetched page at row {} with {} rows ({} kept)",
                offset + 1,
                fetched,
                page.records.len()
            );
            rows.extend(page.records);
            offset += fetched;

            if fetched < page_size || offset - start >= max_rows {
                break;
            }
        }

        rows.truncate(max_rows as usize);
        let records = finish(rows, request, &excluded);
        tracing::info!("Paged screen returned {} stocks", records.len());
        Ok(records)
    }
}

fn finish(records: Vec<StockRecord>, request: &FilterRequest, excluded: &[&str]) -> Vec<StockRecord> {
    let mut records: Vec<StockRecord> = records
        .into_iter()
        .filter(|r| !is_excluded(r, excluded))
        .collect();
    if let Some(ref key) = request.sort_by {
        sort_records(&mut records, key, request.sort_order);
    }
    records
}

fn excluded_sector_codes(names: &[String]) -> Result<Vec<&'static str>, FinvizError> {
    let entry = catalog::lookup("sector")?;
    names.iter().map(|n| entry.encode(n)).collect()
}

fn is_excluded(record: &StockRecord, excluded: &[&str]) -> bool {
    if excluded.is_empty() {
        return false;
    }
    let Some(ref sector) = record.sector else {
        return false;
    };
    match catalog::lookup("sector").and_then(|e| e.encode(sector)) {
        Ok(code) => excluded.contains(&code),
        Err(_) => false,
    }
}

/// Numeric value behind a sort key, for client-side ordering.
pub fn sort_value(record: &StockRecord, key: &str) -> Option<f64> {
    match key {
        "price_change" => record.price_change,
        "relative_volume" => record.relative_volume,
        "volume" => record.volume.map(|v| v as f64),
        "avg_volume" => record.avg_volume.map(|v| v as f64),
        "price" => record.price,
        "market_cap" => record.market_cap,
        "performance_1w" => record.performance_1w,
        "performance_4w" => record.performance_1m,
        "eps_surprise" => record.eps_surprise,
        "eps_growth_yoy" => record.eps_growth_next_y,
        "eps_growth_this_y" => record.eps_growth_this_y,
        "eps_qoq_growth" => record.eps_qoq_growth,
        "afterhours_change" => record.afterhours_change,
        "pe" => record.pe_ratio,
        "dividend_yield" => record.dividend_yield,
        "rsi" => record.rsi,
        "sma200" => record.sma_200,
        "earnings_date" => record.earnings_date.map(|d| d.and_utc().timestamp() as f64),
        _ => None,
    }
}

/// Stable sort by a catalog sort key. Records without a value go last in either order.
pub fn sort_records(records: &mut [StockRecord], key: &str, order: SortOrder) {
    match key {
        "ticker" => records.sort_by(|a, b| directed(a.ticker.cmp(&b.ticker), order)),
        "company" => records.sort_by(|a, b| {
            compare_missing_last(a.company.as_ref(), b.company.as_ref(), order, |x, y| x.cmp(y))
        }),
        _ => records.sort_by(|a, b| {
            compare_missing_last(sort_value(a, key).as_ref(), sort_value(b, key).as_ref(), order, |x, y| {
                x.partial_cmp(y).unwrap_or(Ordering::Equal)
            })
        }),
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

pub fn compare_missing_last<T, F>(a: Option<&T>, b: Option<&T>, order: SortOrder, cmp: F) -> Ordering
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering,
{
    match (a, b) {
        (Some(x), Some(y)) => directed(cmp(x, y), order),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::filter::Range;
    use crate::mock::ScriptedTransport;
    use std::time::Duration;

    pub(crate) fn create_test_client(transport: Arc<ScriptedTransport>) -> FinvizClient {
        let config = FinvizConfig {
            api_key: Some("test-key".to_string()),
            base_url: "https://elite.finviz.test".to_string(),
            requests_per_minute: 0,
            timeout: Duration::from_secs(5),
            max_retries: 0,
            backoff_base: Duration::ZERO,
        };
        FinvizClient::with_transport(&config, transport)
    }

    const MOVERS_CSV: &str = "\
No.,Ticker,Company,Sector,Industry,Country,Market Cap,Price,Change,Volume,Relative Volume
1,SATS,EchoStar Corp,Communication Services,Telecom Services,USA,7410.22,28.11,13.16%,9120400,3.80
2,MRC,MRC Global Inc,Industrials,Industrial Distribution,USA,1180.00,13.77,11.79%,2003000,2.05
3,NKE,NIKE Inc,Consumer Cyclical,Footwear & Accessories,USA,95310.50,72.40,15.19%,42310155,5.21
";

    fn volume_surge_request() -> FilterRequest {
        FilterRequest {
            market_cap: Some("smallover".to_string()),
            price: Range::at_least(10.0),
            relative_volume: Range::at_least(1.5),
            price_change: Range::at_least(2.0),
            sma_filter: Some("above_sma200".to_string()),
            max_results: Some(50),
            sort_by: Some("price_change".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_screen_end_to_end() {
        let transport = Arc::new(ScriptedTransport::new().with_response(200, MOVERS_CSV));
        let client = create_test_client(transport.clone());

        let records = client.screen(&volume_surge_request()).await.unwrap();

        let tickers: Vec<&str> = records.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["NKE", "SATS", "MRC"]);
        assert_eq!(records[0].price_change, Some(15.19));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.url, "https://elite.finviz.test/export.ashx");
        assert_eq!(
            request.param("f"),
            Some("cap_smallover,sh_price_o10,sh_relvol_o1.5,ta_change_o2,ta_sma200_pa")
        );
        assert_eq!(request.param("v"), Some("151"));
        assert_eq!(request.param("ft"), Some("4"));
        assert_eq!(request.param("o"), Some("-change"));
        assert_eq!(request.param("ar"), Some("50"));
        assert_eq!(request.param("auth"), Some("test-key"));
    }

    #[tokio::test]
    async fn test_screen_validation_happens_before_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = create_test_client(transport.clone());
        let request = FilterRequest {
            price: Range::between(50.0, 10.0),
            ..Default::default()
        };
        assert!(matches!(client.screen(&request).await, Err(FinvizError::Validation { .. })));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_screen_excludes_sectors_and_truncates() {
        let transport = Arc::new(ScriptedTransport::new().with_response(200, MOVERS_CSV));
        let client = create_test_client(transport);
        let request = FilterRequest {
            exclude_sectors: vec!["industrials".to_string()],
            sort_by: Some("relative_volume".to_string()),
            max_results: Some(1),
            ..Default::default()
        };
        let records = client.screen(&request).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ticker, "NKE");
    }

    #[tokio::test]
    async fn test_screen_login_page_is_authentication_error() {
        let transport = Arc::new(
            ScriptedTransport::new().with_response(200, "<!DOCTYPE html><html><title>Login</title></html>"),
        );
        let client = create_test_client(transport);
        let err = client.screen(&FilterRequest::default()).await.unwrap_err();
        assert!(matches!(err, FinvizError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_screen_empty_result_is_ok() {
        let transport = Arc::new(ScriptedTransport::new().with_response(200, "No.,Ticker,Company\n"));
        let client = create_test_client(transport);
        let records = tokio_test::assert_ok!(client.screen(&FilterRequest::default()).await);
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_screen_pages_follows_offsets() {
        let mut full_page = String::from("Ticker,Price\n");
        for i in 0..1000 {
            full_page.push_str(&format!("T{},{}\n", i, i + 1));
        }
        let short_page = "Ticker,Price\nAAA,1\nBBB,2\n";
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_response(200, full_page)
                .with_response(200, short_page),
        );
        let client = create_test_client(transport.clone());

        let records = client.screen_pages(&FilterRequest::default(), 1500).await.unwrap();
        assert_eq!(records.len(), 1002);

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].param("r"), Some("1"));
        assert_eq!(requests[0].param("ar"), Some("1000"));
        assert_eq!(requests[1].param("r"), Some("1001"));
        assert_eq!(requests[1].param("ar"), Some("500"));
    }

    #[tokio::test]
    async fn test_screen_pages_counts_dropped_rows() {
        let mut full_page = String::from("Ticker,Price\n");
        for i in 0..1000 {
            let ticker = if i == 5 { String::new() } else { format!("T{}", i) };
            full_page.push_str(&format!("{},{}\n", ticker, i + 1));
        }
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_response(200, full_page)
                .with_response(200, "Ticker,Price\nLAST,1\n"),
        );
        let client = create_test_client(transport.clone());

        let records = client.screen_pages(&FilterRequest::default(), 2000).await.unwrap();
        assert_eq!(records.len(), 1000);

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].param("r"), Some("1001"));
        assert_eq!(requests[1].param("ar"), Some("1000"));
    }

    #[tokio::test]
    async fn test_screen_pages_stops_on_short_page() {
        let transport = Arc::new(ScriptedTransport::new().with_response(200, "Ticker\nAAA\n"));
        let client = create_test_client(transport.clone());
        let records = client.screen_pages(&FilterRequest::default(), 2500).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(transport.request_count(), 1);
        assert_eq!(transport.requests()[0].param("ar"), Some("1000"));
    }

    #[tokio::test]
    async fn test_eps_growth_yoy_sorts_by_next_year() {
        let body = "Ticker,EPS growth this year,EPS growth next year\n\
                    A,5%,40%\n\
                    B,90%,10%\n";
        let transport = Arc::new(ScriptedTransport::new().with_response(200, body));
        let client = create_test_client(transport.clone());
        let request = FilterRequest {
            sort_by: Some("eps_growth_yoy".to_string()),
            sort_order: SortOrder::Desc,
            ..Default::default()
        };

        let records = client.screen(&request).await.unwrap();
        let order: Vec<&str> = records.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["A", "B"]);
        assert_eq!(transport.requests()[0].param("o"), Some("-epsyoy1"));
    }

    #[test]
    fn test_sort_missing_values_last() {
        let mut a = StockRecord::new("A");
        a.rsi = Some(40.0);
        let b = StockRecord::new("B");
        let mut c = StockRecord::new("C");
        c.rsi = Some(20.0);

        let mut records = vec![a.clone(), b.clone(), c.clone()];
        sort_records(&mut records, "rsi", SortOrder::Asc);
        let order: Vec<&str> = records.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);

        sort_records(&mut records, "rsi", SortOrder::Desc);
        let order: Vec<&str> = records.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["A", "C", "B"]);
    }
}
