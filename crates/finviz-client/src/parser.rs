//! CSV export parsing into typed records.
//!
//! Cells that are empty, `-` or `N/A` become absent fields. Row-level problems
//! never fail the whole response: the row or the cell is skipped and a warning
//! is recorded. Only a body that cannot be read as the expected schema is a
//! [`FinvizError::Parse`].

use crate::news::categorize;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use finviz_core::{FinvizError, NewsItem, SecFilingRecord, StockRecord};
use serde_json::{Map, Value};

/// Parsed records plus whatever was skipped along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome<T> {
    pub records: Vec<T>,
    pub warnings: Vec<String>,
    /// Data rows in the body, including rows that were dropped.
    pub rows_read: usize,
}

impl<T> ParseOutcome<T> {
    pub(crate) fn empty() -> Self {
        Self { records: Vec::new(), warnings: Vec::new(), rows_read: 0 }
    }

    pub(crate) fn log_warnings(&self, what: &str) {
        if !self.warnings.is_empty() {
            tracing::warn!(
                "{}: kept {} rows, {} warnings (first: {})",
                what,
                self.records.len(),
                self.warnings.len(),
                self.warnings[0]
            );
        }
    }
}

macro_rules! stock_columns {
    ($( $field:ident : $convert:ident => [$($header:literal),+ $(,)?] ),* $(,)?) => {
        /// Record fields that can be filled from a CSV column.
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum Column {
            $($field),*
        }

        const COLUMNS: &[(Column, &[&str])] = &[
            $( (Column::$field, &[$($header),+]) ),*
        ];

        /// Record field name and the export column that fills it.
        pub const FIELD_COLUMNS: &[(&str, &str)] = &[
            $( (stringify!($field), [$($header),+][0]) ),*
        ];

        impl Column {
            fn assign(&self, record: &mut StockRecord, raw: &str) -> Result<(), String> {
                match self {
                    $( Column::$field => record.$field = Some($convert(raw)?), )*
                }
                Ok(())
            }
        }
    };
}

stock_columns! {
    company: text => ["Company", "Company Name"],
    sector: text => ["Sector"],
    industry: text => ["Industry"],
    country: text => ["Country"],
    index: text => ["Index"],

    market_cap: millions => ["Market Cap"],
    price: number => ["Price"],
    prev_close: number => ["Prev Close"],
    open: number => ["Open"],
    high: number => ["High"],
    low: number => ["Low"],
    price_change: number => ["Change"],
    change_from_open: number => ["Change from Open"],
    gap: number => ["Gap"],
    volume: count => ["Volume"],
    avg_volume: count => ["Average Volume", "Avg Volume"],
    relative_volume: number => ["Relative Volume", "Rel Volume"],
    afterhours_close: number => ["After-Hours Close"],
    afterhours_change: number => ["After-Hours Change"],

    pe_ratio: number => ["P/E"],
    forward_pe: number => ["Forward P/E", "Fwd P/E"],
    peg: number => ["PEG"],
    ps_ratio: number => ["P/S"],
    pb_ratio: number => ["P/B"],
    price_to_cash: number => ["P/Cash", "P/C"],
    price_to_free_cash_flow: number => ["P/Free Cash Flow", "P/FCF"],

    eps: number => ["EPS (ttm)", "EPS"],
    eps_growth_this_y: number => ["EPS growth this year", "EPS growth this Y", "EPS this Y"],
    eps_growth_next_y: number => ["EPS growth next year", "EPS growth next Y", "EPS next Y"],
    eps_growth_past_5y: number => ["EPS growth past 5 years", "EPS growth past 5Y", "EPS past 5Y"],
    eps_growth_next_5y: number => ["EPS growth next 5 years", "EPS growth next 5Y", "EPS next 5Y"],
    sales_growth_past_5y: number => ["Sales growth past 5 years", "Sales growth past 5Y", "Sales past 5Y"],
    eps_qoq_growth: number => ["EPS growth quarter over quarter", "EPS Q/Q"],
    sales_qoq_growth: number => ["Sales growth quarter over quarter", "Sales Q/Q"],
    eps_surprise: number => ["EPS Surprise"],
    revenue_surprise: number => ["Revenue Surprise"],
    earnings_date: datetime => ["Earnings Date", "Earnings", "Next Earnings Date"],

    income: millions => ["Income"],
    sales: millions => ["Sales"],
    book_value_per_share: number => ["Book/sh", "Book Value per Share"],
    cash_per_share: number => ["Cash/sh", "Cash per Share"],
    dividend: number => ["Dividend", "Dividend TTM"],
    dividend_yield: number => ["Dividend Yield", "Dividend %"],
    payout_ratio: number => ["Payout Ratio"],

    roa: number => ["Return on Assets", "ROA"],
    roe: number => ["Return on Equity", "ROE"],
    roic: number => ["Return on Invested Capital", "ROIC", "ROI"],
    gross_margin: number => ["Gross Margin"],
    operating_margin: number => ["Operating Margin"],
    profit_margin: number => ["Profit Margin"],

    current_ratio: number => ["Current Ratio"],
    quick_ratio: number => ["Quick Ratio"],
    lt_debt_to_equity: number => ["LT Debt/Equity"],
    debt_to_equity: number => ["Total Debt/Equity", "Debt/Equity"],

    insider_ownership: number => ["Insider Ownership"],
    insider_transactions: number => ["Insider Transactions"],
    institutional_ownership: number => ["Institutional Ownership"],
    institutional_transactions: number => ["Institutional Transactions"],
    float_short: number => ["Short Float", "Float Short"],
    short_ratio: number => ["Short Ratio"],
    short_interest: millions => ["Short Interest"],
    shares_outstanding: count_millions => ["Shares Outstanding"],
    shares_float: count_millions => ["Shares Float"],

    performance_1w: number => ["Performance (Week)"],
    performance_1m: number => ["Performance (Month)"],
    performance_3m: number => ["Performance (Quarter)"],
    performance_6m: number => ["Performance (Half Year)"],
    performance_ytd: number => ["Performance (YTD)", "Performance (Year To Date)"],
    performance_1y: number => ["Performance (Year)"],

    beta: number => ["Beta"],
    atr: number => ["Average True Range", "ATR (14)", "ATR"],
    volatility_week: number => ["Volatility (Week)"],
    volatility_month: number => ["Volatility (Month)"],
    rsi: number => ["Relative Strength Index (14)", "RSI (14)", "RSI"],
    sma_20: number => ["20-Day Simple Moving Average", "SMA20"],
    sma_50: number => ["50-Day Simple Moving Average", "SMA50"],
    sma_200: number => ["200-Day Simple Moving Average", "SMA200"],
    week_52_high: number => ["52-Week High"],
    week_52_low: number => ["52-Week Low"],

    target_price: number => ["Target Price"],
    analyst_recommendation: number => ["Analyst Recom", "Recom"],

    optionable: flag => ["Optionable"],
    shortable: flag => ["Shortable"],
    employees: count => ["Employees"],
    ipo_date: date => ["IPO Date"],

    assets_under_management: millions => ["Assets Under Management", "AUM"],
    net_expense_ratio: number => ["Net Expense Ratio", "Expense Ratio"],
}

/// Case- and punctuation-insensitive header key.
fn header_key(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn column_for(header: &str) -> Option<Column> {
    let key = header_key(header);
    COLUMNS
        .iter()
        .find(|(_, headers)| headers.iter().any(|h| header_key(h) == key))
        .map(|(column, _)| *column)
}

pub fn is_absent(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "-" || trimmed.eq_ignore_ascii_case("n/a")
}

/// Export endpoints answer an unauthenticated request with the HTML login page.
pub fn ensure_not_html(body: &str) -> Result<(), FinvizError> {
    let head: String = body.trim_start().chars().take(512).collect::<String>().to_ascii_lowercase();
    if head.starts_with("<!doctype html") || head.contains("<html") {
        return Err(FinvizError::Authentication(
            "received an HTML page instead of a CSV export; the API key is missing or invalid".to_string(),
        ));
    }
    Ok(())
}

fn text(raw: &str) -> Result<String, String> {
    Ok(raw.trim().to_string())
}

/// Numeric cell: tolerates `+`, `$`, thousands separators, a trailing `%` and
/// K/M/B/T magnitude suffixes. "12.71B" is 12_710_000_000.0, "-15.19%" is -15.19.
pub fn number(raw: &str) -> Result<f64, String> {
    let mut s: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' '))
        .collect();
    if let Some(stripped) = s.strip_suffix('%') {
        s = stripped.to_string();
    }
    let (digits, multiplier) = match s.chars().last() {
        Some('K') | Some('k') => (&s[..s.len() - 1], 1e3),
        Some('M') | Some('m') => (&s[..s.len() - 1], 1e6),
        Some('B') | Some('b') => (&s[..s.len() - 1], 1e9),
        Some('T') | Some('t') => (&s[..s.len() - 1], 1e12),
        _ => (s.as_str(), 1.0),
    };
    let digits = digits.strip_prefix('+').unwrap_or(digits);
    let value: f64 = digits
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw.trim()))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite number", raw.trim()));
    }
    Ok(value * multiplier)
}

fn has_magnitude_suffix(raw: &str) -> bool {
    matches!(
        raw.trim().chars().last(),
        Some('K' | 'k' | 'M' | 'm' | 'B' | 'b' | 'T' | 't')
    )
}

/// Exports report money and share totals in millions unless a suffix says otherwise.
fn millions(raw: &str) -> Result<f64, String> {
    let value = number(raw)?;
    if has_magnitude_suffix(raw) {
        Ok(value)
    } else {
        Ok(value * 1e6)
    }
}

pub fn count(raw: &str) -> Result<u64, String> {
    to_count(number(raw)?, raw)
}

fn count_millions(raw: &str) -> Result<u64, String> {
    to_count(millions(raw)?, raw)
}

fn to_count(value: f64, raw: &str) -> Result<u64, String> {
    if value < 0.0 {
        return Err(format!("'{}' is not a valid count", raw.trim()));
    }
    Ok(value.round() as u64)
}

fn flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(true),
        "no" | "false" | "0" => Ok(false),
        other => Err(format!("'{}' is not yes/no", other)),
    }
}

// Two-digit year formats go first; `%Y` would otherwise read "25" as year 25.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%m-%d-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%y %I:%M %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

pub fn date(raw: &str) -> Result<NaiveDate, String> {
    let s = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| datetime(s).ok().map(|dt| dt.date()))
        .ok_or_else(|| format!("'{}' is not a recognized date", s))
}

/// Date-only values resolve to midnight.
pub fn datetime(raw: &str) -> Result<NaiveDateTime, String> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Ok(dt);
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("'{}' is not a recognized date/time", s))
}

fn reader(body: &str) -> csv::Reader<&[u8]> {
    let body = body.strip_prefix('\u{feff}').unwrap_or(body);
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes())
}

fn headers(reader: &mut csv::Reader<&[u8]>) -> Result<Vec<String>, FinvizError> {
    let headers = reader
        .headers()
        .map_err(|e| FinvizError::Parse(format!("unreadable CSV header: {}", e)))?;
    Ok(headers.iter().map(|h| h.to_string()).collect())
}

fn find_header(headers: &[String], names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| header_key(n) == header_key(h)))
}

fn missing_column(name: &str, headers: &[String]) -> FinvizError {
    FinvizError::Parse(format!(
        "expected a '{}' column; got headers [{}]",
        name,
        headers.join(", ")
    ))
}

/// Parse a screener or quote export into stock records.
pub fn parse_stock_csv(body: &str) -> Result<ParseOutcome<StockRecord>, FinvizError> {
    ensure_not_html(body)?;
    if body.trim().is_empty() {
        return Ok(ParseOutcome::empty());
    }

    let mut rdr = reader(body);
    let headers = headers(&mut rdr)?;
    let ticker_idx = find_header(&headers, &["Ticker", "Symbol"])
        .ok_or_else(|| missing_column("Ticker", &headers))?;

    let mapped: Vec<(usize, Column)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != ticker_idx)
        .filter_map(|(i, h)| column_for(h).map(|c| (i, c)))
        .collect();

    let mut outcome = ParseOutcome::empty();
    for (n, row) in rdr.records().enumerate() {
        let row_no = n + 1;
        outcome.rows_read += 1;
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                outcome.warnings.push(format!("row {}: unreadable: {}", row_no, e));
                continue;
            }
        };

        let ticker = row.get(ticker_idx).unwrap_or("").trim().to_ascii_uppercase();
        if is_absent(&ticker) {
            outcome.warnings.push(format!("row {}: missing ticker, skipped", row_no));
            continue;
        }

        let mut record = StockRecord::new(ticker);
        for (idx, column) in &mapped {
            let raw = match row.get(*idx) {
                Some(raw) if !is_absent(raw) => raw,
                _ => continue,
            };
            if let Err(msg) = column.assign(&mut record, raw) {
                outcome.warnings.push(format!(
                    "row {} ({}): {}: {}",
                    row_no, record.ticker, headers[*idx], msg
                ));
            }
        }
        outcome.records.push(record);
    }

    outcome.log_warnings("stock export");
    Ok(outcome)
}

/// Parse the news export. `Ticker` is optional; market-wide news has none.
pub fn parse_news_csv(body: &str) -> Result<ParseOutcome<NewsItem>, FinvizError> {
    ensure_not_html(body)?;
    if body.trim().is_empty() {
        return Ok(ParseOutcome::empty());
    }

    let mut rdr = reader(body);
    let headers = headers(&mut rdr)?;
    let title_idx = find_header(&headers, &["Title", "Headline"])
        .ok_or_else(|| missing_column("Title", &headers))?;
    let url_idx = find_header(&headers, &["Url", "Link"]).ok_or_else(|| missing_column("Url", &headers))?;
    let source_idx = find_header(&headers, &["Source"]);
    let date_idx = find_header(&headers, &["Date", "Published"]);
    let ticker_idx = find_header(&headers, &["Ticker"]);

    let cell = |row: &csv::StringRecord, idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| row.get(i))
            .filter(|v| !is_absent(v))
            .map(|v| v.trim().to_string())
    };

    let mut outcome = ParseOutcome::empty();
    for (n, row) in rdr.records().enumerate() {
        let row_no = n + 1;
        outcome.rows_read += 1;
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                outcome.warnings.push(format!("row {}: unreadable: {}", row_no, e));
                continue;
            }
        };

        let (title, url) = match (cell(&row, Some(title_idx)), cell(&row, Some(url_idx))) {
            (Some(t), Some(u)) => (t, u),
            _ => {
                outcome.warnings.push(format!("row {}: missing title or url, skipped", row_no));
                continue;
            }
        };

        let published = match cell(&row, date_idx) {
            Some(raw) => match datetime(&raw) {
                Ok(dt) => Some(dt),
                Err(msg) => {
                    outcome.warnings.push(format!("row {}: Date: {}", row_no, msg));
                    None
                }
            },
            None => None,
        };

        outcome.records.push(NewsItem {
            ticker: cell(&row, ticker_idx).map(|t| t.to_ascii_uppercase()),
            category: categorize(&title),
            title,
            source: cell(&row, source_idx),
            published,
            url,
        });
    }

    outcome.log_warnings("news export");
    Ok(outcome)
}

/// Parse the latest-filings export for one ticker.
pub fn parse_filings_csv(body: &str, ticker: &str) -> Result<ParseOutcome<SecFilingRecord>, FinvizError> {
    ensure_not_html(body)?;
    if body.trim().is_empty() {
        return Ok(ParseOutcome::empty());
    }

    let mut rdr = reader(body);
    let headers = headers(&mut rdr)?;
    let date_idx = find_header(&headers, &["Filing Date", "Filed"])
        .ok_or_else(|| missing_column("Filing Date", &headers))?;
    let form_idx = find_header(&headers, &["Form", "Form Type"]).ok_or_else(|| missing_column("Form", &headers))?;
    let report_idx = find_header(&headers, &["Report Date", "Period"]);
    let desc_idx = find_header(&headers, &["Description"]);
    let filing_idx = find_header(&headers, &["Filing", "Filing URL"]);
    let doc_idx = find_header(&headers, &["Document", "Document URL"]);

    let cell = |row: &csv::StringRecord, idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| row.get(i))
            .filter(|v| !is_absent(v))
            .map(|v| v.trim().to_string())
    };

    let mut outcome = ParseOutcome::empty();
    for (n, row) in rdr.records().enumerate() {
        let row_no = n + 1;
        outcome.rows_read += 1;
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                outcome.warnings.push(format!("row {}: unreadable: {}", row_no, e));
                continue;
            }
        };

        let form = match cell(&row, Some(form_idx)) {
            Some(f) => f,
            None => {
                outcome.warnings.push(format!("row {}: missing form, skipped", row_no));
                continue;
            }
        };
        let filing_date = match cell(&row, Some(date_idx)).map(|d| date(&d)) {
            Some(Ok(d)) => d,
            Some(Err(msg)) => {
                outcome.warnings.push(format!("row {}: Filing Date: {}, skipped", row_no, msg));
                continue;
            }
            None => {
                outcome.warnings.push(format!("row {}: missing filing date, skipped", row_no));
                continue;
            }
        };

        outcome.records.push(SecFilingRecord {
            ticker: ticker.to_ascii_uppercase(),
            filing_date,
            report_date: cell(&row, report_idx).and_then(|d| date(&d).ok()),
            form,
            description: cell(&row, desc_idx).unwrap_or_default(),
            filing_url: cell(&row, filing_idx),
            document_url: cell(&row, doc_idx),
            accession_number: None,
            primary_document: None,
        });
    }

    outcome.log_warnings("filings export");
    Ok(outcome)
}

/// Caller-facing names that differ from record field names.
pub const FIELD_ALIASES: &[(&str, &str)] = &[
    ("roi", "roic"),
    ("debt_equity", "debt_to_equity"),
    ("book_value", "book_value_per_share"),
    ("performance_week", "performance_1w"),
    ("performance_month", "performance_1m"),
    ("short_float", "float_short"),
];

pub fn resolve_field(name: &str) -> &str {
    FIELD_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, field)| *field)
        .unwrap_or(name)
}

/// Names accepted in a `data_fields` list, aliases excluded, sorted.
pub fn record_fields() -> Result<Vec<String>, FinvizError> {
    match serde_json::to_value(StockRecord::new("")) {
        Ok(Value::Object(map)) => {
            let mut fields: Vec<String> = map.into_iter().map(|(k, _)| k).collect();
            fields.sort_unstable();
            Ok(fields)
        }
        Ok(_) => Err(FinvizError::Parse("stock record did not serialize to an object".to_string())),
        Err(e) => Err(FinvizError::Parse(e.to_string())),
    }
}

/// Export column behind a field or alias, if one fills it directly.
pub fn field_column(name: &str) -> Option<&'static str> {
    let field = resolve_field(name);
    if field == "ticker" {
        return Some("Ticker");
    }
    FIELD_COLUMNS.iter().find(|(f, _)| *f == field).map(|(_, column)| *column)
}

/// Restrict a record to the requested fields, keyed by the names the caller used.
/// `ticker` is always included.
pub fn project_fields(record: &StockRecord, fields: &[String]) -> Result<Value, FinvizError> {
    let full = match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(FinvizError::Parse("stock record did not serialize to an object".to_string())),
        Err(e) => return Err(FinvizError::Parse(e.to_string())),
    };

    let mut projected = Map::new();
    projected.insert("ticker".to_string(), Value::String(record.ticker.clone()));
    for name in fields {
        let requested = name.trim();
        let field = resolve_field(requested);
        match full.get(field) {
            Some(value) => {
                projected.insert(requested.to_string(), value.clone());
            }
            None => {
                let mut known: Vec<&str> = full.keys().map(|k| k.as_str()).collect();
                known.extend(FIELD_ALIASES.iter().map(|(alias, _)| *alias));
                known.sort_unstable();
                return Err(FinvizError::validation(
                    "data_fields",
                    format!("unknown field '{}'; available fields: {}", requested, known.join(", ")),
                ));
            }
        }
    }
    Ok(Value::Object(projected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use finviz_core::NewsCategory;

    const SCREENER_CSV: &str = "\
No.,Ticker,Company,Sector,Industry,Country,Market Cap,P/E,Price,Change,Volume,Relative Volume,Earnings Date
1,NKE,NIKE Inc,Consumer Cyclical,Footwear & Accessories,USA,95310.50,34.12,72.40,15.19%,\"42,310,155\",5.21,06/26/2025 04:15:00 PM
2,SATS,EchoStar Corp,Communication Services,Telecom Services,USA,7410.22,-,28.11,13.16%,\"9,120,400\",3.80,-
3,MRC,MRC Global Inc,Industrials,Industrial Distribution,USA,1180.00,21.50,13.77,11.79%,\"2,003,000\",2.05,
";

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-3, "{} != {}", actual, expected);
    }

    #[test]
    fn test_number_conversions() {
        assert_close(number("12.71B").unwrap(), 12_710_000_000.0);
        assert_eq!(number("-15.19%").unwrap(), -15.19);
        assert_eq!(number("+2.5%").unwrap(), 2.5);
        assert_eq!(number("$1,234.50").unwrap(), 1234.5);
        assert_eq!(number("350K").unwrap(), 350_000.0);
        assert_close(number("1.2M").unwrap(), 1_200_000.0);
        assert_eq!(number("2T").unwrap(), 2e12);
        assert!(number("abc").is_err());
        assert!(number("").is_err());
    }

    #[test]
    fn test_absent_cells() {
        assert!(is_absent("-"));
        assert!(is_absent(""));
        assert!(is_absent("  "));
        assert!(is_absent("N/A"));
        assert!(!is_absent("0"));
    }

    #[test]
    fn test_millions_scaling() {
        assert_eq!(millions("95310.50").unwrap(), 95_310_500_000.0);
        assert_close(millions("12.71B").unwrap(), 12_710_000_000.0);
        assert_eq!(count_millions("1.5").unwrap(), 1_500_000);
    }

    #[test]
    fn test_dates() {
        assert_eq!(date("2025-06-26").unwrap(), NaiveDate::from_ymd_opt(2025, 6, 26).unwrap());
        assert_eq!(date("06/26/25").unwrap(), NaiveDate::from_ymd_opt(2025, 6, 26).unwrap());
        let dt = datetime("06/26/2025 04:15:00 PM").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2025-06-26 16:15");
        let midnight = datetime("2025-06-26").unwrap();
        assert_eq!(midnight.format("%H:%M").to_string(), "00:00");
        assert!(date("someday").is_err());
    }

    #[test]
    fn test_parse_screener_rows() {
        let outcome = parse_stock_csv(SCREENER_CSV).unwrap();
        assert_eq!(outcome.records.len(), 3);

        let nke = &outcome.records[0];
        assert_eq!(nke.ticker, "NKE");
        assert_eq!(nke.company.as_deref(), Some("NIKE Inc"));
        assert_eq!(nke.price_change, Some(15.19));
        assert_eq!(nke.volume, Some(42_310_155));
        assert_eq!(nke.market_cap, Some(95_310_500_000.0));
        assert!(nke.earnings_date.is_some());

        let sats = &outcome.records[1];
        assert_eq!(sats.pe_ratio, None);
        assert_eq!(sats.earnings_date, None);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_row_without_ticker_is_dropped() {
        let mut body = String::from("Ticker,Price\n");
        for i in 1..=10 {
            if i == 5 {
                body.push_str(",10.00\n");
            } else {
                body.push_str(&format!("T{},{}.00\n", i, i));
            }
        }
        let outcome = parse_stock_csv(&body).unwrap();
        assert_eq!(outcome.records.len(), 9);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.rows_read, 10);
        assert!(outcome.warnings[0].contains("row 5"));
        assert!(outcome.records.iter().all(|r| r.ticker != "T5"));
    }

    #[test]
    fn test_malformed_cell_left_absent() {
        let body = "Ticker,Price,P/E\nAAPL,oops,28.5\n";
        let outcome = parse_stock_csv(body).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].price, None);
        assert_eq!(outcome.records[0].pe_ratio, Some(28.5));
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_header_only_is_empty_result() {
        let outcome = parse_stock_csv("No.,Ticker,Company\n").unwrap();
        assert!(outcome.records.is_empty());
        assert!(parse_stock_csv("").unwrap().records.is_empty());
    }

    #[test]
    fn test_unknown_schema_is_parse_error() {
        let err = parse_stock_csv("Foo,Bar\n1,2\n").unwrap_err();
        assert!(matches!(err, FinvizError::Parse(_)));
    }

    #[test]
    fn test_html_body_is_authentication_error() {
        let err = parse_stock_csv("<!DOCTYPE html><html><body>Login</body></html>").unwrap_err();
        assert!(matches!(err, FinvizError::Authentication(_)));
    }

    #[test]
    fn test_flags_and_counts() {
        let body = "Ticker,Optionable,Shortable,Employees,IPO Date\nMSFT,Yes,No,\"228,000\",3/13/1986\n";
        let record = &parse_stock_csv(body).unwrap().records[0];
        assert_eq!(record.optionable, Some(true));
        assert_eq!(record.shortable, Some(false));
        assert_eq!(record.employees, Some(228_000));
        assert_eq!(record.ipo_date, NaiveDate::from_ymd_opt(1986, 3, 13));
    }

    #[test]
    fn test_parse_news() {
        let body = "Title,Source,Date,Url,Ticker\n\
            Apple beats earnings estimates,Reuters,2025-06-26 08:30:00,https://example.com/a,aapl\n\
            Analyst upgrade for Tesla,Bloomberg,06/25/2025,https://example.com/b,TSLA\n\
            ,Nobody,2025-06-26,https://example.com/c,MSFT\n";
        let outcome = parse_news_csv(body).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].ticker.as_deref(), Some("AAPL"));
        assert_eq!(outcome.records[0].category, NewsCategory::Earnings);
        assert_eq!(outcome.records[1].category, NewsCategory::Analyst);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_parse_filings() {
        let body = "Filing Date,Report Date,Form,Description,Filing,Document\n\
            07/31/25,06/28/25,10-Q,Quarterly report,https://sec.example/f1,https://sec.example/d1\n\
            2025-07-15,-,4,Statement of changes,https://sec.example/f2,\n\
            garbage,-,8-K,Current report,https://sec.example/f3,\n";
        let outcome = parse_filings_csv(body, "aapl").unwrap();
        assert_eq!(outcome.records.len(), 2);
        let first = &outcome.records[0];
        assert_eq!(first.ticker, "AAPL");
        assert_eq!(first.form, "10-Q");
        assert_eq!(first.filing_date, NaiveDate::from_ymd_opt(2025, 7, 31).unwrap());
        assert_eq!(first.report_date, NaiveDate::from_ymd_opt(2025, 6, 28));
        assert_eq!(outcome.records[1].document_url, None);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_project_fields_with_aliases() {
        let mut record = StockRecord::new("AAPL");
        record.roic = Some(41.2);
        record.price = Some(201.5);
        let fields = vec!["price".to_string(), "roi".to_string(), "pe_ratio".to_string()];
        let projected = project_fields(&record, &fields).unwrap();
        assert_eq!(projected["ticker"], "AAPL");
        assert_eq!(projected["price"], 201.5);
        assert_eq!(projected["roi"], 41.2);
        assert!(projected["pe_ratio"].is_null());
        assert_eq!(projected.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_project_unknown_field_rejected() {
        let record = StockRecord::new("AAPL");
        let err = project_fields(&record, &["zodiac_sign".to_string()]).unwrap_err();
        assert!(matches!(err, FinvizError::Validation { ref field, .. } if field == "data_fields"));
    }

    #[test]
    fn test_record_fields_cover_columns() {
        let fields = record_fields().unwrap();
        assert!(fields.windows(2).all(|w| w[0] < w[1]));
        assert!(fields.iter().any(|f| f == "ticker"));
        for (field, _) in FIELD_COLUMNS {
            assert!(fields.iter().any(|f| f == field), "{} is not a record field", field);
        }
        assert_eq!(field_column("pe_ratio"), Some("P/E"));
        assert_eq!(field_column("roi"), Some("Return on Invested Capital"));
        assert_eq!(field_column("ticker"), Some("Ticker"));
        assert_eq!(field_column("zodiac_sign"), None);
    }

    #[test]
    fn test_column_aliases_do_not_collide() {
        let mut seen = std::collections::HashSet::new();
        for (_, headers) in COLUMNS {
            for h in *headers {
                assert!(seen.insert(header_key(h)), "duplicate header alias {}", h);
            }
        }
    }
}
