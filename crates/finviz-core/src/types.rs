use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One screener/quote export row. Every field except `ticker` is absent when the
/// source cell was empty, `-` or missing from the export view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub ticker: String,
    pub company: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub index: Option<String>,

    // Price and volume
    pub market_cap: Option<f64>,
    pub price: Option<f64>,
    pub prev_close: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    /// Daily change in percent.
    pub price_change: Option<f64>,
    pub change_from_open: Option<f64>,
    pub gap: Option<f64>,
    pub volume: Option<u64>,
    pub avg_volume: Option<u64>,
    pub relative_volume: Option<f64>,
    pub afterhours_close: Option<f64>,
    pub afterhours_change: Option<f64>,

    // Valuation
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub peg: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub price_to_cash: Option<f64>,
    pub price_to_free_cash_flow: Option<f64>,

    // Earnings and growth
    pub eps: Option<f64>,
    pub eps_growth_this_y: Option<f64>,
    pub eps_growth_next_y: Option<f64>,
    pub eps_growth_past_5y: Option<f64>,
    pub eps_growth_next_5y: Option<f64>,
    pub sales_growth_past_5y: Option<f64>,
    pub eps_qoq_growth: Option<f64>,
    pub sales_qoq_growth: Option<f64>,
    pub eps_surprise: Option<f64>,
    pub revenue_surprise: Option<f64>,
    pub earnings_date: Option<NaiveDateTime>,

    // Income statement and dividends
    pub income: Option<f64>,
    pub sales: Option<f64>,
    pub book_value_per_share: Option<f64>,
    pub cash_per_share: Option<f64>,
    pub dividend: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub payout_ratio: Option<f64>,

    // Profitability
    pub roa: Option<f64>,
    pub roe: Option<f64>,
    pub roic: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub profit_margin: Option<f64>,

    // Balance sheet health
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub lt_debt_to_equity: Option<f64>,
    pub debt_to_equity: Option<f64>,

    // Ownership and short interest
    pub insider_ownership: Option<f64>,
    pub insider_transactions: Option<f64>,
    pub institutional_ownership: Option<f64>,
    pub institutional_transactions: Option<f64>,
    pub float_short: Option<f64>,
    pub short_ratio: Option<f64>,
    pub short_interest: Option<f64>,
    pub shares_outstanding: Option<u64>,
    pub shares_float: Option<u64>,

    // Performance (percent)
    pub performance_1w: Option<f64>,
    pub performance_1m: Option<f64>,
    pub performance_3m: Option<f64>,
    pub performance_6m: Option<f64>,
    pub performance_ytd: Option<f64>,
    pub performance_1y: Option<f64>,

    // Technicals. SMA and 52-week fields are percent distance of price from the level.
    pub beta: Option<f64>,
    pub atr: Option<f64>,
    pub volatility_week: Option<f64>,
    pub volatility_month: Option<f64>,
    pub rsi: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub week_52_high: Option<f64>,
    pub week_52_low: Option<f64>,

    // Analysts
    pub target_price: Option<f64>,
    /// Consensus on a 1 (strong buy) to 5 (strong sell) scale.
    pub analyst_recommendation: Option<f64>,

    // Misc
    pub optionable: Option<bool>,
    pub shortable: Option<bool>,
    pub employees: Option<u64>,
    pub ipo_date: Option<NaiveDate>,

    // ETF-only columns
    pub assets_under_management: Option<f64>,
    pub net_expense_ratio: Option<f64>,
}

impl StockRecord {
    /// A record with every optional field absent.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Default::default()
        }
    }
}

/// When an earnings release happens relative to the regular session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningsTiming {
    BeforeOpen,
    AfterClose,
}

impl EarningsTiming {
    /// Releases stamped before noon are treated as pre-market. Midnight means the
    /// source gave a date without a time.
    pub fn from_datetime(dt: &NaiveDateTime) -> Option<Self> {
        let time = dt.time();
        if time.hour() == 0 && time.minute() == 0 {
            None
        } else if time.hour() < 12 {
            Some(Self::BeforeOpen)
        } else {
            Some(Self::AfterClose)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeOpen => "before",
            Self::AfterClose => "after",
        }
    }
}

/// Earnings-focused view of a screener row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsRecord {
    pub ticker: String,
    pub company: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub earnings_date: Option<NaiveDateTime>,
    pub timing: Option<EarningsTiming>,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub price_change: Option<f64>,
    pub gap: Option<f64>,
    pub afterhours_change: Option<f64>,
    pub volume: Option<u64>,
    pub avg_volume: Option<u64>,
    pub relative_volume: Option<f64>,
    pub eps_surprise: Option<f64>,
    pub revenue_surprise: Option<f64>,
    pub eps_qoq_growth: Option<f64>,
    pub sales_qoq_growth: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub target_price: Option<f64>,
    /// Percent distance from price to analyst target.
    pub target_price_upside: Option<f64>,
    pub analyst_recommendation: Option<f64>,
    pub performance_1w: Option<f64>,
    pub performance_1m: Option<f64>,
    pub volatility_week: Option<f64>,
    pub beta: Option<f64>,
    pub float_short: Option<f64>,
    pub short_ratio: Option<f64>,
    pub insider_ownership: Option<f64>,
    pub institutional_ownership: Option<f64>,
}

impl From<&StockRecord> for EarningsRecord {
    fn from(s: &StockRecord) -> Self {
        let target_price_upside = match (s.target_price, s.price) {
            (Some(target), Some(price)) if price > 0.0 => Some((target - price) / price * 100.0),
            _ => None,
        };

        Self {
            ticker: s.ticker.clone(),
            company: s.company.clone(),
            sector: s.sector.clone(),
            industry: s.industry.clone(),
            earnings_date: s.earnings_date,
            timing: s.earnings_date.as_ref().and_then(EarningsTiming::from_datetime),
            price: s.price,
            market_cap: s.market_cap,
            price_change: s.price_change,
            gap: s.gap,
            afterhours_change: s.afterhours_change,
            volume: s.volume,
            avg_volume: s.avg_volume,
            relative_volume: s.relative_volume,
            eps_surprise: s.eps_surprise,
            revenue_surprise: s.revenue_surprise,
            eps_qoq_growth: s.eps_qoq_growth,
            sales_qoq_growth: s.sales_qoq_growth,
            pe_ratio: s.pe_ratio,
            forward_pe: s.forward_pe,
            target_price: s.target_price,
            target_price_upside,
            analyst_recommendation: s.analyst_recommendation,
            performance_1w: s.performance_1w,
            performance_1m: s.performance_1m,
            volatility_week: s.volatility_week,
            beta: s.beta,
            float_short: s.float_short,
            short_ratio: s.short_ratio,
            insider_ownership: s.insider_ownership,
            institutional_ownership: s.institutional_ownership,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsCategory {
    Earnings,
    Analyst,
    Insider,
    Merger,
    Regulatory,
    CorporateAction,
    General,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 7] = [
        Self::Earnings,
        Self::Analyst,
        Self::Insider,
        Self::Merger,
        Self::Regulatory,
        Self::CorporateAction,
        Self::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earnings => "earnings",
            Self::Analyst => "analyst",
            Self::Insider => "insider",
            Self::Merger => "merger",
            Self::Regulatory => "regulatory",
            Self::CorporateAction => "corporate_action",
            Self::General => "general",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

/// A headline from the news export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub ticker: Option<String>,
    pub title: String,
    pub source: Option<String>,
    pub published: Option<NaiveDateTime>,
    pub url: String,
    pub category: NewsCategory,
}

/// Grouping dimension of the groups page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Sector,
    Industry,
    Country,
}

impl GroupKind {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Sector => "sector",
            Self::Industry => "industry",
            Self::Country => "country",
        }
    }
}

/// Performance of one sector, industry or country group (percent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPerformance {
    pub name: String,
    pub group: GroupKind,
    pub performance_1d: Option<f64>,
    pub performance_1w: Option<f64>,
    pub performance_1m: Option<f64>,
    pub performance_3m: Option<f64>,
    pub performance_6m: Option<f64>,
    pub performance_1y: Option<f64>,
    pub stock_count: Option<u32>,
}

/// One SEC filing, from either the Finviz filings export or EDGAR submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecFilingRecord {
    pub ticker: String,
    pub filing_date: NaiveDate,
    pub report_date: Option<NaiveDate>,
    pub form: String,
    pub description: String,
    pub filing_url: Option<String>,
    pub document_url: Option<String>,
    pub accession_number: Option<String>,
    pub primary_document: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingSummary {
    pub ticker: String,
    pub days_back: u32,
    pub total_filings: usize,
    pub forms: BTreeMap<String, usize>,
    pub latest_filing_date: Option<NaiveDate>,
    pub latest_form: Option<String>,
}

impl FilingSummary {
    pub fn from_filings(ticker: &str, days_back: u32, filings: &[SecFilingRecord]) -> Self {
        let mut forms = BTreeMap::new();
        for f in filings {
            *forms.entry(f.form.clone()).or_insert(0) += 1;
        }
        let latest = filings.iter().max_by_key(|f| f.filing_date);

        Self {
            ticker: ticker.to_string(),
            days_back,
            total_filings: filings.len(),
            forms,
            latest_filing_date: latest.map(|f| f.filing_date),
            latest_form: latest.map(|f| f.form.clone()),
        }
    }
}

/// Sector performance plus index proxy quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
    pub generated_at: DateTime<Utc>,
    pub sectors: Vec<SectorPerformance>,
    pub indices: Vec<StockRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn create_test_filing(form: &str, date: &str) -> SecFilingRecord {
        SecFilingRecord {
            ticker: "AAPL".to_string(),
            filing_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            report_date: None,
            form: form.to_string(),
            description: String::new(),
            filing_url: None,
            document_url: None,
            accession_number: None,
            primary_document: None,
        }
    }

    #[test]
    fn test_new_record_has_no_values() {
        let record = StockRecord::new("AAPL");
        assert_eq!(record.ticker, "AAPL");
        assert!(record.price.is_none());
        assert!(record.market_cap.is_none());
        assert!(record.earnings_date.is_none());
    }

    #[test]
    fn test_earnings_timing() {
        assert_eq!(EarningsTiming::from_datetime(&at("2025-01-30", "08:00:00")), Some(EarningsTiming::BeforeOpen));
        assert_eq!(EarningsTiming::from_datetime(&at("2025-01-30", "16:30:00")), Some(EarningsTiming::AfterClose));
        assert_eq!(EarningsTiming::from_datetime(&at("2025-01-30", "00:00:00")), None);
    }

    #[test]
    fn test_earnings_record_upside() {
        let mut stock = StockRecord::new("NKE");
        stock.price = Some(80.0);
        stock.target_price = Some(100.0);
        stock.earnings_date = Some(at("2025-06-26", "16:15:00"));

        let earnings = EarningsRecord::from(&stock);
        assert_eq!(earnings.target_price_upside, Some(25.0));
        assert_eq!(earnings.timing, Some(EarningsTiming::AfterClose));

        stock.price = None;
        assert!(EarningsRecord::from(&stock).target_price_upside.is_none());
    }

    #[test]
    fn test_news_category_parse() {
        assert_eq!(NewsCategory::parse("corporate_action"), Some(NewsCategory::CorporateAction));
        assert_eq!(NewsCategory::parse("gossip"), None);
    }

    #[test]
    fn test_filing_summary_counts() {
        let filings = vec![
            create_test_filing("10-Q", "2025-05-02"),
            create_test_filing("8-K", "2025-05-20"),
            create_test_filing("8-K", "2025-04-11"),
        ];
        let summary = FilingSummary::from_filings("AAPL", 90, &filings);
        assert_eq!(summary.total_filings, 3);
        assert_eq!(summary.forms.get("8-K"), Some(&2));
        assert_eq!(summary.latest_form.as_deref(), Some("8-K"));
        assert_eq!(summary.latest_filing_date, NaiveDate::from_ymd_opt(2025, 5, 20));
    }
}
