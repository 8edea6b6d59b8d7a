//! Preset screens. Each builds a [`FilterRequest`] and runs it through
//! [`FinvizClient::screen`].

use crate::client::{compare_missing_last, FinvizClient};
use crate::filter::{FilterRequest, Range, SortOrder};
use finviz_core::{EarningsRecord, FinvizError, StockRecord};
use serde::{Deserialize, Serialize};

/// Sectors the upcoming-earnings screen covers unless told otherwise.
pub const DEFAULT_EARNINGS_SECTORS: &[&str] = &[
    "Technology",
    "Industrials",
    "Healthcare",
    "Communication Services",
    "Consumer Cyclical",
    "Financial Services",
    "Consumer Defensive",
    "Basic Materials",
];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn parse_order(value: &str) -> Result<SortOrder, FinvizError> {
    SortOrder::parse(value)
}

pub fn volume_surge() -> FilterRequest {
    FilterRequest {
        market_cap: Some("smallover".to_string()),
        stocks_only: true,
        avg_volume: Range::at_least(100_000.0),
        price: Range::at_least(10.0),
        relative_volume: Range::at_least(1.5),
        price_change: Range::at_least(2.0),
        sma_filter: Some("above_sma200".to_string()),
        sort_by: Some("price_change".to_string()),
        sort_order: SortOrder::Desc,
        ..Default::default()
    }
}

pub fn uptrend() -> FilterRequest {
    FilterRequest {
        market_cap: Some("microover".to_string()),
        stocks_only: true,
        avg_volume: Range::at_least(100_000.0),
        price: Range::at_least(10.0),
        sort_by: Some("eps_growth_yoy".to_string()),
        sort_order: SortOrder::Desc,
        ..Default::default()
    }
    .with_filter("high_low_52w", "above_low_30")
    .with_filter("performance2", "month_up")
    .with_filter("sma20", "price_above")
    .with_filter("sma200", "price_above")
    .with_filter("sma50", "above_sma200")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarningsParams {
    pub earnings_date: String,
    pub market_cap: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_volume: Option<f64>,
    pub sectors: Vec<String>,
    pub max_results: u32,
}

impl Default for EarningsParams {
    fn default() -> Self {
        Self {
            earnings_date: "this_week".to_string(),
            market_cap: None,
            min_price: None,
            max_price: None,
            min_volume: None,
            sectors: Vec::new(),
            max_results: 100,
        }
    }
}

pub fn earnings(params: &EarningsParams) -> FilterRequest {
    FilterRequest {
        earnings_date: vec![params.earnings_date.clone()],
        market_cap: params.market_cap.clone(),
        price: Range::new(params.min_price, params.max_price),
        volume: Range::new(params.min_volume, None),
        sectors: params.sectors.clone(),
        sort_by: Some("earnings_date".to_string()),
        sort_order: SortOrder::Asc,
        max_results: Some(params.max_results),
        ..Default::default()
    }
}

pub fn earnings_premarket() -> FilterRequest {
    FilterRequest {
        earnings_date: strings(&["today_before"]),
        market_cap: Some("smallover".to_string()),
        avg_volume: Range::at_least(100_000.0),
        price: Range::at_least(10.0),
        price_change: Range::at_least(2.0),
        stocks_only: true,
        sort_by: Some("price_change".to_string()),
        sort_order: SortOrder::Desc,
        max_results: Some(60),
        ..Default::default()
    }
}

pub fn earnings_afterhours() -> FilterRequest {
    FilterRequest {
        earnings_date: strings(&["today_after"]),
        market_cap: Some("smallover".to_string()),
        avg_volume: Range::at_least(100_000.0),
        price: Range::at_least(10.0),
        stocks_only: true,
        sort_by: Some("afterhours_change".to_string()),
        sort_order: SortOrder::Desc,
        max_results: Some(60),
        ..Default::default()
    }
    .with_range("afterhours_change", Range::at_least(2.0))
}

/// Fresh reporters with upward revisions that pulled back over the last month.
pub fn earnings_trading() -> FilterRequest {
    FilterRequest {
        earnings_date: strings(&["yesterday_after", "today_before"]),
        market_cap: Some("smallover".to_string()),
        avg_volume: Range::at_least(200_000.0),
        price: Range::at_least(10.0),
        stocks_only: true,
        sort_by: Some("eps_surprise".to_string()),
        sort_order: SortOrder::Desc,
        max_results: Some(60),
        ..Default::default()
    }
    .with_filter("eps_revision", "positive")
    .with_filter("price_direction", "up")
    .with_filter("performance", "month_flat_or_down")
    .with_range("volatility", Range::at_least(1.0))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositiveSurpriseParams {
    pub min_price: Option<f64>,
    pub min_eps_qoq_growth: Option<f64>,
    pub above_sma200: bool,
    pub sort_by: String,
    pub max_results: u32,
}

impl Default for PositiveSurpriseParams {
    fn default() -> Self {
        Self {
            min_price: None,
            min_eps_qoq_growth: None,
            above_sma200: false,
            sort_by: "eps_qoq_growth".to_string(),
            max_results: 50,
        }
    }
}

pub fn earnings_positive_surprise(params: &PositiveSurpriseParams) -> FilterRequest {
    let mut request = FilterRequest {
        earnings_date: strings(&["this_week"]),
        market_cap: Some("smallover".to_string()),
        price: Range::new(params.min_price, None),
        sort_by: Some(params.sort_by.clone()),
        sort_order: SortOrder::Desc,
        max_results: Some(params.max_results),
        ..Default::default()
    };
    if params.above_sma200 {
        request.sma_filter = Some("above_sma200".to_string());
    }
    match params.min_eps_qoq_growth {
        Some(min) => request.with_range("eps_qoq", Range::at_least(min)),
        None => request.with_filter("eps_growth_qoq", "positive"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DividendGrowthParams {
    pub market_cap: String,
    pub min_dividend_yield: f64,
    pub max_dividend_yield: Option<f64>,
    pub max_pb_ratio: f64,
    pub max_pe_ratio: f64,
    pub min_payout_ratio: Option<f64>,
    pub max_payout_ratio: Option<f64>,
    pub min_roe: Option<f64>,
    pub max_debt_equity: Option<f64>,
    pub country: String,
    pub sort_by: String,
    pub sort_order: String,
    pub max_results: u32,
}

impl Default for DividendGrowthParams {
    fn default() -> Self {
        Self {
            market_cap: "midover".to_string(),
            min_dividend_yield: 2.0,
            max_dividend_yield: None,
            max_pb_ratio: 5.0,
            max_pe_ratio: 30.0,
            min_payout_ratio: None,
            max_payout_ratio: None,
            min_roe: None,
            max_debt_equity: None,
            country: "USA".to_string(),
            sort_by: "sma200".to_string(),
            sort_order: "asc".to_string(),
            max_results: 100,
        }
    }
}

pub fn dividend_growth(params: &DividendGrowthParams) -> Result<FilterRequest, FinvizError> {
    let mut request = FilterRequest {
        market_cap: Some(params.market_cap.clone()),
        country: Some(params.country.clone()),
        stocks_only: true,
        dividend_yield: Range::new(Some(params.min_dividend_yield), params.max_dividend_yield),
        pe: Range::at_most(params.max_pe_ratio),
        sort_by: Some(params.sort_by.clone()),
        sort_order: parse_order(&params.sort_order)?,
        max_results: Some(params.max_results),
        ..Default::default()
    }
    .with_range("pb", Range::at_most(params.max_pb_ratio))
    .with_filter("eps_growth_5y", "positive")
    .with_filter("eps_growth_qoq", "positive")
    .with_filter("eps_growth_yoy", "positive")
    .with_filter("sales_growth_5y", "positive")
    .with_filter("sales_growth_qoq", "positive");

    let payout = Range::new(params.min_payout_ratio, params.max_payout_ratio);
    if !payout.is_open() {
        request = request.with_range("payout_ratio", payout);
    }
    if let Some(min) = params.min_roe {
        request = request.with_range("roe", Range::at_least(min));
    }
    if let Some(max) = params.max_debt_equity {
        request = request.with_range("debt_equity", Range::at_most(max));
    }
    Ok(request)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtfParams {
    /// Minimum assets under management, in dollars.
    pub min_aum: Option<f64>,
    /// Maximum net expense ratio, in percent.
    pub max_expense_ratio: Option<f64>,
    /// `aum` or `expense_ratio`.
    pub sort_by: String,
    pub sort_order: String,
    pub max_results: u32,
}

impl Default for EtfParams {
    fn default() -> Self {
        Self {
            min_aum: None,
            max_expense_ratio: None,
            sort_by: "aum".to_string(),
            sort_order: "desc".to_string(),
            max_results: 50,
        }
    }
}

pub fn etf() -> FilterRequest {
    FilterRequest::default().with_filter("instrument", "etf")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendReversionParams {
    pub market_cap: String,
    pub eps_growth_qoq: Option<f64>,
    pub revenue_growth_qoq: Option<f64>,
    pub rsi_max: Option<f64>,
    pub sectors: Vec<String>,
    pub exclude_sectors: Vec<String>,
    pub sort_by: String,
    pub sort_order: String,
    pub max_results: u32,
}

impl Default for TrendReversionParams {
    fn default() -> Self {
        Self {
            market_cap: "midover".to_string(),
            eps_growth_qoq: None,
            revenue_growth_qoq: None,
            rsi_max: None,
            sectors: Vec::new(),
            exclude_sectors: Vec::new(),
            sort_by: "rsi".to_string(),
            sort_order: "asc".to_string(),
            max_results: 50,
        }
    }
}

pub fn trend_reversion(params: &TrendReversionParams) -> Result<FilterRequest, FinvizError> {
    let mut request = FilterRequest {
        market_cap: Some(params.market_cap.clone()),
        rsi: Range::new(None, params.rsi_max),
        sectors: params.sectors.clone(),
        exclude_sectors: params.exclude_sectors.clone(),
        sort_by: Some(params.sort_by.clone()),
        sort_order: parse_order(&params.sort_order)?,
        max_results: Some(params.max_results),
        ..Default::default()
    };
    if let Some(min) = params.eps_growth_qoq {
        request = request.with_range("eps_qoq", Range::at_least(min));
    }
    if let Some(min) = params.revenue_growth_qoq {
        request = request.with_range("sales_qoq", Range::at_least(min));
    }
    Ok(request)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelativeVolumeParams {
    pub min_relative_volume: f64,
    pub min_price: Option<f64>,
    pub sectors: Vec<String>,
    pub max_results: u32,
}

impl Default for RelativeVolumeParams {
    fn default() -> Self {
        Self {
            min_relative_volume: 2.0,
            min_price: None,
            sectors: Vec::new(),
            max_results: 50,
        }
    }
}

pub fn relative_volume(params: &RelativeVolumeParams) -> FilterRequest {
    FilterRequest {
        relative_volume: Range::at_least(params.min_relative_volume),
        price: Range::new(params.min_price, None),
        sectors: params.sectors.clone(),
        sort_by: Some("relative_volume".to_string()),
        sort_order: SortOrder::Desc,
        max_results: Some(params.max_results),
        ..Default::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalParams {
    pub rsi_min: Option<f64>,
    pub rsi_max: Option<f64>,
    /// Price relation to each moving average: `above`, `below`, `crossed_above`, `crossed_below`.
    pub price_vs_sma20: Option<String>,
    pub price_vs_sma50: Option<String>,
    pub price_vs_sma200: Option<String>,
    /// Shorthand such as `above_sma50`; conflicts with the matching `price_vs_sma*`.
    pub sma_filter: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_volume: Option<f64>,
    pub sectors: Vec<String>,
    pub max_results: u32,
}

impl Default for TechnicalParams {
    fn default() -> Self {
        Self {
            rsi_min: None,
            rsi_max: None,
            price_vs_sma20: None,
            price_vs_sma50: None,
            price_vs_sma200: None,
            sma_filter: None,
            min_price: None,
            max_price: None,
            min_volume: None,
            sectors: Vec::new(),
            max_results: 50,
        }
    }
}

pub fn technical_analysis(params: &TechnicalParams) -> FilterRequest {
    let mut request = FilterRequest {
        rsi: Range::new(params.rsi_min, params.rsi_max),
        price: Range::new(params.min_price, params.max_price),
        volume: Range::new(params.min_volume, None),
        sectors: params.sectors.clone(),
        sma_filter: params.sma_filter.clone(),
        max_results: Some(params.max_results),
        ..Default::default()
    };
    for (key, relation) in [
        ("sma20", &params.price_vs_sma20),
        ("sma50", &params.price_vs_sma50),
        ("sma200", &params.price_vs_sma200),
    ] {
        if let Some(relation) = relation {
            let relation = relation.trim().to_ascii_lowercase();
            let value = if relation.starts_with("price_") {
                relation
            } else {
                format!("price_{}", relation)
            };
            request = request.with_filter(key, &value);
        }
    }
    request
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpcomingEarningsParams {
    /// `next_week`, `next_2_weeks` or `this_month`.
    pub earnings_period: String,
    pub market_cap: String,
    pub min_price: Option<f64>,
    pub min_avg_volume: Option<f64>,
    pub target_sectors: Vec<String>,
    /// `earnings_date`, `market_cap`, `target_price_upside`, `price_change`, `volume` or `ticker`.
    pub sort_by: String,
    pub sort_order: String,
    pub max_results: u32,
}

impl Default for UpcomingEarningsParams {
    fn default() -> Self {
        Self {
            earnings_period: "next_week".to_string(),
            market_cap: "smallover".to_string(),
            min_price: Some(10.0),
            min_avg_volume: Some(500_000.0),
            target_sectors: strings(DEFAULT_EARNINGS_SECTORS),
            sort_by: "earnings_date".to_string(),
            sort_order: "asc".to_string(),
            max_results: 100,
        }
    }
}

pub fn upcoming_earnings(params: &UpcomingEarningsParams) -> Result<FilterRequest, FinvizError> {
    let bucket = match params.earnings_period.as_str() {
        "next_week" => "next_week",
        "next_2_weeks" => "within_2_weeks",
        "this_month" => "this_month",
        other => {
            return Err(FinvizError::validation(
                "earnings_period",
                format!("unknown value '{}'; accepted values: next_week, next_2_weeks, this_month", other),
            ))
        }
    };
    Ok(FilterRequest {
        earnings_date: strings(&[bucket]),
        market_cap: Some(params.market_cap.clone()),
        price: Range::new(params.min_price, None),
        avg_volume: Range::new(params.min_avg_volume, None),
        sectors: params.target_sectors.clone(),
        ..Default::default()
    })
}

fn earnings_sort_value(record: &EarningsRecord, key: &str) -> Option<f64> {
    match key {
        "earnings_date" => record.earnings_date.map(|d| d.and_utc().timestamp() as f64),
        "market_cap" => record.market_cap,
        "target_price_upside" => record.target_price_upside,
        "price_change" => record.price_change,
        "volume" => record.volume.map(|v| v as f64),
        "eps_surprise" => record.eps_surprise,
        "price" => record.price,
        _ => None,
    }
}

impl FinvizClient {
    pub async fn volume_surge_screener(&self) -> Result<Vec<StockRecord>, FinvizError> {
        self.screen(&volume_surge()).await
    }

    pub async fn uptrend_screener(&self) -> Result<Vec<StockRecord>, FinvizError> {
        self.screen(&uptrend()).await
    }

    pub async fn earnings_screener(&self, params: &EarningsParams) -> Result<Vec<StockRecord>, FinvizError> {
        self.screen(&earnings(params)).await
    }

    pub async fn earnings_premarket_screener(&self) -> Result<Vec<StockRecord>, FinvizError> {
        self.screen(&earnings_premarket()).await
    }

    pub async fn earnings_afterhours_screener(&self) -> Result<Vec<StockRecord>, FinvizError> {
        self.screen(&earnings_afterhours()).await
    }

    pub async fn earnings_trading_screener(&self) -> Result<Vec<StockRecord>, FinvizError> {
        self.screen(&earnings_trading()).await
    }

    pub async fn earnings_positive_surprise_screener(
        &self,
        params: &PositiveSurpriseParams,
    ) -> Result<Vec<StockRecord>, FinvizError> {
        self.screen(&earnings_positive_surprise(params)).await
    }

    pub async fn dividend_growth_screener(&self, params: &DividendGrowthParams) -> Result<Vec<StockRecord>, FinvizError> {
        self.screen(&dividend_growth(params)?).await
    }

    /// ETF screen. AUM and expense-ratio limits have no screener token and are applied here.
    pub async fn etf_screener(&self, params: &EtfParams) -> Result<Vec<StockRecord>, FinvizError> {
        let order = parse_order(&params.sort_order)?;
        let sort_key: fn(&StockRecord) -> Option<f64> = match params.sort_by.as_str() {
            "aum" => |r: &StockRecord| r.assets_under_management,
            "expense_ratio" => |r: &StockRecord| r.net_expense_ratio,
            other => {
                return Err(FinvizError::validation(
                    "sort_by",
                    format!("unknown value '{}'; accepted values: aum, expense_ratio", other),
                ))
            }
        };
        crate::filter::validate_limit(params.max_results)?;

        let mut records: Vec<StockRecord> = self
            .screen(&etf())
            .await?
            .into_iter()
            .filter(|r| match params.min_aum {
                Some(min) => r.assets_under_management.is_some_and(|aum| aum >= min),
                None => true,
            })
            .filter(|r| match params.max_expense_ratio {
                Some(max) => r.net_expense_ratio.is_some_and(|er| er <= max),
                None => true,
            })
            .collect();

        records.sort_by(|a, b| {
            compare_missing_last(sort_key(a).as_ref(), sort_key(b).as_ref(), order, |x, y| {
                x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal)
            })
        });
        records.truncate(params.max_results as usize);
        Ok(records)
    }

    pub async fn trend_reversion_screener(&self, params: &TrendReversionParams) -> Result<Vec<StockRecord>, FinvizError> {
        self.screen(&trend_reversion(params)?).await
    }

    pub async fn relative_volume_screener(&self, params: &RelativeVolumeParams) -> Result<Vec<StockRecord>, FinvizError> {
        self.screen(&relative_volume(params)).await
    }

    pub async fn technical_analysis_screener(&self, params: &TechnicalParams) -> Result<Vec<StockRecord>, FinvizError> {
        self.screen(&technical_analysis(params)).await
    }

    /// Upcoming reporters as earnings records, with target upside and timing derived.
    pub async fn upcoming_earnings_screener(
        &self,
        params: &UpcomingEarningsParams,
    ) -> Result<Vec<EarningsRecord>, FinvizError> {
        let order = parse_order(&params.sort_order)?;
        crate::filter::validate_limit(params.max_results)?;
        let request = upcoming_earnings(params)?;
        let mut records: Vec<EarningsRecord> = self
            .screen(&request)
            .await?
            .iter()
            .map(EarningsRecord::from)
            .collect();

        let key = params.sort_by.as_str();
        if key == "ticker" {
            records.sort_by(|a, b| match order {
                SortOrder::Asc => a.ticker.cmp(&b.ticker),
                SortOrder::Desc => b.ticker.cmp(&a.ticker),
            });
        } else {
            records.sort_by(|a, b| {
                compare_missing_last(
                    earnings_sort_value(a, key).as_ref(),
                    earnings_sort_value(b, key).as_ref(),
                    order,
                    |x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal),
                )
            });
        }
        records.truncate(params.max_results as usize);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::create_test_client;
    use crate::filter::compile;
    use crate::mock::ScriptedTransport;
    use std::sync::Arc;

    fn filter_param(request: &FilterRequest) -> String {
        compile(request).unwrap().filter_param().unwrap_or_default()
    }

    #[test]
    fn test_volume_surge_tokens() {
        assert_eq!(
            filter_param(&volume_surge()),
            "cap_smallover,ind_stocksonly,sh_avgvol_o100,sh_price_o10,sh_relvol_o1.5,ta_change_o2,ta_sma200_pa"
        );
    }

    #[test]
    fn test_uptrend_tokens() {
        assert_eq!(
            filter_param(&uptrend()),
            "cap_microover,ind_stocksonly,sh_avgvol_o100,sh_price_o10,ta_highlow52w_a30h,ta_perf2_4wup,ta_sma20_pa,ta_sma200_pa,ta_sma50_sa200"
        );
        assert_eq!(compile(&uptrend()).unwrap().sort.as_deref(), Some("-epsyoy1"));
    }

    #[test]
    fn test_earnings_trading_tokens() {
        let query = compile(&earnings_trading()).unwrap();
        assert_eq!(
            query.filter_param().unwrap(),
            "cap_smallover,earningsdate_yesterdayafter|todaybefore,fa_epsrev_ep,ind_stocksonly,sh_avgvol_o200,sh_price_o10,ta_change_u,ta_perf_0to-4w,ta_volatility_1tox"
        );
        assert_eq!(query.sort.as_deref(), Some("-epssurprise"));
        assert_eq!(query.limit, Some(60));
    }

    #[test]
    fn test_earnings_afterhours_tokens() {
        let query = compile(&earnings_afterhours()).unwrap();
        assert_eq!(
            query.filter_param().unwrap(),
            "ah_change_o2,cap_smallover,earningsdate_todayafter,ind_stocksonly,sh_avgvol_o100,sh_price_o10"
        );
        assert_eq!(query.sort.as_deref(), Some("-afterchange"));
    }

    #[test]
    fn test_dividend_growth_defaults() {
        let request = dividend_growth(&DividendGrowthParams::default()).unwrap();
        let query = compile(&request).unwrap();
        assert_eq!(
            query.filter_param().unwrap(),
            "cap_midover,fa_div_o2,fa_eps5years_pos,fa_epsqoq_pos,fa_epsyoy_pos,fa_pb_u5,fa_pe_u30,\
             fa_sales5years_pos,fa_salesqoq_pos,geo_usa,ind_stocksonly"
        );
        assert_eq!(query.sort.as_deref(), Some("sma200"));
    }

    #[test]
    fn test_dividend_growth_bad_sort_order() {
        let params = DividendGrowthParams {
            sort_order: "sideways".to_string(),
            ..Default::default()
        };
        assert!(dividend_growth(&params).is_err());
    }

    #[test]
    fn test_trend_reversion_ranges() {
        let params = TrendReversionParams {
            rsi_max: Some(30.0),
            eps_growth_qoq: Some(10.0),
            ..Default::default()
        };
        let query = compile(&trend_reversion(&params).unwrap()).unwrap();
        assert_eq!(query.filter_param().unwrap(), "cap_midover,fa_epsqoq_o10,ta_rsi_to30");
        assert_eq!(query.sort.as_deref(), Some("rsi"));
    }

    #[test]
    fn test_technical_relations() {
        let params = TechnicalParams {
            price_vs_sma50: Some("above".to_string()),
            price_vs_sma200: Some("crossed_below".to_string()),
            ..Default::default()
        };
        assert_eq!(filter_param(&technical_analysis(&params)), "ta_sma200_pcb,ta_sma50_pa");

        let shorthand = TechnicalParams {
            sma_filter: Some("above_sma20".to_string()),
            ..Default::default()
        };
        assert_eq!(filter_param(&technical_analysis(&shorthand)), "ta_sma20_pa");

        let bad = TechnicalParams {
            price_vs_sma20: Some("sideways".to_string()),
            ..Default::default()
        };
        assert!(compile(&technical_analysis(&bad)).is_err());
    }

    #[test]
    fn test_upcoming_earnings_request() {
        let request = upcoming_earnings(&UpcomingEarningsParams::default()).unwrap();
        let param = filter_param(&request);
        assert!(param.starts_with("cap_smallover,earningsdate_nextweek,"));
        assert!(param.contains("sh_avgvol_o500"));
        assert!(param.contains("sec_technology|industrials|healthcare"));

        let bad = UpcomingEarningsParams {
            earnings_period: "next_decade".to_string(),
            ..Default::default()
        };
        assert!(upcoming_earnings(&bad).is_err());
    }

    #[tokio::test]
    async fn test_upcoming_earnings_records() {
        let body = "Ticker,Company,Price,Target Price,Earnings Date\n\
            LATE,Late Co,50.00,60.00,07/30/2025 04:30:00 PM\n\
            EARLY,Early Co,20.00,-,07/28/2025 08:00:00 AM\n";
        let transport = Arc::new(ScriptedTransport::new().with_response(200, body));
        let client = create_test_client(transport);

        let records = client
            .upcoming_earnings_screener(&UpcomingEarningsParams::default())
            .await
            .unwrap();
        assert_eq!(records[0].ticker, "EARLY");
        assert_eq!(records[0].timing, Some(finviz_core::EarningsTiming::BeforeOpen));
        assert_eq!(records[0].target_price_upside, None);
        assert_eq!(records[1].timing, Some(finviz_core::EarningsTiming::AfterClose));
        assert!((records[1].target_price_upside.unwrap() - 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_upcoming_earnings_truncates_after_sorting() {
        let body = "Ticker,Company,Price,Earnings Date\n\
            AAA,First Alphabetically,30.00,07/30/2025 04:30:00 PM\n\
            ZZZ,Reports First,40.00,07/28/2025 08:00:00 AM\n";
        let transport = Arc::new(ScriptedTransport::new().with_response(200, body));
        let client = create_test_client(transport.clone());

        let params = UpcomingEarningsParams {
            max_results: 1,
            ..Default::default()
        };
        let records = client.upcoming_earnings_screener(&params).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ticker, "ZZZ");
        assert_eq!(transport.requests()[0].param("ar"), None);
    }

    #[tokio::test]
    async fn test_etf_client_side_filters() {
        let body = "Ticker,Company,Assets Under Management,Net Expense Ratio\n\
            SPY,SPDR S&P 500,550000,0.09%\n\
            TINY,Tiny Fund,10,0.75%\n\
            QQQ,Invesco QQQ,300000,0.20%\n";
        let transport = Arc::new(ScriptedTransport::new().with_response(200, body));
        let client = create_test_client(transport.clone());

        let params = EtfParams {
            min_aum: Some(1_000_000_000.0),
            sort_by: "expense_ratio".to_string(),
            sort_order: "asc".to_string(),
            ..Default::default()
        };
        let records = client.etf_screener(&params).await.unwrap();
        let tickers: Vec<&str> = records.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["SPY", "QQQ"]);
        assert_eq!(transport.requests()[0].param("f"), Some("ind_exchangetradedfund"));
    }
}
