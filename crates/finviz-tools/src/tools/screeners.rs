use crate::format;
use crate::tool::{parse_args, Tool, ToolOutput};
use crate::validate;
use async_trait::async_trait;
use finviz_client::catalog::{self, EARNINGS_DATES, MARKET_CAPS, SECTORS};
use finviz_client::{
    DividendGrowthParams, EarningsParams, EtfParams, FinvizClient, PositiveSurpriseParams, RelativeVolumeParams,
    TechnicalParams, TrendReversionParams, UpcomingEarningsParams,
};
use finviz_core::{FinvizError, StockRecord};
use serde_json::{json, Value};

fn names(pairs: &'static [(&'static str, &'static str)]) -> Vec<&'static str> {
    pairs.iter().map(|(name, _)| *name).collect()
}

fn market_cap_schema() -> Value {
    json!({"type": "string", "enum": names(MARKET_CAPS), "description": "Market cap bucket"})
}

fn sectors_schema() -> Value {
    json!({"type": "array", "items": {"type": "string", "enum": names(SECTORS)}, "description": "Sectors to include"})
}

fn max_results_schema(default: u32) -> Value {
    json!({"type": "integer", "minimum": 1, "maximum": 1000, "default": default})
}

fn sort_order_schema(default: &str) -> Value {
    json!({"type": "string", "enum": ["asc", "desc"], "default": default})
}

fn no_args_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

fn sort_keys() -> Vec<&'static str> {
    catalog::SORT_KEYS.iter().map(|(k, _)| *k).collect()
}

fn output(title: &str, records: Vec<StockRecord>) -> Result<ToolOutput, FinvizError> {
    ToolOutput::with_records(format::stock_list(title, &records), &records)
}

pub struct EarningsScreener {
    client: FinvizClient,
}

impl EarningsScreener {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for EarningsScreener {
    fn name(&self) -> &'static str {
        "earnings_screener"
    }

    fn description(&self) -> &'static str {
        "Screen stocks by upcoming or recent earnings date"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "earnings_date": {"type": "string", "enum": names(EARNINGS_DATES), "default": "this_week"},
                "market_cap": market_cap_schema(),
                "min_price": {"type": "number", "minimum": 0},
                "max_price": {"type": "number", "minimum": 0},
                "min_volume": {"type": "number", "minimum": 0},
                "sectors": sectors_schema(),
                "max_results": max_results_schema(100)
            },
            "required": ["earnings_date"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let params: EarningsParams = parse_args(args)?;
        validate::price_range(params.min_price, params.max_price)?;
        validate::max_results(params.max_results)?;
        let records = self.client.earnings_screener(&params).await?;
        output(&format!("earnings {}", params.earnings_date), records)
    }
}

pub struct VolumeSurgeScreener {
    client: FinvizClient,
}

impl VolumeSurgeScreener {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for VolumeSurgeScreener {
    fn name(&self) -> &'static str {
        "volume_surge_screener"
    }

    fn description(&self) -> &'static str {
        "Small caps and up trading on 1.5x relative volume, up 2% or more, above the 200-day SMA"
    }

    fn input_schema(&self) -> Value {
        no_args_schema()
    }

    async fn execute(&self, _args: Value) -> Result<ToolOutput, FinvizError> {
        output("volume surge", self.client.volume_surge_screener().await?)
    }
}

pub struct TrendReversionScreener {
    client: FinvizClient,
}

impl TrendReversionScreener {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for TrendReversionScreener {
    fn name(&self) -> &'static str {
        "trend_reversion_screener"
    }

    fn description(&self) -> &'static str {
        "Oversold stocks with growing earnings and revenue, candidates for a trend reversal"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "market_cap": market_cap_schema(),
                "eps_growth_qoq": {"type": "number", "description": "Minimum EPS growth QoQ, percent"},
                "revenue_growth_qoq": {"type": "number", "description": "Minimum sales growth QoQ, percent"},
                "rsi_max": {"type": "number", "minimum": 0, "maximum": 100},
                "sectors": sectors_schema(),
                "exclude_sectors": sectors_schema(),
                "sort_by": {"type": "string", "enum": sort_keys(), "default": "rsi"},
                "sort_order": sort_order_schema("asc"),
                "max_results": max_results_schema(50)
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let params: TrendReversionParams = parse_args(args)?;
        validate::rsi("rsi_max", params.rsi_max)?;
        validate::sort_order(&params.sort_order)?;
        validate::max_results(params.max_results)?;
        output("trend reversion", self.client.trend_reversion_screener(&params).await?)
    }
}

pub struct UptrendScreener {
    client: FinvizClient,
}

impl UptrendScreener {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for UptrendScreener {
    fn name(&self) -> &'static str {
        "uptrend_screener"
    }

    fn description(&self) -> &'static str {
        "Stocks in a confirmed uptrend: above the 20, 50 and 200-day SMAs and up over the month"
    }

    fn input_schema(&self) -> Value {
        no_args_schema()
    }

    async fn execute(&self, _args: Value) -> Result<ToolOutput, FinvizError> {
        output("uptrend", self.client.uptrend_screener().await?)
    }
}

pub struct DividendGrowthScreener {
    client: FinvizClient,
}

impl DividendGrowthScreener {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for DividendGrowthScreener {
    fn name(&self) -> &'static str {
        "dividend_growth_screener"
    }

    fn description(&self) -> &'static str {
        "Dividend payers with positive earnings and sales growth at reasonable valuations"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "market_cap": market_cap_schema(),
                "min_dividend_yield": {"type": "number", "minimum": 0, "default": 2},
                "max_dividend_yield": {"type": "number", "minimum": 0},
                "max_pb_ratio": {"type": "number", "minimum": 0, "default": 5},
                "max_pe_ratio": {"type": "number", "minimum": 0, "default": 30},
                "min_payout_ratio": {"type": "number", "minimum": 0},
                "max_payout_ratio": {"type": "number", "minimum": 0},
                "min_roe": {"type": "number"},
                "max_debt_equity": {"type": "number", "minimum": 0},
                "country": {"type": "string", "default": "USA"},
                "sort_by": {"type": "string", "enum": sort_keys(), "default": "sma200"},
                "sort_order": sort_order_schema("asc"),
                "max_results": max_results_schema(100)
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let params: DividendGrowthParams = parse_args(args)?;
        validate::max_results(params.max_results)?;
        output("dividend growth", self.client.dividend_growth_screener(&params).await?)
    }
}

pub struct EtfScreener {
    client: FinvizClient,
}

impl EtfScreener {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for EtfScreener {
    fn name(&self) -> &'static str {
        "etf_screener"
    }

    fn description(&self) -> &'static str {
        "Exchange traded funds filtered by assets under management and expense ratio"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "min_aum": {"type": "number", "minimum": 0, "description": "Minimum AUM in dollars"},
                "max_expense_ratio": {"type": "number", "minimum": 0, "description": "Maximum net expense ratio, percent"},
                "sort_by": {"type": "string", "enum": ["aum", "expense_ratio"], "default": "aum"},
                "sort_order": sort_order_schema("desc"),
                "max_results": max_results_schema(50)
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let params: EtfParams = parse_args(args)?;
        validate::sort_order(&params.sort_order)?;
        validate::max_results(params.max_results)?;
        let records = self.client.etf_screener(&params).await?;
        let mut text = format::stock_list("ETFs", &records);
        for r in &records {
            text.push_str(&format!(
                "   {} AUM {} | Expense {}\n",
                r.ticker,
                format::opt_large_number(r.assets_under_management),
                format::ratio(r.net_expense_ratio)
            ));
        }
        ToolOutput::with_records(text, &records)
    }
}

pub struct EarningsPremarketScreener {
    client: FinvizClient,
}

impl EarningsPremarketScreener {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for EarningsPremarketScreener {
    fn name(&self) -> &'static str {
        "earnings_premarket_screener"
    }

    fn description(&self) -> &'static str {
        "Stocks reporting before today's open that are up 2% or more"
    }

    fn input_schema(&self) -> Value {
        no_args_schema()
    }

    async fn execute(&self, _args: Value) -> Result<ToolOutput, FinvizError> {
        output("pre-market earnings", self.client.earnings_premarket_screener().await?)
    }
}

pub struct EarningsAfterhoursScreener {
    client: FinvizClient,
}

impl EarningsAfterhoursScreener {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for EarningsAfterhoursScreener {
    fn name(&self) -> &'static str {
        "earnings_afterhours_screener"
    }

    fn description(&self) -> &'static str {
        "Stocks reporting after today's close that are up 2% or more after hours"
    }

    fn input_schema(&self) -> Value {
        no_args_schema()
    }

    async fn execute(&self, _args: Value) -> Result<ToolOutput, FinvizError> {
        output("after-hours earnings", self.client.earnings_afterhours_screener().await?)
    }
}

pub struct EarningsTradingScreener {
    client: FinvizClient,
}

impl EarningsTradingScreener {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for EarningsTradingScreener {
    fn name(&self) -> &'static str {
        "earnings_trading_screener"
    }

    fn description(&self) -> &'static str {
        "Fresh reporters with upward EPS revisions, rising today after a flat or down month"
    }

    fn input_schema(&self) -> Value {
        no_args_schema()
    }

    async fn execute(&self, _args: Value) -> Result<ToolOutput, FinvizError> {
        output("earnings trading", self.client.earnings_trading_screener().await?)
    }
}

pub struct EarningsPositiveSurpriseScreener {
    client: FinvizClient,
}

impl EarningsPositiveSurpriseScreener {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for EarningsPositiveSurpriseScreener {
    fn name(&self) -> &'static str {
        "earnings_positive_surprise_screener"
    }

    fn description(&self) -> &'static str {
        "This week's reporters with positive quarterly EPS growth"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "min_price": {"type": "number", "minimum": 0},
                "min_eps_qoq_growth": {"type": "number", "description": "Minimum EPS growth QoQ, percent"},
                "above_sma200": {"type": "boolean", "default": false},
                "sort_by": {"type": "string", "enum": sort_keys(), "default": "eps_qoq_growth"},
                "max_results": max_results_schema(50)
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let params: PositiveSurpriseParams = parse_args(args)?;
        validate::price_range(params.min_price, None)?;
        validate::max_results(params.max_results)?;
        output(
            "positive earnings surprise",
            self.client.earnings_positive_surprise_screener(&params).await?,
        )
    }
}

pub struct RelativeVolumeTool {
    client: FinvizClient,
}

impl RelativeVolumeTool {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for RelativeVolumeTool {
    fn name(&self) -> &'static str {
        "get_relative_volume_stocks"
    }

    fn description(&self) -> &'static str {
        "Stocks trading at unusual volume relative to their average"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "min_relative_volume": {"type": "number", "minimum": 0, "default": 2},
                "min_price": {"type": "number", "minimum": 0},
                "sectors": sectors_schema(),
                "max_results": max_results_schema(50)
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let params: RelativeVolumeParams = parse_args(args)?;
        validate::price_range(params.min_price, None)?;
        validate::max_results(params.max_results)?;
        output("relative volume", self.client.relative_volume_screener(&params).await?)
    }
}

pub struct TechnicalAnalysisScreener {
    client: FinvizClient,
}

impl TechnicalAnalysisScreener {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for TechnicalAnalysisScreener {
    fn name(&self) -> &'static str {
        "technical_analysis_screener"
    }

    fn description(&self) -> &'static str {
        "Screen on RSI and price position relative to the 20, 50 and 200-day SMAs"
    }

    fn input_schema(&self) -> Value {
        let relation = json!({"type": "string", "enum": ["above", "below", "crossed_above", "crossed_below"]});
        json!({
            "type": "object",
            "properties": {
                "rsi_min": {"type": "number", "minimum": 0, "maximum": 100},
                "rsi_max": {"type": "number", "minimum": 0, "maximum": 100},
                "price_vs_sma20": relation,
                "price_vs_sma50": relation,
                "price_vs_sma200": relation,
                "sma_filter": {
                    "type": "string",
                    "enum": ["above_sma20", "above_sma50", "above_sma200", "below_sma20", "below_sma50", "below_sma200", "none"]
                },
                "min_price": {"type": "number", "minimum": 0},
                "max_price": {"type": "number", "minimum": 0},
                "min_volume": {"type": "number", "minimum": 0},
                "sectors": sectors_schema(),
                "max_results": max_results_schema(50)
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let mut params: TechnicalParams = parse_args(args)?;
        validate::rsi("rsi_min", params.rsi_min)?;
        validate::rsi("rsi_max", params.rsi_max)?;
        validate::price_range(params.min_price, params.max_price)?;
        validate::max_results(params.max_results)?;
        params.sma_filter = match params.sma_filter.take() {
            Some(raw) => validate::sma_filter(&raw)?,
            None => None,
        };
        output("technical analysis", self.client.technical_analysis_screener(&params).await?)
    }
}

pub struct UpcomingEarningsScreener {
    client: FinvizClient,
}

impl UpcomingEarningsScreener {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for UpcomingEarningsScreener {
    fn name(&self) -> &'static str {
        "upcoming_earnings_screener"
    }

    fn description(&self) -> &'static str {
        "Companies reporting soon, with release timing and analyst target upside"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "earnings_period": {"type": "string", "enum": ["next_week", "next_2_weeks", "this_month"], "default": "next_week"},
                "market_cap": market_cap_schema(),
                "min_price": {"type": "number", "minimum": 0, "default": 10},
                "min_avg_volume": {"type": "number", "minimum": 0, "default": 500000},
                "target_sectors": sectors_schema(),
                "sort_by": {
                    "type": "string",
                    "enum": ["earnings_date", "market_cap", "target_price_upside", "price_change", "volume", "ticker"],
                    "default": "earnings_date"
                },
                "sort_order": sort_order_schema("asc"),
                "max_results": max_results_schema(100)
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let params: UpcomingEarningsParams = parse_args(args)?;
        validate::price_range(params.min_price, None)?;
        validate::max_results(params.max_results)?;
        let records = self.client.upcoming_earnings_screener(&params).await?;
        let title = format!("earnings {}", params.earnings_period);
        ToolOutput::with_records(format::earnings_list(&title, &records), &records)
    }
}
