use crate::format;
use crate::tool::{parse_args, Tool, ToolOutput};
use crate::validate;
use async_trait::async_trait;
use finviz_client::catalog::SECTORS;
use finviz_client::FinvizClient;
use finviz_core::{FinvizError, NewsCategory};
use serde::Deserialize;
use serde_json::{json, Value};

fn news_types() -> Vec<&'static str> {
    std::iter::once("all")
        .chain(NewsCategory::ALL.iter().map(|c| c.as_str()))
        .collect()
}

fn parse_news_type(value: &str) -> Result<Option<NewsCategory>, FinvizError> {
    let lower = value.trim().to_ascii_lowercase();
    if lower == "all" || lower.is_empty() {
        return Ok(None);
    }
    NewsCategory::parse(&lower).map(Some).ok_or_else(|| {
        FinvizError::validation(
            "news_type",
            format!("unknown value '{}'; accepted values: {}", value, news_types().join(", ")),
        )
    })
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct StockNewsArgs {
    ticker: String,
    days_back: u32,
    news_type: String,
}

impl Default for StockNewsArgs {
    fn default() -> Self {
        Self {
            ticker: String::new(),
            days_back: 7,
            news_type: "all".to_string(),
        }
    }
}

pub struct StockNewsTool {
    client: FinvizClient,
}

impl StockNewsTool {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for StockNewsTool {
    fn name(&self) -> &'static str {
        "get_stock_news"
    }

    fn description(&self) -> &'static str {
        "Recent headlines for one stock, optionally limited to one news category"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {"type": "string"},
                "days_back": {"type": "integer", "minimum": 1, "maximum": 365, "default": 7},
                "news_type": {"type": "string", "enum": news_types(), "default": "all"}
            },
            "required": ["ticker"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let args: StockNewsArgs = parse_args(args)?;
        let ticker = validate::ticker(&args.ticker)?;
        let days_back = validate::days_back(args.days_back)?;
        let category = parse_news_type(&args.news_type)?;

        let items = self.client.get_stock_news(&ticker, days_back, category).await?;
        ToolOutput::with_records(format::news(&ticker, &items), &items)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MarketNewsArgs {
    days_back: u32,
    max_items: usize,
}

impl Default for MarketNewsArgs {
    fn default() -> Self {
        Self {
            days_back: 3,
            max_items: 50,
        }
    }
}

pub struct MarketNewsTool {
    client: FinvizClient,
}

impl MarketNewsTool {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for MarketNewsTool {
    fn name(&self) -> &'static str {
        "get_market_news"
    }

    fn description(&self) -> &'static str {
        "Market-wide headlines"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "days_back": {"type": "integer", "minimum": 1, "maximum": 365, "default": 3},
                "max_items": {"type": "integer", "minimum": 1, "default": 50}
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let args: MarketNewsArgs = parse_args(args)?;
        let days_back = validate::days_back(args.days_back)?;
        if args.max_items == 0 {
            return Err(FinvizError::validation("max_items", "must be at least 1"));
        }

        let items = self.client.get_market_news(days_back, args.max_items).await?;
        ToolOutput::with_records(format::news("the market", &items), &items)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SectorNewsArgs {
    sector: String,
    days_back: u32,
    max_items: usize,
}

impl Default for SectorNewsArgs {
    fn default() -> Self {
        Self {
            sector: String::new(),
            days_back: 5,
            max_items: 30,
        }
    }
}

pub struct SectorNewsTool {
    client: FinvizClient,
}

impl SectorNewsTool {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SectorNewsTool {
    fn name(&self) -> &'static str {
        "get_sector_news"
    }

    fn description(&self) -> &'static str {
        "Headlines for one sector"
    }

    fn input_schema(&self) -> Value {
        let sectors: Vec<&str> = SECTORS.iter().map(|(name, _)| *name).collect();
        json!({
            "type": "object",
            "properties": {
                "sector": {"type": "string", "enum": sectors},
                "days_back": {"type": "integer", "minimum": 1, "maximum": 365, "default": 5},
                "max_items": {"type": "integer", "minimum": 1, "default": 30}
            },
            "required": ["sector"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let args: SectorNewsArgs = parse_args(args)?;
        let sector = validate::required("sector", &args.sector)?;
        let days_back = validate::days_back(args.days_back)?;
        if args.max_items == 0 {
            return Err(FinvizError::validation("max_items", "must be at least 1"));
        }

        let items = self.client.get_sector_news(sector, days_back, args.max_items).await?;
        ToolOutput::with_records(format::news(sector, &items), &items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_news_type() {
        assert_eq!(parse_news_type("all").unwrap(), None);
        assert_eq!(parse_news_type("Earnings").unwrap(), Some(NewsCategory::Earnings));
        assert_eq!(parse_news_type("corporate_action").unwrap(), Some(NewsCategory::CorporateAction));
        assert!(parse_news_type("gossip").is_err());
    }
}
