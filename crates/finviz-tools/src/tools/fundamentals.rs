use crate::format;
use crate::tool::{parse_args, Tool, ToolOutput};
use crate::validate;
use async_trait::async_trait;
use finviz_client::parser::FIELD_ALIASES;
use finviz_client::FinvizClient;
use finviz_core::FinvizError;
use serde::Deserialize;
use serde_json::{json, Value};

fn data_fields_schema() -> Value {
    let aliases: Vec<&str> = FIELD_ALIASES.iter().map(|(alias, _)| *alias).collect();
    json!({
        "type": "array",
        "items": {"type": "string"},
        "description": format!(
            "Record fields to return, e.g. pe_ratio, market_cap, dividend_yield. Aliases: {}",
            aliases.join(", ")
        )
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FundamentalsArgs {
    ticker: String,
    data_fields: Vec<String>,
}

pub struct StockFundamentalsTool {
    client: FinvizClient,
}

impl StockFundamentalsTool {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for StockFundamentalsTool {
    fn name(&self) -> &'static str {
        "get_stock_fundamentals"
    }

    fn description(&self) -> &'static str {
        "Fundamental data for one stock, optionally restricted to selected fields"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {"type": "string", "description": "Stock ticker, e.g. AAPL"},
                "data_fields": data_fields_schema()
            },
            "required": ["ticker"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let args: FundamentalsArgs = parse_args(args)?;
        let ticker = validate::ticker(&args.ticker)?;

        if args.data_fields.is_empty() {
            let record = self.client.get_stock_fundamentals(&ticker).await?;
            ToolOutput::with_records(format::fundamentals(&record), &record)
        } else {
            let value = self
                .client
                .get_stock_fundamentals_fields(&ticker, &args.data_fields)
                .await?;
            Ok(ToolOutput::success(format::projection(&value), value))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MultipleFundamentalsArgs {
    tickers: Vec<String>,
    data_fields: Vec<String>,
}

pub struct MultipleFundamentalsTool {
    client: FinvizClient,
}

impl MultipleFundamentalsTool {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for MultipleFundamentalsTool {
    fn name(&self) -> &'static str {
        "get_multiple_stocks_fundamentals"
    }

    fn description(&self) -> &'static str {
        "Fundamental data for several stocks in one request, in the order given"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tickers": {"type": "array", "items": {"type": "string"}, "minItems": 1},
                "data_fields": data_fields_schema()
            },
            "required": ["tickers"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let args: MultipleFundamentalsArgs = parse_args(args)?;
        let tickers = validate::tickers(&args.tickers)?;

        if args.data_fields.is_empty() {
            let records = self.client.get_multiple_stocks_fundamentals(&tickers).await?;
            let text = records
                .iter()
                .map(format::fundamentals)
                .collect::<Vec<_>>()
                .join("\n");
            ToolOutput::with_records(text, &records)
        } else {
            let values = self
                .client
                .get_multiple_stocks_fundamentals_fields(&tickers, &args.data_fields)
                .await?;
            let text = values.iter().map(format::projection).collect::<Vec<_>>().join("\n");
            Ok(ToolOutput::success(text, Value::Array(values)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests::create_test_client;
    use finviz_client::mock::ScriptedTransport;
    use std::sync::Arc;

    const AAPL_ROW: &str = "Ticker,Company,Sector,P/E,ROI,Price\nAAPL,Apple Inc.,Technology,29.50,45.20,189.84\n";

    #[tokio::test]
    async fn test_data_fields_project_the_record() {
        let transport = Arc::new(ScriptedTransport::new().with_response(200, AAPL_ROW));
        let tool = StockFundamentalsTool::new(create_test_client(transport));

        let output = tool
            .execute(json!({"ticker": "aapl", "data_fields": ["pe_ratio", "roi"]}))
            .await
            .unwrap();
        let data = output.data.as_object().unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data["ticker"], "AAPL");
        assert_eq!(data["pe_ratio"], 29.5);
        assert_eq!(data["roi"], 45.2);
        assert!(output.text.starts_with("AAPL\n"));
    }

    #[tokio::test]
    async fn test_unknown_data_field_fails_before_network() {
        let transport = Arc::new(ScriptedTransport::new().with_response(200, AAPL_ROW));
        let tool = StockFundamentalsTool::new(create_test_client(transport.clone()));

        let err = tool
            .execute(json!({"ticker": "AAPL", "data_fields": ["shoe_size"]}))
            .await
            .unwrap_err();
        assert!(matches!(err, FinvizError::Validation { .. }));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_multiple_tickers_with_fields() {
        let body = "Ticker,P/E\nMSFT,35.0\nAAPL,29.5\n";
        let transport = Arc::new(ScriptedTransport::new().with_response(200, body));
        let tool = MultipleFundamentalsTool::new(create_test_client(transport.clone()));

        let output = tool
            .execute(json!({"tickers": ["AAPL", "MSFT"], "data_fields": ["pe_ratio"]}))
            .await
            .unwrap();
        let rows = output.data.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["ticker"], "AAPL");
        assert_eq!(rows[1]["pe_ratio"], 35.0);
        assert_eq!(transport.request_count(), 1);
    }
}
