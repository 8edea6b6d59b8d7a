use crate::format;
use crate::tool::{parse_args, Tool, ToolOutput};
use async_trait::async_trait;
use finviz_client::{FinvizClient, Timeframe};
use finviz_core::{FinvizError, GroupKind};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GroupArgs {
    timeframe: String,
    #[serde(alias = "sectors", alias = "industries", alias = "countries")]
    names: Vec<String>,
}

impl Default for GroupArgs {
    fn default() -> Self {
        Self {
            timeframe: "1d".to_string(),
            names: Vec::new(),
        }
    }
}

/// Sector, industry or country performance, one tool per grouping.
pub struct GroupPerformanceTool {
    client: FinvizClient,
    group: GroupKind,
}

impl GroupPerformanceTool {
    pub fn new(client: FinvizClient, group: GroupKind) -> Self {
        Self { client, group }
    }

    fn list_field(&self) -> &'static str {
        match self.group {
            GroupKind::Sector => "sectors",
            GroupKind::Industry => "industries",
            GroupKind::Country => "countries",
        }
    }

    fn title(&self) -> &'static str {
        match self.group {
            GroupKind::Sector => "Sector",
            GroupKind::Industry => "Industry",
            GroupKind::Country => "Country",
        }
    }
}

#[async_trait]
impl Tool for GroupPerformanceTool {
    fn name(&self) -> &'static str {
        match self.group {
            GroupKind::Sector => "get_sector_performance",
            GroupKind::Industry => "get_industry_performance",
            GroupKind::Country => "get_country_performance",
        }
    }

    fn description(&self) -> &'static str {
        match self.group {
            GroupKind::Sector => "Performance of each market sector over 1D to 1Y windows",
            GroupKind::Industry => "Performance of each industry over 1D to 1Y windows",
            GroupKind::Country => "Performance of stocks grouped by country over 1D to 1Y windows",
        }
    }

    fn input_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        properties.insert(
            "timeframe".to_string(),
            json!({"type": "string", "enum": ["1d", "1w", "1m", "3m", "6m", "1y"], "default": "1d"}),
        );
        properties.insert(
            self.list_field().to_string(),
            json!({"type": "array", "items": {"type": "string"}, "description": "Only these groups; empty for all"}),
        );
        json!({"type": "object", "properties": properties})
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let args: GroupArgs = parse_args(args)?;
        let timeframe = Timeframe::parse(&args.timeframe)?;
        let groups = self
            .client
            .get_group_performance(self.group, timeframe, &args.names)
            .await?;
        ToolOutput::with_records(format::groups(self.title(), &groups), &groups)
    }
}

pub struct MarketOverviewTool {
    client: FinvizClient,
}

impl MarketOverviewTool {
    pub fn new(client: FinvizClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for MarketOverviewTool {
    fn name(&self) -> &'static str {
        "get_market_overview"
    }

    fn description(&self) -> &'static str {
        "Index proxies (SPY, QQQ, DIA, IWM) plus today's sector performance"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> Result<ToolOutput, FinvizError> {
        let overview = self.client.get_market_overview().await?;
        ToolOutput::with_records(format::market_overview(&overview), &overview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests::create_test_client;
    use finviz_client::mock::ScriptedTransport;
    use std::sync::Arc;

    const GROUPS_PAGE: &str = r#"<html><body>
        <table class="groups-table">
          <tr><th>Name</th><th>Perf Day</th><th>Perf Week</th><th>Perf Month</th>
              <th>Perf Quart</th><th>Perf Half</th><th>Perf Year</th><th>Stocks</th></tr>
          <tr><td>Technology</td><td>1.25%</td><td>-0.50%</td><td>3.10%</td>
              <td>8.00%</td><td>12.40%</td><td>25.90%</td><td>812</td></tr>
          <tr><td>Energy</td><td>-0.75%</td><td>2.00%</td><td>-</td>
              <td>1.10%</td><td>-4.20%</td><td>5.00%</td><td>254</td></tr>
        </table></body></html>"#;

    #[tokio::test]
    async fn test_market_overview_makes_two_calls() {
        let indices = "Ticker,Price,Change\nSPY,512.30,0.45%\nQQQ,440.10,0.80%\nDIA,389.00,-0.10%\nIWM,201.55,1.20%\n";
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_response(200, GROUPS_PAGE)
                .with_response(200, indices),
        );
        let tool = MarketOverviewTool::new(create_test_client(transport.clone()));

        let output = tool.execute(Value::Null).await.unwrap();
        assert_eq!(transport.request_count(), 2);
        assert_eq!(output.data["sectors"].as_array().unwrap().len(), 2);
        assert_eq!(output.data["indices"][0]["ticker"], "SPY");
        assert_eq!(output.data["indices"][3]["ticker"], "IWM");
        assert!(output.text.contains("  SPY: $512.30 (+0.45%)"));
        assert!(output.text.contains("Technology: 1D +1.25%"));
    }

    #[tokio::test]
    async fn test_group_tool_filters_by_name() {
        let transport = Arc::new(ScriptedTransport::new().with_response(200, GROUPS_PAGE));
        let tool = GroupPerformanceTool::new(create_test_client(transport), GroupKind::Sector);

        let output = tool
            .execute(json!({"timeframe": "1w", "sectors": ["energy"]}))
            .await
            .unwrap();
        let groups = output.data.as_array().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["name"], "Energy");
    }

    #[tokio::test]
    async fn test_group_tool_rejects_unknown_timeframe() {
        let transport = Arc::new(ScriptedTransport::new());
        let tool = GroupPerformanceTool::new(create_test_client(transport.clone()), GroupKind::Industry);

        assert!(tool.execute(json!({"timeframe": "5y"})).await.is_err());
        assert_eq!(transport.request_count(), 0);
    }
}
