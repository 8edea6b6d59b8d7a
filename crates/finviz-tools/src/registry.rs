use crate::tool::{Tool, ToolOutput};
use crate::tools::{edgar, fields, filings, fundamentals, market, news, screeners};
use edgar_client::EdgarClient;
use finviz_client::FinvizClient;
use finviz_core::{FinvizError, GroupKind};
use serde_json::{json, Value};

/// Every tool exposed by the binary, looked up by name.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new(finviz: FinvizClient, edgar: EdgarClient) -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![
            // screeners
            Box::new(screeners::EarningsScreener::new(finviz.clone())),
            Box::new(screeners::VolumeSurgeScreener::new(finviz.clone())),
            Box::new(screeners::TrendReversionScreener::new(finviz.clone())),
            Box::new(screeners::UptrendScreener::new(finviz.clone())),
            Box::new(screeners::DividendGrowthScreener::new(finviz.clone())),
            Box::new(screeners::EtfScreener::new(finviz.clone())),
            Box::new(screeners::EarningsPremarketScreener::new(finviz.clone())),
            Box::new(screeners::EarningsAfterhoursScreener::new(finviz.clone())),
            Box::new(screeners::EarningsTradingScreener::new(finviz.clone())),
            Box::new(screeners::EarningsPositiveSurpriseScreener::new(finviz.clone())),
            Box::new(screeners::RelativeVolumeTool::new(finviz.clone())),
            Box::new(screeners::TechnicalAnalysisScreener::new(finviz.clone())),
            Box::new(screeners::UpcomingEarningsScreener::new(finviz.clone())),
            // fundamentals
            Box::new(fundamentals::StockFundamentalsTool::new(finviz.clone())),
            Box::new(fundamentals::MultipleFundamentalsTool::new(finviz.clone())),
            Box::new(fields::ListAvailableFieldsTool),
            Box::new(fields::ValidateFieldsTool),
            // news
            Box::new(news::StockNewsTool::new(finviz.clone())),
            Box::new(news::MarketNewsTool::new(finviz.clone())),
            Box::new(news::SectorNewsTool::new(finviz.clone())),
            // groups
            Box::new(market::GroupPerformanceTool::new(finviz.clone(), GroupKind::Sector)),
            Box::new(market::GroupPerformanceTool::new(finviz.clone(), GroupKind::Industry)),
            Box::new(market::GroupPerformanceTool::new(finviz.clone(), GroupKind::Country)),
            Box::new(market::MarketOverviewTool::new(finviz.clone())),
            // filings
            Box::new(filings::SecFilingsTool::new(finviz.clone())),
            Box::new(filings::MajorFilingsTool::new(finviz.clone())),
            Box::new(filings::InsiderFilingsTool::new(finviz.clone())),
            Box::new(filings::FilingSummaryTool::new(finviz)),
            // edgar
            Box::new(edgar::EdgarFilingsTool::new(edgar.clone())),
            Box::new(edgar::EdgarFilingContentTool::new(edgar.clone())),
            Box::new(edgar::EdgarCompanyConceptTool::new(edgar.clone())),
            Box::new(edgar::EdgarCompanyFactsTool::new(edgar)),
        ];
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Tool descriptors in the `{name, description, inputSchema}` shape.
    pub fn list_tools(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name(),
                    "description": t.description(),
                    "inputSchema": t.input_schema(),
                })
            })
            .collect()
    }

    /// Run a tool. Failures come back as an error output rather than an `Err`.
    pub async fn call(&self, name: &str, args: Value) -> ToolOutput {
        let Some(tool) = self.get(name) else {
            let err = FinvizError::validation(
                "tool",
                format!("unknown tool '{}'; available: {}", name, self.names().join(", ")),
            );
            return ToolOutput::error(&err);
        };

        tracing::info!("Executing tool {}", name);
        match tool.execute(args).await {
            Ok(output) => output,
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!("Tool {} failed: {}", name, e);
                } else {
                    tracing::error!("Tool {} failed: {}", name, e);
                }
                ToolOutput::error(&e)
            }
        }
    }
}
