use crate::catalog;
use crate::client::{FinvizClient, GROUPS_PATH};
use crate::parser::{self, is_absent, ParseOutcome};
use chrono::Utc;
use finviz_core::{FinvizError, GroupKind, MarketOverview, SectorPerformance};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// Index proxies fetched for the market overview.
pub const INDEX_PROXIES: &[&str] = &["SPY", "QQQ", "DIA", "IWM"];

/// Performance window of the groups page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1d")]
    Day,
    #[serde(rename = "1w")]
    Week,
    #[serde(rename = "1m")]
    Month,
    #[serde(rename = "3m")]
    Quarter,
    #[serde(rename = "6m")]
    HalfYear,
    #[serde(rename = "1y")]
    Year,
}

impl Timeframe {
    pub fn parse(value: &str) -> Result<Self, FinvizError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1d" | "day" => Ok(Self::Day),
            "1w" | "week" => Ok(Self::Week),
            "1m" | "month" => Ok(Self::Month),
            "3m" | "quarter" => Ok(Self::Quarter),
            "6m" | "half" => Ok(Self::HalfYear),
            "1y" | "year" => Ok(Self::Year),
            other => Err(FinvizError::validation(
                "timeframe",
                format!("unknown timeframe '{}'; accepted values: 1d, 1w, 1m, 3m, 6m, 1y", other),
            )),
        }
    }

    /// View code of the groups page for this window.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Day => "110",
            Self::Week => "120",
            Self::Month => "130",
            Self::Quarter => "160",
            Self::HalfYear => "170",
            Self::Year => "180",
        }
    }
}

fn selector(css: &str) -> Result<Selector, FinvizError> {
    Selector::parse(css).map_err(|e| FinvizError::Parse(format!("invalid selector '{}': {:?}", css, e)))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<Vec<_>>().join("").trim().to_string()
}

/// Parse the groups performance table out of the page HTML.
pub fn parse_groups_html(body: &str, group: GroupKind) -> Result<ParseOutcome<SectorPerformance>, FinvizError> {
    let document = Html::parse_document(body);
    let table_selector = selector("table")?;
    let groups_selector = selector("table.groups-table")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("th, td")?;

    let first_cell_is_name = |table: &ElementRef<'_>| {
        table
            .select(&row_selector)
            .next()
            .and_then(|row| row.select(&cell_selector).next())
            .map(|cell| cell_text(cell).starts_with("Name"))
            .unwrap_or(false)
    };

    let table = document
        .select(&groups_selector)
        .next()
        .or_else(|| document.select(&table_selector).find(|t| first_cell_is_name(t)))
        .ok_or_else(|| FinvizError::Parse("groups page has no performance table".to_string()))?;

    let mut outcome = ParseOutcome::empty();
    for (n, row) in table.select(&row_selector).enumerate() {
        let cells: Vec<String> = row.select(&cell_selector).map(cell_text).collect();
        if cells.is_empty() || cells[0].starts_with("Name") || cells[0].is_empty() {
            continue;
        }
        outcome.rows_read += 1;
        if cells.len() < 8 {
            outcome
                .warnings
                .push(format!("row {}: expected 8 cells, found {}", n, cells.len()));
            continue;
        }

        let perf = |i: usize| -> Option<f64> {
            let raw = &cells[i];
            if is_absent(raw) {
                None
            } else {
                parser::number(raw).ok()
            }
        };
        let stock_count = if is_absent(&cells[7]) {
            None
        } else {
            parser::count(&cells[7]).ok().and_then(|c| u32::try_from(c).ok())
        };

        outcome.records.push(SectorPerformance {
            name: cells[0].clone(),
            group,
            performance_1d: perf(1),
            performance_1w: perf(2),
            performance_1m: perf(3),
            performance_3m: perf(4),
            performance_6m: perf(5),
            performance_1y: perf(6),
            stock_count,
        });
    }

    outcome.log_warnings("groups page");
    Ok(outcome)
}

/// Keep groups whose name matches one of `names`, ignoring case and punctuation.
/// An empty list keeps everything.
pub fn filter_groups(groups: Vec<SectorPerformance>, names: &[String]) -> Vec<SectorPerformance> {
    if names.is_empty() {
        return groups;
    }
    let wanted: Vec<String> = names.iter().map(|n| catalog::normalize(n)).collect();
    groups
        .into_iter()
        .filter(|g| wanted.contains(&catalog::normalize(&g.name)))
        .collect()
}

impl FinvizClient {
    pub async fn get_group_performance(
        &self,
        group: GroupKind,
        timeframe: Timeframe,
        names: &[String],
    ) -> Result<Vec<SectorPerformance>, FinvizError> {
        let params = vec![
            ("g".to_string(), group.as_param().to_string()),
            ("v".to_string(), timeframe.code().to_string()),
        ];
        let body = self.get_body(GROUPS_PATH, params).await?;
        let groups = filter_groups(parse_groups_html(&body, group)?.records, names);
        tracing::info!("Retrieved performance for {} {} groups", groups.len(), group.as_param());
        Ok(groups)
    }

    pub async fn get_sector_performance(
        &self,
        timeframe: Timeframe,
        sectors: &[String],
    ) -> Result<Vec<SectorPerformance>, FinvizError> {
        self.get_group_performance(GroupKind::Sector, timeframe, sectors).await
    }

    pub async fn get_industry_performance(
        &self,
        timeframe: Timeframe,
        industries: &[String],
    ) -> Result<Vec<SectorPerformance>, FinvizError> {
        self.get_group_performance(GroupKind::Industry, timeframe, industries).await
    }

    pub async fn get_country_performance(
        &self,
        timeframe: Timeframe,
        countries: &[String],
    ) -> Result<Vec<SectorPerformance>, FinvizError> {
        self.get_group_performance(GroupKind::Country, timeframe, countries).await
    }

    /// Daily sector performance plus fundamentals for the index proxies.
    pub async fn get_market_overview(&self) -> Result<MarketOverview, FinvizError> {
        let sectors = self.get_sector_performance(Timeframe::Day, &[]).await?;
        let tickers: Vec<String> = INDEX_PROXIES.iter().map(|t| t.to_string()).collect();
        let indices = self.get_multiple_stocks_fundamentals(&tickers).await?;
        Ok(MarketOverview {
            generated_at: Utc::now(),
            sectors,
            indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::create_test_client;
    use crate::mock::ScriptedTransport;
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

    const PLAIN_TABLE_PAGE: &str = r#"<html><body>
        <table><tr><td>Menu</td></tr></table>
        <table>
          <tr><td>Name</td><td>1D</td><td>1W</td><td>1M</td><td>3M</td><td>6M</td><td>1Y</td><td>Count</td></tr>
          <tr><td>USA</td><td>0.40%</td><td>1.00%</td><td>2.00%</td><td>3.00%</td><td>4.00%</td><td>5.00%</td><td>4,512</td></tr>
        </table></body></html>"#;

    #[test]
    fn test_timeframe_codes() {
        assert_eq!(Timeframe::parse("1d").unwrap().code(), "110");
        assert_eq!(Timeframe::parse("1W").unwrap().code(), "120");
        assert_eq!(Timeframe::parse("3m").unwrap().code(), "160");
        assert_eq!(Timeframe::parse("year").unwrap().code(), "180");
        assert!(Timeframe::parse("2y").is_err());
        assert_eq!(Timeframe::default(), Timeframe::Day);
    }

    #[test]
    fn test_parse_groups_table() {
        let outcome = parse_groups_html(GROUPS_PAGE, GroupKind::Sector).unwrap();
        assert_eq!(outcome.records.len(), 2);

        let tech = &outcome.records[0];
        assert_eq!(tech.name, "Technology");
        assert_eq!(tech.performance_1d, Some(1.25));
        assert_eq!(tech.performance_1w, Some(-0.5));
        assert_eq!(tech.stock_count, Some(812));

        let energy = &outcome.records[1];
        assert_eq!(energy.performance_1m, None);
        assert_eq!(energy.performance_6m, Some(-4.2));
    }

    #[test]
    fn test_parse_falls_back_to_name_header() {
        let outcome = parse_groups_html(PLAIN_TABLE_PAGE, GroupKind::Country).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].name, "USA");
        assert_eq!(outcome.records[0].group, GroupKind::Country);
        assert_eq!(outcome.records[0].stock_count, Some(4512));
    }

    #[test]
    fn test_missing_table_is_parse_error() {
        let err = parse_groups_html("<html><body><p>maintenance</p></body></html>", GroupKind::Sector).unwrap_err();
        assert!(matches!(err, FinvizError::Parse(_)));
    }

    #[test]
    fn test_filter_groups_by_name() {
        let groups = parse_groups_html(GROUPS_PAGE, GroupKind::Sector).unwrap().records;
        let kept = filter_groups(groups.clone(), &["energy".to_string()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Energy");
        assert_eq!(filter_groups(groups, &[]).len(), 2);
    }

    #[tokio::test]
    async fn test_sector_performance_request() {
        let transport = Arc::new(ScriptedTransport::new().with_response(200, GROUPS_PAGE));
        let client = create_test_client(transport.clone());

        let sectors = client
            .get_sector_performance(Timeframe::Month, &["Technology".to_string()])
            .await
            .unwrap();
        assert_eq!(sectors.len(), 1);

        let request = &transport.requests()[0];
        assert!(request.url.ends_with("/groups.ashx"));
        assert_eq!(request.param("g"), Some("sector"));
        assert_eq!(request.param("v"), Some("130"));
    }

    #[tokio::test]
    async fn test_market_overview_combines_sectors_and_indices() {
        let indices = "Ticker,Company,Price,Change\nSPY,SPDR S&P 500,512.30,0.45%\nQQQ,Invesco QQQ,440.10,0.80%\n\
                       DIA,SPDR Dow Jones,389.00,-0.10%\nIWM,iShares Russell 2000,201.55,1.20%\n";
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_response(200, GROUPS_PAGE)
                .with_response(200, indices),
        );
        let client = create_test_client(transport.clone());

        let overview = client.get_market_overview().await.unwrap();
        assert_eq!(overview.sectors.len(), 2);
        let tickers: Vec<&str> = overview.indices.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["SPY", "QQQ", "DIA", "IWM"]);
        assert_eq!(transport.requests()[1].param("t"), Some("SPY,QQQ,DIA,IWM"));
    }
}
