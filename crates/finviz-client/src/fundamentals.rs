use crate::client::FinvizClient;
use crate::filter::{CompiledQuery, FUNDAMENTALS_VIEW};
use crate::parser;
use finviz_core::{FinvizError, StockRecord};
use serde_json::Value;
use std::time::Duration;

/// Every column of the custom view, in export order.
pub const FUNDAMENTALS_COLUMNS: &str = "0,1,2,79,3,4,5,129,6,7,8,9,10,11,12,13,73,74,75,14,130,131,147,148,149,\
15,16,77,17,18,142,19,20,143,21,23,22,132,133,82,78,127,128,144,145,146,24,25,85,26,27,28,29,30,31,84,32,33,34,\
35,36,37,38,39,40,41,90,91,92,93,94,95,96,97,98,99,42,43,44,45,47,46,138,139,140,48,49,50,51,52,53,54,55,56,57,\
58,134,125,126,59,68,70,80,83,76,60,61,62,63,64,67,89,69,81,86,87,88,65,66,71,72,141,135,136,137,103,100,101,104,\
102,106,107,108,109,110,111,112,113,114,115,116,117,118,119,120,121,122,123,124,105";

/// Pause between per-ticker requests when the batch request is unusable.
pub const FALLBACK_DELAY: Duration = Duration::from_millis(200);

fn normalize_ticker(ticker: &str) -> Result<String, FinvizError> {
    let ticker = ticker.trim().to_ascii_uppercase();
    if ticker.is_empty() {
        return Err(FinvizError::validation("ticker", "must not be empty"));
    }
    Ok(ticker)
}

fn fundamentals_query(tickers: &str) -> CompiledQuery {
    let mut query = CompiledQuery::for_view(FUNDAMENTALS_VIEW);
    query.tickers = Some(tickers.to_string());
    query.columns = Some(FUNDAMENTALS_COLUMNS.to_string());
    query
}

/// Reorder `records` to follow `tickers`, dropping anything not requested.
fn in_requested_order(tickers: &[String], mut records: Vec<StockRecord>) -> Vec<StockRecord> {
    let mut ordered = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        if let Some(pos) = records.iter().position(|r| &r.ticker == ticker) {
            ordered.push(records.swap_remove(pos));
        }
    }
    ordered
}

impl FinvizClient {
    pub async fn get_stock_fundamentals(&self, ticker: &str) -> Result<StockRecord, FinvizError> {
        let ticker = normalize_ticker(ticker)?;
        let outcome = self.fetch_query(&fundamentals_query(&ticker)).await?;
        let record = outcome
            .records
            .into_iter()
            .find(|r| r.ticker == ticker)
            .ok_or_else(|| FinvizError::NotFound(format!("no fundamentals for ticker {}", ticker)))?;
        tracing::info!("Retrieved fundamentals for {}", ticker);
        Ok(record)
    }

    /// Fundamentals projected onto `fields`; an empty list returns the full record.
    pub async fn get_stock_fundamentals_fields(&self, ticker: &str, fields: &[String]) -> Result<Value, FinvizError> {
        check_fields(fields)?;
        let record = self.get_stock_fundamentals(ticker).await?;
        project(&record, fields)
    }

    /// One batched request; per-ticker requests if the batch fails or comes back empty.
    pub async fn get_multiple_stocks_fundamentals(&self, tickers: &[String]) -> Result<Vec<StockRecord>, FinvizError> {
        if tickers.is_empty() {
            return Err(FinvizError::validation("tickers", "at least one ticker is required"));
        }
        let tickers = tickers
            .iter()
            .map(|t| normalize_ticker(t))
            .collect::<Result<Vec<_>, _>>()?;

        match self.fetch_query(&fundamentals_query(&tickers.join(","))).await {
            Ok(outcome) if !outcome.records.is_empty() => {
                let records = in_requested_order(&tickers, outcome.records);
                tracing::info!("Retrieved fundamentals for {}/{} tickers in one request", records.len(), tickers.len());
                return Ok(records);
            }
            Ok(_) => tracing::warn!("Batch fundamentals request returned no rows, fetching tickers one by one"),
            Err(FinvizError::Authentication(msg)) => return Err(FinvizError::Authentication(msg)),
            Err(e) => tracing::warn!("Batch fundamentals request failed ({}), fetching tickers one by one", e),
        }

        let mut records = Vec::with_capacity(tickers.len());
        for (i, ticker) in tickers.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(FALLBACK_DELAY).await;
            }
            match self.get_stock_fundamentals(ticker).await {
                Ok(record) => records.push(record),
                Err(FinvizError::Authentication(msg)) => return Err(FinvizError::Authentication(msg)),
                Err(e) => tracing::warn!("Skipping {}: {}", ticker, e),
            }
        }
        Ok(records)
    }

    pub async fn get_multiple_stocks_fundamentals_fields(
        &self,
        tickers: &[String],
        fields: &[String],
    ) -> Result<Vec<Value>, FinvizError> {
        check_fields(fields)?;
        self.get_multiple_stocks_fundamentals(tickers)
            .await?
            .iter()
            .map(|record| project(record, fields))
            .collect()
    }
}

/// Reject unknown field names before spending a request.
fn check_fields(fields: &[String]) -> Result<(), FinvizError> {
    if !fields.is_empty() {
        parser::project_fields(&StockRecord::new(""), fields)?;
    }
    Ok(())
}

fn project(record: &StockRecord, fields: &[String]) -> Result<Value, FinvizError> {
    if fields.is_empty() {
        serde_json::to_value(record).map_err(|e| FinvizError::Parse(e.to_string()))
    } else {
        parser::project_fields(record, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::create_test_client;
    use crate::mock::ScriptedTransport;
    use std::sync::Arc;

    const AAPL_ROW: &str = "Ticker,Company,Sector,P/E,ROI,Price\nAAPL,Apple Inc.,Technology,29.50,45.20,189.84\n";

    #[tokio::test]
    async fn test_single_ticker_request() {
        let transport = Arc::new(ScriptedTransport::new().with_response(200, AAPL_ROW));
        let client = create_test_client(transport.clone());

        let record = client.get_stock_fundamentals(" aapl ").await.unwrap();
        assert_eq!(record.ticker, "AAPL");
        assert_eq!(record.pe_ratio, Some(29.5));

        let request = &transport.requests()[0];
        assert_eq!(request.param("v"), Some("152"));
        assert_eq!(request.param("t"), Some("AAPL"));
        assert_eq!(request.param("c"), Some(FUNDAMENTALS_COLUMNS));
    }

    #[tokio::test]
    async fn test_zero_rows_is_not_found() {
        let transport = Arc::new(ScriptedTransport::new().with_response(200, "Ticker,Company\n"));
        let client = create_test_client(transport);
        let err = client.get_stock_fundamentals("ZZZZ").await.unwrap_err();
        assert!(matches!(err, FinvizError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_projection_keeps_ticker_and_aliases() {
        let transport = Arc::new(ScriptedTransport::new().with_response(200, AAPL_ROW));
        let client = create_test_client(transport);

        let fields = vec!["pe_ratio".to_string(), "roi".to_string()];
        let value = client.get_stock_fundamentals_fields("AAPL", &fields).await.unwrap();
        assert_eq!(value["ticker"], "AAPL");
        assert_eq!(value["pe_ratio"], 29.5);
        assert_eq!(value["roi"], 45.2);
        assert!(value.get("company").is_none());
    }

    #[tokio::test]
    async fn test_unknown_field_fails_before_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = create_test_client(transport.clone());
        let err = client
            .get_stock_fundamentals_fields("AAPL", &["moon_phase".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, FinvizError::Validation { .. }));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_batch_keeps_requested_order() {
        let body = "Ticker,Company\nMSFT,Microsoft\nAAPL,Apple\nNVDA,NVIDIA\n";
        let transport = Arc::new(ScriptedTransport::new().with_response(200, body));
        let client = create_test_client(transport.clone());

        let tickers = vec!["nvda".to_string(), "AAPL".to_string(), "MSFT".to_string()];
        let records = client.get_multiple_stocks_fundamentals(&tickers).await.unwrap();
        let order: Vec<&str> = records.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["NVDA", "AAPL", "MSFT"]);
        assert_eq!(transport.request_count(), 1);
        assert_eq!(transport.requests()[0].param("t"), Some("NVDA,AAPL,MSFT"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_failure_falls_back_to_single_requests() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_response(500, "oops")
                .with_response(200, "Ticker,Company\nAAPL,Apple\n")
                .with_response(200, "Ticker,Company\n")
                .with_response(200, "Ticker,Company\nMSFT,Microsoft\n"),
        );
        let client = create_test_client(transport.clone());

        let tickers = vec!["AAPL".to_string(), "GONE".to_string(), "MSFT".to_string()];
        let records = client.get_multiple_stocks_fundamentals(&tickers).await.unwrap();
        let order: Vec<&str> = records.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["AAPL", "MSFT"]);

        let requested: Vec<String> = transport
            .requests()
            .iter()
            .filter_map(|r| r.param("t").map(str::to_string))
            .collect();
        assert_eq!(requested, vec!["AAPL,GONE,MSFT", "AAPL", "GONE", "MSFT"]);
    }

    #[tokio::test]
    async fn test_empty_ticker_list_is_rejected() {
        let client = create_test_client(Arc::new(ScriptedTransport::new()));
        assert!(client.get_multiple_stocks_fundamentals(&[]).await.is_err());
    }
}
