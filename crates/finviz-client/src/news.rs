use crate::catalog;
use crate::client::{FinvizClient, NEWS_EXPORT_PATH};
use crate::parser;
use chrono::{Duration, NaiveDateTime, Utc};
use finviz_core::{FinvizError, NewsCategory, NewsItem};

/// Title keywords per category, checked in order; the first match wins.
const CATEGORY_KEYWORDS: &[(NewsCategory, &[&str])] = &[
    (NewsCategory::Earnings, &["earnings", "revenue", "profit", "eps", "guidance"]),
    (NewsCategory::Analyst, &["upgrade", "downgrade", "rating", "analyst", "target"]),
    (NewsCategory::Insider, &["insider", "ceo", "cfo", "director", "executive"]),
    (NewsCategory::Merger, &["merger", "acquisition", "deal", "buyout"]),
    (NewsCategory::Regulatory, &["fda", "approval", "clinical", "trial"]),
    (NewsCategory::CorporateAction, &["dividend", "split", "buyback"]),
];

pub const MAX_DAYS_BACK: u32 = 365;

pub fn categorize(title: &str) -> NewsCategory {
    let lower = title.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(NewsCategory::General)
}

fn validate_days_back(days_back: u32) -> Result<(), FinvizError> {
    if days_back == 0 || days_back > MAX_DAYS_BACK {
        return Err(FinvizError::validation(
            "days_back",
            format!("must be between 1 and {}, got {}", MAX_DAYS_BACK, days_back),
        ));
    }
    Ok(())
}

/// Keep items newer than `cutoff` (undated items are kept), optionally of one
/// category, up to `max_items`.
pub fn select_news(
    items: Vec<NewsItem>,
    cutoff: NaiveDateTime,
    category: Option<NewsCategory>,
    max_items: Option<usize>,
) -> Vec<NewsItem> {
    items
        .into_iter()
        .filter(|item| item.published.map_or(true, |p| p >= cutoff))
        .filter(|item| category.map_or(true, |c| item.category == c))
        .take(max_items.unwrap_or(usize::MAX))
        .collect()
}

fn cutoff(days_back: u32) -> NaiveDateTime {
    Utc::now().naive_utc() - Duration::days(days_back as i64)
}

impl FinvizClient {
    async fn news_export(&self, extra: Vec<(String, String)>) -> Result<Vec<NewsItem>, FinvizError> {
        let mut params = vec![("v".to_string(), "3".to_string())];
        params.extend(extra);
        let body = self.get_body(NEWS_EXPORT_PATH, params).await?;
        Ok(parser::parse_news_csv(&body)?.records)
    }

    /// Headlines for one ticker. `category` of `None` means all categories.
    pub async fn get_stock_news(
        &self,
        ticker: &str,
        days_back: u32,
        category: Option<NewsCategory>,
    ) -> Result<Vec<NewsItem>, FinvizError> {
        validate_days_back(days_back)?;
        let ticker = ticker.trim().to_ascii_uppercase();
        let items = self
            .news_export(vec![("t".to_string(), ticker.clone())])
            .await?;
        let items = select_news(items, cutoff(days_back), category, None);
        tracing::info!("Retrieved {} news items for {}", items.len(), ticker);
        Ok(items)
    }

    pub async fn get_market_news(&self, days_back: u32, max_items: usize) -> Result<Vec<NewsItem>, FinvizError> {
        validate_days_back(days_back)?;
        let items = self.news_export(Vec::new()).await?;
        let items = select_news(items, cutoff(days_back), None, Some(max_items));
        tracing::info!("Retrieved {} market news items", items.len());
        Ok(items)
    }

    pub async fn get_sector_news(
        &self,
        sector: &str,
        days_back: u32,
        max_items: usize,
    ) -> Result<Vec<NewsItem>, FinvizError> {
        validate_days_back(days_back)?;
        let entry = catalog::lookup("sector")?;
        let code = entry.encode(sector)?;
        let items = self
            .news_export(vec![("f".to_string(), format!("{}_{}", entry.code, code))])
            .await?;
        let items = select_news(items, cutoff(days_back), None, Some(max_items));
        tracing::info!("Retrieved {} news items for sector {}", items.len(), sector);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::create_test_client;
    use crate::mock::ScriptedTransport;
    use std::sync::Arc;

    fn item(title: &str, published: Option<NaiveDateTime>) -> NewsItem {
        NewsItem {
            ticker: None,
            title: title.to_string(),
            source: None,
            published,
            url: "https://example.com".to_string(),
            category: categorize(title),
        }
    }

    #[test]
    fn test_categorize() {
        assert_eq!(categorize("Apple Q3 earnings top estimates"), NewsCategory::Earnings);
        assert_eq!(categorize("Morgan Stanley upgrades NVDA"), NewsCategory::Analyst);
        assert_eq!(categorize("CEO sells 10,000 shares"), NewsCategory::Insider);
        assert_eq!(categorize("Company agrees to buyout"), NewsCategory::Merger);
        assert_eq!(categorize("FDA grants approval"), NewsCategory::Regulatory);
        assert_eq!(categorize("Board declares special dividend"), NewsCategory::CorporateAction);
        assert_eq!(categorize("Markets open mixed"), NewsCategory::General);
    }

    #[test]
    fn test_select_news() {
        let now = Utc::now().naive_utc();
        let items = vec![
            item("Earnings beat", Some(now)),
            item("Old earnings story", Some(now - Duration::days(30))),
            item("Analyst upgrade", Some(now - Duration::hours(2))),
            item("Undated general story", None),
        ];
        let cutoff = now - Duration::days(7);

        let all = select_news(items.clone(), cutoff, None, None);
        assert_eq!(all.len(), 3);

        let earnings = select_news(items.clone(), cutoff, Some(NewsCategory::Earnings), None);
        assert_eq!(earnings.len(), 1);

        let capped = select_news(items, cutoff, None, Some(2));
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn test_stock_news_request() {
        let today = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();
        let body = format!(
            "Title,Source,Date,Url,Ticker\nTesla earnings preview,Reuters,{},https://example.com/1,TSLA\n",
            today
        );
        let transport = Arc::new(ScriptedTransport::new().with_response(200, body));
        let client = create_test_client(transport.clone());

        let items = client.get_stock_news("tsla", 7, None).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, NewsCategory::Earnings);

        let request = &transport.requests()[0];
        assert!(request.url.ends_with("/news_export.ashx"));
        assert_eq!(request.param("v"), Some("3"));
        assert_eq!(request.param("t"), Some("TSLA"));
    }

    #[tokio::test]
    async fn test_sector_news_request_and_validation() {
        let transport = Arc::new(ScriptedTransport::new().with_response(200, "Title,Source,Date,Url\n"));
        let client = create_test_client(transport.clone());

        assert!(client.get_sector_news("Healthcare", 5, 10).await.unwrap().is_empty());
        assert_eq!(transport.requests()[0].param("f"), Some("sec_healthcare"));

        assert!(client.get_sector_news("Astrology", 5, 10).await.is_err());
        assert!(client.get_market_news(0, 10).await.is_err());
        assert!(client.get_market_news(366, 10).await.is_err());
        assert_eq!(transport.request_count(), 1);
    }
}
