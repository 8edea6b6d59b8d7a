//! Argument checks shared by the tools. Each returns the normalized value or a
//! [`FinvizError::Validation`] naming the offending field.

use chrono::NaiveDate;
use finviz_client::filter::MAX_RESULTS_LIMIT;
use finviz_client::SortOrder;
use finviz_core::FinvizError;
use regex::Regex;
use std::sync::OnceLock;

pub const MAX_DAYS_BACK: u32 = 365;

const SMA_FILTERS: &[&str] = &[
    "above_sma20",
    "above_sma50",
    "above_sma200",
    "below_sma20",
    "below_sma50",
    "below_sma200",
    "none",
];

fn ticker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z]{1,5}([.-][A-Z]{1,2})?$").expect("ticker pattern is valid"))
}

/// Upper-cased ticker; one `.` or `-` class suffix is allowed (BRK.B, BF-B).
pub fn ticker(value: &str) -> Result<String, FinvizError> {
    let upper = value.trim().to_ascii_uppercase();
    if ticker_pattern().is_match(&upper) {
        Ok(upper)
    } else {
        Err(FinvizError::validation("ticker", format!("invalid ticker '{}'", value)))
    }
}

pub fn tickers(values: &[String]) -> Result<Vec<String>, FinvizError> {
    if values.is_empty() {
        return Err(FinvizError::validation("tickers", "at least one ticker is required"));
    }
    values.iter().map(|t| ticker(t)).collect()
}

pub fn price_range(min: Option<f64>, max: Option<f64>) -> Result<(), FinvizError> {
    for (field, value) in [("min_price", min), ("max_price", max)] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(FinvizError::validation(field, format!("must be a non-negative number, got {}", v)));
            }
        }
    }
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(FinvizError::validation(
                "min_price",
                format!("min_price {} is greater than max_price {}", lo, hi),
            ));
        }
    }
    Ok(())
}

pub fn max_results(value: u32) -> Result<u32, FinvizError> {
    if value == 0 || value > MAX_RESULTS_LIMIT {
        return Err(FinvizError::validation(
            "max_results",
            format!("must be between 1 and {}, got {}", MAX_RESULTS_LIMIT, value),
        ));
    }
    Ok(value)
}

pub fn sort_order(value: &str) -> Result<SortOrder, FinvizError> {
    SortOrder::parse(value)
}

pub fn sma_filter(value: &str) -> Result<Option<String>, FinvizError> {
    let lower = value.trim().to_ascii_lowercase();
    if !SMA_FILTERS.contains(&lower.as_str()) {
        return Err(FinvizError::validation(
            "sma_filter",
            format!("unknown value '{}'; accepted values: {}", value, SMA_FILTERS.join(", ")),
        ));
    }
    Ok((lower != "none").then_some(lower))
}

pub fn days_back(value: u32) -> Result<u32, FinvizError> {
    if value == 0 || value > MAX_DAYS_BACK {
        return Err(FinvizError::validation(
            "days_back",
            format!("must be between 1 and {}, got {}", MAX_DAYS_BACK, value),
        ));
    }
    Ok(value)
}

pub fn rsi(field: &str, value: Option<f64>) -> Result<(), FinvizError> {
    match value {
        Some(v) if !(0.0..=100.0).contains(&v) => {
            Err(FinvizError::validation(field, format!("must be between 0 and 100, got {}", v)))
        }
        _ => Ok(()),
    }
}

/// `YYYY-MM-DD`.
pub fn date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, FinvizError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| FinvizError::validation(field, format!("expected YYYY-MM-DD, got '{}'", raw))),
        None => Ok(None),
    }
}

pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, FinvizError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FinvizError::validation(field, "is required"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker() {
        assert_eq!(ticker("aapl").unwrap(), "AAPL");
        assert_eq!(ticker(" brk.b ").unwrap(), "BRK.B");
        assert_eq!(ticker("BF-B").unwrap(), "BF-B");
        assert!(ticker("").is_err());
        assert!(ticker("TOOLONG").is_err());
        assert!(ticker("A1").is_err());
        assert!(ticker("BRK..B").is_err());
    }

    #[test]
    fn test_price_range() {
        assert!(price_range(Some(5.0), Some(10.0)).is_ok());
        assert!(price_range(None, Some(10.0)).is_ok());
        assert!(price_range(Some(-1.0), None).is_err());
        assert!(price_range(Some(20.0), Some(10.0)).is_err());
    }

    #[test]
    fn test_limits_and_orders() {
        assert!(max_results(1).is_ok());
        assert!(max_results(1000).is_ok());
        assert!(max_results(0).is_err());
        assert!(max_results(1001).is_err());

        assert_eq!(sort_order("ASC").unwrap(), SortOrder::Asc);
        assert!(sort_order("sideways").is_err());

        assert!(days_back(365).is_ok());
        assert!(days_back(0).is_err());
        assert!(days_back(366).is_err());
    }

    #[test]
    fn test_sma_filter() {
        assert_eq!(sma_filter("above_sma50").unwrap().as_deref(), Some("above_sma50"));
        assert_eq!(sma_filter("none").unwrap(), None);
        assert!(sma_filter("above_sma100").is_err());
    }

    #[test]
    fn test_date() {
        assert_eq!(date("date_from", Some("2024-03-01")).unwrap(), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(date("date_from", None).unwrap(), None);
        assert!(date("date_from", Some("03/01/2024")).is_err());
    }
}
