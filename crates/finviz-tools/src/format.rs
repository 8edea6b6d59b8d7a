//! Plain-text rendering of records for tool output.

use edgar_client::{FilingContent, FilingContentResult};
use finviz_core::{
    EarningsRecord, FilingSummary, MarketOverview, NewsItem, SecFilingRecord, SectorPerformance, StockRecord,
};
use serde_json::Value;
use std::fmt::Write;

const NA: &str = "N/A";

/// 1234567 -> "1.23M". Values under a thousand keep two decimals.
pub fn large_number(value: f64) -> String {
    let abs = value.abs();
    let (scaled, suffix) = if abs >= 1e12 {
        (value / 1e12, "T")
    } else if abs >= 1e9 {
        (value / 1e9, "B")
    } else if abs >= 1e6 {
        (value / 1e6, "M")
    } else if abs >= 1e3 {
        (value / 1e3, "K")
    } else {
        (value, "")
    };
    format!("{:.2}{}", scaled, suffix)
}

pub fn opt_large_number(value: Option<f64>) -> String {
    value.map(large_number).unwrap_or_else(|| NA.to_string())
}

pub fn volume(value: Option<u64>) -> String {
    value.map(|v| large_number(v as f64)).unwrap_or_else(|| NA.to_string())
}

pub fn price(value: Option<f64>) -> String {
    value.map(|v| format!("${:.2}", v)).unwrap_or_else(|| NA.to_string())
}

pub fn percent(value: Option<f64>) -> String {
    value.map(|v| format!("{:+.2}%", v)).unwrap_or_else(|| NA.to_string())
}

pub fn ratio(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| NA.to_string())
}

fn text(value: Option<&str>) -> &str {
    value.unwrap_or(NA)
}

/// One line per stock under a "Found N ..." header.
pub fn stock_list(title: &str, records: &[StockRecord]) -> String {
    if records.is_empty() {
        return format!("No stocks found for {}.", title);
    }
    let mut out = format!("Found {} stocks for {}:\n", records.len(), title);
    for (i, r) in records.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} - {} | {} | Price {} ({}) | Volume {} | RelVol {} | MCap {} | P/E {}",
            i + 1,
            r.ticker,
            text(r.company.as_deref()),
            text(r.sector.as_deref()),
            price(r.price),
            percent(r.price_change),
            volume(r.volume),
            ratio(r.relative_volume),
            opt_large_number(r.market_cap),
            ratio(r.pe_ratio),
        );
    }
    out
}

pub fn earnings_list(title: &str, records: &[EarningsRecord]) -> String {
    if records.is_empty() {
        return format!("No upcoming earnings found for {}.", title);
    }
    let mut out = format!("Found {} companies for {}:\n", records.len(), title);
    for (i, r) in records.iter().enumerate() {
        let date = r
            .earnings_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| NA.to_string());
        let timing = r.timing.map(|t| t.as_str()).unwrap_or(NA);
        let _ = writeln!(
            out,
            "{}. {} - {} | {} | Earnings {} ({}) | Price {} | Target {} ({}) | MCap {}",
            i + 1,
            r.ticker,
            text(r.company.as_deref()),
            text(r.sector.as_deref()),
            date,
            timing,
            price(r.price),
            price(r.target_price),
            percent(r.target_price_upside),
            opt_large_number(r.market_cap),
        );
    }
    out
}

/// Multi-line detail block for one stock.
pub fn fundamentals(r: &StockRecord) -> String {
    let mut out = format!("{} - {}\n", r.ticker, text(r.company.as_deref()));
    let rows: [(&str, String); 16] = [
        ("Sector", text(r.sector.as_deref()).to_string()),
        ("Industry", text(r.industry.as_deref()).to_string()),
        ("Country", text(r.country.as_deref()).to_string()),
        ("Price", price(r.price)),
        ("Change", percent(r.price_change)),
        ("Market Cap", opt_large_number(r.market_cap)),
        ("Volume", volume(r.volume)),
        ("Avg Volume", volume(r.avg_volume)),
        ("P/E", ratio(r.pe_ratio)),
        ("Forward P/E", ratio(r.forward_pe)),
        ("P/B", ratio(r.pb_ratio)),
        ("EPS", ratio(r.eps)),
        ("Dividend Yield", percent(r.dividend_yield)),
        ("ROE", percent(r.roe)),
        ("RSI", ratio(r.rsi)),
        ("Target Price", price(r.target_price)),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "  {}: {}", label, value);
    }
    out
}

/// `key: value` lines for a projected JSON object, ticker first.
pub fn projection(value: &Value) -> String {
    let Some(map) = value.as_object() else {
        return value.to_string();
    };
    let mut out = format!("{}\n", map.get("ticker").and_then(Value::as_str).unwrap_or(NA));
    for (key, v) in map.iter().filter(|(k, _)| k.as_str() != "ticker") {
        let shown = match v {
            Value::Null => NA.to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let _ = writeln!(out, "  {}: {}", key, shown);
    }
    out
}

pub fn news(title: &str, items: &[NewsItem]) -> String {
    if items.is_empty() {
        return format!("No news found for {}.", title);
    }
    let mut out = format!("{} news items for {}:\n", items.len(), title);
    for (i, item) in items.iter().enumerate() {
        let when = item
            .published
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| NA.to_string());
        let _ = writeln!(
            out,
            "{}. [{}] {} ({}, {})\n   {}",
            i + 1,
            item.category.as_str(),
            item.title,
            text(item.source.as_deref()),
            when,
            item.url
        );
    }
    out
}

pub fn groups(title: &str, groups: &[SectorPerformance]) -> String {
    if groups.is_empty() {
        return format!("No {} performance data found.", title);
    }
    let mut out = format!("{} performance ({} groups):\n", title, groups.len());
    for g in groups {
        let count = g.stock_count.map(|c| c.to_string()).unwrap_or_else(|| NA.to_string());
        let _ = writeln!(
            out,
            "{}: 1D {} | 1W {} | 1M {} | 3M {} | 6M {} | 1Y {} | Stocks {}",
            g.name,
            percent(g.performance_1d),
            percent(g.performance_1w),
            percent(g.performance_1m),
            percent(g.performance_3m),
            percent(g.performance_6m),
            percent(g.performance_1y),
            count,
        );
    }
    out
}

pub fn market_overview(overview: &MarketOverview) -> String {
    let mut out = format!("Market overview at {}\n\nIndices:\n", overview.generated_at.format("%Y-%m-%d %H:%M UTC"));
    for r in &overview.indices {
        let _ = writeln!(
            out,
            "  {}: {} ({})",
            r.ticker,
            price(r.price),
            percent(r.price_change)
        );
    }
    out.push('\n');
    out.push_str(&groups("Sector", &overview.sectors));
    out
}

pub fn filings(title: &str, filings: &[SecFilingRecord]) -> String {
    if filings.is_empty() {
        return format!("No SEC filings found for {}.", title);
    }
    let mut out = format!("{} SEC filings for {}:\n", filings.len(), title);
    for (i, f) in filings.iter().enumerate() {
        let report = f
            .report_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| NA.to_string());
        let _ = writeln!(
            out,
            "{}. {} {} (report {}) {}",
            i + 1,
            f.filing_date,
            f.form,
            report,
            f.description
        );
        if let Some(url) = f.document_url.as_ref().or(f.filing_url.as_ref()) {
            let _ = writeln!(out, "   {}", url);
        }
    }
    out
}

pub fn filing_summary(s: &FilingSummary) -> String {
    let mut out = format!(
        "SEC filing summary for {} (last {} days): {} filings\n",
        s.ticker, s.days_back, s.total_filings
    );
    if let (Some(date), Some(form)) = (s.latest_filing_date, s.latest_form.as_deref()) {
        let _ = writeln!(out, "Latest: {} on {}", form, date);
    }
    for (form, count) in &s.forms {
        let _ = writeln!(out, "  {}: {}", form, count);
    }
    out
}

pub fn filing_content(c: &FilingContent) -> String {
    let mut out = format!(
        "{} {} ({} characters{})\n{}\n\n",
        c.ticker,
        c.accession_number,
        c.content_length,
        if c.truncated { ", truncated" } else { "" },
        c.document_url
    );
    out.push_str(&c.content);
    out
}

pub fn filing_contents(results: &[FilingContentResult]) -> String {
    let mut out = String::new();
    for (i, r) in results.iter().enumerate() {
        let _ = write!(out, "--- {}/{}: ", i + 1, results.len());
        match (&r.content, &r.error) {
            (Some(content), _) => out.push_str(&filing_content(content)),
            (None, Some(error)) => {
                let _ = write!(out, "{} {} failed: {}", r.filing.ticker, r.filing.accession_number, error);
            }
            (None, None) => out.push_str(NA),
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_large_number() {
        assert_eq!(large_number(1_234_567.0), "1.23M");
        assert_eq!(large_number(2_500_000_000_000.0), "2.50T");
        assert_eq!(large_number(12_710_000_000.0), "12.71B");
        assert_eq!(large_number(45_300.0), "45.30K");
        assert_eq!(large_number(999.0), "999.00");
        assert_eq!(large_number(-3_000_000.0), "-3.00M");
    }

    #[test]
    fn test_scalar_formats() {
        assert_eq!(price(Some(72.4)), "$72.40");
        assert_eq!(percent(Some(15.19)), "+15.19%");
        assert_eq!(percent(Some(-0.5)), "-0.50%");
        assert_eq!(ratio(Some(1.0)), "1.00");
        assert_eq!(price(None), "N/A");
        assert_eq!(volume(None), "N/A");
    }

    #[test]
    fn test_stock_list() {
        let mut nke = StockRecord::new("NKE");
        nke.company = Some("NIKE Inc".to_string());
        nke.price = Some(72.4);
        nke.price_change = Some(15.19);
        nke.volume = Some(42_310_155);

        let text = stock_list("volume surge", &[nke]);
        assert!(text.starts_with("Found 1 stocks for volume surge:"));
        assert!(text.contains("1. NKE - NIKE Inc | N/A | Price $72.40 (+15.19%) | Volume 42.31M"));
        assert_eq!(stock_list("volume surge", &[]), "No stocks found for volume surge.");
    }

    #[test]
    fn test_projection_lines() {
        let value = serde_json::json!({"ticker": "AAPL", "pe_ratio": 29.5, "sector": null});
        let text = projection(&value);
        assert!(text.starts_with("AAPL\n"));
        assert!(text.contains("  pe_ratio: 29.5"));
        assert!(text.contains("  sector: N/A"));
    }
}
