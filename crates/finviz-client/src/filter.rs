//! Compiles a typed [`FilterRequest`] into the screener's query parameters.

use crate::catalog::{self, CatalogEntry, OpenBound, RangeRule};
use chrono::NaiveDate;
use finviz_core::FinvizError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Export view with the screener's default column set.
pub const SCREENER_VIEW: &str = "151";
/// Export view used for single/multi ticker fundamentals.
pub const FUNDAMENTALS_VIEW: &str = "152";
pub const MAX_RESULTS_LIMIT: u32 = 1000;

/// Inclusive numeric bounds; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: f64) -> Self {
        Self { min: Some(min), max: None }
    }

    pub fn at_most(max: f64) -> Self {
        Self { min: None, max: Some(max) }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self { min: Some(min), max: Some(max) }
    }

    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Result<Self, FinvizError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(FinvizError::validation(
                "sort_order",
                format!("unknown value '{}'; accepted values: asc, desc", other),
            )),
        }
    }
}

/// Explicit earnings calendar window, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A screening request. Every field is optional; an empty request constrains nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRequest {
    pub sectors: Vec<String>,
    /// Applied to parsed rows; the screener has no negative sector filter.
    pub exclude_sectors: Vec<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub market_cap: Option<String>,
    /// Billions of dollars.
    pub market_cap_range: Range,
    pub price: Range,
    /// Shares traded today.
    pub volume: Range,
    /// Average daily shares.
    pub avg_volume: Range,
    pub relative_volume: Range,
    /// Daily change in percent.
    pub price_change: Range,
    pub dividend_yield: Range,
    pub pe: Range,
    pub rsi: Range,
    /// One of `above_sma20`, `above_sma50`, `above_sma200`, the `below_` variants, or `none`.
    pub sma_filter: Option<String>,
    pub earnings_date: Vec<String>,
    pub earnings_window: Option<DateWindow>,
    pub stocks_only: bool,
    /// Any other enumerated catalog key, e.g. `performance` -> `month_up`.
    pub filters: BTreeMap<String, String>,
    /// Any other range catalog key, e.g. `eps_qoq` -> at least 10.
    pub ranges: BTreeMap<String, Range>,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub max_results: Option<u32>,
    /// Zero-based row offset for pagination.
    pub offset: Option<u32>,
}

impl FilterRequest {
    pub fn with_filter(mut self, key: &str, value: &str) -> Self {
        self.filters.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_range(mut self, key: &str, range: Range) -> Self {
        self.ranges.insert(key.to_string(), range);
        self
    }
}

/// Query parameters for one export request, minus credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub view: String,
    /// Filter tokens ordered by parameter code.
    pub filters: Vec<String>,
    pub sort: Option<String>,
    pub limit: Option<u32>,
    /// 1-based first row, the screener's `r` parameter.
    pub first_row: Option<u32>,
    pub tickers: Option<String>,
    pub columns: Option<String>,
}

impl CompiledQuery {
    pub fn for_view(view: &str) -> Self {
        Self {
            view: view.to_string(),
            filters: Vec::new(),
            sort: None,
            limit: None,
            first_row: None,
            tickers: None,
            columns: None,
        }
    }

    pub fn filter_param(&self) -> Option<String> {
        if self.filters.is_empty() {
            None
        } else {
            Some(self.filters.join(","))
        }
    }

    /// Parameters in a fixed order: v, t, f, ft, o, ar, r, c.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("v".to_string(), self.view.clone())];
        if let Some(ref t) = self.tickers {
            params.push(("t".to_string(), t.clone()));
        }
        if let Some(f) = self.filter_param() {
            params.push(("f".to_string(), f));
        }
        params.push(("ft".to_string(), "4".to_string()));
        if let Some(ref o) = self.sort {
            params.push(("o".to_string(), o.clone()));
        }
        if let Some(ar) = self.limit {
            params.push(("ar".to_string(), ar.to_string()));
        }
        if let Some(r) = self.first_row {
            params.push(("r".to_string(), r.to_string()));
        }
        if let Some(ref c) = self.columns {
            params.push(("c".to_string(), c.clone()));
        }
        params
    }

    /// Unencoded `k=v&k=v` form, stable for a given request.
    pub fn to_query_string(&self) -> String {
        self.to_params()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Tokens keyed by parameter code; two constraints on one code conflict.
struct TokenSet {
    tokens: BTreeMap<&'static str, (&'static str, String)>,
}

impl TokenSet {
    fn new() -> Self {
        Self { tokens: BTreeMap::new() }
    }

    fn add(&mut self, entry: &CatalogEntry, token: String) -> Result<(), FinvizError> {
        if let Some((other_key, existing)) = self.tokens.get(entry.code) {
            return Err(FinvizError::validation(
                entry.key,
                format!(
                    "conflicts with {} ({}); both constrain '{}'",
                    other_key, existing, entry.code
                ),
            ));
        }
        self.tokens.insert(entry.code, (entry.key, token));
        Ok(())
    }

    fn into_tokens(self) -> Vec<String> {
        self.tokens.into_values().map(|(_, token)| token).collect()
    }
}

/// Compile a request. Pure; identical requests always produce identical queries.
pub fn compile(request: &FilterRequest) -> Result<CompiledQuery, FinvizError> {
    let mut tokens = TokenSet::new();

    add_enumerated(&mut tokens, "sector", &request.sectors)?;
    for (key, value) in [
        ("industry", &request.industry),
        ("country", &request.country),
        ("market_cap", &request.market_cap),
    ] {
        if let Some(v) = value {
            add_enumerated(&mut tokens, key, std::slice::from_ref(v))?;
        }
    }
    if request.stocks_only {
        add_enumerated(&mut tokens, "instrument", &["stocks_only".to_string()])?;
    }

    add_enumerated(&mut tokens, "earnings_date", &request.earnings_date)?;
    if let Some(window) = request.earnings_window {
        let entry = catalog::lookup("earnings_date")?;
        if window.start > window.end {
            return Err(FinvizError::validation(
                "earnings_window",
                format!("start {} is after end {}", window.start, window.end),
            ));
        }
        tokens.add(
            entry,
            format!(
                "{}_{}x{}",
                entry.code,
                window.start.format("%m-%d-%Y"),
                window.end.format("%m-%d-%Y")
            ),
        )?;
    }

    if let Some(ref sma) = request.sma_filter {
        if let Some((key, relation)) = sma_relation(sma)? {
            add_enumerated(&mut tokens, key, &[relation.to_string()])?;
        }
    }

    for (key, value) in &request.filters {
        let values: Vec<String> = value.split('|').map(|v| v.to_string()).collect();
        add_enumerated(&mut tokens, key, &values)?;
    }

    let typed_ranges = [
        ("market_cap_range", request.market_cap_range),
        ("price", request.price),
        ("volume", request.volume),
        ("avg_volume", request.avg_volume),
        ("relative_volume", request.relative_volume),
        ("price_change", request.price_change),
        ("dividend_yield", request.dividend_yield),
        ("pe", request.pe),
        ("rsi", request.rsi),
    ];
    let extra_ranges = request.ranges.iter().map(|(k, r)| (k.as_str(), *r));
    for (key, range) in typed_ranges.into_iter().chain(extra_ranges) {
        let entry = catalog::lookup(key)?;
        let rule = entry.range_rule().ok_or_else(|| {
            FinvizError::validation(key, "expects a discrete value, not a numeric range")
        })?;
        if let Some(token) = format_range(entry, rule, range)? {
            tokens.add(entry, token)?;
        }
    }

    let sort = match request.sort_by {
        Some(ref key) => {
            let code = catalog::sort_code(key)?;
            Some(match request.sort_order {
                SortOrder::Desc => format!("-{}", code),
                SortOrder::Asc => code.to_string(),
            })
        }
        None => None,
    };

    if let Some(limit) = request.max_results {
        validate_limit(limit)?;
    }

    Ok(CompiledQuery {
        view: SCREENER_VIEW.to_string(),
        filters: tokens.into_tokens(),
        sort,
        limit: request.max_results,
        first_row: request.offset.map(|o| o + 1),
        tickers: None,
        columns: None,
    })
}

pub fn validate_limit(limit: u32) -> Result<(), FinvizError> {
    if limit == 0 || limit > MAX_RESULTS_LIMIT {
        return Err(FinvizError::validation(
            "max_results",
            format!("must be between 1 and {}, got {}", MAX_RESULTS_LIMIT, limit),
        ));
    }
    Ok(())
}

fn add_enumerated(tokens: &mut TokenSet, key: &str, values: &[String]) -> Result<(), FinvizError> {
    if values.is_empty() {
        return Ok(());
    }
    let entry = catalog::lookup(key)?;
    if values.len() > 1 && !entry.multi {
        return Err(FinvizError::validation(key, "accepts a single value"));
    }
    let encoded = values
        .iter()
        .map(|v| entry.encode(v))
        .collect::<Result<Vec<_>, _>>()?;
    tokens.add(entry, format!("{}_{}", entry.code, encoded.join("|")))
}

/// Map the `sma_filter` shorthand onto a per-period catalog key and relation.
fn sma_relation(value: &str) -> Result<Option<(&'static str, &'static str)>, FinvizError> {
    let relation = match value.trim().to_ascii_lowercase().as_str() {
        "none" | "" => None,
        "above_sma20" => Some(("sma20", "price_above")),
        "below_sma20" => Some(("sma20", "price_below")),
        "above_sma50" => Some(("sma50", "price_above")),
        "below_sma50" => Some(("sma50", "price_below")),
        "above_sma200" => Some(("sma200", "price_above")),
        "below_sma200" => Some(("sma200", "price_below")),
        other => {
            return Err(FinvizError::validation(
                "sma_filter",
                format!(
                    "unknown value '{}'; accepted values: above_sma20, above_sma50, above_sma200, \
                     below_sma20, below_sma50, below_sma200, none",
                    other
                ),
            ))
        }
    };
    Ok(relation)
}

fn format_range(entry: &CatalogEntry, rule: &RangeRule, range: Range) -> Result<Option<String>, FinvizError> {
    if range.is_open() {
        return Ok(None);
    }
    if let (Some(min), Some(max)) = (range.min, range.max) {
        if min > max {
            return Err(FinvizError::validation(
                entry.key,
                format!("min ({}) is greater than max ({})", min, max),
            ));
        }
    }

    let min = range.min.map(|v| format_bound(entry, rule, v)).transpose()?;
    let max = range.max.map(|v| format_bound(entry, rule, v)).transpose()?;

    let value = match (min, max) {
        (Some(lo), Some(hi)) => format!("{}to{}", lo, hi),
        (Some(lo), None) => match rule.min_only {
            OpenBound::Prefix(p) => format!("{}{}", p, lo),
            OpenBound::Custom(fill) => format!("{}to{}", lo, fill),
        },
        (None, Some(hi)) => match rule.max_only {
            OpenBound::Prefix(p) => format!("{}{}", p, hi),
            OpenBound::Custom(fill) => format!("{}to{}", fill, hi),
        },
        (None, None) => return Ok(None),
    };

    Ok(Some(format!("{}_{}", entry.code, value)))
}

fn format_bound(entry: &CatalogEntry, rule: &RangeRule, value: f64) -> Result<String, FinvizError> {
    if !value.is_finite() {
        return Err(FinvizError::validation(entry.key, "bound must be a finite number"));
    }
    if value < 0.0 && !rule.allow_negative {
        return Err(FinvizError::validation(
            entry.key,
            format!("bound must be non-negative, got {}", value),
        ));
    }
    let scaled = rule.unit.scale(value);
    format_number(scaled, rule.decimals).ok_or_else(|| {
        FinvizError::validation(
            entry.key,
            format!(
                "{} has more precision than the screener accepts ({} decimal places)",
                value, rule.decimals
            ),
        )
    })
}

/// Shortest decimal rendering with at most `decimals` fractional digits, or `None`
/// when the value would need more.
pub fn format_number(value: f64, decimals: u32) -> Option<String> {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    if (scaled - scaled.round()).abs() > 1e-6 {
        return None;
    }
    let rounded = scaled.round() / factor;
    if rounded == 0.0 {
        return Some("0".to_string());
    }
    let text = format!("{:.*}", decimals as usize, rounded);
    if text.contains('.') {
        Some(text.trim_end_matches('0').trim_end_matches('.').to_string())
    } else {
        Some(text)
    }
}
