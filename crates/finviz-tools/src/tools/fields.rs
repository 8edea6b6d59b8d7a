//! Discovery of the record fields accepted by `data_fields`.

use crate::tool::{parse_args, Tool, ToolOutput};
use async_trait::async_trait;
use finviz_client::parser::{self, FIELD_ALIASES};
use finviz_core::FinvizError;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Write;

/// Shorthands that are not aliases but are common enough to suggest.
const CORRECTIONS: &[(&str, &str)] = &[
    ("pe", "pe_ratio"),
    ("pb", "pb_ratio"),
    ("ps", "ps_ratio"),
    ("div_yield", "dividend_yield"),
    ("mcap", "market_cap"),
    ("eps_ttm", "eps"),
    ("aum", "assets_under_management"),
    ("expense_ratio", "net_expense_ratio"),
];

fn is_known(name: &str, fields: &[String]) -> bool {
    let resolved = parser::resolve_field(name);
    fields.iter().any(|f| f == resolved)
}

/// Closest known field for a misspelled name: a listed correction, then the
/// shortest field that contains the name or is contained by it.
fn suggest(name: &str, fields: &[String]) -> Option<String> {
    let lower = name.trim().to_ascii_lowercase();
    if let Some((_, field)) = CORRECTIONS.iter().find(|(short, _)| *short == lower) {
        return Some(field.to_string());
    }
    if is_known(&lower, fields) {
        return Some(lower);
    }
    if lower.len() < 3 {
        return None;
    }
    fields
        .iter()
        .filter(|f| f.len() >= 3 && (f.contains(lower.as_str()) || lower.contains(f.as_str())))
        .min_by_key(|f| f.len())
        .cloned()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListFieldsArgs {
    keyword: Option<String>,
}

pub struct ListAvailableFieldsTool;

#[async_trait]
impl Tool for ListAvailableFieldsTool {
    fn name(&self) -> &'static str {
        "list_available_fields"
    }

    fn description(&self) -> &'static str {
        "Field names accepted by data_fields in the fundamentals tools, with the export column behind each"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keyword": {"type": "string", "description": "Only fields whose name or column contains this text"}
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let args: ListFieldsArgs = parse_args(args)?;
        let keyword = args
            .keyword
            .map(|k| k.trim().to_ascii_lowercase())
            .filter(|k| !k.is_empty());

        let mut entries = Vec::new();
        for name in parser::record_fields()? {
            let column = parser::field_column(&name);
            let matches = match keyword.as_deref() {
                Some(k) => name.contains(k) || column.is_some_and(|c| c.to_ascii_lowercase().contains(k)),
                None => true,
            };
            if matches {
                entries.push((name, column));
            }
        }

        let mut text = match keyword.as_deref() {
            Some(k) => format!("{} data fields matching '{}':\n", entries.len(), k),
            None => format!("Available data fields ({} total):\n", entries.len()),
        };
        for (name, column) in &entries {
            match column {
                Some(column) => {
                    let _ = writeln!(text, "  {} ({})", name, column);
                }
                None => {
                    let _ = writeln!(text, "  {}", name);
                }
            }
        }
        text.push_str("Aliases:\n");
        for (alias, field) in FIELD_ALIASES {
            let _ = writeln!(text, "  {} -> {}", alias, field);
        }

        let fields: Vec<Value> = entries
            .iter()
            .map(|(name, column)| json!({"name": name, "column": column}))
            .collect();
        let aliases: serde_json::Map<String, Value> = FIELD_ALIASES
            .iter()
            .map(|(alias, field)| (alias.to_string(), Value::String(field.to_string())))
            .collect();
        Ok(ToolOutput::success(text, json!({"fields": fields, "aliases": aliases})))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ValidateFieldsArgs {
    #[serde(alias = "field_names", alias = "data_fields")]
    fields: Vec<String>,
}

pub struct ValidateFieldsTool;

#[async_trait]
impl Tool for ValidateFieldsTool {
    fn name(&self) -> &'static str {
        "validate_fields"
    }

    fn description(&self) -> &'static str {
        "Check a data_fields list before using it and suggest corrections for unknown names"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fields": {"type": "array", "items": {"type": "string"}, "minItems": 1}
            },
            "required": ["fields"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let args: ValidateFieldsArgs = parse_args(args)?;
        if args.fields.is_empty() {
            return Err(FinvizError::validation("fields", "at least one field name is required"));
        }
        let known = parser::record_fields()?;

        let mut valid = Vec::new();
        let mut invalid = Vec::new();
        for requested in &args.fields {
            let name = requested.trim();
            if is_known(name, &known) {
                valid.push(name.to_string());
            } else {
                invalid.push((name.to_string(), suggest(name, &known)));
            }
        }

        let mut text = format!("{} of {} fields are valid\n", valid.len(), args.fields.len());
        for name in &valid {
            let _ = writeln!(text, "  ok {}", name);
        }
        for (name, suggestion) in &invalid {
            match suggestion {
                Some(s) => {
                    let _ = writeln!(text, "  unknown {} (did you mean {}?)", name, s);
                }
                None => {
                    let _ = writeln!(text, "  unknown {}", name);
                }
            }
        }

        let invalid: Vec<Value> = invalid
            .into_iter()
            .map(|(field, suggestion)| json!({"field": field, "suggestion": suggestion}))
            .collect();
        Ok(ToolOutput::success(
            text,
            json!({"all_valid": invalid.is_empty(), "valid": valid, "invalid": invalid}),
        ))
    }
}
