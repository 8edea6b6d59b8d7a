use crate::format;
use crate::tool::{parse_args, Tool, ToolOutput};
use crate::validate;
use async_trait::async_trait;
use edgar_client::client::{DEFAULT_DOCUMENT_LENGTH, DEFAULT_MULTI_DOCUMENT_LENGTH};
use edgar_client::{EdgarClient, FilingRef};
use finviz_core::FinvizError;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct EdgarFilingsArgs {
    ticker: String,
    form_types: Vec<String>,
    date_from: Option<String>,
    date_to: Option<String>,
    max_count: usize,
}

impl Default for EdgarFilingsArgs {
    fn default() -> Self {
        Self {
            ticker: String::new(),
            form_types: Vec::new(),
            date_from: None,
            date_to: None,
            max_count: 50,
        }
    }
}

pub struct EdgarFilingsTool {
    client: EdgarClient,
}

impl EdgarFilingsTool {
    pub fn new(client: EdgarClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for EdgarFilingsTool {
    fn name(&self) -> &'static str {
        "get_edgar_filings"
    }

    fn description(&self) -> &'static str {
        "Company filings straight from the SEC EDGAR submissions feed"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {"type": "string"},
                "form_types": {"type": "array", "items": {"type": "string"}},
                "date_from": {"type": "string", "description": "YYYY-MM-DD, inclusive"},
                "date_to": {"type": "string", "description": "YYYY-MM-DD, inclusive"},
                "max_count": {"type": "integer", "minimum": 1, "maximum": 1000, "default": 50}
            },
            "required": ["ticker"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let args: EdgarFilingsArgs = parse_args(args)?;
        let ticker = validate::ticker(&args.ticker)?;
        let date_from = validate::date("date_from", args.date_from.as_deref())?;
        let date_to = validate::date("date_to", args.date_to.as_deref())?;
        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(FinvizError::validation("date_from", "must not be after date_to"));
            }
        }
        let max_count = validate::max_results(u32::try_from(args.max_count).unwrap_or(u32::MAX))
            .map_err(|_| FinvizError::validation("max_count", "must be between 1 and 1000"))?;

        let filings = self
            .client
            .get_company_filings(&ticker, &args.form_types, date_from, date_to, max_count as usize)
            .await?;
        ToolOutput::with_records(format::filings(&format!("{} (EDGAR)", ticker), &filings), &filings)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FilingContentArgs {
    ticker: String,
    accession_number: String,
    primary_document: String,
    filings: Vec<FilingRef>,
    max_length: Option<usize>,
}

/// Downloads one filing document, or a batch when `filings` is given.
pub struct EdgarFilingContentTool {
    client: EdgarClient,
}

impl EdgarFilingContentTool {
    pub fn new(client: EdgarClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for EdgarFilingContentTool {
    fn name(&self) -> &'static str {
        "get_edgar_filing_content"
    }

    fn description(&self) -> &'static str {
        "Text of one or more filing documents from the EDGAR archives, truncated to max_length characters"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {"type": "string"},
                "accession_number": {"type": "string", "description": "e.g. 0000320193-24-000123"},
                "primary_document": {"type": "string", "description": "e.g. aapl-20240928.htm"},
                "filings": {
                    "type": "array",
                    "description": "Batch mode: documents to fetch one after another",
                    "items": {
                        "type": "object",
                        "properties": {
                            "ticker": {"type": "string"},
                            "accession_number": {"type": "string"},
                            "primary_document": {"type": "string"}
                        },
                        "required": ["ticker", "accession_number", "primary_document"]
                    }
                },
                "max_length": {
                    "type": "integer",
                    "minimum": 1,
                    "description": format!(
                        "Characters per document; default {} single, {} batch",
                        DEFAULT_DOCUMENT_LENGTH, DEFAULT_MULTI_DOCUMENT_LENGTH
                    )
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let args: FilingContentArgs = parse_args(args)?;
        if args.max_length == Some(0) {
            return Err(FinvizError::validation("max_length", "must be at least 1"));
        }

        if !args.filings.is_empty() {
            let max_length = args.max_length.unwrap_or(DEFAULT_MULTI_DOCUMENT_LENGTH);
            let results = self.client.get_multiple_filing_contents(&args.filings, max_length).await;
            return ToolOutput::with_records(format::filing_contents(&results), &results);
        }

        let ticker = validate::ticker(&args.ticker)?;
        let accession_number = validate::required("accession_number", &args.accession_number)?;
        let primary_document = validate::required("primary_document", &args.primary_document)?;
        let max_length = args.max_length.unwrap_or(DEFAULT_DOCUMENT_LENGTH);

        let content = self
            .client
            .get_filing_document_content(&ticker, accession_number, primary_document, max_length)
            .await?;
        ToolOutput::with_records(format::filing_content(&content), &content)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ConceptArgs {
    ticker: String,
    concept: String,
    taxonomy: String,
}

impl Default for ConceptArgs {
    fn default() -> Self {
        Self {
            ticker: String::new(),
            concept: String::new(),
            taxonomy: "us-gaap".to_string(),
        }
    }
}

/// Reported values of one XBRL concept, grouped by unit.
fn concept_summary(ticker: &str, value: &Value) -> String {
    let label = value["label"].as_str().or(value["tag"].as_str()).unwrap_or("concept");
    let units = value["units"].as_object();
    let mut out = format!("{} for {}", label, ticker);
    match units {
        Some(units) if !units.is_empty() => {
            for (unit, facts) in units {
                let facts = facts.as_array().map(Vec::as_slice).unwrap_or_default();
                out.push_str(&format!("\n  {}: {} values", unit, facts.len()));
                if let Some(last) = facts.last() {
                    out.push_str(&format!(
                        ", latest {} (period ending {})",
                        last["val"],
                        last["end"].as_str().unwrap_or("N/A")
                    ));
                }
            }
        }
        _ => out.push_str(": no reported values"),
    }
    out
}

pub struct EdgarCompanyConceptTool {
    client: EdgarClient,
}

impl EdgarCompanyConceptTool {
    pub fn new(client: EdgarClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for EdgarCompanyConceptTool {
    fn name(&self) -> &'static str {
        "get_edgar_company_concept"
    }

    fn description(&self) -> &'static str {
        "All reported values of one XBRL concept (e.g. Assets, Revenues) for a company"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {"type": "string"},
                "concept": {"type": "string", "description": "e.g. Assets, NetIncomeLoss"},
                "taxonomy": {"type": "string", "enum": ["us-gaap", "dei", "ifrs-full", "srt"], "default": "us-gaap"}
            },
            "required": ["ticker", "concept"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let args: ConceptArgs = parse_args(args)?;
        let ticker = validate::ticker(&args.ticker)?;
        let concept = validate::required("concept", &args.concept)?;

        let value = self.client.get_company_concept(&ticker, concept, &args.taxonomy).await?;
        Ok(ToolOutput::success(concept_summary(&ticker, &value), value))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FactsArgs {
    ticker: String,
}

/// Number of concepts reported per taxonomy.
fn facts_summary(ticker: &str, value: &Value) -> String {
    let name = value["entityName"].as_str().unwrap_or(ticker);
    let mut out = format!("Company facts for {} ({})", name, ticker);
    match value["facts"].as_object() {
        Some(taxonomies) if !taxonomies.is_empty() => {
            for (taxonomy, concepts) in taxonomies {
                let count = concepts.as_object().map_or(0, |c| c.len());
                out.push_str(&format!("\n  {}: {} concepts", taxonomy, count));
            }
        }
        _ => out.push_str(": no facts reported"),
    }
    out
}

pub struct EdgarCompanyFactsTool {
    client: EdgarClient,
}

impl EdgarCompanyFactsTool {
    pub fn new(client: EdgarClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for EdgarCompanyFactsTool {
    fn name(&self) -> &'static str {
        "get_edgar_company_facts"
    }

    fn description(&self) -> &'static str {
        "Every XBRL fact a company has reported to the SEC"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"ticker": {"type": "string"}},
            "required": ["ticker"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError> {
        let args: FactsArgs = parse_args(args)?;
        let ticker = validate::ticker(&args.ticker)?;

        let value = self.client.get_company_facts(&ticker).await?;
        Ok(ToolOutput::success(facts_summary(&ticker, &value), value))
    }
}
