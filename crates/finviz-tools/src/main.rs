//! finviz-tools: run one screener, fundamentals, news, group or filings tool from the command line.
//!
//! Usage:
//!   finviz-tools list
//!   finviz-tools schema <tool>
//!   finviz-tools <tool> ['<json arguments>'] [--json]
//!
//! Examples:
//!   finviz-tools uptrend_screener
//!   finviz-tools get_stock_fundamentals '{"ticker": "AAPL", "data_fields": ["pe_ratio", "market_cap"]}'
//!   finviz-tools get_edgar_filings '{"ticker": "MSFT", "form_types": ["10-K"]}' --json

use edgar_client::EdgarClient;
use finviz_client::FinvizClient;
use finviz_tools::ToolRegistry;
use serde_json::Value;

const DEFAULT_LOG_FILTER: &str = "finviz_tools=info,finviz_client=info,edgar_client=info";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| std::env::var("LOG_LEVEL").map(tracing_subscriber::EnvFilter::new))
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn usage(registry: &ToolRegistry) -> String {
    format!(
        "Usage: finviz-tools list | schema <tool> | <tool> ['<json arguments>'] [--json]\n\nTools:\n  {}",
        registry.names().join("\n  ")
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let registry = ToolRegistry::new(FinvizClient::from_env()?, EdgarClient::from_env()?);

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let emit_json = args.iter().any(|a| a == "--json");
    args.retain(|a| a != "--json");

    let Some(command) = args.first() else {
        eprintln!("{}", usage(&registry));
        std::process::exit(2);
    };

    match command.as_str() {
        "list" => {
            for descriptor in registry.list_tools() {
                println!(
                    "{:<38} {}",
                    descriptor["name"].as_str().unwrap_or_default(),
                    descriptor["description"].as_str().unwrap_or_default()
                );
            }
        }
        "schema" => {
            let name = args.get(1).map(String::as_str).unwrap_or_default();
            match registry.get(name) {
                Some(tool) => println!("{}", serde_json::to_string_pretty(&tool.input_schema())?),
                None => {
                    eprintln!("unknown tool '{}'\n\n{}", name, usage(&registry));
                    std::process::exit(2);
                }
            }
        }
        "-h" | "--help" | "help" => println!("{}", usage(&registry)),
        name => {
            let arguments: Value = match args.get(1) {
                Some(raw) => serde_json::from_str(raw)
                    .map_err(|e| anyhow::anyhow!("arguments must be a JSON object: {}", e))?,
                None => Value::Null,
            };

            let output = registry.call(name, arguments).await;
            if emit_json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if output.is_error {
                eprintln!("{}", output.text);
            } else {
                println!("{}", output.text);
            }
            if output.is_error {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
