use async_trait::async_trait;
use finviz_core::FinvizError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of one tool invocation: human-readable text plus the records behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub text: String,
    pub data: Value,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>, data: Value) -> Self {
        Self {
            text: text.into(),
            data,
            is_error: false,
        }
    }

    /// Serialize `records` as the data payload.
    pub fn with_records<T: Serialize + ?Sized>(text: impl Into<String>, records: &T) -> Result<Self, FinvizError> {
        let data = serde_json::to_value(records).map_err(|e| FinvizError::Parse(e.to_string()))?;
        Ok(Self::success(text, data))
    }

    pub fn error(err: &FinvizError) -> Self {
        Self {
            text: format!("Error: {} ({})", err, err.user_hint()),
            data: Value::Null,
            is_error: true,
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON Schema of the accepted arguments.
    fn input_schema(&self) -> Value;
    async fn execute(&self, args: Value) -> Result<ToolOutput, FinvizError>;
}

/// Deserialize tool arguments. `null` means "all defaults".
pub fn parse_args<T: DeserializeOwned + Default>(args: Value) -> Result<T, FinvizError> {
    if args.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(args).map_err(|e| FinvizError::validation("arguments", e.to_string()))
}
