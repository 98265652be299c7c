//! Extraction-script boundary contract
//!
//! An injected script self-guards against its own errors and always settles
//! to `{ success: true, data }` or `{ success: false, error, stack? }`.
//! That shape is validated exactly once, here; downstream code works with
//! the typed result and never re-checks.

use serde_json::Value;

use crate::error::CoreError;

/// Tagged result of running an injected extraction script.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Success { data: Value },
    Failure { message: String, trace: Option<String> },
}

impl ExtractionResult {
    /// Validates the raw value returned from the page against the boundary
    /// contract. Anything without an explicit boolean `success` tag is a
    /// protocol violation, not a failure result.
    pub fn from_script_value(value: Value) -> Result<Self, CoreError> {
        let obj = value.as_object().ok_or_else(|| CoreError::InvalidExtractionResult {
            detail: format!("expected an object, got {}", type_name(&value)),
        })?;

        match obj.get("success") {
            Some(Value::Bool(true)) => Ok(Self::Success {
                data: obj.get("data").cloned().unwrap_or(Value::Null),
            }),
            Some(Value::Bool(false)) => Ok(Self::Failure {
                message: obj
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("script reported failure without an error message")
                    .to_string(),
                trace: obj.get("stack").and_then(Value::as_str).map(str::to_string),
            }),
            Some(other) => Err(CoreError::InvalidExtractionResult {
                detail: format!("success tag is {}, not a boolean", type_name(other)),
            }),
            None => Err(CoreError::InvalidExtractionResult {
                detail: "missing success tag".to_string(),
            }),
        }
    }

    /// Unwraps the success payload, converting a script-reported failure
    /// into [`CoreError::ExtractionFailed`]. A result is never treated as
    /// successful unless the tag said so.
    pub fn into_data(self) -> Result<Value, CoreError> {
        match self {
            Self::Success { data } => Ok(data),
            Self::Failure { message, trace } => {
                if let Some(trace) = trace {
                    tracing::error!(%trace, "extraction script stack trace");
                }
                Err(CoreError::ExtractionFailed { message })
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
