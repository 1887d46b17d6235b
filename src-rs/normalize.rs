//! Turns whatever a snippet produced into an [`ExecutionResult`].
//!
//! A string that parses as JSON is normalized as the parsed value; any other
//! string is reported as `Success` with the string itself as data.

use serde_json::{Map, Value};

use crate::result::ExecutionResult;

pub const DEFAULT_WAITING_MESSAGE: &str = "入力待ち";

pub fn normalize(raw: Value) -> ExecutionResult {
    match raw {
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed) => normalize_value(parsed),
            Err(_) => ExecutionResult::success(Value::String(text)),
        },
        other => normalize_value(other),
    }
}

fn normalize_value(raw: Value) -> ExecutionResult {
    match raw {
        Value::Object(map) => match normalize_object(&map) {
            Ok(Some(result)) => result,
            Ok(None) => ExecutionResult::success(Value::Object(map)),
            Err(cause) => ExecutionResult::error(format!("formatting error: {}", cause)),
        },
        other => ExecutionResult::success(other),
    }
}

fn normalize_object(map: &Map<String, Value>) -> Result<Option<ExecutionResult>, String> {
    if let Some(error) = map.get("error").filter(|value| is_truthy(value)) {
        let message = match error {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        return Ok(Some(ExecutionResult::Error {
            message,
            details: map.get("details").filter(|value| !value.is_null()).cloned(),
        }));
    }

    if map.get("status").and_then(|v| v.as_str()) == Some("waiting_input") {
        let message = match map.get("message") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => DEFAULT_WAITING_MESSAGE.to_string(),
            Some(other) => other.to_string(),
        };
        let required_params = match map.get("required_params") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| format!("required_params entry is not a string: {}", item))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => return Err(format!("required_params is not a list: {}", other)),
        };
        return Ok(Some(ExecutionResult::WaitingInput {
            message,
            required_params,
        }));
    }

    Ok(None)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(num) => num.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
