use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::runner::SnippetError;
use super::template;
use crate::executor::HttpMethod;
use crate::flow::ParamSet;

/// A generated API call: method, path template, optional body template and
/// the binding that becomes the snippet's `result`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snippet {
    #[serde(default)]
    pub summary: String,
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamPrompt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultBinding>,
    /// `body` was written before `path`; slots are scanned in that order.
    #[serde(skip)]
    pub body_first: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamPrompt {
    pub name: String,
    pub prompt: String,
}

/// `"response"` for the whole body, `{"pointer": "/items"}` for a JSON pointer into it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultBinding {
    Response,
    Pointer(String),
}

impl ResultBinding {
    pub fn extract(&self, response: Value) -> Option<Value> {
        match self {
            ResultBinding::Response => Some(response),
            ResultBinding::Pointer(pointer) => response.pointer(pointer).cloned(),
        }
    }
}

impl Snippet {
    /// Parses and validates snippet text. Nothing is executed here.
    pub fn parse(text: &str) -> Result<Self, SnippetError> {
        let syntax = |err: serde_json::Error| SnippetError::Syntax {
            message: err.to_string(),
        };
        let raw: Value = serde_json::from_str(text.trim()).map_err(syntax)?;
        let position = |key: &str| raw.as_object().and_then(|map| map.keys().position(|k| k == key));
        let body_first = matches!((position("body"), position("path")), (Some(body), Some(path)) if body < path);
        let mut snippet: Snippet = serde_json::from_value(raw).map_err(syntax)?;
        snippet.body_first = body_first;
        snippet.validate()?;
        Ok(snippet)
    }

    pub fn validate(&self) -> Result<(), SnippetError> {
        let syntax = |message: String| SnippetError::Syntax { message };
        template::validate_path(&self.path).map_err(syntax)?;
        if let Some(body) = &self.body {
            template::validate_body(body).map_err(syntax)?;
        }
        for param in &self.params {
            if !template::is_identifier(&param.name) {
                return Err(syntax(format!("invalid parameter name {:?}", param.name)));
            }
        }
        if let Some(ResultBinding::Pointer(pointer)) = &self.result {
            if !pointer.is_empty() && !pointer.starts_with('/') {
                return Err(syntax(format!("result pointer must start with '/': {:?}", pointer)));
            }
        }
        Ok(())
    }

    /// Pretty JSON with `path` and `body` in the order they were written.
    pub fn to_text(&self) -> String {
        let value = match serde_json::to_value(self) {
            Ok(Value::Object(map)) if self.body_first => {
                let mut ordered = Map::with_capacity(map.len());
                let body = map.get("body").cloned();
                for (key, item) in map {
                    match key.as_str() {
                        "body" => continue,
                        "path" => {
                            if let Some(body) = &body {
                                ordered.insert("body".to_string(), body.clone());
                            }
                            ordered.insert(key, item);
                        }
                        _ => {
                            ordered.insert(key, item);
                        }
                    }
                }
                Value::Object(ordered)
            }
            Ok(value) => value,
            Err(_) => return String::new(),
        };
        serde_json::to_string_pretty(&value).unwrap_or_default()
    }

    /// Parameters still referenced by a slot, in the order they appear in the snippet text.
    pub fn unresolved_params(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.body_first {
            self.body_slots(&mut names);
            template::text_slots(&self.path, &mut names);
        } else {
            template::text_slots(&self.path, &mut names);
            self.body_slots(&mut names);
        }
        names
    }

    fn body_slots(&self, names: &mut Vec<String>) {
        if let Some(body) = &self.body {
            template::value_slots(body, names);
        }
    }

    /// Parameters that fill a path slot and so must be valid path segments.
    pub fn path_params(&self) -> Vec<String> {
        let mut names = Vec::new();
        template::text_slots(&self.path, &mut names);
        names
    }

    pub fn is_fully_bound(&self) -> bool {
        self.unresolved_params().is_empty()
    }

    /// Copy with every slot whose parameter is known replaced by its value.
    pub fn bind(&self, params: &ParamSet) -> Snippet {
        Snippet {
            summary: self.summary.clone(),
            method: self.method,
            path: template::bind_path(&self.path, params),
            body: self.body.as_ref().map(|body| template::bind_value(body, params)),
            params: self.params.clone(),
            result: self.result.clone(),
            body_first: self.body_first,
        }
    }
}
