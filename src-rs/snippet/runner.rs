use serde_json::{json, Value};
use tracing::{info, warn};

use super::catalog::prompt_for;
use super::types::Snippet;
use crate::executor::{RequestError, RequestExecutor};
use crate::flow::ParamSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnippetErrorKind {
    SyntaxError,
    RuntimeError,
    MissingResult,
}

#[derive(Debug, thiserror::Error)]
pub enum SnippetError {
    #[error("snippet syntax error: {message}")]
    Syntax { message: String },

    #[error("snippet execution error: {message}")]
    Runtime { message: String },

    #[error("snippet did not produce a result")]
    MissingResult,
}

impl SnippetError {
    pub fn kind(&self) -> SnippetErrorKind {
        match self {
            SnippetError::Syntax { .. } => SnippetErrorKind::SyntaxError,
            SnippetError::Runtime { .. } => SnippetErrorKind::RuntimeError,
            SnippetError::MissingResult => SnippetErrorKind::MissingResult,
        }
    }
}

/// Interprets snippets against one executor. The executor and the bound
/// parameters are the only things a snippet can reach.
pub struct SnippetRunner<'a> {
    executor: &'a dyn RequestExecutor,
}

impl<'a> SnippetRunner<'a> {
    pub fn new(executor: &'a dyn RequestExecutor) -> Self {
        Self { executor }
    }

    /// Validates `text` before anything runs; invalid text never reaches the executor.
    pub fn run(&self, text: &str, params: &ParamSet) -> Result<Value, SnippetError> {
        let snippet = Snippet::parse(text)?;
        self.run_snippet(&snippet, params)
    }

    pub fn run_snippet(&self, snippet: &Snippet, params: &ParamSet) -> Result<Value, SnippetError> {
        snippet.validate()?;
        let bound = snippet.bind(params);

        let missing = bound.unresolved_params();
        if let Some(first) = missing.first() {
            let message = prompt_for(first, Some(&bound));
            info!(missing = ?missing, "snippet is waiting for parameters");
            return Ok(json!({
                "status": "waiting_input",
                "message": message,
                "required_params": missing,
            }));
        }

        let binding = bound.result.as_ref().ok_or(SnippetError::MissingResult)?;

        match self.executor.execute(bound.method, &bound.path, bound.body.as_ref()) {
            Ok(response) => binding.extract(response).ok_or(SnippetError::MissingResult),
            Err(err @ RequestError::Http { .. }) => {
                warn!(error = %err, "API rejected the snippet request");
                let details = match &err {
                    RequestError::Http { body: Some(body), .. } => body.to_value(),
                    _ => Value::Null,
                };
                Ok(json!({
                    "status": "error",
                    "error": err.to_string(),
                    "details": details,
                }))
            }
            Err(err) => {
                warn!(error = %err, "snippet request failed");
                Err(SnippetError::Runtime {
                    message: err.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::executor::{ErrorBody, HttpMethod};
    use crate::snippet::templates;

    struct Recorder {
        calls: RefCell<Vec<(HttpMethod, String, Option<Value>)>>,
        reply: fn() -> Result<Value, RequestError>,
    }

    impl Recorder {
        fn new(reply: fn() -> Result<Value, RequestError>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                reply,
            }
        }
    }

    impl RequestExecutor for Recorder {
        fn execute(&self, method: HttpMethod, path: &str, data: Option<&Value>) -> Result<Value, RequestError> {
            self.calls
                .borrow_mut()
                .push((method, path.to_string(), data.cloned()));
            (self.reply)()
        }
    }

    fn ok_items() -> Result<Value, RequestError> {
        Ok(json!({"items": [{"id": 1}]}))
    }

    #[test]
    fn invalid_text_never_reaches_the_executor() {
        let recorder = Recorder::new(ok_items);
        let runner = SnippetRunner::new(&recorder);
        let err = runner.run("result = executor.execute_request(", &ParamSet::new()).unwrap_err();
        assert_eq!(err.kind(), SnippetErrorKind::SyntaxError);
        assert!(recorder.calls.borrow().is_empty());
    }

    #[test]
    fn unbound_parameters_yield_waiting_input() {
        let recorder = Recorder::new(ok_items);
        let runner = SnippetRunner::new(&recorder);
        let value = runner
            .run_snippet(&templates::create_database(), &ParamSet::new())
            .unwrap();
        assert_eq!(value["status"], "waiting_input");
        assert_eq!(value["required_params"], json!(["app_id", "db_name"]));
        assert!(recorder.calls.borrow().is_empty());
    }

    #[test]
    fn missing_result_binding_is_reported() {
        let recorder = Recorder::new(ok_items);
        let runner = SnippetRunner::new(&recorder);
        let err = runner.run(r#"{"method": "GET", "path": "apps"}"#, &ParamSet::new()).unwrap_err();
        assert_eq!(err.kind(), SnippetErrorKind::MissingResult);

        let err = runner
            .run(r#"{"method": "GET", "path": "apps", "result": {"pointer": "/nothing"}}"#, &ParamSet::new())
            .unwrap_err();
        assert_eq!(err.kind(), SnippetErrorKind::MissingResult);
    }

    #[test]
    fn pointer_result_is_extracted() {
        let recorder = Recorder::new(ok_items);
        let runner = SnippetRunner::new(&recorder);
        let mut params = ParamSet::new();
        params.set("app_id", "7");
        let value = runner.run_snippet(&templates::list_databases(), &params).unwrap();
        assert_eq!(value, json!([{"id": 1}]));
        let calls = recorder.calls.borrow();
        assert_eq!(calls[0].0, HttpMethod::Get);
        assert_eq!(calls[0].1, "apps/7/dbs");
        assert_eq!(calls[0].2, None);
    }

    #[test]
    fn http_rejection_becomes_domain_error_value() {
        fn not_found() -> Result<Value, RequestError> {
            Err(RequestError::Http {
                status: 404,
                body: Some(ErrorBody::Json(json!({"error": "not found"}))),
            })
        }
        let recorder = Recorder::new(not_found);
        let runner = SnippetRunner::new(&recorder);
        let value = runner
            .run(r#"{"method": "GET", "path": "apps/9", "result": "response"}"#, &ParamSet::new())
            .unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["details"], json!({"error": "not found"}));
    }

    #[test]
    fn transport_failure_is_a_runtime_error() {
        fn refused() -> Result<Value, RequestError> {
            Err(RequestError::Network {
                message: "connection refused".to_string(),
            })
        }
        let recorder = Recorder::new(refused);
        let runner = SnippetRunner::new(&recorder);
        let err = runner
            .run(r#"{"method": "GET", "path": "apps", "result": "response"}"#, &ParamSet::new())
            .unwrap_err();
        assert_eq!(err.kind(), SnippetErrorKind::RuntimeError);
        assert!(err.to_string().contains("connection refused"));
    }
}
