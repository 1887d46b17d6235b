use serde::Serialize;
use tracing::{debug, info, warn};

use super::params::ParamSet;
use crate::executor::RequestExecutor;
use crate::normalize::normalize;
use crate::result::ExecutionResult;
use crate::snippet::template::check_path_value;
use crate::snippet::{prompt_for, Snippet, SnippetError, SnippetRunner};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "param", rename_all = "snake_case")]
pub enum FlowState {
    Generating,
    AwaitingParam(String),
    ReadyToExecute,
    Executed,
    Failed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FlowEvent {
    NeedParam { name: String, prompt: String },
    Ready { snippet: Snippet },
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("no parameter is being collected")]
    NotAwaitingParam,

    #[error("no snippet is ready to execute")]
    NotReady,

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error(transparent)]
    Snippet(#[from] SnippetError),
}

/// Working state of one conversation goal.
#[derive(Clone, Debug, Default)]
pub struct GoalContext {
    pub snippet: Option<Snippet>,
    pub params: ParamSet,
}

/// Collects parameters for a snippet one at a time and runs it once confirmed.
#[derive(Debug)]
pub struct ParameterFlow {
    state: FlowState,
    goal: GoalContext,
}

impl Default for ParameterFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterFlow {
    pub fn new() -> Self {
        Self {
            state: FlowState::Generating,
            goal: GoalContext::default(),
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn pending_param(&self) -> Option<&str> {
        match &self.state {
            FlowState::AwaitingParam(name) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == FlowState::ReadyToExecute
    }

    pub fn snippet(&self) -> Option<&Snippet> {
        self.goal.snippet.as_ref()
    }

    pub fn params(&self) -> &ParamSet {
        &self.goal.params
    }

    /// Starts a new goal, dropping whatever the previous one collected.
    pub fn begin(&mut self, snippet: Snippet) -> FlowEvent {
        self.goal = GoalContext::default();
        self.advance(snippet)
    }

    /// Replaces the snippet of the current goal, keeping collected values.
    pub fn revise(&mut self, snippet: Snippet) -> FlowEvent {
        self.advance(snippet)
    }

    pub fn supply(&mut self, value: &str) -> Result<FlowEvent, FlowError> {
        let name = match &self.state {
            FlowState::AwaitingParam(name) => name.clone(),
            _ => return Err(FlowError::NotAwaitingParam),
        };
        let value = value.trim();
        let in_path = match &self.goal.snippet {
            Some(snippet) => snippet.path_params().contains(&name),
            None => return Err(FlowError::NotAwaitingParam),
        };
        if in_path {
            if let Err(reason) = check_path_value(value) {
                warn!(param = %name, %reason, "rejected path parameter");
                return Err(FlowError::InvalidValue { name, reason });
            }
        }
        let snippet = self.goal.snippet.take().ok_or(FlowError::NotAwaitingParam)?;
        debug!(param = %name, "parameter supplied");
        self.goal.params.set(&name, value);
        Ok(self.advance(snippet))
    }

    /// Runs the ready snippet. Callers invoke this only on explicit confirmation.
    pub fn execute(&mut self, executor: &dyn RequestExecutor) -> Result<ExecutionResult, FlowError> {
        if self.state != FlowState::ReadyToExecute {
            return Err(FlowError::NotReady);
        }
        let goal = std::mem::take(&mut self.goal);
        let snippet = goal.snippet.ok_or(FlowError::NotReady)?;

        let runner = SnippetRunner::new(executor);
        match runner.run_snippet(&snippet, &goal.params) {
            Ok(raw) => {
                self.state = FlowState::Executed;
                let result = normalize(raw);
                info!(success = result.is_success(), "snippet executed");
                Ok(result)
            }
            Err(err) => {
                self.state = FlowState::Failed;
                info!(error = %err, "snippet failed");
                Err(err.into())
            }
        }
    }

    /// Marks the goal as failed, e.g. when no snippet could be produced.
    pub fn fail(&mut self) {
        self.goal = GoalContext::default();
        self.state = FlowState::Failed;
    }

    pub fn abandon(&mut self) {
        self.goal = GoalContext::default();
        self.state = FlowState::Generating;
    }

    fn advance(&mut self, snippet: Snippet) -> FlowEvent {
        let bound = snippet.bind(&self.goal.params);
        match bound.unresolved_params().into_iter().next() {
            Some(name) => {
                let prompt = prompt_for(&name, Some(&bound));
                info!(param = %name, "waiting for parameter");
                self.state = FlowState::AwaitingParam(name.clone());
                self.goal.snippet = Some(bound);
                FlowEvent::NeedParam { name, prompt }
            }
            None => {
                info!("snippet ready to execute");
                self.state = FlowState::ReadyToExecute;
                self.goal.snippet = Some(bound.clone());
                FlowEvent::Ready { snippet: bound }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::{json, Value};

    use super::*;
    use crate::executor::{HttpMethod, RequestError};
    use crate::snippet::templates;

    #[derive(Default)]
    struct Recorder {
        bodies: RefCell<Vec<Option<Value>>>,
    }

    impl RequestExecutor for Recorder {
        fn execute(&self, _method: HttpMethod, _path: &str, data: Option<&Value>) -> Result<Value, RequestError> {
            self.bodies.borrow_mut().push(data.cloned());
            Ok(json!({"id": 10}))
        }
    }

    #[test]
    fn snippet_without_slots_is_ready_immediately() {
        let mut flow = ParameterFlow::new();
        let mut snippet = templates::get_app();
        snippet.path = "apps".to_string();
        assert!(matches!(flow.begin(snippet), FlowEvent::Ready { .. }));
        assert!(flow.is_ready());
    }

    #[test]
    fn supply_outside_awaiting_state_is_rejected() {
        let mut flow = ParameterFlow::new();
        assert!(matches!(flow.supply("42"), Err(FlowError::NotAwaitingParam)));
    }

    #[test]
    fn execute_requires_ready_state() {
        let mut flow = ParameterFlow::new();
        flow.begin(templates::get_app());
        let recorder = Recorder::default();
        assert!(matches!(flow.execute(&recorder), Err(FlowError::NotReady)));
        assert!(recorder.bodies.borrow().is_empty());
    }

    #[test]
    fn begin_discards_stale_parameters() {
        let mut flow = ParameterFlow::new();
        flow.begin(templates::get_app());
        flow.supply("42").unwrap();
        assert_eq!(flow.params().get("app_id"), Some("42"));
        flow.begin(templates::get_app());
        assert!(flow.params().is_empty());
        assert_eq!(flow.pending_param(), Some("app_id"));
    }

    #[test]
    fn dot_segments_are_refused_and_asked_again() {
        let mut flow = ParameterFlow::new();
        flow.begin(templates::list_databases());
        for value in ["..", ".", "   "] {
            let err = flow.supply(value).unwrap_err();
            assert!(matches!(err, FlowError::InvalidValue { ref name, .. } if name == "app_id"));
            assert_eq!(flow.pending_param(), Some("app_id"));
            assert!(flow.params().is_empty());
        }
        match flow.supply("42").unwrap() {
            FlowEvent::Ready { snippet } => assert_eq!(snippet.path, "apps/42/dbs"),
            other => panic!("expected ready, got {:?}", other),
        }
    }

    #[test]
    fn body_parameters_accept_dots() {
        let mut flow = ParameterFlow::new();
        let mut params = ParamSet::new();
        params.set("app_id", "42");
        flow.begin(templates::create_database().bind(&params));
        assert_eq!(flow.pending_param(), Some("db_name"));
        assert!(matches!(flow.supply("..").unwrap(), FlowEvent::Ready { .. }));
    }

    #[test]
    fn revise_keeps_collected_parameters() {
        let mut flow = ParameterFlow::new();
        flow.begin(templates::get_app());
        flow.supply("42").unwrap();
        let event = flow.revise(templates::list_databases());
        match event {
            FlowEvent::Ready { snippet } => assert_eq!(snippet.path, "apps/42/dbs"),
            other => panic!("expected ready, got {:?}", other),
        }
    }

    #[test]
    fn successful_execution_clears_the_goal() {
        let mut flow = ParameterFlow::new();
        flow.begin(templates::get_app());
        flow.supply("42").unwrap();
        let recorder = Recorder::default();
        let result = flow.execute(&recorder).unwrap();
        assert_eq!(result, ExecutionResult::success(json!({"id": 10})));
        assert_eq!(flow.state(), &FlowState::Executed);
        assert!(flow.snippet().is_none());
        assert!(flow.params().is_empty());
    }

    #[test]
    fn missing_result_moves_to_failed() {
        let mut flow = ParameterFlow::new();
        let mut snippet = templates::get_app();
        snippet.result = None;
        flow.begin(snippet);
        flow.supply("42").unwrap();
        let err = flow.execute(&Recorder::default()).unwrap_err();
        assert!(matches!(err, FlowError::Snippet(SnippetError::MissingResult)));
        assert_eq!(flow.state(), &FlowState::Failed);
        assert!(flow.snippet().is_none());
    }

    #[test]
    fn state_serializes_with_parameter_name() {
        let state = FlowState::AwaitingParam("app_id".to_string());
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"state": "awaiting_param", "param": "app_id"})
        );
        assert_eq!(
            serde_json::to_value(FlowState::ReadyToExecute).unwrap(),
            json!({"state": "ready_to_execute"})
        );
    }
}
