use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{AssistantConfig, EndpointConfig};
use crate::conversation::{Conversation, Turn};
use crate::executor::{RequestError, RequestExecutor, SpiralExecutor};
use crate::flow::{FlowError, FlowEvent, FlowState, ParameterFlow};
use crate::generator::CodeGenerator;
use crate::helpers::build_generator;
use crate::result::ExecutionResult;
use crate::snippet::{prompt_for, Snippet};

pub type ExecutorFactory =
    Arc<dyn Fn(&EndpointConfig) -> Result<Box<dyn RequestExecutor>, RequestError> + Send + Sync>;

/// What one input or confirmation added to the conversation.
#[derive(Clone, Debug, Serialize)]
pub struct SessionReply {
    pub turns: Vec<Turn>,
    pub state: FlowState,
    pub pending_param: Option<String>,
}

/// One conversation: code generation, parameter collection and confirmed execution.
pub struct AssistantSession {
    pub config: AssistantConfig,
    generator: Box<dyn CodeGenerator>,
    executor_factory: ExecutorFactory,
    flow: ParameterFlow,
    log: Conversation,
}

impl AssistantSession {
    pub fn new(config: AssistantConfig, generator: Box<dyn CodeGenerator>) -> Self {
        let limit = config.log_body_limit;
        let factory: ExecutorFactory = Arc::new(move |endpoint: &EndpointConfig| {
            let executor = SpiralExecutor::new(endpoint.clone())?.with_log_body_limit(limit);
            Ok(Box::new(executor) as Box<dyn RequestExecutor>)
        });
        Self {
            config,
            generator,
            executor_factory: factory,
            flow: ParameterFlow::new(),
            log: Conversation::new(),
        }
    }

    /// Session backed by the LLM providers found in the environment.
    pub fn from_config(config: AssistantConfig) -> Result<Self, String> {
        let generator = build_generator(&config)?;
        Ok(Self::new(config, Box::new(generator)))
    }

    pub fn with_executor_factory(mut self, factory: ExecutorFactory) -> Self {
        self.executor_factory = factory;
        self
    }

    pub fn state(&self) -> &FlowState {
        self.flow.state()
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.config.endpoint
    }

    pub fn set_endpoint(&mut self, base_url: Option<String>, api_key: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.config.endpoint.base_url = url.trim().to_string();
        }
        if let Some(key) = api_key {
            self.config.endpoint.api_key = key.trim().to_string();
        }
        info!(endpoint = ?self.config.endpoint, "endpoint updated");
    }

    pub fn history(&self, limit: usize) -> Vec<Turn> {
        self.log.list(limit)
    }

    pub fn reset(&mut self) {
        self.flow.abandon();
        self.log.clear();
    }

    pub fn handle_input(&mut self, text: &str) -> SessionReply {
        let text = text.trim();
        if text.is_empty() {
            return self.reply(vec![Conversation::assistant("メッセージを入力してください。")]);
        }

        let mut turns = vec![self.log.push(Conversation::user(text))];
        match self.flow.state().clone() {
            FlowState::AwaitingParam(name) => match self.flow.supply(text) {
                Ok(event) => turns.push(self.render_event(event)),
                Err(FlowError::InvalidValue { reason, .. }) => {
                    let prompt = prompt_for(&name, self.flow.snippet());
                    let content = format!("この値は使用できません ({})。\n{}", reason, prompt);
                    turns.push(self.log.push(Conversation::assistant(&content)));
                }
                Err(err) => {
                    warn!(param = %name, error = %err, "could not store parameter");
                    turns.push(self.log.push(Conversation::assistant(&format!("エラーが発生しました: {}", err))));
                }
            },
            FlowState::ReadyToExecute => {
                let previous = self.flow.snippet().map(Snippet::to_text);
                self.log.prune_ready();
                turns.push(self.generate(text, previous));
            }
            _ => {
                self.flow.abandon();
                turns.push(self.generate(text, None));
            }
        }
        self.reply(turns)
    }

    /// Runs the pending snippet. This is the explicit confirmation step.
    pub fn confirm(&mut self) -> SessionReply {
        if !self.flow.is_ready() {
            let turn = self.log.push(Conversation::assistant("実行できるスニペットがありません。"));
            return self.reply(vec![turn]);
        }
        let snippet_text = self.flow.snippet().map(Snippet::to_text);
        self.log.prune_ready();

        let executor = match (self.executor_factory)(&self.config.endpoint) {
            Ok(executor) => executor,
            Err(err) => {
                self.flow.fail();
                let turn = Conversation::assistant_with(&could_not_run(&err.to_string()), snippet_text, None, false);
                let turn = self.log.push(turn);
                return self.reply(vec![turn]);
            }
        };

        let turn = match self.flow.execute(executor.as_ref()) {
            Ok(result) => {
                let content = match &result {
                    ExecutionResult::Success { .. } => "コードを生成し実行しました。".to_string(),
                    ExecutionResult::Error { message, .. } => {
                        format!("操作は実行されましたが、APIがエラーを返しました: {}", message)
                    }
                    ExecutionResult::WaitingInput { message, .. } => message.clone(),
                };
                Conversation::assistant_with(&content, snippet_text, Some(result), false)
            }
            Err(err) => Conversation::assistant_with(&could_not_run(&err.to_string()), snippet_text, None, false),
        };
        let turn = self.log.push(turn);
        self.reply(vec![turn])
    }

    fn generate(&mut self, instruction: &str, previous: Option<String>) -> Turn {
        let revising = previous.is_some();
        let text = match self.generator.generate(instruction, previous.as_deref()) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "snippet generation failed");
                self.flow.fail();
                return self.log.push(Conversation::assistant(&format!("エラーが発生しました: {}", err)));
            }
        };
        let snippet = match Snippet::parse(&text) {
            Ok(snippet) => snippet,
            Err(err) => {
                warn!(error = %err, "generated snippet was rejected");
                self.flow.fail();
                let turn = Conversation::assistant_with(&could_not_run(&err.to_string()), Some(text), None, false);
                return self.log.push(turn);
            }
        };
        let event = if revising {
            self.flow.revise(snippet)
        } else {
            self.flow.begin(snippet)
        };
        self.render_event(event)
    }

    fn render_event(&mut self, event: FlowEvent) -> Turn {
        let turn = match event {
            FlowEvent::NeedParam { prompt, .. } => {
                let snippet = self.flow.snippet();
                let waiting = ExecutionResult::WaitingInput {
                    message: prompt.clone(),
                    required_params: snippet.map(Snippet::unresolved_params).unwrap_or_default(),
                };
                Conversation::assistant_with(&prompt, snippet.map(Snippet::to_text), Some(waiting), false)
            }
            FlowEvent::Ready { snippet } => {
                let mut content = "スニペットの準備ができました。実行する場合は確認してください。".to_string();
                if !snippet.summary.is_empty() {
                    content = format!("{}\n{}", snippet.summary, content);
                }
                Conversation::assistant_with(&content, Some(snippet.to_text()), None, true)
            }
        };
        self.log.push(turn)
    }

    fn reply(&self, turns: Vec<Turn>) -> SessionReply {
        SessionReply {
            turns,
            state: self.flow.state().clone(),
            pending_param: self.flow.pending_param().map(str::to_string),
        }
    }
}

fn could_not_run(message: &str) -> String {
    format!("操作を実行できませんでした: {}", message)
}
