use tracing::{debug, info};

use crate::llm::{CompletionRequest, LLMRouter, Message, ProviderError};
use crate::snippet::templates;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("code generation failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("code generation returned no snippet")]
    Empty,
}

/// Produces snippet text from an instruction, optionally revising an earlier snippet.
pub trait CodeGenerator: Send {
    fn generate(&self, instruction: &str, previous: Option<&str>) -> Result<String, GenerationError>;
}

pub struct LlmSnippetGenerator {
    router: LLMRouter,
    model: Option<String>,
    temperature: f64,
    max_tokens: u32,
}

impl LlmSnippetGenerator {
    pub fn new(router: LLMRouter, model: Option<String>, temperature: f64, max_tokens: u32) -> Self {
        Self {
            router,
            model,
            temperature,
            max_tokens,
        }
    }
}

impl CodeGenerator for LlmSnippetGenerator {
    fn generate(&self, instruction: &str, previous: Option<&str>) -> Result<String, GenerationError> {
        let user = match previous {
            Some(snippet) => format!(
                "Revise this snippet according to the request.\n\nSnippet:\n{}\n\nRequest:\n{}",
                snippet, instruction
            ),
            None => instruction.to_string(),
        };
        let request = CompletionRequest {
            messages: vec![Message::system(&system_prompt()), Message::user(&user)],
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            model: self.model.clone(),
            provider: None,
        };
        info!(revising = previous.is_some(), "requesting snippet generation");
        let response = self.router.complete(request)?;
        debug!(chars = response.content.len(), "generation reply received");
        let text = strip_code_fence(&response.content);
        if text.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text)
    }
}

pub fn system_prompt() -> String {
    format!(
        r#"You are a SPIRAL API expert. Turn the user's request into ONE snippet that calls the SPIRAL API.

Reply with a single JSON object and nothing else:
- "summary": short description for the user, in Japanese
- "method": one of GET, POST, PUT, PATCH, DELETE
- "path": path relative to the API endpoint, parameters as {{name}} slots, e.g. "apps/{{app_id}}/dbs"
- "body": optional JSON request body
- "params": optional list of {{"name": ..., "prompt": ...}} with Japanese prompts for parameters you introduce
- "result": "response" for the whole response, or {{"pointer": "/json/pointer"}} for part of it

Rules:
1. Never invent values the user did not give. Use a slot instead: {{"$param": "name"}} in the body,
   {{name}} in the path, or {{"$format": "text with {{name}}"}} for composed strings.
2. Parameter names are ASCII identifiers (app_id, db_name, db_id, record_id, ...).
3. When a value may be generated automatically, wrap it as
   {{"$auto": {{"param": "name", "then": <sample values>, "else": <template using the param>}}}}.
   The user answers 「自動生成」 to choose "then".
4. Always set "result".
5. Use only ASCII in keys and paths; Japanese is allowed in summary, prompts and sample values.

Example (create a database):
{}"#,
        templates::create_database().to_text()
    )
}

/// Removes a surrounding Markdown code fence, if the model added one.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let without_open = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return String::new(),
    };
    without_open
        .trim_end()
        .trim_end_matches("```")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::llm::{LLMResponse, ProviderAdapter};
    use crate::snippet::Snippet;

    struct Canned {
        reply: String,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ProviderAdapter for Canned {
        fn complete(&self, request: CompletionRequest) -> Result<LLMResponse, ProviderError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request);
            }
            Ok(LLMResponse {
                content: self.reply.clone(),
                raw: None,
            })
        }
    }

    fn generator(reply: &str) -> (LlmSnippetGenerator, Arc<Canned>) {
        let canned = Arc::new(Canned {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let mut router = LLMRouter::new("canned");
        router.register_provider("canned", canned.clone());
        (LlmSnippetGenerator::new(router, None, 0.7, 1500), canned)
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```"), "");
    }

    #[test]
    fn example_in_prompt_is_a_valid_snippet() {
        let prompt = system_prompt();
        let start = prompt.find("Example (create a database):\n").unwrap();
        let example = &prompt[start + "Example (create a database):\n".len()..];
        assert!(Snippet::parse(example).is_ok());
    }

    #[test]
    fn revision_includes_previous_snippet() {
        let (generator, canned) = generator("```json\n{\"method\": \"GET\", \"path\": \"apps\"}\n```");
        let text = generator.generate("use POST", Some("{\"method\": \"GET\"}")).unwrap();
        assert_eq!(text, "{\"method\": \"GET\", \"path\": \"apps\"}");
        let seen = canned.seen.lock().unwrap();
        assert_eq!(seen[0].messages.len(), 2);
        assert!(seen[0].messages[1].content.contains("{\"method\": \"GET\"}"));
        assert_eq!(seen[0].max_tokens, Some(1500));
    }

    #[test]
    fn empty_reply_is_an_error() {
        let (generator, _) = generator("   ");
        assert!(matches!(generator.generate("hi", None), Err(GenerationError::Empty)));
    }
}
