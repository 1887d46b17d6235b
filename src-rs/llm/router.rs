use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::types::{CompletionRequest, LLMResponse, ProviderAdapter, ProviderError};

pub struct LLMRouter {
    default_provider: String,
    providers: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl LLMRouter {
    pub fn new(default_provider: &str) -> Self {
        Self {
            default_provider: default_provider.to_string(),
            providers: HashMap::new(),
        }
    }

    pub fn register_provider(&mut self, name: &str, adapter: Arc<dyn ProviderAdapter>) {
        self.providers.insert(name.to_string(), adapter);
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn complete(&self, request: CompletionRequest) -> Result<LLMResponse, ProviderError> {
        let provider = request
            .provider
            .clone()
            .unwrap_or_else(|| self.default_provider.clone());
        let adapter = self.providers.get(&provider).ok_or_else(|| {
            ProviderError::new("provider_missing", &format!("provider not registered: {}", provider), false)
        })?;
        debug!(%provider, messages = request.messages.len(), "routing completion request");
        adapter.complete(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl ProviderAdapter for Echo {
        fn complete(&self, request: CompletionRequest) -> Result<LLMResponse, ProviderError> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(LLMResponse { content: last, raw: None })
        }
    }

    #[test]
    fn routes_to_default_provider() {
        let mut router = LLMRouter::new("echo");
        router.register_provider("echo", Arc::new(Echo));
        let request = CompletionRequest {
            messages: vec![crate::llm::Message::user("hi")],
            ..CompletionRequest::default()
        };
        assert_eq!(router.complete(request).unwrap().content, "hi");
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let router = LLMRouter::new("missing");
        let err = router.complete(CompletionRequest::default()).unwrap_err();
        assert_eq!(err.code, "provider_missing");
    }
}
