pub mod catalog;
pub mod runner;
pub mod template;
pub mod templates;
pub mod types;

pub use catalog::{is_auto_sentinel, prompt_for, AUTO_GENERATE_SENTINELS};
pub use runner::{SnippetError, SnippetErrorKind, SnippetRunner};
pub use types::{ParamPrompt, ResultBinding, Snippet};
