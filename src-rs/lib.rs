pub mod config;
pub mod generator;
pub mod helpers;
pub mod normalize;
pub mod result;
pub mod session;
pub mod telemetry;

#[path = "conversation/lib.rs"]
pub mod conversation;
#[path = "executor/lib.rs"]
pub mod executor;
#[path = "flow/lib.rs"]
pub mod flow;
#[path = "llm/lib.rs"]
pub mod llm;
#[path = "snippet/lib.rs"]
pub mod snippet;
#[path = "api/lib.rs"]
pub mod api;

pub use config::{AssistantConfig, EndpointConfig};
pub use normalize::normalize;
pub use result::ExecutionResult;
pub use session::{AssistantSession, SessionReply};
