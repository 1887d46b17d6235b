pub use crate::config::{AssistantConfig, EndpointConfig};
pub use crate::conversation::{Role, Turn};
pub use crate::flow::FlowState;
pub use crate::result::ExecutionResult;
pub use crate::session::{AssistantSession, SessionReply};

pub mod handlers;
pub mod server;
