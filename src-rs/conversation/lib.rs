pub mod log;
pub mod types;

pub use log::Conversation;
pub use types::{Role, Turn};
