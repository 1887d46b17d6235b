pub mod client;
pub mod types;

pub use client::{join_url, SpiralExecutor};
pub use types::{ErrorBody, HttpMethod, RequestError, RequestErrorKind, RequestExecutor};
