//! Chat completion client for grounded Q&A.

mod api;
pub mod prompts;
mod provider;

pub use api::LlmApiClient;
pub use provider::{CompletionOptions, LlmProvider};
