//! LLM provider adapters.

mod anthropic;

pub use anthropic::{AnthropicBackend, AnthropicBackendBuilder};
