//! LLM integration for structured extraction.
//!
//! Provides a chat client abstraction over the hosted backends (OpenAI,
//! Vertex AI, Mistral, Anthropic) and the factory that builds the right one
//! for a model identifier.

pub(crate) mod anthropic;
pub(crate) mod mistral;
pub(crate) mod openai;
pub(crate) mod provider;
pub(crate) mod vertexai;

pub use provider::{
    resolve_env_var, ChatModel, ChatModelFactory, ChatResponse, GenerationSettings,
    LlmClientFactory, TEMPERATURE,
};
