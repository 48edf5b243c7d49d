//! LLM integration for stage-forge.
//!
//! [`client`] holds the transport: request/response types, the
//! [`LlmProvider`] trait and the OpenAI-compatible [`CompletionClient`].
//! [`generation`] layers the two response shapes the pipeline needs on top
//! of any provider.
//!
//! ```ignore
//! use std::sync::Arc;
//! use stage_forge::llm::{CompletionClient, GenerationClient, DEFAULT_API_BASE};
//!
//! let client = CompletionClient::new(DEFAULT_API_BASE, api_key, "openai/gpt-4.1")?;
//! let generator = GenerationClient::new(Arc::new(client), "openai/gpt-4.1");
//! let code = generator.generate_code(&prompt).await?;
//! ```

pub mod client;
pub mod generation;

pub use client::{
    Choice, CompletionClient, GenerationRequest, GenerationResponse, LlmProvider, Message,
    ResponseFormat, Usage, DEFAULT_API_BASE,
};
pub use generation::{GenerationClient, HintPayload, HintsPayload, GENERATION_TEMPERATURE};
