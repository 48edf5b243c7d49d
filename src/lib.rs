//! stage-forge: LLM-driven generation of per-language challenge solutions and hints.
//!
//! Given a challenge stage description and reference solutions in a few
//! languages, this library asks a completion API for a solution and a set
//! of hints in every other language, and writes them into the challenge's
//! directory layout.

pub mod challenge;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod languages;
pub mod llm;
pub mod orchestrator;
pub mod pool;
pub mod progress;
pub mod prompts;
pub mod utils;

// Re-export commonly used error types
pub use error::{ConfigError, GenerationError, LlmError, RepositoryError};
