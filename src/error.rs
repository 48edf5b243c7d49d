//! Error types for stage-forge operations.
//!
//! Defines error types for each subsystem:
//! - LLM API interactions
//! - Challenge repository reads and writes
//! - Per-language generation pipelines
//! - Run configuration

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: OPENROUTER_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("LLM response contained no content")]
    EmptyResponse,
}

/// Errors that can occur while reading or writing the challenge directory layout.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Stage description '{stage_id}' not found under {dir}")]
    StageDescriptionNotFound { stage_id: String, dir: PathBuf },

    #[error("Starter template for '{language}' not found at {path}")]
    StarterNotFound { language: String, path: PathBuf },

    #[error("IO error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RepositoryError {
    /// Wraps an I/O error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RepositoryError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that can occur while generating artifacts for one target language.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Generated hints for '{language}' cannot cover the fixed titles: expected {expected}, got {actual}")]
    HintTitleMismatch {
        language: String,
        expected: usize,
        actual: usize,
    },
}

impl GenerationError {
    /// Whether this error must abort the whole run rather than a single language.
    ///
    /// Missing required inputs, filesystem failures and configuration
    /// problems are fatal; backend failures only affect the language that
    /// triggered them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GenerationError::Repository(_) | GenerationError::Config(_)
        )
    }
}

/// Errors that can occur while resolving the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required value: {0}")]
    MissingValue(&'static str),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("No target languages left to generate for")]
    NoTargets,
}
