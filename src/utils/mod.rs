//! Shared utility functions for stage-forge.
//!
//! This module provides common helpers used across modules, currently
//! extraction of code and JSON payloads from LLM responses.

pub mod fences;

pub use fences::{extract_code_block, extract_json_payload, find_matching_brace, first_fenced_block};
