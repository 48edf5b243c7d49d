//! Command-line interface for stage-forge.
//!
//! Parses flags and environment overrides, checks the API credential, and
//! hands a resolved run configuration to the orchestrator.

mod commands;

pub use commands::{
    exit_code, parse_cli, retain_known_args, run, run_with_cli, Cli, API_KEY_ENV, EXIT_FAILURE,
    EXIT_MISSING_CREDENTIAL,
};
