//! CLI definition and entry point for stage-forge.
//!
//! There is a single command: generate every target language's solution and
//! hints for one challenge stage. Unknown flags are stripped before parsing
//! (see [`retain_known_args`]) so wrapper scripts can pass extra options.

use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tracing::{debug, info};

use crate::challenge::StageKind;
use crate::config::{
    default_lang_concurrency, parse_language_list, RunConfig, DEFAULT_MODEL, DEFAULT_REFS,
    DEFAULT_TASK_CONCURRENCY,
};
use crate::error::LlmError;
use crate::llm::{CompletionClient, DEFAULT_API_BASE};
use crate::orchestrator::StageOrchestrator;
use crate::progress::ProgressReporter;

/// Environment variable holding the completion API credential.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Exit code when the API credential is missing.
pub const EXIT_MISSING_CREDENTIAL: i32 = 2;

/// Exit code for every other failure.
pub const EXIT_FAILURE: i32 = 1;

/// Generate per-language solutions and hints for a challenge stage.
#[derive(Parser, Debug)]
#[command(name = "stage-forge")]
#[command(about = "Generate per-language challenge solutions and hints with an LLM")]
#[command(version)]
#[command(
    long_about = "stage-forge reads a stage description and reference solutions from \
challenges/<slug>/, asks an LLM for a solution and hints in every target language, and \
writes them back next to the references.\n\nThe API key is read from OPENROUTER_API_KEY.\n\n\
Example usage:\n  stage-forge --challenge-slug redis --stage-id 02-ping --refs python,go --targets rust"
)]
pub struct Cli {
    /// Directory containing `challenges/`.
    #[arg(long, default_value = ".")]
    pub project_root: String,

    /// Challenge slug, the directory name under `challenges/`.
    #[arg(long)]
    pub challenge_slug: String,

    /// Stage identifier, e.g. `02-ping`.
    #[arg(long)]
    pub stage_id: String,

    /// Stage description variant to read.
    #[arg(long, value_enum, default_value_t = StageKind::Base)]
    pub stage_kind: StageKind,

    /// Comma-separated reference languages, in priority order.
    #[arg(long, default_value = DEFAULT_REFS)]
    pub refs: String,

    /// Comma-separated target languages. Defaults to every language under
    /// `solutions/` that is not a reference.
    #[arg(long)]
    pub targets: Option<String>,

    /// LLM model used for every request.
    #[arg(long, env = "STAGE_FORGE_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Maximum target languages processed at once. Values <= 0 behave as 1.
    #[arg(
        long,
        env = "STAGE_FORGE_LANG_CONCURRENCY",
        allow_negative_numbers = true,
        default_value_t = default_lang_concurrency()
    )]
    pub lang_concurrency: i64,

    /// Maximum generation requests per language at once. Values <= 0 behave as 1.
    #[arg(
        long,
        env = "STAGE_FORGE_TASK_CONCURRENCY",
        allow_negative_numbers = true,
        default_value_t = DEFAULT_TASK_CONCURRENCY
    )]
    pub task_concurrency: i64,

    /// Log intended filesystem writes instead of performing them.
    #[arg(
        long,
        env = "STAGE_FORGE_DRY_RUN",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub dry_run: bool,

    /// Base URL of the OpenAI-compatible completion API.
    #[arg(long, env = "STAGE_FORGE_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Resolves the parsed flags into a run configuration.
    ///
    /// An empty `--targets` list means the targets are derived.
    pub fn to_run_config(&self) -> RunConfig {
        let mut config = RunConfig::new(
            &self.project_root,
            self.challenge_slug.trim(),
            self.stage_id.trim(),
        )
        .with_stage_kind(self.stage_kind)
        .with_refs(parse_language_list(&self.refs))
        .with_model(self.model.trim())
        .with_api_base(self.api_base.trim())
        .with_concurrency(self.lang_concurrency, self.task_concurrency)
        .with_dry_run(self.dry_run);

        if let Some(targets) = self
            .targets
            .as_deref()
            .map(parse_language_list)
            .filter(|targets| !targets.is_empty())
        {
            config = config.with_targets(targets);
        }
        config
    }
}

/// Drops every argument that is not a known flag or a known flag's value.
///
/// The first element (the program name) is always kept.
pub fn retain_known_args<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let command = Cli::command();
    let mut args = args.into_iter().map(Into::into);
    let mut kept: Vec<String> = args.next().into_iter().collect();
    let mut expecting_value = false;

    for arg in args {
        if expecting_value {
            expecting_value = false;
            kept.push(arg);
            continue;
        }
        match known_flag(&command, &arg) {
            Some(takes_value) => {
                expecting_value = takes_value;
                kept.push(arg);
            }
            None => debug!(arg = %arg, "Ignoring unknown argument"),
        }
    }
    kept
}

/// For a known flag, whether the next argument is its value.
fn known_flag(command: &clap::Command, arg: &str) -> Option<bool> {
    if let Some(long) = arg.strip_prefix("--") {
        let (name, inline_value) = match long.split_once('=') {
            Some((name, _)) => (name, true),
            None => (long, false),
        };
        if name == "help" || name == "version" {
            return Some(false);
        }
        return command
            .get_arguments()
            .find(|a| a.get_long() == Some(name))
            .map(|a| a.get_action().takes_values() && !inline_value);
    }

    let mut chars = arg.strip_prefix('-')?.chars();
    let short = chars.next()?;
    if short == 'h' || short == 'V' {
        return Some(false);
    }
    let attached = !chars.as_str().is_empty();
    command
        .get_arguments()
        .find(|a| a.get_short() == Some(short))
        .map(|a| a.get_action().takes_values() && !attached)
}

/// Parse command-line arguments, ignoring unknown flags.
pub fn parse_cli() -> Cli {
    let args = std::env::args_os().map(|a| a.to_string_lossy().into_owned());
    Cli::parse_from(retain_known_args(args))
}

/// Run the CLI by parsing arguments and executing the command.
///
/// For more control over logging initialization, use `parse_cli()` and `run_with_cli()`.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
///
/// Fails when the credential is missing, on a fatal generation error, or
/// when any target language failed (after the summary is printed).
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let api_key = std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or(LlmError::MissingApiKey)?;

    let config = cli.to_run_config();
    config.validate()?;

    let client = CompletionClient::new(&config.api_base, api_key, &config.model)?;
    info!(
        model = %client.default_model(),
        api_base = %client.api_base(),
        api_key = %client.api_key_masked(),
        "Using completion API"
    );

    let orchestrator = StageOrchestrator::new(config, Arc::new(client), ProgressReporter::stdout());
    let summary = orchestrator.run().await?;

    if summary.has_failures() {
        anyhow::bail!(
            "{} of {} target languages failed",
            summary.failed,
            summary.languages.len()
        );
    }
    Ok(())
}

/// Process exit code for an error returned by [`run_with_cli`].
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<LlmError>() {
        Some(LlmError::MissingApiKey) => EXIT_MISSING_CREDENTIAL,
        _ => EXIT_FAILURE,
    }
}
