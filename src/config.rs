//! Run configuration for the stage orchestrator.
//!
//! [`RunConfig`] is the resolved form of the command-line flags and their
//! environment overrides. The CLI layer builds it; the orchestrator only
//! reads it.

use std::path::PathBuf;

use crate::challenge::StageKind;
use crate::error::ConfigError;
use crate::llm::DEFAULT_API_BASE;

/// Default model for every generation request.
pub const DEFAULT_MODEL: &str = "openai/gpt-4.1";

/// Default reference languages.
pub const DEFAULT_REFS: &str = "python";

/// Default width of the per-language pool (solution and hints).
pub const DEFAULT_TASK_CONCURRENCY: i64 = 2;

/// Default width of the outer pool over target languages: twice the CPU count.
pub fn default_lang_concurrency() -> i64 {
    i64::try_from(num_cpus::get().saturating_mul(2)).unwrap_or(i64::MAX)
}

/// Configuration for a single generation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory containing `challenges/`.
    pub project_root: PathBuf,
    /// Challenge slug, e.g. `redis`.
    pub challenge_slug: String,
    /// Stage identifier, e.g. `03-ping`.
    pub stage_id: String,
    /// Which stage description variant to read.
    pub stage_kind: StageKind,
    /// Reference languages, in priority order.
    pub refs: Vec<String>,
    /// Explicit target languages; derived from the repository when `None`.
    pub targets: Option<Vec<String>>,
    /// Model identifier sent with every request.
    pub model: String,
    /// Base URL of the completion API.
    pub api_base: String,
    /// Outer pool width. Values <= 0 behave as 1.
    pub lang_concurrency: i64,
    /// Inner pool width. Values <= 0 behave as 1.
    pub task_concurrency: i64,
    /// Log intended writes instead of touching the filesystem.
    pub dry_run: bool,
}

impl RunConfig {
    /// Creates a configuration with default values for everything but the stage.
    pub fn new(
        project_root: impl Into<PathBuf>,
        challenge_slug: impl Into<String>,
        stage_id: impl Into<String>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            challenge_slug: challenge_slug.into(),
            stage_id: stage_id.into(),
            stage_kind: StageKind::default(),
            refs: parse_language_list(DEFAULT_REFS),
            targets: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            lang_concurrency: default_lang_concurrency(),
            task_concurrency: DEFAULT_TASK_CONCURRENCY,
            dry_run: false,
        }
    }

    /// Sets the stage description variant.
    pub fn with_stage_kind(mut self, stage_kind: StageKind) -> Self {
        self.stage_kind = stage_kind;
        self
    }

    /// Sets the reference languages.
    pub fn with_refs(mut self, refs: Vec<String>) -> Self {
        self.refs = refs;
        self
    }

    /// Sets explicit target languages.
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = Some(targets);
        self
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the completion API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sets both pool widths.
    pub fn with_concurrency(mut self, lang_concurrency: i64, task_concurrency: i64) -> Self {
        self.lang_concurrency = lang_concurrency;
        self.task_concurrency = task_concurrency;
        self
    }

    /// Enables or disables dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required value is empty or when the slug,
    /// stage id or a language would escape the challenge directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.challenge_slug.trim().is_empty() {
            return Err(ConfigError::MissingValue("challenge-slug"));
        }
        if self.stage_id.trim().is_empty() {
            return Err(ConfigError::MissingValue("stage-id"));
        }
        if self.refs.is_empty() {
            return Err(ConfigError::MissingValue("refs"));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingValue("model"));
        }

        for (key, value) in [
            ("challenge-slug", &self.challenge_slug),
            ("stage-id", &self.stage_id),
        ] {
            if !is_plain_path_component(value) {
                return Err(ConfigError::InvalidValue {
                    key,
                    message: format!("'{}' must be a single path component", value),
                });
            }
        }

        let languages = self
            .refs
            .iter()
            .map(|language| ("refs", language))
            .chain(self.targets.iter().flatten().map(|language| ("targets", language)));
        for (key, language) in languages {
            if !is_plain_path_component(language) {
                return Err(ConfigError::InvalidValue {
                    key,
                    message: format!("language '{}' must be a single path component", language),
                });
            }
        }

        Ok(())
    }

    /// Resolves the languages to generate for.
    ///
    /// Explicit targets are used as given. Otherwise every language in
    /// `available` that is not a reference language is a target; names that
    /// are not a single path component are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoTargets` when the result is empty.
    pub fn resolve_targets(&self, available: Vec<String>) -> Result<Vec<String>, ConfigError> {
        let targets = match &self.targets {
            Some(explicit) => explicit.clone(),
            None => available
                .into_iter()
                .filter(|language| {
                    is_plain_path_component(language) && !self.refs.contains(language)
                })
                .collect(),
        };
        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        Ok(targets)
    }
}

/// Parses a comma-separated language list.
///
/// Items are trimmed and lowercased; empty items and repeats are dropped,
/// keeping the first occurrence.
pub fn parse_language_list(csv: &str) -> Vec<String> {
    let mut languages: Vec<String> = Vec::new();
    for item in csv.split(',') {
        let language = item.trim().to_lowercase();
        if !language.is_empty() && !languages.contains(&language) {
            languages.push(language);
        }
    }
    languages
}

fn is_plain_path_component(value: &str) -> bool {
    !value.trim().is_empty() && value != "." && value != ".." && !value.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RunConfig {
        RunConfig::new("/tmp/project", "redis", "02-ping")
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.refs, vec!["python".to_string()]);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.stage_kind, StageKind::Base);
        assert_eq!(config.task_concurrency, 2);
        assert!(config.lang_concurrency >= 2);
        assert!(config.targets.is_none());
        assert!(!config.dry_run);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_language_list() {
        assert_eq!(
            parse_language_list(" Python, go,,rust ,GO, python"),
            vec!["python".to_string(), "go".to_string(), "rust".to_string()]
        );
        assert!(parse_language_list("").is_empty());
        assert!(parse_language_list(" , ,").is_empty());
    }

    #[test]
    fn test_validate_rejects_missing_values() {
        let err = RunConfig::new("/tmp", "  ", "01").validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue("challenge-slug")));

        let err = RunConfig::new("/tmp", "redis", "").validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue("stage-id")));

        let err = config().with_refs(vec![]).validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue("refs")));
    }

    #[test]
    fn test_validate_rejects_path_traversal() {
        let err = RunConfig::new("/tmp", "../etc", "01").validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "challenge-slug",
                ..
            }
        ));

        let err = RunConfig::new("/tmp", "redis", "..").validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "stage-id", .. }));
    }

    #[test]
    fn test_validate_rejects_language_traversal() {
        let err = config()
            .with_targets(vec!["go".to_string(), "../../../victim".to_string()])
            .validate()
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, message } => {
                assert_eq!(key, "targets");
                assert!(message.contains("../../../victim"));
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }

        let err = config()
            .with_refs(vec!["python".to_string(), "..".to_string()])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "refs", .. }));

        let err = config()
            .with_targets(vec!["go\\..\\..".to_string()])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "targets", .. }));

        let err = config().with_targets(vec![" ".to_string()]).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "targets", .. }));

        assert!(config()
            .with_targets(vec!["go".to_string(), "c++".to_string()])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_resolve_targets_skips_unsafe_directory_names() {
        let available = vec!["go".to_string(), "..".to_string(), "a\\b".to_string()];
        assert_eq!(
            config().resolve_targets(available).expect("targets"),
            vec!["go".to_string()]
        );
    }

    #[test]
    fn test_resolve_targets_excludes_refs_when_derived() {
        let config = config().with_refs(vec!["python".to_string(), "rust".to_string()]);
        let available = vec!["go".to_string(), "python".to_string(), "rust".to_string()];
        assert_eq!(
            config.resolve_targets(available).expect("targets"),
            vec!["go".to_string()]
        );
    }

    #[test]
    fn test_resolve_targets_uses_explicit_list() {
        let config = config().with_targets(vec!["zig".to_string()]);
        assert_eq!(
            config.resolve_targets(vec!["go".to_string()]).expect("targets"),
            vec!["zig".to_string()]
        );
    }

    #[test]
    fn test_resolve_targets_empty_is_an_error() {
        let result = config().resolve_targets(vec!["python".to_string()]);
        assert!(matches!(result, Err(ConfigError::NoTargets)));

        let result = config().with_targets(vec![]).resolve_targets(vec!["go".to_string()]);
        assert!(matches!(result, Err(ConfigError::NoTargets)));
    }
}
