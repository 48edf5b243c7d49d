//! End-to-end generation run for one challenge stage.
//!
//! The [`StageOrchestrator`] loads the stage description and the reference
//! examples once, fixes the hint title list, then fans out one pipeline per
//! target language through the bounded pool:
//!
//! 1. read the previous stage's solution for extra context
//! 2. generate the solution and the hints concurrently
//! 3. align the generated hints to the fixed titles
//! 4. replace the code directory with the starter and write the solution
//! 5. write the hints file
//!
//! Backend failures fail only the affected language; repository and
//! configuration failures abort the run.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::challenge::{ChallengeRepository, Hint, StageBundle};
use crate::config::RunConfig;
use crate::error::{GenerationError, LlmError};
use crate::languages::LanguageSpec;
use crate::llm::{GenerationClient, LlmProvider};
use crate::pool::run_pool;
use crate::progress::ProgressReporter;
use crate::prompts::{build_hints_prompt, build_solution_prompt};

/// Files written for one target language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageArtifacts {
    pub solution_path: PathBuf,
    pub hints_path: PathBuf,
}

/// How a single target language ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageStatus {
    Completed(LanguageArtifacts),
    Failed { error: String },
}

/// Result of one target language's pipeline.
#[derive(Debug, Clone)]
pub struct LanguageOutcome {
    pub language: String,
    pub elapsed: Duration,
    pub status: LanguageStatus,
}

impl LanguageOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, LanguageStatus::Completed(_))
    }
}

/// Counts and per-language outcomes of a run, in target order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub languages: Vec<LanguageOutcome>,
}

impl RunSummary {
    /// Builds a summary from outcomes, counting each status.
    pub fn from_outcomes(languages: Vec<LanguageOutcome>) -> Self {
        let completed = languages.iter().filter(|o| o.is_completed()).count();
        Self {
            completed,
            failed: languages.len() - completed,
            languages,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "summary: {} completed, {} failed",
            self.completed, self.failed
        )
    }
}

/// Output of one inner-pool task.
enum Artifact {
    Solution(String),
    Hints(Vec<Hint>),
}

/// Drives a generation run for one challenge stage.
pub struct StageOrchestrator {
    config: RunConfig,
    repository: ChallengeRepository,
    generator: GenerationClient,
    progress: ProgressReporter,
}

impl StageOrchestrator {
    /// Creates an orchestrator that generates through `provider`.
    pub fn new(
        config: RunConfig,
        provider: Arc<dyn LlmProvider>,
        progress: ProgressReporter,
    ) -> Self {
        let repository = ChallengeRepository::new(&config.project_root, &config.challenge_slug)
            .with_dry_run(config.dry_run);
        let generator = GenerationClient::new(provider, config.model.clone());
        Self {
            config,
            repository,
            generator,
            progress,
        }
    }

    pub fn repository(&self) -> &ChallengeRepository {
        &self.repository
    }

    /// Loads the stage description and every reference example.
    pub fn load_stage(&self) -> Result<StageBundle, GenerationError> {
        let stage_description = self
            .repository
            .read_stage_description(&self.config.stage_id, self.config.stage_kind)?;
        let examples = self
            .config
            .refs
            .iter()
            .map(|language| self.repository.load_reference(language, &self.config.stage_id))
            .collect();
        Ok(StageBundle {
            stage_description,
            examples,
        })
    }

    /// Runs the whole stage and returns the per-language summary.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error (see [`GenerationError::is_fatal`]).
    /// Non-fatal errors are recorded as failed languages instead.
    pub async fn run(&self) -> Result<RunSummary, GenerationError> {
        self.config.validate()?;
        let targets = self
            .config
            .resolve_targets(self.repository.list_languages())?;
        let stage = self.load_stage()?;
        let fixed_titles = stage.fixed_hint_titles();

        info!(
            challenge = %self.config.challenge_slug,
            stage = %self.config.stage_id,
            kind = %self.config.stage_kind,
            refs = ?self.config.refs,
            targets = ?targets,
            titles = ?fixed_titles,
            dry_run = self.config.dry_run,
            "Starting stage generation"
        );

        let started = Instant::now();
        let tasks = targets
            .iter()
            .map(|language| self.run_language(&stage, &fixed_titles, language));
        let outcomes = run_pool(tasks, self.config.lang_concurrency).await;
        if outcomes.is_err() {
            // Failure lines already queued must reach the sink before the caller exits.
            self.progress.flush().await;
        }
        let outcomes = outcomes?;

        let summary = RunSummary::from_outcomes(outcomes);
        info!(
            completed = summary.completed,
            failed = summary.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Stage generation finished"
        );
        self.progress.line(summary.to_string());
        self.progress.flush().await;
        Ok(summary)
    }

    async fn run_language(
        &self,
        stage: &StageBundle,
        fixed_titles: &[String],
        language: &str,
    ) -> Result<LanguageOutcome, GenerationError> {
        let started = Instant::now();
        let result = self
            .progress
            .timed(
                language,
                self.generate_language(stage, fixed_titles, language),
            )
            .await;
        let elapsed = started.elapsed();

        let status = match result {
            Ok(artifacts) => LanguageStatus::Completed(artifacts),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(language, error = %e, "Language generation failed");
                LanguageStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        Ok(LanguageOutcome {
            language: language.to_string(),
            elapsed,
            status,
        })
    }

    async fn generate_language(
        &self,
        stage: &StageBundle,
        fixed_titles: &[String],
        language: &str,
    ) -> Result<LanguageArtifacts, GenerationError> {
        let stage_id = self.config.stage_id.as_str();
        let target = LanguageSpec::lookup(language);
        if !LanguageSpec::is_known(language) {
            warn!(
                language,
                extension = %target.extension,
                "Unknown language, using fallback conventions"
            );
        }

        let previous = self.repository.read_previous_stage(language, stage_id);
        if let Some(previous) = &previous {
            debug!(language, previous_stage = ?previous.stage_id, "Using previous stage as context");
        }
        let entry_file = self.repository.entry_file(language);
        let solution_prompt = build_solution_prompt(
            stage,
            &target,
            &entry_file.to_string_lossy(),
            previous.as_ref(),
        );
        let hints_prompt = build_hints_prompt(stage, &target, previous.as_ref(), fixed_titles);

        let solution_task = self.progress.timed(format!("{}/solution", language), async {
            self.generator
                .generate_code(&solution_prompt)
                .await
                .map(Artifact::Solution)
                .map_err(GenerationError::from)
        });
        let hints_task = self.progress.timed(format!("{}/hints", language), async {
            self.generator
                .generate_hints(&hints_prompt)
                .await
                .map(Artifact::Hints)
                .map_err(GenerationError::from)
        });
        let tasks: Vec<BoxFuture<'_, Result<Artifact, GenerationError>>> =
            vec![solution_task.boxed(), hints_task.boxed()];

        let mut artifacts = run_pool(tasks, self.config.task_concurrency)
            .await?
            .into_iter();
        let (Some(Artifact::Solution(code)), Some(Artifact::Hints(hints))) =
            (artifacts.next(), artifacts.next())
        else {
            return Err(LlmError::EmptyResponse.into());
        };

        if code.trim().is_empty() {
            warn!(language, "Generated solution is empty");
        }
        let hints = align_hints(fixed_titles, hints, language)?;

        self.repository.prepare_code_dir(language, stage_id)?;
        let solution_path = self.repository.write_solution(language, stage_id, &code)?;
        let hints_path = self.repository.write_hints(language, stage_id, &hints)?;

        info!(
            language,
            solution = %solution_path.display(),
            hints = %hints_path.display(),
            "Wrote generated artifacts"
        );
        Ok(LanguageArtifacts {
            solution_path,
            hints_path,
        })
    }
}

/// Aligns generated hints to the fixed title list.
///
/// For each fixed title, in order, the first unused hint with exactly that
/// title (trimmed) is taken. Otherwise the next unused hint is relabelled,
/// preferring hints whose title is not another fixed title. Extra hints
/// are dropped.
///
/// # Errors
///
/// Returns `GenerationError::HintTitleMismatch` when there are fewer
/// generated hints than fixed titles.
pub fn align_hints(
    fixed_titles: &[String],
    generated: Vec<Hint>,
    language: &str,
) -> Result<Vec<Hint>, GenerationError> {
    let mismatch = |actual: usize| GenerationError::HintTitleMismatch {
        language: language.to_string(),
        expected: fixed_titles.len(),
        actual,
    };
    if generated.len() < fixed_titles.len() {
        return Err(mismatch(generated.len()));
    }

    let generated_count = generated.len();
    let is_fixed = |title: &str| fixed_titles.iter().any(|t| t.trim() == title.trim());
    let mut unused: Vec<Option<Hint>> = generated.into_iter().map(Some).collect();
    let mut aligned = Vec::with_capacity(fixed_titles.len());

    for title in fixed_titles {
        let exact = unused.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|hint| hint.title.trim() == title.trim())
        });
        let index = exact
            .or_else(|| {
                unused
                    .iter()
                    .position(|slot| slot.as_ref().is_some_and(|hint| !is_fixed(&hint.title)))
            })
            .or_else(|| unused.iter().position(Option::is_some));
        let Some(mut hint) = index.and_then(|i| unused[i].take()) else {
            return Err(mismatch(generated_count));
        };

        if hint.title != *title {
            warn!(
                language,
                generated = %hint.title,
                fixed = %title,
                "Relabelled generated hint to fixed title"
            );
            hint.title = title.clone();
        }
        aligned.push(hint);
    }

    let dropped = unused.iter().flatten().count();
    if dropped > 0 {
        warn!(language, dropped, "Dropped generated hints beyond the fixed titles");
    }
    Ok(aligned)
}
