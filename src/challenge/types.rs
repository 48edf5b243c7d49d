//! Domain types shared by the repository, prompt builders and orchestrator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Hint titles used when no reference language defines any.
pub const FALLBACK_HINT_TITLES: [&str; 2] = ["Where to start", "Common pitfalls"];

/// A single instructional hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub title: String,
    pub body: String,
}

impl Hint {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Which stage description variant to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StageKind {
    /// `stage_descriptions/base-<id>`
    #[default]
    Base,
    /// `stage_descriptions/<id>`
    Localized,
}

impl StageKind {
    /// Directory or file stem of the description for `stage_id`.
    pub fn description_name(&self, stage_id: &str) -> String {
        match self {
            StageKind::Base => format!("base-{}", stage_id),
            StageKind::Localized => stage_id.to_string(),
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Base => write!(f, "base"),
            StageKind::Localized => write!(f, "localized"),
        }
    }
}

impl FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base" => Ok(StageKind::Base),
            "localized" => Ok(StageKind::Localized),
            other => Err(format!(
                "invalid stage kind '{}': must be 'base' or 'localized'",
                other
            )),
        }
    }
}

/// An existing solution in a reference language, with its hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceExample {
    pub language: String,
    pub solution: String,
    /// Titles of `hints`, in file order.
    pub fixed_hint_titles: Vec<String>,
    pub hints: Vec<Hint>,
}

impl ReferenceExample {
    pub fn new(language: impl Into<String>, solution: impl Into<String>, hints: Vec<Hint>) -> Self {
        let fixed_hint_titles = hints
            .iter()
            .map(|h| h.title.clone())
            .filter(|t| !t.trim().is_empty())
            .collect();
        Self {
            language: language.into(),
            solution: solution.into(),
            fixed_hint_titles,
            hints,
        }
    }
}

/// Stage description plus every reference example. Built once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageBundle {
    pub stage_description: String,
    pub examples: Vec<ReferenceExample>,
}

impl StageBundle {
    /// The hint titles every target language must use.
    ///
    /// Taken from the first example (in reference order) with a nonempty
    /// title list, otherwise [`FALLBACK_HINT_TITLES`].
    pub fn fixed_hint_titles(&self) -> Vec<String> {
        self.examples
            .iter()
            .find(|example| !example.fixed_hint_titles.is_empty())
            .map(|example| example.fixed_hint_titles.clone())
            .unwrap_or_else(|| {
                FALLBACK_HINT_TITLES
                    .iter()
                    .map(|t| t.to_string())
                    .collect()
            })
    }
}

/// Source of the same language's previous stage, fed as extra context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviousStageSolution {
    pub stage_id: Option<String>,
    pub source: String,
}
