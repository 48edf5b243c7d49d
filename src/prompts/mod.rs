//! Prompt builders for solution and hint generation.
//!
//! Both builders are pure string assembly over a [`StageBundle`]:
//!
//! - [`solution`] - asks for a single fenced code block implementing the stage
//! - [`hints`] - asks for a JSON object of hints using the fixed title list
//!
//! Neither builder validates what the backend eventually returns.

pub mod hints;
pub mod solution;

pub use hints::{build_hints_prompt, HINTS_STYLE_GUIDE};
pub use solution::build_solution_prompt;

use crate::challenge::{PreviousStageSolution, StageBundle};
use crate::languages::LanguageSpec;

/// A system/user prompt pair for one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPrompt {
    /// System prompt establishing the assistant's role.
    pub system: String,
    /// User prompt with the stage context and instructions.
    pub user: String,
}

impl GenerationPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Renders the stage description and every reference solution.
pub(crate) fn render_stage_context(bundle: &StageBundle) -> String {
    let mut out = String::new();
    out.push_str("## Stage description\n\n");
    out.push_str(bundle.stage_description.trim());
    out.push_str("\n\n");

    if bundle.examples.is_empty() {
        out.push_str("## Reference solutions\n\n(none provided)\n\n");
        return out;
    }

    out.push_str("## Reference solutions\n\n");
    for example in &bundle.examples {
        let spec = LanguageSpec::lookup(&example.language);
        out.push_str(&format!("### {}\n\n", spec.display_name));
        if example.solution.trim().is_empty() {
            out.push_str("(no solution source found)\n\n");
        } else {
            out.push_str(&fenced(&example.language, &example.solution));
        }
        if !example.fixed_hint_titles.is_empty() {
            out.push_str("Hint titles:\n");
            for title in &example.fixed_hint_titles {
                out.push_str(&format!("- {}\n", title));
            }
            out.push('\n');
        }
    }
    out
}

/// Renders the target language's previous-stage source, with extend-don't-rewrite guidance.
pub(crate) fn render_previous_stage(
    target: &LanguageSpec,
    previous: Option<&PreviousStageSolution>,
) -> String {
    let Some(previous) = previous else {
        return String::new();
    };
    if previous.source.trim().is_empty() {
        return String::new();
    }

    let label = previous.stage_id.as_deref().unwrap_or("previous stage");
    let mut out = format!(
        "## Existing {} solution from {}\n\n",
        target.display_name, label
    );
    out.push_str(&fenced(&target.id, &previous.source));
    out.push_str(
        "Extend this solution rather than rewriting it. Keep existing names, \
         structure and style unless the new requirement forces a change.\n\n",
    );
    out
}

/// Wraps `source` in a code fence longer than any backtick run inside it.
fn fenced(language: &str, source: &str) -> String {
    let longest_run = source
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run.max(2) + 1);
    format!("{fence}{language}\n{}\n{fence}\n\n", source.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_uses_three_backticks_by_default() {
        assert_eq!(fenced("go", "package main\n"), "```go\npackage main\n```\n\n");
    }

    #[test]
    fn test_fenced_outgrows_backticks_in_source() {
        let source = "doc = \"\"\"\n```python\nprint(1)\n```\n\"\"\"";
        let block = fenced("python", source);
        assert!(block.starts_with("````python\n"));
        assert!(block.ends_with("\n````\n\n"));

        let previous = PreviousStageSolution {
            stage_id: Some("01-init".to_string()),
            source: "s = '`````'".to_string(),
        };
        let rendered = render_previous_stage(&LanguageSpec::lookup("python"), Some(&previous));
        assert!(rendered.contains("``````python\ns = '`````'\n``````\n"));
    }
}
