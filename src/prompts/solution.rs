//! Prompt for generating a stage solution in a target language.

use tracing::debug;

use super::{render_previous_stage, render_stage_context, GenerationPrompt};
use crate::challenge::{PreviousStageSolution, StageBundle};
use crate::languages::LanguageSpec;

const SOLUTION_SYSTEM_PROMPT: &str = "You are an expert programmer who writes clear, idiomatic, \
working solutions to staged programming challenges. You answer with code only.";

const SOLUTION_INSTRUCTIONS: &str = r#"## Task

Write the complete {language} solution for the stage described above. The
reference solutions show the expected behaviour in other languages; match
that behaviour, but write idiomatic {language} rather than a line-by-line
translation.

The solution lives in a single entry file ({entry_file}). Use only the
standard library unless a reference solution clearly depends on a library.

Respond with exactly one fenced code block containing the whole file. Do not
include any prose before or after the code block.
"#;

/// Builds the prompt that asks for a full solution in `target`.
///
/// `entry_file` is the path, relative to the code directory, that the
/// solution will be written to.
pub fn build_solution_prompt(
    bundle: &StageBundle,
    target: &LanguageSpec,
    entry_file: &str,
    previous: Option<&PreviousStageSolution>,
) -> GenerationPrompt {
    let mut user = render_stage_context(bundle);
    user.push_str(&render_previous_stage(target, previous));
    user.push_str(
        &SOLUTION_INSTRUCTIONS
            .replace("{language}", &target.display_name)
            .replace("{entry_file}", entry_file),
    );

    debug!(
        language = %target.id,
        prompt_chars = user.len(),
        with_previous = previous.is_some(),
        "Built solution prompt"
    );
    GenerationPrompt::new(SOLUTION_SYSTEM_PROMPT, user)
}
