//! Prompt for generating instructional hints in a target language.

use tracing::debug;

use super::{render_previous_stage, render_stage_context, GenerationPrompt};
use crate::challenge::{PreviousStageSolution, StageBundle};
use crate::languages::LanguageSpec;

const HINTS_SYSTEM_PROMPT: &str = "You write short, precise hints that help learners finish a \
programming challenge stage without handing them the full solution. You answer with JSON only.";

/// Style rules every generated hint body must follow.
pub const HINTS_STYLE_GUIDE: &str = r#"## Hint style guide

Tone and length:
- Write terse, direct sentences. One idea per sentence.
- Address the reader as "you". No greetings, no encouragement, no filler.
- Keep each hint body under 120 words.

Links:
- Link to official documentation inline, on the words that describe the
  thing: [`net.Listen`](https://pkg.go.dev/net#Listen).
- Never write bare URLs and never write "click here" or "see this link".
- Wrap identifiers, commands and literal protocol data in backticks.

Code snippets:
- Prefer prose. Add a snippet only when the exact syntax is the hard part.
- A snippet shows the smallest fragment that makes the point: a call, a
  signature, a format string. Never a full function, never the solution.
- Snippets use fenced code blocks tagged with the target language.

Examples:

Correct:
  Read from the connection in a loop. Each call to
  [`conn.Read`](https://pkg.go.dev/net#Conn.Read) may return only part of a
  command, so keep reading until you see `\r\n`.

Incorrect (bare link, filler):
  Great job so far! Now you need to read data. See
  https://pkg.go.dev/net for more info.

Correct:
  RESP arrays start with `*` followed by the element count:
  ```go
  fmt.Sscanf(line, "*%d", &count)
  ```

Incorrect (snippet gives away the solution):
  Here is the full handler you need:
  ```go
  func handle(conn net.Conn) { /* forty lines */ }
  ```
"#;

const HINTS_INSTRUCTIONS: &str = r#"## Task

Write hints for the {language} version of this stage. Adapt the reference
hints to {language}: use its standard library names, link to its official
documentation, and tag snippets as `{fence}`.

Use exactly these titles, verbatim, in this order, one hint per title:
{titles}
Do not rename, merge, split, reorder, add or drop titles.

Respond with a single JSON object and nothing else, in this shape:
{"hints": [{"title": "<title>", "body": "<markdown body>"}]}
"#;

/// Builds the prompt that asks for hints in `target` using `fixed_titles`.
pub fn build_hints_prompt(
    bundle: &StageBundle,
    target: &LanguageSpec,
    previous: Option<&PreviousStageSolution>,
    fixed_titles: &[String],
) -> GenerationPrompt {
    let mut user = render_stage_context(bundle);
    user.push_str(&render_previous_stage(target, previous));
    user.push_str(&render_reference_hints(bundle));
    user.push_str(HINTS_STYLE_GUIDE);
    user.push('\n');

    let titles = fixed_titles
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{}. {}", i + 1, title))
        .collect::<Vec<_>>()
        .join("\n");
    user.push_str(
        &HINTS_INSTRUCTIONS
            .replace("{language}", &target.display_name)
            .replace("{fence}", &target.id)
            .replace("{titles}", &titles),
    );

    debug!(
        language = %target.id,
        prompt_chars = user.len(),
        titles = fixed_titles.len(),
        "Built hints prompt"
    );
    GenerationPrompt::new(HINTS_SYSTEM_PROMPT, user)
}

fn render_reference_hints(bundle: &StageBundle) -> String {
    let mut out = String::from("## Reference hints\n\n");
    for example in &bundle.examples {
        let spec = LanguageSpec::lookup(&example.language);
        out.push_str(&format!("### {} hints\n\n", spec.display_name));
        if example.hints.is_empty() {
            out.push_str("(no existing hints found)\n\n");
            continue;
        }
        for hint in &example.hints {
            out.push_str(&format!("#### {}\n\n{}\n\n", hint.title, hint.body.trim_end()));
        }
    }
    if bundle.examples.is_empty() {
        out.push_str("(no existing hints found)\n\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{Hint, ReferenceExample};

    fn titles() -> Vec<String> {
        vec!["Binding a port".to_string(), "Reading commands".to_string()]
    }

    #[test]
    fn test_hints_prompt_embeds_titles_and_reference_hints() {
        let bundle = StageBundle {
            stage_description: "Bind to port 6379.".to_string(),
            examples: vec![
                ReferenceExample::new(
                    "python",
                    "import socket",
                    vec![Hint::new("Binding a port", "Use `socket.create_server`.")],
                ),
                ReferenceExample::new("rust", "fn main() {}", vec![]),
            ],
        };
        let prompt = build_hints_prompt(&bundle, &LanguageSpec::lookup("go"), None, &titles());

        assert!(prompt.user.contains("Bind to port 6379."));
        assert!(prompt.user.contains("### Python hints"));
        assert!(prompt.user.contains("#### Binding a port\n\nUse `socket.create_server`."));
        assert!(prompt.user.contains("### Rust hints\n\n(no existing hints found)"));
        assert!(prompt.user.contains("1. Binding a port\n2. Reading commands"));
        assert!(prompt.user.contains("## Hint style guide"));
        assert!(prompt.user.contains(r#"{"hints": [{"title": "<title>", "body": "<markdown body>"}]}"#));
        assert!(prompt.user.contains("tag snippets as `go`"));
        assert!(prompt.system.contains("JSON only"));
    }

    #[test]
    fn test_hints_prompt_without_references() {
        let bundle = StageBundle {
            stage_description: "desc".to_string(),
            examples: vec![],
        };
        let prompt = build_hints_prompt(&bundle, &LanguageSpec::lookup("ruby"), None, &titles());
        assert!(prompt.user.contains("## Reference hints\n\n(no existing hints found)"));
        assert!(prompt.user.contains("Ruby version of this stage"));
    }
}
