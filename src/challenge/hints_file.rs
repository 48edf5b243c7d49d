//! Reader and writer for per-stage `config.yml` hint files.
//!
//! The file layout is:
//!
//! ```text
//! hints:
//!   - title_markdown: "Title"
//!     body_markdown: |-
//!       First body line
//!       Second body line
//! ```
//!
//! Files are written by hand so the quoting, indentation and block marker
//! stay stable across runs; they are read back with `serde_yaml`. Carriage
//! returns in bodies are written as line breaks. A body holding other
//! control characters is written as an escaped double-quoted scalar.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::types::Hint;

const BODY_INDENT: &str = "      ";

#[derive(Debug, Default, Deserialize)]
struct HintsDocument {
    #[serde(default)]
    hints: Option<Vec<HintEntry>>,
}

#[derive(Debug, Deserialize)]
struct HintEntry {
    #[serde(default)]
    title_markdown: Option<String>,
    #[serde(default)]
    body_markdown: Option<String>,
}

/// Renders hints into the `config.yml` text format.
pub fn render_hints(hints: &[Hint]) -> String {
    if hints.is_empty() {
        return "hints: []\n".to_string();
    }

    let mut out = String::from("hints:\n");
    for hint in hints {
        out.push_str("  - title_markdown: ");
        out.push_str(&quote(&hint.title));
        out.push('\n');

        let body = hint.body.replace("\r\n", "\n").replace('\r', "\n");
        // Block scalars cannot carry non-printable characters.
        if body.chars().any(needs_escape) {
            out.push_str("    body_markdown: ");
            out.push_str(&quote(&body));
            out.push('\n');
            continue;
        }

        let lines: Vec<&str> = body.split('\n').collect();
        // A leading space on the first content line would be taken as extra
        // indentation, so pin the indentation explicitly in that case.
        let pin_indent = lines
            .iter()
            .find(|line| !line.is_empty())
            .is_some_and(|line| line.starts_with(' '));
        out.push_str(if pin_indent {
            "    body_markdown: |2-\n"
        } else {
            "    body_markdown: |-\n"
        });

        if body.is_empty() {
            continue;
        }
        for line in lines {
            if !line.is_empty() {
                out.push_str(BODY_INDENT);
                out.push_str(line);
            }
            out.push('\n');
        }
    }
    out
}

/// Parses `config.yml` text. Malformed content yields an empty list.
pub fn parse_hints(content: &str) -> Vec<Hint> {
    let document: HintsDocument = match serde_yaml::from_str(content) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(error = %e, "Ignoring malformed hints document");
            return Vec::new();
        }
    };

    document
        .hints
        .unwrap_or_default()
        .into_iter()
        .map(|entry| Hint {
            title: entry.title_markdown.unwrap_or_default(),
            body: entry.body_markdown.unwrap_or_default(),
        })
        .collect()
}

/// Reads a hints file. A missing or unreadable file yields an empty list.
pub fn read_hints_file(path: &Path) -> Vec<Hint> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_hints(&content),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No readable hints file");
            Vec::new()
        }
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if needs_escape(c) => match u32::from(c) {
                code @ 0..=0xff => out.push_str(&format!("\\x{:02X}", code)),
                code @ 0x100..=0xffff => out.push_str(&format!("\\u{:04X}", code)),
                code => out.push_str(&format!("\\U{:08X}", code)),
            },
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Characters YAML does not accept verbatim, plus the ones it reads as line breaks.
fn needs_escape(c: char) -> bool {
    (c.is_control() && c != '\n' && c != '\t')
        || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}' | '\u{fffe}' | '\u{ffff}')
}
