//! Extraction of code and JSON payloads from LLM responses.
//!
//! Responses may wrap their payload in markdown code fences or surround it
//! with explanatory text. These helpers pull out the part the caller asked
//! for:
//!
//! - [`extract_code_block`] returns the first fenced block's contents, or
//!   the whole trimmed response when no fence is present
//! - [`extract_json_payload`] locates a JSON object in the response
//!
//! # Example
//!
//! ```
//! use stage_forge::utils::fences::{extract_code_block, extract_json_payload};
//!
//! let code = extract_code_block("Here you go:\n```go\npackage main\n```\nDone.");
//! assert_eq!(code, "package main");
//!
//! let json = extract_json_payload("Result: {\"hints\": []} - enjoy");
//! assert_eq!(json.as_deref(), Some("{\"hints\": []}"));
//! ```

use regex::Regex;

/// Returns the contents of the first fenced code block in `content`.
pub fn first_fenced_block(content: &str) -> Option<String> {
    let re = Regex::new(r"```[^\n`]*\n([\s\S]*?)\n?```").ok()?;
    let caps = re.captures(content)?;
    let block = caps.get(1)?.as_str();
    Some(block.trim_end().trim_start_matches('\n').to_string())
}

/// Returns the first fenced block's contents, falling back to the trimmed response.
pub fn extract_code_block(content: &str) -> String {
    first_fenced_block(content).unwrap_or_else(|| content.trim().to_string())
}

/// Locates a JSON object in an LLM response.
///
/// Tries, in order: the whole trimmed response, a fenced block, and the
/// first balanced `{...}` span that parses as JSON.
pub fn extract_json_payload(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }

    if is_json(trimmed) {
        return Some(trimmed.to_string());
    }

    if let Some(block) = first_fenced_block(trimmed) {
        if is_json(&block) {
            return Some(block);
        }
    }

    for (start, _) in trimmed.match_indices('{') {
        let candidate = &trimmed[start..];
        if let Some(end) = find_matching_brace(candidate) {
            let json = &candidate[..=end];
            if is_json(json) {
                return Some(json.to_string());
            }
        }
    }

    None
}

/// Finds the index of the `}` closing the object that starts at `s[0]`.
///
/// Handles nesting, string literals and escape sequences.
pub fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                depth += 1;
            }
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

fn is_json(candidate: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(candidate).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_block_with_language_tag() {
        let input = "Sure!\n```python\ndef main():\n    print(1)\n```\n\n```python\nother\n```";
        assert_eq!(extract_code_block(input), "def main():\n    print(1)");
    }

    #[test]
    fn test_block_without_language_tag() {
        let input = "```\nfn main() {}\n```";
        assert_eq!(extract_code_block(input), "fn main() {}");
    }

    #[test]
    fn test_no_fence_returns_trimmed_response() {
        let input = "\n  package main\n\nfunc main() {}\n  ";
        assert_eq!(extract_code_block(input), "package main\n\nfunc main() {}");
    }

    #[test]
    fn test_unclosed_fence_falls_back_to_whole_text() {
        let input = "```go\npackage main";
        assert_eq!(first_fenced_block(input), None);
        assert_eq!(extract_code_block(input), "```go\npackage main");
    }

    #[test]
    fn test_block_keeps_leading_indentation() {
        let input = "```yaml\n  key: value\n    nested: 1\n```";
        assert_eq!(extract_code_block(input), "  key: value\n    nested: 1");
    }

    #[test]
    fn test_direct_json() {
        let input = r#"{"hints": [{"title": "A", "body": "b"}]}"#;
        assert_eq!(extract_json_payload(input).as_deref(), Some(input));
    }

    #[test]
    fn test_json_in_code_block() {
        let input = "Here:\n```json\n{\"key\": \"value\"}\n```\nHope this helps!";
        assert_eq!(
            extract_json_payload(input).as_deref(),
            Some(r#"{"key": "value"}"#)
        );
    }

    #[test]
    fn test_json_surrounded_by_text_with_braces_in_strings() {
        let input = r#"Output: {"body": "use {} and \"quotes\""} trailing"#;
        assert_eq!(
            extract_json_payload(input).as_deref(),
            Some(r#"{"body": "use {} and \"quotes\""}"#)
        );
    }

    #[test]
    fn test_no_json() {
        assert_eq!(extract_json_payload("plain text"), None);
        assert_eq!(extract_json_payload("   "), None);
        assert_eq!(extract_json_payload(r#"{"truncated": "#), None);
    }

    #[test]
    fn test_find_matching_brace_nested() {
        let s = r#"{"a": {"b": "}"}} rest"#;
        assert_eq!(find_matching_brace(s), Some(16));
    }
}
