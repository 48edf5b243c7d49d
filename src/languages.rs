//! Static table of per-language source conventions.
//!
//! Maps a language identifier (as used for directory names under
//! `solutions/` and `compiled_starters/`) to the file extension of its
//! sources and the entry file to create when a code directory has none.

use std::borrow::Cow;

/// Source conventions for a single language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSpec {
    /// Language identifier, e.g. `"python"`.
    pub id: Cow<'static, str>,
    /// File extension without the leading dot, e.g. `"py"`.
    pub extension: Cow<'static, str>,
    /// Entry file path relative to the code directory, used when discovery finds nothing.
    pub default_file: Cow<'static, str>,
    /// Human-readable name used in prompts.
    pub display_name: Cow<'static, str>,
}

impl LanguageSpec {
    const fn known(
        id: &'static str,
        extension: &'static str,
        default_file: &'static str,
        display_name: &'static str,
    ) -> Self {
        Self {
            id: Cow::Borrowed(id),
            extension: Cow::Borrowed(extension),
            default_file: Cow::Borrowed(default_file),
            display_name: Cow::Borrowed(display_name),
        }
    }

    /// Looks up a language, falling back to `extension = id` for unknown ids.
    pub fn lookup(language: &str) -> LanguageSpec {
        let normalized = language.trim().to_ascii_lowercase();
        KNOWN_LANGUAGES
            .iter()
            .find(|spec| spec.id == normalized.as_str())
            .cloned()
            .unwrap_or_else(|| LanguageSpec {
                default_file: Cow::Owned(format!("app/main.{}", normalized)),
                extension: Cow::Owned(normalized.clone()),
                display_name: Cow::Owned(normalized.clone()),
                id: Cow::Owned(normalized),
            })
    }

    /// Whether this language is part of the built-in table.
    pub fn is_known(language: &str) -> bool {
        let normalized = language.trim().to_ascii_lowercase();
        KNOWN_LANGUAGES.iter().any(|spec| spec.id == normalized.as_str())
    }
}

static KNOWN_LANGUAGES: &[LanguageSpec] = &[
    LanguageSpec::known("python", "py", "app/main.py", "Python"),
    LanguageSpec::known("go", "go", "app/main.go", "Go"),
    LanguageSpec::known("rust", "rs", "src/main.rs", "Rust"),
    LanguageSpec::known("javascript", "js", "app/main.js", "JavaScript"),
    LanguageSpec::known("typescript", "ts", "app/main.ts", "TypeScript"),
    LanguageSpec::known("ruby", "rb", "app/main.rb", "Ruby"),
    LanguageSpec::known("java", "java", "src/main/java/Main.java", "Java"),
    LanguageSpec::known("kotlin", "kt", "src/main/kotlin/Main.kt", "Kotlin"),
    LanguageSpec::known("c", "c", "src/main.c", "C"),
    LanguageSpec::known("cpp", "cpp", "src/main.cpp", "C++"),
    LanguageSpec::known("csharp", "cs", "src/Server.cs", "C#"),
    LanguageSpec::known("haskell", "hs", "app/Main.hs", "Haskell"),
    LanguageSpec::known("elixir", "ex", "lib/main.ex", "Elixir"),
    LanguageSpec::known("php", "php", "app/main.php", "PHP"),
    LanguageSpec::known("swift", "swift", "Sources/main.swift", "Swift"),
    LanguageSpec::known("zig", "zig", "src/main.zig", "Zig"),
    LanguageSpec::known("gleam", "gleam", "src/main.gleam", "Gleam"),
    LanguageSpec::known("ocaml", "ml", "src/main.ml", "OCaml"),
    LanguageSpec::known("scala", "scala", "src/main/scala/Main.scala", "Scala"),
    LanguageSpec::known("clojure", "clj", "src/main.clj", "Clojure"),
    LanguageSpec::known("dart", "dart", "bin/main.dart", "Dart"),
    LanguageSpec::known("crystal", "cr", "src/main.cr", "Crystal"),
    LanguageSpec::known("nim", "nim", "src/main.nim", "Nim"),
    LanguageSpec::known("odin", "odin", "src/main.odin", "Odin"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_language_lookup() {
        let python = LanguageSpec::lookup("python");
        assert_eq!(python.extension, "py");
        assert_eq!(python.default_file, "app/main.py");

        let rust = LanguageSpec::lookup(" Rust ");
        assert_eq!(rust.id, "rust");
        assert_eq!(rust.extension, "rs");
    }

    #[test]
    fn test_unknown_language_falls_back_to_id() {
        let spec = LanguageSpec::lookup("v");
        assert_eq!(spec.extension, "v");
        assert_eq!(spec.default_file, "app/main.v");
        assert!(!LanguageSpec::is_known("v"));
        assert!(LanguageSpec::is_known("go"));
    }
}
