//! Access to the on-disk challenge layout.
//!
//! ```text
//! challenges/<slug>/
//!   stage_descriptions/{base-<id>|<id>}[.md | /*.md]
//!   compiled_starters/<language>/...
//!   solutions/<language>/<stageId>/code/...
//!   solutions/<language>/<stageId>/config.yml
//! ```
//!
//! Reads of optional inputs (solutions, hints, previous stages) degrade to
//! empty values. Missing required inputs (stage description, starter
//! template) and write failures are returned as errors.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::hints_file::{read_hints_file, render_hints};
use super::types::{Hint, PreviousStageSolution, ReferenceExample, StageKind};
use crate::discovery::find_main_file;
use crate::error::RepositoryError;
use crate::languages::LanguageSpec;

const HINTS_FILE_NAME: &str = "config.yml";

/// Read/write accessor for one challenge directory.
#[derive(Debug, Clone)]
pub struct ChallengeRepository {
    challenge_dir: PathBuf,
    dry_run: bool,
}

impl ChallengeRepository {
    /// Creates an accessor for `<project_root>/challenges/<slug>`.
    pub fn new(project_root: impl AsRef<Path>, slug: &str) -> Self {
        Self {
            challenge_dir: project_root.as_ref().join("challenges").join(slug),
            dry_run: false,
        }
    }

    /// When set, writes are logged instead of performed.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn challenge_dir(&self) -> &Path {
        &self.challenge_dir
    }

    pub fn stage_descriptions_dir(&self) -> PathBuf {
        self.challenge_dir.join("stage_descriptions")
    }

    pub fn solutions_dir(&self) -> PathBuf {
        self.challenge_dir.join("solutions")
    }

    pub fn starter_dir(&self, language: &str) -> PathBuf {
        self.challenge_dir.join("compiled_starters").join(language)
    }

    pub fn stage_dir(&self, language: &str, stage_id: &str) -> PathBuf {
        self.solutions_dir().join(language).join(stage_id)
    }

    pub fn code_dir(&self, language: &str, stage_id: &str) -> PathBuf {
        self.stage_dir(language, stage_id).join("code")
    }

    pub fn hints_path(&self, language: &str, stage_id: &str) -> PathBuf {
        self.stage_dir(language, stage_id).join(HINTS_FILE_NAME)
    }

    /// Reads the stage description.
    ///
    /// A folder holding markdown files takes priority over a single
    /// same-named `.md` file. Inside a folder the lexicographically first
    /// `.md` file is used.
    pub fn read_stage_description(
        &self,
        stage_id: &str,
        kind: StageKind,
    ) -> Result<String, RepositoryError> {
        let dir = self.stage_descriptions_dir();
        let name = kind.description_name(stage_id);

        let folder = dir.join(&name);
        if let Some(markdown) = first_markdown_file(&folder) {
            debug!(path = %markdown.display(), "Reading stage description from folder");
            return fs::read_to_string(&markdown).map_err(|e| RepositoryError::io(markdown, e));
        }

        let file = dir.join(format!("{}.md", name));
        if file.is_file() {
            debug!(path = %file.display(), "Reading stage description file");
            return fs::read_to_string(&file).map_err(|e| RepositoryError::io(file, e));
        }

        Err(RepositoryError::StageDescriptionNotFound {
            stage_id: name,
            dir,
        })
    }

    /// Reads the entry source of `language` at `stage_id`, or an empty string.
    pub fn read_solution(&self, language: &str, stage_id: &str) -> String {
        let code_dir = self.code_dir(language, stage_id);
        if !code_dir.is_dir() {
            return String::new();
        }

        let spec = LanguageSpec::lookup(language);
        let Some(path) = find_main_file(&code_dir, &spec.extension) else {
            debug!(language, stage_id, "No entry file found in code directory");
            return String::new();
        };

        fs::read_to_string(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to read solution file");
            String::new()
        })
    }

    /// Reads the hints of `language` at `stage_id`, or an empty list.
    pub fn read_hints(&self, language: &str, stage_id: &str) -> Vec<Hint> {
        read_hints_file(&self.hints_path(language, stage_id))
    }

    /// Loads a reference example: solution source plus hints.
    pub fn load_reference(&self, language: &str, stage_id: &str) -> ReferenceExample {
        let solution = self.read_solution(language, stage_id);
        let hints = self.read_hints(language, stage_id);
        debug!(
            language,
            solution_bytes = solution.len(),
            hints = hints.len(),
            "Loaded reference example"
        );
        ReferenceExample::new(language, solution, hints)
    }

    /// Writes hints to the fixed per-stage config location.
    pub fn write_hints(
        &self,
        language: &str,
        stage_id: &str,
        hints: &[Hint],
    ) -> Result<PathBuf, RepositoryError> {
        let path = self.hints_path(language, stage_id);
        let content = render_hints(hints);
        self.write_file(&path, &content)?;
        Ok(path)
    }

    /// Finds the stage directory numbered one below `stage_id` for `language`.
    pub fn previous_stage_id(&self, language: &str, stage_id: &str) -> Option<String> {
        let current = stage_number(stage_id)?;
        let wanted = current.checked_sub(1)?;

        let entries = match fs::read_dir(self.solutions_dir().join(language)) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(language, error = %e, "Cannot list stages");
                return None;
            }
        };

        let mut matches: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| stage_number(name) == Some(wanted))
            .collect();
        matches.sort();
        matches.into_iter().next()
    }

    /// Reads the previous stage's solution, when one exists and is nonempty.
    pub fn read_previous_stage(
        &self,
        language: &str,
        stage_id: &str,
    ) -> Option<PreviousStageSolution> {
        let previous = self.previous_stage_id(language, stage_id)?;
        let source = self.read_solution(language, &previous);
        if source.trim().is_empty() {
            return None;
        }
        Some(PreviousStageSolution {
            stage_id: Some(previous),
            source,
        })
    }

    /// Lists the language directories under `solutions/`, sorted, skipping hidden entries.
    pub fn list_languages(&self) -> Vec<String> {
        let entries = match fs::read_dir(self.solutions_dir()) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(error = %e, "Cannot list solution languages");
                return Vec::new();
            }
        };

        let mut languages: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| !name.starts_with('.'))
            .collect();
        languages.sort();
        languages
    }

    /// Replaces the code directory of (`language`, `stage_id`) with a copy of the starter.
    pub fn prepare_code_dir(
        &self,
        language: &str,
        stage_id: &str,
    ) -> Result<PathBuf, RepositoryError> {
        let starter = self.starter_dir(language);
        if !starter.is_dir() {
            return Err(RepositoryError::StarterNotFound {
                language: language.to_string(),
                path: starter,
            });
        }

        let code_dir = self.code_dir(language, stage_id);
        if self.dry_run {
            info!(
                from = %starter.display(),
                to = %code_dir.display(),
                "Dry run: would replace code directory with starter"
            );
            return Ok(code_dir);
        }

        if code_dir.exists() {
            fs::remove_dir_all(&code_dir).map_err(|e| RepositoryError::io(&code_dir, e))?;
        }
        copy_dir_recursive(&starter, &code_dir)?;
        debug!(language, stage_id, path = %code_dir.display(), "Prepared code directory");
        Ok(code_dir)
    }

    /// Entry file of the starter template, relative to the code directory.
    ///
    /// Falls back to the language's default file when the starter is
    /// missing or has no source file for the language.
    pub fn entry_file(&self, language: &str) -> PathBuf {
        let spec = LanguageSpec::lookup(language);
        let starter = self.starter_dir(language);
        find_main_file(&starter, &spec.extension)
            .and_then(|path| path.strip_prefix(&starter).ok().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from(spec.default_file.as_ref()))
    }

    /// Writes generated source to the entry file of the prepared code directory.
    ///
    /// The entry file is discovered in the code directory; when none exists
    /// the language's default file path is created.
    pub fn write_solution(
        &self,
        language: &str,
        stage_id: &str,
        source: &str,
    ) -> Result<PathBuf, RepositoryError> {
        let code_dir = self.code_dir(language, stage_id);
        let spec = LanguageSpec::lookup(language);

        // In a dry run the code directory was never refreshed; the starter
        // shows what it would contain.
        let path = if self.dry_run {
            code_dir.join(self.entry_file(language))
        } else {
            find_main_file(&code_dir, &spec.extension)
                .unwrap_or_else(|| code_dir.join(spec.default_file.as_ref()))
        };

        self.write_file(&path, source)?;
        Ok(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<(), RepositoryError> {
        if self.dry_run {
            info!(path = %path.display(), bytes = content.len(), "Dry run: would write file");
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| RepositoryError::io(parent, e))?;
        }
        fs::write(path, content).map_err(|e| RepositoryError::io(path, e))
    }
}

/// Leading integer of a stage id, e.g. `3` for `"03-xyz"`.
pub fn stage_number(stage_id: &str) -> Option<u64> {
    let digits: String = stage_id.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn first_markdown_file(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    files.into_iter().next()
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<(), RepositoryError> {
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| from.to_path_buf());
            RepositoryError::io(path, std::io::Error::from(e))
        })?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| RepositoryError::io(entry.path(), std::io::Error::other(e)))?;
        let target = to.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| RepositoryError::io(&target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| RepositoryError::io(parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| RepositoryError::io(&target, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("has parent")).expect("create dirs");
        fs::write(path, content).expect("write file");
    }

    fn setup() -> (TempDir, ChallengeRepository) {
        let dir = TempDir::new().expect("temp dir");
        let repo = ChallengeRepository::new(dir.path(), "redis");
        (dir, repo)
    }

    #[test]
    fn test_stage_description_folder_takes_priority() {
        let (dir, repo) = setup();
        let base = "challenges/redis/stage_descriptions";
        write(dir.path(), &format!("{base}/base-02-ping.md"), "file variant");
        write(dir.path(), &format!("{base}/base-02-ping/b.md"), "folder b");
        write(dir.path(), &format!("{base}/base-02-ping/a.md"), "folder a");

        let text = repo
            .read_stage_description("02-ping", StageKind::Base)
            .expect("found");
        assert_eq!(text, "folder a");
    }

    #[test]
    fn test_stage_description_file_and_localized_variant() {
        let (dir, repo) = setup();
        let base = "challenges/redis/stage_descriptions";
        write(dir.path(), &format!("{base}/02-ping.md"), "localized");
        write(dir.path(), &format!("{base}/base-02-ping.md"), "base");

        assert_eq!(
            repo.read_stage_description("02-ping", StageKind::Localized)
                .expect("found"),
            "localized"
        );
        assert_eq!(
            repo.read_stage_description("02-ping", StageKind::Base)
                .expect("found"),
            "base"
        );
    }

    #[test]
    fn test_stage_description_missing_is_error() {
        let (_dir, repo) = setup();
        let err = repo
            .read_stage_description("09-none", StageKind::Base)
            .expect_err("missing");
        assert!(matches!(err, RepositoryError::StageDescriptionNotFound { .. }));
    }

    #[test]
    fn test_read_solution_absent_is_empty() {
        let (dir, repo) = setup();
        assert_eq!(repo.read_solution("python", "01-init"), "");

        write(dir.path(), "challenges/redis/solutions/python/01-init/code/README.md", "x");
        assert_eq!(repo.read_solution("python", "01-init"), "");

        write(
            dir.path(),
            "challenges/redis/solutions/python/01-init/code/app/main.py",
            "print('hi')",
        );
        assert_eq!(repo.read_solution("python", "01-init"), "print('hi')");
    }

    #[test]
    fn test_previous_stage_lookup() {
        let (dir, repo) = setup();
        write(dir.path(), "challenges/redis/solutions/go/01-init/code/app/main.go", "v1");
        write(dir.path(), "challenges/redis/solutions/go/02-ping/code/app/main.go", "v2");

        assert_eq!(
            repo.previous_stage_id("go", "02-ping"),
            Some("01-init".to_string())
        );
        assert_eq!(repo.previous_stage_id("go", "01-init"), None);
        assert_eq!(repo.previous_stage_id("go", "xx-none"), None);
        assert_eq!(repo.previous_stage_id("rust", "02-ping"), None);
        assert_eq!(repo.previous_stage_id("go", "04-echo"), None);

        let previous = repo.read_previous_stage("go", "02-ping").expect("previous");
        assert_eq!(previous.stage_id.as_deref(), Some("01-init"));
        assert_eq!(previous.source, "v1");
    }

    #[test]
    fn test_stage_number_parsing() {
        assert_eq!(stage_number("03-abc"), Some(3));
        assert_eq!(stage_number("10"), Some(10));
        assert_eq!(stage_number("abc"), None);
        assert_eq!(stage_number(""), None);
    }

    #[test]
    fn test_list_languages_skips_hidden_and_files() {
        let (dir, repo) = setup();
        assert!(repo.list_languages().is_empty());

        fs::create_dir_all(dir.path().join("challenges/redis/solutions/rust")).expect("mkdir");
        fs::create_dir_all(dir.path().join("challenges/redis/solutions/go")).expect("mkdir");
        fs::create_dir_all(dir.path().join("challenges/redis/solutions/.git")).expect("mkdir");
        write(dir.path(), "challenges/redis/solutions/notes.txt", "x");

        assert_eq!(repo.list_languages(), vec!["go", "rust"]);
    }

    #[test]
    fn test_prepare_code_dir_wipes_and_copies_starter() {
        let (dir, repo) = setup();
        write(dir.path(), "challenges/redis/compiled_starters/go/app/main.go", "starter");
        write(dir.path(), "challenges/redis/compiled_starters/go/go.mod", "module x");
        write(dir.path(), "challenges/redis/solutions/go/02-ping/code/stale.go", "old");

        let code_dir = repo.prepare_code_dir("go", "02-ping").expect("prepared");
        assert!(code_dir.join("app/main.go").is_file());
        assert!(code_dir.join("go.mod").is_file());
        assert!(!code_dir.join("stale.go").exists());

        let path = repo
            .write_solution("go", "02-ping", "package main")
            .expect("written");
        assert_eq!(path, code_dir.join("app/main.go"));
        assert_eq!(fs::read_to_string(path).expect("read"), "package main");
    }

    #[test]
    fn test_prepare_code_dir_requires_starter() {
        let (_dir, repo) = setup();
        let err = repo.prepare_code_dir("zig", "01-init").expect_err("no starter");
        assert!(matches!(err, RepositoryError::StarterNotFound { .. }));
    }

    #[test]
    fn test_write_solution_uses_default_path_when_nothing_found() {
        let (dir, repo) = setup();
        fs::create_dir_all(dir.path().join("challenges/redis/compiled_starters/rust"))
            .expect("mkdir");
        repo.prepare_code_dir("rust", "01-init").expect("prepared");

        let path = repo
            .write_solution("rust", "01-init", "fn main() {}")
            .expect("written");
        assert_eq!(
            path,
            dir.path()
                .join("challenges/redis/solutions/rust/01-init/code/src/main.rs")
        );
        assert!(path.is_file());
    }

    #[test]
    fn test_entry_file_follows_starter_layout() {
        let (dir, repo) = setup();
        write(
            dir.path(),
            "challenges/redis/compiled_starters/go/src/server.go",
            "package main",
        );
        assert_eq!(repo.entry_file("go"), PathBuf::from("src/server.go"));
        assert_eq!(repo.entry_file("python"), PathBuf::from("app/main.py"));
    }

    #[test]
    fn test_hints_write_and_read_back() {
        let (_dir, repo) = setup();
        let hints = vec![Hint::new("A", "body a"), Hint::new("B", "body \"b\"")];
        let path = repo.write_hints("go", "01-init", &hints).expect("written");
        assert!(path.ends_with("solutions/go/01-init/config.yml"));
        assert_eq!(repo.read_hints("go", "01-init"), hints);

        let reference = repo.load_reference("go", "01-init");
        assert_eq!(reference.fixed_hint_titles, vec!["A", "B"]);
        assert_eq!(reference.solution, "");
    }

    #[test]
    fn test_dry_run_never_writes() {
        let dir = TempDir::new().expect("temp dir");
        let repo = ChallengeRepository::new(dir.path(), "redis").with_dry_run(true);
        write(dir.path(), "challenges/redis/compiled_starters/go/app/main.go", "starter");
        write(dir.path(), "challenges/redis/solutions/go/02-ping/code/stale.go", "old");

        let code_dir = repo.prepare_code_dir("go", "02-ping").expect("prepared");
        assert!(code_dir.join("stale.go").is_file());

        let path = repo
            .write_solution("go", "02-ping", "package main")
            .expect("logged");
        assert_eq!(path, code_dir.join("app/main.go"));
        assert!(!path.exists());

        let hints_path = repo
            .write_hints("go", "02-ping", &[Hint::new("A", "a")])
            .expect("logged");
        assert!(!hints_path.exists());
    }
}
