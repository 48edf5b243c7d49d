//! Best-effort discovery of a language's entry source file.
//!
//! Challenge solutions are laid out inconsistently: flat, nested under a
//! library root, or nested under an application root. Discovery runs in two
//! phases:
//!
//! 1. Scan the conventional source roots in priority order. The first root
//!    containing any match decides; candidates are ranked by basename
//!    preference, then shallower depth, then path.
//! 2. If no conventional root matched, scan the whole tree with a larger
//!    depth limit and rank by deepest first, then basename preference, then
//!    path.
//!
//! Unreadable directories are treated as empty. Discovery never fails; it
//! returns `None` when nothing matches.

use std::cmp::Reverse;
use std::path::{Path, PathBuf};

use tracing::trace;
use walkdir::{DirEntry, WalkDir};

/// Conventional source roots, highest priority first.
pub const SOURCE_ROOTS: &[&str] = &["src", "lib", "app"];

/// Preferred entry-file stems, best first. Compared case-insensitively.
pub const PREFERRED_STEMS: &[&str] = &["main", "server", "app", "index"];

/// Depth limit inside a conventional root.
pub const ROOT_SCAN_DEPTH: usize = 6;

/// Depth limit for the whole-tree fallback scan.
pub const TREE_SCAN_DEPTH: usize = 12;

const IGNORED_DIRS: &[&str] = &["node_modules", "target"];

#[derive(Debug, Clone)]
struct Candidate {
    path: PathBuf,
    depth: usize,
    stem_rank: usize,
}

/// Finds the most likely entry file with the given extension under `root`.
///
/// `extension` may be given with or without the leading dot.
pub fn find_main_file(root: &Path, extension: &str) -> Option<PathBuf> {
    let extension = normalize_extension(extension);
    if extension.len() <= 1 {
        return None;
    }

    for source_root in SOURCE_ROOTS {
        let dir = root.join(source_root);
        if !dir.is_dir() {
            continue;
        }
        let mut candidates = collect_candidates(&dir, &extension, ROOT_SCAN_DEPTH);
        if candidates.is_empty() {
            continue;
        }
        candidates.sort_by(|a, b| {
            (a.stem_rank, a.depth, &a.path).cmp(&(b.stem_rank, b.depth, &b.path))
        });
        trace!(root = %dir.display(), count = candidates.len(), "Matched in conventional root");
        return candidates.into_iter().next().map(|c| c.path);
    }

    let mut candidates = collect_candidates(root, &extension, TREE_SCAN_DEPTH);
    candidates.sort_by(|a, b| {
        (Reverse(a.depth), a.stem_rank, &a.path).cmp(&(Reverse(b.depth), b.stem_rank, &b.path))
    });
    candidates.into_iter().next().map(|c| c.path)
}

fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim();
    if trimmed.starts_with('.') {
        trimmed.to_string()
    } else {
        format!(".{}", trimmed)
    }
}

fn collect_candidates(dir: &Path, extension: &str, max_depth: usize) -> Vec<Candidate> {
    WalkDir::new(dir)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry))
        // Unreadable directories surface as per-entry errors; skip them.
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?;
            let stem = name.strip_suffix(extension)?;
            if stem.is_empty() {
                return None;
            }
            let rank = stem_rank(stem);
            let depth = entry.depth();
            Some(Candidate {
                stem_rank: rank,
                depth,
                path: entry.into_path(),
            })
        })
        .collect()
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && IGNORED_DIRS.contains(&name.as_ref())
}

fn stem_rank(stem: &str) -> usize {
    let lowered = stem.to_ascii_lowercase();
    PREFERRED_STEMS
        .iter()
        .position(|preferred| *preferred == lowered)
        .unwrap_or(PREFERRED_STEMS.len())
}
