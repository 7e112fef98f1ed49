use crate::error::Error;
use crate::model::CandidateFile;
use glob::Pattern;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use walkdir::{DirEntry, WalkDir};

/// Resolve each root to its canonical absolute form so that different spellings of
/// one directory (relative, absolute, via a symlink) compare equal.
pub fn canonical_roots(root_paths: &[String]) -> Result<Vec<String>, Error> {
    root_paths
        .iter()
        .map(|root| canonical_root(Path::new(root)).map(|p| p.to_string_lossy().into_owned()))
        .collect()
}

fn canonical_root(root: &Path) -> Result<PathBuf, Error> {
    fs::canonicalize(root).map_err(|source| Error::Discovery {
        path: root.to_path_buf(),
        source,
    })
}

/// Walks every root in parallel and collects files whose lowercased extension is in
/// `extensions`. Hidden entries (name starting with `.`) are pruned, directories
/// included. Symlinks are not followed. An unreadable root aborts discovery.
pub fn discover_candidates(
    root_paths: &[&str],
    extensions: &[String],
    ignore_globs: &[&str],
) -> Result<Vec<CandidateFile>, Error> {
    let allowed: HashSet<String> = extensions.iter().map(|e| normalize_extension(e)).collect();

    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    let per_root: Vec<Vec<CandidateFile>> = root_paths
        .par_iter()
        .map(|root| visit_root(Path::new(root), &allowed, &ignore_patterns))
        .collect::<Result<_, _>>()?;

    let mut seen = HashSet::new();
    let mut candidates: Vec<CandidateFile> = per_root
        .into_iter()
        .flatten()
        .filter(|c| seen.insert(c.path.clone()))
        .collect();
    candidates.sort();

    Ok(candidates)
}

fn visit_root(
    root: &Path,
    allowed: &HashSet<String>,
    ignore_patterns: &[Pattern],
) -> Result<Vec<CandidateFile>, Error> {
    // Surface an unreadable root up front rather than as a walk entry error.
    let canonical = canonical_root(root)?;
    fs::read_dir(&canonical).map_err(|source| Error::Discovery {
        path: root.to_path_buf(),
        source,
    })?;
    let root = canonical.as_path();

    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_pruned(entry, ignore_patterns));

    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                if err.depth() == 0 {
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "walk failed"));
                    return Err(Error::Discovery {
                        path: root.to_path_buf(),
                        source,
                    });
                }
                warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(extension) = matching_extension(entry.path(), allowed) {
            found.push(CandidateFile {
                path: entry.into_path(),
                extension,
            });
        }
    }

    debug!("{} candidate files under {}", found.len(), root.display());
    Ok(found)
}

fn is_pruned(entry: &DirEntry, ignore_patterns: &[Pattern]) -> bool {
    is_hidden(entry)
        || ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(entry.path()))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn matching_extension(path: &Path, allowed: &HashSet<String>) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    allowed.contains(&extension).then_some(extension)
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn allowed(exts: &[&str]) -> HashSet<String> {
        exts.iter().map(|e| normalize_extension(e)).collect()
    }

    #[test]
    fn test_matching_extension_is_case_insensitive() {
        let allowed = allowed(&["jpg", "cr3"]);
        assert_eq!(
            matching_extension(Path::new("/a/photo.JPG"), &allowed),
            Some("jpg".to_string())
        );
        assert_eq!(
            matching_extension(Path::new("/a/IMG_0001.Cr3"), &allowed),
            Some("cr3".to_string())
        );
        assert_eq!(matching_extension(Path::new("/a/notes.txt"), &allowed), None);
        assert_eq!(matching_extension(Path::new("/a/README"), &allowed), None);
    }

    #[test]
    fn test_normalize_extension_strips_dot() {
        assert_eq!(normalize_extension(".NEF"), "nef");
        assert_eq!(normalize_extension("arw"), "arw");
    }
}
