//! Candidate file discovery
//!
//! Walks the target folder and returns every file a fabricated commit may
//! touch. Exclusions come from a built-in pattern set, the folder's own
//! `.gitignore` and `.gitgamerignore`, and any extra patterns from the
//! user config. Matching uses gitignore semantics, and ignored
//! directories are pruned instead of being walked and filtered. Whatever
//! git itself would ignore (nested `.gitignore` files, `.git/info/exclude`,
//! the global excludes file) is skipped during the walk as well.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Always excluded, on top of whatever the folder ignores itself.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git/",
    "node_modules/",
    "dist/",
    "build/",
    ".cache/",
    "__pycache__/",
    ".env*",
    ".venv/",
    "venv/",
    "*.pyc",
];

/// Tool-specific ignore file read from the target root
pub const PROJECT_IGNORE_FILE: &str = ".gitgamerignore";

#[derive(Error, Debug)]
pub enum FilesError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("invalid ignore pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: ignore::Error,
    },

    #[error("failed to build ignore rules for {path}: {source}")]
    Matcher {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lists commit candidates under a root, relative to that root.
#[derive(Debug, Clone)]
pub struct FileEnumerator {
    root: PathBuf,
    matcher: Gitignore,
    skip: Option<PathBuf>,
}

impl FileEnumerator {
    /// Build the ignore rules for `root`.
    ///
    /// `extra_patterns` use gitignore syntax. An unreadable `.gitignore`
    /// is logged and skipped rather than failing the run. The running
    /// executable is excluded if it happens to live under `root`.
    pub fn new(root: &Path, extra_patterns: &[String]) -> Result<Self, FilesError> {
        if !root.is_dir() {
            return Err(FilesError::NotADirectory(root.to_path_buf()));
        }
        let root = root.canonicalize()?;

        let mut builder = GitignoreBuilder::new(&root);
        let defaults = DEFAULT_IGNORE_PATTERNS.iter().copied();
        for pattern in defaults.chain(extra_patterns.iter().map(String::as_str)) {
            builder
                .add_line(None, pattern)
                .map_err(|source| FilesError::BadPattern {
                    pattern: pattern.to_string(),
                    source,
                })?;
        }

        for name in [".gitignore", PROJECT_IGNORE_FILE] {
            let path = root.join(name);
            if !path.is_file() {
                continue;
            }
            if let Some(err) = builder.add(&path) {
                warn!("Could not read {}: {}", path.display(), err);
            } else {
                debug!("Loaded ignore rules from {}", path.display());
            }
        }

        let matcher = builder.build().map_err(|source| FilesError::Matcher {
            path: root.clone(),
            source,
        })?;

        let skip = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.canonicalize().ok());

        Ok(Self {
            root,
            matcher,
            skip,
        })
    }

    /// Exclude one more absolute path in place of the running executable.
    pub fn skip_path(mut self, path: &Path) -> Self {
        self.skip = path.canonicalize().ok();
        self
    }

    /// Canonical root the returned paths are relative to
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a root-relative path is excluded by the root-level rules.
    /// Nested ignore files only apply during [`FileEnumerator::collect`].
    pub fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }

    /// Walk the root and return every candidate, sorted.
    pub fn collect(&self) -> Result<Vec<PathBuf>, FilesError> {
        let matcher = self.matcher.clone();
        let root = self.root.clone();

        let mut builder = WalkBuilder::new(&self.root);
        // nested .gitignore files, .git/info/exclude and core.excludesFile:
        // git refuses to stage what they match
        builder
            .standard_filters(false)
            .git_ignore(true)
            .git_exclude(true)
            .git_global(true)
            .require_git(false)
            .parents(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                let Ok(relative) = entry.path().strip_prefix(&root) else {
                    return true;
                };
                if relative.as_os_str().is_empty() {
                    return true;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !matcher.matched(relative, is_dir).is_ignore()
            });

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            if self.skip.as_deref() == Some(path) {
                debug!("Skipping own executable {}", path.display());
                continue;
            }
            if let Ok(relative) = path.strip_prefix(&self.root) {
                files.push(relative.to_path_buf());
            }
        }

        files.sort();
        debug!("Found {} candidate files under {}", files.len(), self.root.display());
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_default_patterns_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/main.rs");
        touch(root, "README.md");
        touch(root, "node_modules/left-pad/index.js");
        touch(root, "web/node_modules/react/index.js");
        touch(root, ".git/config");
        touch(root, "build/out.o");
        touch(root, ".env.local");
        touch(root, "app/__pycache__/mod.cpython-311.pyc");
        touch(root, "app/mod.pyc");

        let files = FileEnumerator::new(root, &[]).unwrap().collect().unwrap();
        assert_eq!(names(&files), vec!["README.md", "src/main.rs"]);
    }

    #[test]
    fn test_gitignore_and_project_ignore_are_honored() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(".gitignore"), "# comment\nsecret.txt\nlogs/\n").unwrap();
        fs::write(root.join(PROJECT_IGNORE_FILE), "*.bak\n").unwrap();
        touch(root, "secret.txt");
        touch(root, "logs/today.log");
        touch(root, "notes.bak");
        touch(root, "lib.rs");

        let files = FileEnumerator::new(root, &[]).unwrap().collect().unwrap();
        assert_eq!(
            names(&files),
            vec![".gitgamerignore", ".gitignore", "lib.rs"]
        );
    }

    #[test]
    fn test_nested_gitignore_and_info_exclude() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "sub/.gitignore");
        fs::write(root.join("sub/.gitignore"), "x.txt\n").unwrap();
        touch(root, "sub/x.txt");
        touch(root, "sub/y.txt");
        touch(root, ".git/info/exclude");
        fs::write(root.join(".git/info/exclude"), "local.txt\n").unwrap();
        touch(root, "local.txt");

        let files = FileEnumerator::new(root, &[]).unwrap().collect().unwrap();
        assert_eq!(names(&files), vec!["sub/.gitignore", "sub/y.txt"]);
    }

    #[test]
    fn test_extra_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "docs/guide.md");
        touch(root, "src/a.rs");

        let extra = vec!["docs/".to_string()];
        let files = FileEnumerator::new(root, &extra).unwrap().collect().unwrap();
        assert_eq!(names(&files), vec!["src/a.rs"]);
    }

    #[test]
    fn test_skip_path_is_never_returned() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "tool");
        touch(root, "a.txt");

        let files = FileEnumerator::new(root, &[])
            .unwrap()
            .skip_path(&root.join("tool"))
            .collect()
            .unwrap();
        assert_eq!(names(&files), vec!["a.txt"]);
    }

    #[test]
    fn test_ignored_directories_report_as_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let enumerator = FileEnumerator::new(dir.path(), &[]).unwrap();
        assert!(enumerator.is_ignored(Path::new("node_modules"), true));
        assert!(enumerator.is_ignored(Path::new("pkg/node_modules/x/y.js"), false));
        assert!(!enumerator.is_ignored(Path::new("src/lib.rs"), false));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileEnumerator::new(&dir.path().join("nope"), &[]).unwrap_err();
        assert!(matches!(err, FilesError::NotADirectory(_)));
    }

    #[test]
    fn test_empty_folder_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileEnumerator::new(dir.path(), &[]).unwrap().collect().unwrap();
        assert!(files.is_empty());
    }
}
