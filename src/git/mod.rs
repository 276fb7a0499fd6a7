//! Version-control boundary
//!
//! Everything the tool asks of git goes through the [`Vcs`] trait so the
//! scheduling and commit logic can run against an in-memory double. The
//! real implementation, [`GitCli`], shells out to the `git` executable and
//! uses libgit2 only for read-only lookups.
//!
//! # Example
//!
//! ```no_run
//! use gitgamer::git::{init_repository, GitCli};
//! use std::path::Path;
//!
//! let mut git = GitCli::new(Path::new("/path/to/project"));
//! init_repository(&mut git, Some("git@example.com:me/project.git")).unwrap();
//! ```

pub mod command;
pub mod identity;
pub mod timestamp;

pub use command::GitCli;
pub use identity::{configured_identity, CommitIdentity, FALLBACK_EMAIL, FALLBACK_NAME};
pub use timestamp::{format_git_timestamp, local_offset_at};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Remote name used for setup and push
pub const ORIGIN: &str = "origin";

#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}: {stderr}", exit_label(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("HEAD is detached, no branch to push")]
    DetachedHead,

    #[error("repository error: {0}")]
    Repository(#[from] git2::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

/// The handful of git operations the tool needs.
pub trait Vcs {
    /// Whether the working directory already holds repository metadata
    fn is_repository(&self) -> bool;

    fn init(&mut self) -> Result<(), GitError>;

    fn remove_remote(&mut self, name: &str) -> Result<(), GitError>;

    fn add_remote(&mut self, name: &str, url: &str) -> Result<(), GitError>;

    /// Stage one path, relative to the working directory
    fn add(&mut self, path: &Path) -> Result<(), GitError>;

    /// Drop `paths` from the index again, back to their `HEAD` state
    fn unstage(&mut self, paths: &[PathBuf]) -> Result<(), GitError>;

    /// Commit the index with `identity` as both author and committer and
    /// `timestamp` as both author and committer date.
    fn commit(
        &mut self,
        message: &str,
        identity: &CommitIdentity,
        timestamp: &str,
    ) -> Result<(), GitError>;

    fn current_branch(&self) -> Result<String, GitError>;

    /// Push `branch` and set it to track `remote`
    fn push(&mut self, remote: &str, branch: &str) -> Result<(), GitError>;
}

/// Make sure a repository exists and, if a URL is given, point `origin` at it.
///
/// Safe to repeat: an existing repository is left alone, and an existing
/// `origin` is replaced (failure to remove a missing one is ignored).
pub fn init_repository<V: Vcs + ?Sized>(vcs: &mut V, remote_url: Option<&str>) -> Result<(), GitError> {
    if vcs.is_repository() {
        debug!("Repository already initialized");
    } else {
        info!("Initializing new git repository");
        vcs.init()?;
    }

    if let Some(url) = remote_url {
        if let Err(err) = vcs.remove_remote(ORIGIN) {
            debug!("No existing {} to remove: {}", ORIGIN, err);
        }
        vcs.add_remote(ORIGIN, url)?;
        info!("Remote {} set to {}", ORIGIN, url);
    }

    Ok(())
}

/// Push the current branch to `origin` when there is something to push.
///
/// Returns `Ok(false)` without touching the network when no remote was
/// configured or no commit was made.
pub fn push_history<V: Vcs + ?Sized>(
    vcs: &mut V,
    remote_url: Option<&str>,
    commits_made: usize,
) -> Result<bool, GitError> {
    if remote_url.is_none() || commits_made == 0 {
        return Ok(false);
    }
    let branch = vcs.current_branch()?;
    info!("Pushing {} to {}", branch, ORIGIN);
    vcs.push(ORIGIN, &branch)?;
    Ok(true)
}

/// In-memory [`Vcs`] used by unit tests across the crate.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashSet;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedCommit {
        pub message: String,
        pub timestamp: String,
        pub identity: CommitIdentity,
        pub files: Vec<PathBuf>,
    }

    #[derive(Debug, Default)]
    pub struct FakeVcs {
        pub initialized: bool,
        pub init_calls: usize,
        pub remotes: Vec<(String, String)>,
        pub staged: Vec<PathBuf>,
        pub commits: Vec<RecordedCommit>,
        pub pushes: Vec<(String, String)>,
        /// Paths whose `add` always fails
        pub reject_add: HashSet<PathBuf>,
        /// Number of upcoming `add` calls that fail, whatever the path
        pub fail_adds: usize,
        /// Number of upcoming `commit` calls that fail
        pub fail_commits: usize,
        pub fail_push: bool,
        pub branch: Option<String>,
    }

    fn failed(command: &str) -> GitError {
        GitError::CommandFailed {
            command: command.to_string(),
            code: Some(1),
            stderr: "simulated failure".to_string(),
        }
    }

    impl Vcs for FakeVcs {
        fn is_repository(&self) -> bool {
            self.initialized
        }

        fn init(&mut self) -> Result<(), GitError> {
            self.init_calls += 1;
            self.initialized = true;
            Ok(())
        }

        fn remove_remote(&mut self, name: &str) -> Result<(), GitError> {
            let before = self.remotes.len();
            self.remotes.retain(|(n, _)| n != name);
            if self.remotes.len() == before {
                return Err(failed("git remote remove"));
            }
            Ok(())
        }

        fn add_remote(&mut self, name: &str, url: &str) -> Result<(), GitError> {
            if self.remotes.iter().any(|(n, _)| n == name) {
                return Err(failed("git remote add"));
            }
            self.remotes.push((name.to_string(), url.to_string()));
            Ok(())
        }

        fn add(&mut self, path: &Path) -> Result<(), GitError> {
            if self.reject_add.contains(path) {
                return Err(failed("git add"));
            }
            if self.fail_adds > 0 {
                self.fail_adds -= 1;
                return Err(failed("git add"));
            }
            self.staged.push(path.to_path_buf());
            Ok(())
        }

        fn unstage(&mut self, paths: &[PathBuf]) -> Result<(), GitError> {
            self.staged.retain(|p| !paths.contains(p));
            Ok(())
        }

        fn commit(
            &mut self,
            message: &str,
            identity: &CommitIdentity,
            timestamp: &str,
        ) -> Result<(), GitError> {
            if self.fail_commits > 0 {
                self.fail_commits -= 1;
                return Err(failed("git commit"));
            }
            self.commits.push(RecordedCommit {
                message: message.to_string(),
                timestamp: timestamp.to_string(),
                identity: identity.clone(),
                files: std::mem::take(&mut self.staged),
            });
            Ok(())
        }

        fn current_branch(&self) -> Result<String, GitError> {
            self.branch.clone().ok_or(GitError::DetachedHead)
        }

        fn push(&mut self, remote: &str, branch: &str) -> Result<(), GitError> {
            if self.fail_push {
                return Err(failed("git push"));
            }
            self.pushes.push((remote.to_string(), branch.to_string()));
            Ok(())
        }
    }
}
