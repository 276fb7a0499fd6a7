//! Author/committer identity

use git2::{Config, Repository};
use std::path::Path;
use tracing::debug;

pub const FALLBACK_NAME: &str = "Unknown";
pub const FALLBACK_EMAIL: &str = "unknown@example.com";

/// Name and email written as both author and committer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

impl CommitIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Pick the first non-blank value from each list of candidates, in
    /// priority order, falling back to placeholder values.
    pub fn resolve<N, E>(names: N, emails: E) -> Self
    where
        N: IntoIterator<Item = Option<String>>,
        E: IntoIterator<Item = Option<String>>,
    {
        Self {
            name: first_filled(names).unwrap_or_else(|| FALLBACK_NAME.to_string()),
            email: first_filled(emails).unwrap_or_else(|| FALLBACK_EMAIL.to_string()),
        }
    }

    /// Environment that makes git record this identity and `timestamp`
    /// for both author and committer.
    pub fn env_for(&self, timestamp: &str) -> [(&'static str, String); 6] {
        [
            ("GIT_AUTHOR_DATE", timestamp.to_string()),
            ("GIT_COMMITTER_DATE", timestamp.to_string()),
            ("GIT_AUTHOR_NAME", self.name.clone()),
            ("GIT_AUTHOR_EMAIL", self.email.clone()),
            ("GIT_COMMITTER_NAME", self.name.clone()),
            ("GIT_COMMITTER_EMAIL", self.email.clone()),
        ]
    }
}

impl std::fmt::Display for CommitIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

fn first_filled<I: IntoIterator<Item = Option<String>>>(candidates: I) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// `user.name` and `user.email` as git would see them in `dir`: the
/// repository's own config layered over the global one, or only the
/// global/system config when `dir` is not a repository yet.
pub fn configured_identity(dir: &Path) -> (Option<String>, Option<String>) {
    let config = match Repository::open(dir) {
        Ok(repo) => repo.config(),
        Err(_) => Config::open_default(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            debug!("No git configuration available: {}", err);
            return (None, None);
        }
    };
    (
        config.get_string("user.name").ok(),
        config.get_string("user.email").ok(),
    )
}
