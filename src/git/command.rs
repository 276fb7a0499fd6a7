//! [`Vcs`] backed by the `git` executable

use super::{CommitIdentity, GitError, Vcs};
use git2::{ErrorCode, Repository};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Runs `git` inside a fixed working directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
    program: OsString,
}

impl GitCli {
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
            program: OsString::from("git"),
        }
    }

    /// Use a different executable than `git` from `PATH`.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// `git --version`, used by `doctor`
    pub fn version(&self) -> Result<String, GitError> {
        let output = self.run(&["--version"], &[])?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn run(&self, args: &[&str], env: &[(&str, &str)]) -> Result<Output, GitError> {
        let label = format!("git {}", args.join(" "));
        debug!("Running {} in {}", label, self.workdir.display());

        let mut cmd = Command::new(&self.program);
        cmd.args(args).current_dir(&self.workdir);
        for (key, value) in env {
            cmd.env(key, value);
        }

        let output = cmd.output().map_err(|source| GitError::Spawn {
            command: label.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: label,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl Vcs for GitCli {
    fn is_repository(&self) -> bool {
        Repository::open(&self.workdir).is_ok()
    }

    fn init(&mut self) -> Result<(), GitError> {
        self.run(&["init", "--quiet"], &[]).map(drop)
    }

    fn remove_remote(&mut self, name: &str) -> Result<(), GitError> {
        self.run(&["remote", "remove", name], &[]).map(drop)
    }

    fn add_remote(&mut self, name: &str, url: &str) -> Result<(), GitError> {
        self.run(&["remote", "add", name, url], &[]).map(drop)
    }

    fn add(&mut self, path: &Path) -> Result<(), GitError> {
        let path = path.to_string_lossy();
        self.run(&["add", "--", &path], &[]).map(drop)
    }

    fn unstage(&mut self, paths: &[PathBuf]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }
        let repo = Repository::open(&self.workdir)?;
        // unborn HEAD: resetting to no target removes the entries from the index
        let head = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?.into_object()),
            Err(err) if err.code() == ErrorCode::UnbornBranch => None,
            Err(err) => return Err(err.into()),
        };
        debug!("Unstaging {} path(s) in {}", paths.len(), self.workdir.display());
        repo.reset_default(head.as_ref(), paths.iter().map(|p| p.as_path()))?;
        Ok(())
    }

    fn commit(
        &mut self,
        message: &str,
        identity: &CommitIdentity,
        timestamp: &str,
    ) -> Result<(), GitError> {
        let env = identity.env_for(timestamp);
        let env: Vec<(&str, &str)> = env.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.run(&["commit", "--quiet", "-m", message], &env).map(drop)
    }

    fn current_branch(&self) -> Result<String, GitError> {
        let repo = Repository::open(&self.workdir)?;
        let head = repo.find_reference("HEAD")?;
        match head.symbolic_target() {
            Some(target) => Ok(target.trim_start_matches("refs/heads/").to_string()),
            None => Err(GitError::DetachedHead),
        }
    }

    fn push(&mut self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run(&["push", "-u", remote, branch], &[]).map(drop)
    }
}
