//! Commit driver
//!
//! Plays a [`Schedule`] against a repository. For every planned commit it
//! draws a time inside working hours, takes a handful of files out of the
//! pool, appends a newline to each, stages them and commits with the
//! backdated timestamp.
//!
//! Failures of a single attempt (write, stage, commit) are not fatal: the
//! files go to the retry pool and the attempt does not count. The pool is
//! refilled from the retry pool first and from a fresh directory walk
//! second.

use crate::files::{FileEnumerator, FilesError};
use crate::git::{format_git_timestamp, local_offset_at, CommitIdentity, GitError, Vcs};
use crate::message::MessageSource;
use crate::schedule::Schedule;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use indicatif::ProgressBar;
use rand::seq::index;
use rand::Rng;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_MAX_FILES_PER_COMMIT: usize = 5;
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: usize = 50;

/// First hour of the working day (inclusive)
pub const WORKDAY_START_HOUR: u32 = 9;
/// Last hour of the working day (inclusive, up to hh:59:59)
pub const WORKDAY_END_HOUR: u32 = 18;

/// Errors that stop the whole run
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("no files available to modify under {0}")]
    NoFilesAvailable(PathBuf),

    #[error("giving up after {0} failed commit attempts in a row")]
    TooManyFailures(usize),

    #[error("max files per commit must be at least 1")]
    ZeroFilesPerCommit,

    #[error(transparent)]
    Files(#[from] FilesError),
}

/// Why one commit attempt did not go through
#[derive(Error, Debug)]
enum AttemptError {
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Git(#[from] GitError),
}

/// Files waiting for a commit plus those whose last attempt failed.
#[derive(Debug, Default, Clone)]
pub struct FilePool {
    pending: Vec<PathBuf>,
    retry: Vec<PathBuf>,
}

impl FilePool {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            pending: files,
            retry: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn retry_len(&self) -> usize {
        self.retry.len()
    }

    /// Move retry files back into the pending set. Returns false if there were none.
    pub fn replenish_from_retry(&mut self) -> bool {
        if self.retry.is_empty() {
            return false;
        }
        self.pending.append(&mut self.retry);
        true
    }

    pub fn refill(&mut self, files: Vec<PathBuf>) {
        self.pending.extend(files);
    }

    /// Remove and return between 1 and `max` random files (fewer if the
    /// pool is smaller). Empty only when the pool is empty or `max` is 0.
    pub fn take_random<R: Rng + ?Sized>(&mut self, max: usize, rng: &mut R) -> Vec<PathBuf> {
        let upper = max.min(self.pending.len());
        if upper == 0 {
            return Vec::new();
        }
        let amount = rng.random_range(1..=upper);
        let mut picked = index::sample(rng, self.pending.len(), amount).into_vec();
        // highest index first so swap_remove never moves a picked entry
        picked.sort_unstable_by(|a, b| b.cmp(a));
        picked
            .into_iter()
            .map(|i| self.pending.swap_remove(i))
            .collect()
    }

    /// Queue files from a failed attempt for a later one.
    pub fn requeue(&mut self, files: Vec<PathBuf>) {
        self.retry.extend(files);
    }
}

/// Tunables for [`CommitDriver`].
#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    pub max_files_per_commit: usize,
    pub max_consecutive_failures: usize,
    /// Fixed UTC offset for every commit; `None` uses the local offset of each date
    pub utc_offset: Option<FixedOffset>,
}

impl DriverOptions {
    pub fn validate(&self) -> Result<(), DriveError> {
        if self.max_files_per_commit == 0 {
            return Err(DriveError::ZeroFilesPerCommit);
        }
        Ok(())
    }
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            max_files_per_commit: DEFAULT_MAX_FILES_PER_COMMIT,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            utc_offset: None,
        }
    }
}

/// Outcome of a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DriveSummary {
    pub commits_made: usize,
    pub failed_attempts: usize,
    pub files_touched: usize,
}

pub struct CommitDriver<'a, V: Vcs + ?Sized, M: MessageSource> {
    vcs: &'a mut V,
    enumerator: &'a FileEnumerator,
    messages: M,
    identity: CommitIdentity,
    options: DriverOptions,
    progress: ProgressBar,
}

impl<'a, V: Vcs + ?Sized, M: MessageSource> CommitDriver<'a, V, M> {
    pub fn new(
        vcs: &'a mut V,
        enumerator: &'a FileEnumerator,
        messages: M,
        identity: CommitIdentity,
    ) -> Self {
        Self {
            vcs,
            enumerator,
            messages,
            identity,
            options: DriverOptions::default(),
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_options(mut self, options: DriverOptions) -> Self {
        self.options = options;
        self
    }

    /// Report each successful commit on `progress`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Make every commit in `schedule`, in order.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        schedule: &Schedule,
        pool: &mut FilePool,
        rng: &mut R,
    ) -> Result<DriveSummary, DriveError> {
        self.options.validate()?;

        let total = schedule.total_commits();
        let mut summary = DriveSummary::default();
        let mut failures_in_a_row = 0;

        self.progress.set_length(total as u64);

        'days: for entry in schedule {
            self.progress.set_message(entry.date.to_string());
            let mut made_today = 0;

            while made_today < entry.commits {
                if summary.commits_made >= total {
                    break 'days;
                }

                self.ensure_files(pool)?;

                let when = random_work_time(entry.date, rng);
                let files = pool.take_random(self.options.max_files_per_commit, rng);
                let message = self.messages.next_message(rng);

                match self.try_commit(&files, &message, when) {
                    Ok(()) => {
                        debug!("Committed {} file(s) at {}: {}", files.len(), when, message);
                        summary.commits_made += 1;
                        summary.files_touched += files.len();
                        made_today += 1;
                        failures_in_a_row = 0;
                        self.progress.inc(1);
                    }
                    Err(err) => {
                        warn!("Commit attempt failed, will retry its files later: {}", err);
                        summary.failed_attempts += 1;
                        pool.requeue(files);
                        failures_in_a_row += 1;
                        if failures_in_a_row >= self.options.max_consecutive_failures {
                            return Err(DriveError::TooManyFailures(failures_in_a_row));
                        }
                    }
                }
            }
        }

        Ok(summary)
    }

    fn ensure_files(&self, pool: &mut FilePool) -> Result<(), DriveError> {
        if !pool.is_empty() {
            return Ok(());
        }
        if pool.replenish_from_retry() {
            debug!("Pool empty, reusing {} file(s) from retry", pool.len());
            return Ok(());
        }

        let files = self.enumerator.collect()?;
        if files.is_empty() {
            return Err(DriveError::NoFilesAvailable(
                self.enumerator.root().to_path_buf(),
            ));
        }
        debug!("Pool empty, rescanned {} file(s)", files.len());
        pool.refill(files);
        Ok(())
    }

    /// One commit attempt. On failure nothing it staged stays in the index,
    /// so the files only ever land in a commit they were picked for.
    fn try_commit(
        &mut self,
        files: &[PathBuf],
        message: &str,
        when: NaiveDateTime,
    ) -> Result<(), AttemptError> {
        let result = self.commit_files(files, message, when);
        if result.is_err() {
            if let Err(err) = self.vcs.unstage(files) {
                warn!("Could not unstage files of a failed attempt: {}", err);
            }
        }
        result
    }

    fn commit_files(
        &mut self,
        files: &[PathBuf],
        message: &str,
        when: NaiveDateTime,
    ) -> Result<(), AttemptError> {
        for file in files {
            touch(&self.enumerator.root().join(file))?;
        }
        for file in files {
            self.vcs.add(file)?;
        }

        let offset = self
            .options
            .utc_offset
            .unwrap_or_else(|| local_offset_at(when));
        let timestamp = format_git_timestamp(when, offset);
        self.vcs.commit(message, &self.identity, &timestamp)?;
        Ok(())
    }
}

/// Append a single newline to `path`.
fn touch(path: &Path) -> Result<(), AttemptError> {
    std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(b"\n"))
        .map_err(|source| AttemptError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Uniformly random second between 09:00:00 and 18:59:59 on `date`.
pub fn random_work_time<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> NaiveDateTime {
    let start = WORKDAY_START_HOUR * 3600;
    let end = (WORKDAY_END_HOUR + 1) * 3600;
    let seconds = rng.random_range(start..end);
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or(NaiveTime::MIN);
    date.and_time(time)
}
