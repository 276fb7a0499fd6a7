//! gitgamer - backfill a repository with a believable commit history
//!
//! Picks a spread of past dates, decides how many commits land on each,
//! then touches random files and commits them with backdated author and
//! committer timestamps.
//!
//! The pipeline is split so each stage can be tested on its own:
//! [`schedule`] plans dates and counts, [`files`] lists candidate files,
//! [`driver`] plays the plan through the [`git::Vcs`] boundary.

pub mod config;
pub mod driver;
pub mod files;
pub mod git;
pub mod message;
pub mod schedule;
