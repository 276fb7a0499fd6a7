//! Run command - plan and create the backdated commits

use super::prompt::Prompter;
use super::RunArgs;

use anyhow::{bail, Context, Result};
use chrono::Local;
use console::style;
use gitgamer::config::UserConfig;
use gitgamer::driver::{CommitDriver, DriverOptions, FilePool};
use gitgamer::files::FileEnumerator;
use gitgamer::git::{configured_identity, init_repository, push_history, CommitIdentity, GitCli};
use gitgamer::message::RandomMessages;
use gitgamer::schedule::{build_schedule, ScheduleParams};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything a run needs once flags, answers and config are merged
#[derive(Debug)]
struct Settings {
    folder: PathBuf,
    params: ScheduleParams,
    remote: Option<String>,
    identity: CommitIdentity,
    max_files: usize,
    seed: Option<u64>,
}

/// Run the generator
pub fn run(args: RunArgs, config: &UserConfig) -> Result<()> {
    let interactive = !args.yes && console::user_attended_stderr();
    let settings = resolve_settings(args, config, interactive)?;

    // Reject impossible plans before touching the repository
    settings.params.validate()?;

    let root = settings
        .folder
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", settings.folder.display()))?;
    if !root.is_dir() {
        bail!("Path is not a directory: {}", root.display());
    }

    let mut rng = make_rng(settings.seed);
    let mut git = GitCli::new(&root);
    init_repository(&mut git, settings.remote.as_deref())
        .context("Error initializing git repository")?;

    let enumerator = FileEnumerator::new(&root, config.ignore_patterns())?;
    let files = enumerator.collect()?;
    if files.is_empty() {
        bail!(
            "No files found in {} (excluding ignored paths)",
            root.display()
        );
    }

    let schedule = build_schedule(&settings.params, Local::now().date_naive(), &mut rng)?;
    info!(
        "Planned {} commits over {} days for {}",
        schedule.total_commits(),
        schedule.len(),
        settings.identity
    );

    println!(
        "\n{} {} commits over {} active days ({} to {}) as {}",
        style("📅").bold(),
        style(schedule.total_commits()).cyan(),
        style(schedule.len()).cyan(),
        schedule.first_date().map(|d| d.to_string()).unwrap_or_default(),
        schedule.last_date().map(|d| d.to_string()).unwrap_or_default(),
        style(&settings.identity).yellow()
    );
    println!(
        "   {} candidate files in {}",
        style(files.len()).cyan(),
        style(root.display()).dim()
    );

    let bar = ProgressBar::new(schedule.total_commits() as u64);
    bar.set_style(bar_style());

    let options = DriverOptions {
        max_files_per_commit: settings.max_files,
        ..Default::default()
    };
    let mut pool = FilePool::new(files);
    let summary = CommitDriver::new(&mut git, &enumerator, RandomMessages, settings.identity)
        .with_options(options)
        .with_progress(bar.clone())
        .run(&schedule, &mut pool, &mut rng);

    let summary = match summary {
        Ok(summary) => summary,
        Err(err) => {
            bar.abandon();
            return Err(err).context("Commit generation stopped");
        }
    };

    bar.finish_with_message(format!(
        "{}Completed: {}/{} commits created",
        style("✓ ").green(),
        summary.commits_made,
        schedule.total_commits()
    ));
    if summary.failed_attempts > 0 {
        println!(
            "   {} attempts failed and were retried",
            style(summary.failed_attempts).yellow()
        );
    }

    if settings.remote.is_some() && summary.commits_made > 0 {
        println!("\n{} Pushing changes to remote repository...", style("🚀").bold());
    }
    if push_history(&mut git, settings.remote.as_deref(), summary.commits_made)
        .context("Git push failed")?
    {
        println!("{} Pushed", style("✓").green());
    }

    Ok(())
}

fn resolve_settings(args: RunArgs, config: &UserConfig, interactive: bool) -> Result<Settings> {
    let prompter = Prompter::new();
    let schedule = args.schedule;

    let max_files = args.max_files.unwrap_or(config.max_files_per_commit());
    if max_files == 0 {
        bail!("max_files_per_commit in the config file must be at least 1");
    }

    if interactive {
        prompter.heading("gitgamer configuration")?;
    }

    let total_commits = match schedule.commits {
        Some(n) => n,
        None if interactive => prompter.number(
            "Enter total number of commits you want",
            None,
            |n: &usize| *n > 0,
            "Please enter a positive number.",
        )?,
        None => bail!("--commits is required when not running interactively"),
    };

    let folder = match args.path {
        Some(path) => path,
        None if interactive => prompter.folder("Enter the folder path", Path::new("."))?,
        None => PathBuf::from("."),
    };

    let max_commits_per_day = ask_or(
        schedule.max_per_day,
        config.max_commits_per_day(),
        interactive,
        |default| {
            prompter.number(
                "Enter maximum commits per day",
                Some(default),
                |n: &usize| *n > 0,
                "Please enter a positive number.",
            )
        },
    )?;

    let max_gap = ask_or(schedule.max_gap, config.max_gap(), interactive, |default| {
        prompter.number(
            "Enter maximum gap between commits in days",
            Some(default),
            |_: &u32| true,
            "Please enter a non-negative number.",
        )
    })?;

    let max_days_in_past = ask_or(
        schedule.max_days,
        config.max_days_in_past(),
        interactive,
        |default| {
            prompter.number(
                "Enter maximum days in past",
                Some(default),
                |_: &u32| true,
                "Please enter a non-negative number.",
            )
        },
    )?;

    let remote = match args.remote {
        Some(url) => Some(url),
        None if interactive => {
            prompter.optional("Enter remote repository URL (optional, press Enter to skip):")?
        }
        None => None,
    };

    let mut answered_name = None;
    let mut answered_email = None;
    if interactive && (args.name.is_none() || args.email.is_none()) {
        prompter.heading("Git author configuration")?;
        if args.name.is_none() {
            answered_name = prompter.optional("Enter your Git name (default from git config):")?;
        }
        if args.email.is_none() {
            answered_email =
                prompter.optional("Enter your Git email (default from git config):")?;
        }
    }

    let (git_name, git_email) = configured_identity(&folder);
    let identity = CommitIdentity::resolve(
        [args.name, answered_name, config.author.name.clone(), git_name],
        [args.email, answered_email, config.author.email.clone(), git_email],
    );

    Ok(Settings {
        folder,
        params: ScheduleParams {
            total_commits,
            max_commits_per_day,
            max_gap,
            max_days_in_past,
        },
        remote,
        identity,
        max_files,
        seed: schedule.seed,
    })
}

/// Flag value if given, else the prompt's answer when interactive, else the default.
fn ask_or<T: Copy>(
    flag: Option<T>,
    default: T,
    interactive: bool,
    ask: impl FnOnce(T) -> Result<T>,
) -> Result<T> {
    match flag {
        Some(value) => Ok(value),
        None if interactive => ask(default),
        None => Ok(default),
    }
}

pub(super) fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .expect("valid template")
        .progress_chars("█▓▒░  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ScheduleArgs;

    #[test]
    fn test_non_interactive_requires_commit_count() {
        let err = resolve_settings(RunArgs::default(), &UserConfig::default(), false).unwrap_err();
        assert!(err.to_string().contains("--commits"));
    }

    #[test]
    fn test_flags_beat_config() {
        let mut config = UserConfig::default();
        config.schedule.max_gap = Some(7);
        config.schedule.max_days_in_past = Some(60);
        config.author.name = Some("From Config".to_string());

        let args = RunArgs {
            path: Some(PathBuf::from("somewhere")),
            schedule: ScheduleArgs {
                commits: Some(10),
                max_per_day: Some(3),
                max_gap: None,
                max_days: Some(12),
                seed: Some(1),
            },
            name: Some("From Flag".to_string()),
            email: Some("flag@example.com".to_string()),
            ..Default::default()
        };
        let settings = resolve_settings(args, &config, false).unwrap();
        assert_eq!(settings.folder, PathBuf::from("somewhere"));
        assert_eq!(
            settings.params,
            ScheduleParams {
                total_commits: 10,
                max_commits_per_day: 3,
                max_gap: 7,
                max_days_in_past: 12,
            }
        );
        assert_eq!(settings.identity.name, "From Flag");
        assert_eq!(settings.identity.email, "flag@example.com");
        assert_eq!(settings.max_files, 5);
        assert_eq!(settings.seed, Some(1));
    }

    #[test]
    fn test_zero_files_per_commit_in_config_is_rejected() {
        let mut config = UserConfig::default();
        config.schedule.max_files_per_commit = Some(0);
        let args = RunArgs {
            schedule: ScheduleArgs {
                commits: Some(3),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = resolve_settings(args, &config, false).unwrap_err();
        assert!(err.to_string().contains("max_files_per_commit"));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        use rand::Rng;
        let a: u64 = make_rng(Some(3)).random();
        let b: u64 = make_rng(Some(3)).random();
        assert_eq!(a, b);
    }
}
