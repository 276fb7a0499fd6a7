//! CLI command definitions and handlers

mod doctor;
mod generate;
mod plan;
mod prompt;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use gitgamer::config::UserConfig;
use std::path::PathBuf;

/// Parse a count that must be at least 1
fn parse_positive(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("must be at least 1".to_string())
    } else {
        Ok(n)
    }
}

/// gitgamer - backfill a repository with a believable commit history
#[derive(Parser, Debug)]
#[command(name = "gitgamer")]
#[command(
    version,
    about = "Fill a repository with backdated commits spread over past days",
    long_about = "gitgamer picks a spread of past dates, decides how many commits land on \
each one, then appends a newline to a few random files per commit and commits them with \
backdated author and committer dates.\n\n\
Run without a subcommand for an interactive session in the current terminal.",
    after_help = "\
Examples:
  gitgamer                                       Interactive: asks for every setting
  gitgamer run ./project -n 40 --yes             40 commits over the last 30 days
  gitgamer run . -n 100 --max-days 90 --remote git@example.com:me/p.git
  gitgamer plan -n 25 --max-days 14              Preview the day-by-day plan
  gitgamer plan -n 25 --seed 7 --format json     Reproducible plan as JSON"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Knobs shared by `run` and `plan`
#[derive(Args, Debug, Clone, Default)]
pub struct ScheduleArgs {
    /// Total number of commits to create
    #[arg(long, short = 'n', value_parser = parse_positive)]
    pub commits: Option<usize>,

    /// Maximum commits on a single day (default 5)
    #[arg(long, value_parser = parse_positive)]
    pub max_per_day: Option<usize>,

    /// Maximum idle days between two active days (default 2)
    #[arg(long)]
    pub max_gap: Option<u32>,

    /// How many days back the history starts (default 30)
    #[arg(long)]
    pub max_days: Option<u32>,

    /// Seed for a reproducible plan and file selection
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Folder to fill with commits (asked for when omitted in a terminal)
    pub path: Option<PathBuf>,

    #[command(flatten)]
    pub schedule: ScheduleArgs,

    /// Remote URL to set as origin and push to afterwards
    #[arg(long)]
    pub remote: Option<String>,

    /// Author and committer name
    #[arg(long)]
    pub name: Option<String>,

    /// Author and committer email
    #[arg(long)]
    pub email: Option<String>,

    /// Most files touched by one commit (default 5)
    #[arg(long, value_parser = parse_positive)]
    pub max_files: Option<usize>,

    /// Never prompt; use flags, config and defaults only
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the commits (initializes the repository if needed)
    #[command(after_help = "\
Examples:
  gitgamer run ./project -n 40 --yes
  gitgamer run . -n 60 --max-per-day 3 --max-gap 1 --max-days 45
  gitgamer run . -n 20 --name \"Jane Doe\" --email jane@example.com
  gitgamer run . -n 20 --remote git@example.com:me/project.git")]
    Run(RunArgs),

    /// Print the commit plan without touching any repository
    Plan {
        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Manage configuration (init or show)
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Check environment setup (git binary, identity, config)
    Doctor,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create the config file with commented examples
    Init,
    /// Show the config path and effective values
    Show,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let config = UserConfig::load()?;

    match cli.command {
        Some(Commands::Run(args)) => generate::run(args, &config),

        Some(Commands::Plan { schedule, format }) => plan::run(&schedule, &format, &config),

        Some(Commands::Config { action }) => run_config_action(action, &config),

        Some(Commands::Doctor) => doctor::run(&config),

        // Default: interactive run in the current terminal
        None => generate::run(RunArgs::default(), &config),
    }
}

fn run_config_action(action: ConfigAction, config: &UserConfig) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = UserConfig::init_user_config()?;
            println!("✅ Config initialized at: {}", path.display());
            println!("\nEdit it to set default schedule values and your author identity.");
            Ok(())
        }
        ConfigAction::Show => show_config(config),
    }
}

fn show_config(config: &UserConfig) -> Result<()> {
    println!("📁 Config path:");
    if let Some(path) = UserConfig::user_config_path() {
        let status = if path.exists() { "✓" } else { "(not found)" };
        println!("  {} {}", path.display(), status);
    }
    println!();
    println!("📅 Schedule defaults:");
    println!("  max commits per day:  {}", config.max_commits_per_day());
    println!("  max gap (days):       {}", config.max_gap());
    println!("  max days in past:     {}", config.max_days_in_past());
    println!("  max files per commit: {}", config.max_files_per_commit());
    println!();
    println!("👤 Author:");
    println!(
        "  name:  {}",
        config.author.name.as_deref().unwrap_or("(git config)")
    );
    println!(
        "  email: {}",
        config.author.email.as_deref().unwrap_or("(git config)")
    );
    if !config.ignore_patterns().is_empty() {
        println!();
        println!("🚫 Extra ignore patterns: {}", config.ignore_patterns().join(", "));
    }
    Ok(())
}
