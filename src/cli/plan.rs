//! Plan command - preview the schedule without touching a repository

use super::generate::make_rng;
use super::ScheduleArgs;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use console::style;
use gitgamer::config::UserConfig;
use gitgamer::schedule::{build_schedule, Schedule, ScheduleParams};
use serde::Serialize;

#[derive(Serialize)]
struct PlanReport<'a> {
    total_commits: usize,
    active_days: usize,
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
    schedule: &'a Schedule,
}

pub fn run(args: &ScheduleArgs, format: &str, config: &UserConfig) -> Result<()> {
    let total_commits = args
        .commits
        .context("--commits is required for plan")?;
    let params = ScheduleParams {
        total_commits,
        max_commits_per_day: args.max_per_day.unwrap_or(config.max_commits_per_day()),
        max_gap: args.max_gap.unwrap_or(config.max_gap()),
        max_days_in_past: args.max_days.unwrap_or(config.max_days_in_past()),
    };

    let mut rng = make_rng(args.seed);
    let schedule = build_schedule(&params, Local::now().date_naive(), &mut rng)?;

    match format {
        "json" => {
            let report = PlanReport {
                total_commits: schedule.total_commits(),
                active_days: schedule.len(),
                first_date: schedule.first_date(),
                last_date: schedule.last_date(),
                schedule: &schedule,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => print_text(&schedule, &params),
    }
    Ok(())
}

fn print_text(schedule: &Schedule, params: &ScheduleParams) {
    println!(
        "\n{} {} commits over {} active days (window {} days, max {}/day)\n",
        style("📅").bold(),
        style(schedule.total_commits()).cyan(),
        style(schedule.len()).cyan(),
        params.window_days(),
        params.max_commits_per_day
    );
    for entry in schedule {
        println!(
            "  {}  {}  {:>3}  {}",
            entry.date,
            style(entry.date.format("%a")).dim(),
            entry.commits,
            style("■".repeat(entry.commits)).green()
        );
    }
    println!();
}
