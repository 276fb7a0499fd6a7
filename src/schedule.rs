//! Commit schedule planning
//!
//! Turns "N commits over the last M days" into an ordered list of
//! `(date, commit count)` entries. Dates are picked with a coin flip per
//! day followed by a random gap, then every picked date gets an even
//! baseline share of the total and the remainder is sprinkled on top
//! without exceeding the daily cap.
//!
//! All randomness comes from the caller so plans are reproducible with a
//! seeded generator:
//!
//! ```
//! use chrono::NaiveDate;
//! use gitgamer::schedule::{build_schedule, ScheduleParams};
//! use rand::SeedableRng;
//!
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
//! let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let plan = build_schedule(&ScheduleParams::new(12), today, &mut rng).unwrap();
//! assert_eq!(plan.total_commits(), 12);
//! ```

use chrono::{Days, NaiveDate};
use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_MAX_COMMITS_PER_DAY: usize = 5;
pub const DEFAULT_MAX_GAP: u32 = 2;
pub const DEFAULT_MAX_DAYS_IN_PAST: u32 = 30;

/// Errors raised while validating or building a schedule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("total commits must be at least 1")]
    NoCommitsRequested,

    #[error("max commits per day must be at least 1")]
    ZeroDailyCap,

    #[error(
        "{total} commits cannot fit into {days} days at {per_day} per day (at most {capacity}); \
         raise --max-per-day or --max-days"
    )]
    InsufficientCapacity {
        total: usize,
        per_day: usize,
        days: u64,
        capacity: u64,
    },

    #[error("a window of {0} days reaches past the earliest supported date")]
    WindowOutOfRange(u32),
}

/// Knobs for [`build_schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleParams {
    /// Exact number of commits the plan must contain
    pub total_commits: usize,
    /// Upper bound for a single day
    pub max_commits_per_day: usize,
    /// Largest number of idle days between two picked dates
    pub max_gap: u32,
    /// How far back the window starts (0 = today only)
    pub max_days_in_past: u32,
}

impl ScheduleParams {
    /// Params with the default cap, gap and window.
    pub fn new(total_commits: usize) -> Self {
        Self {
            total_commits,
            max_commits_per_day: DEFAULT_MAX_COMMITS_PER_DAY,
            max_gap: DEFAULT_MAX_GAP,
            max_days_in_past: DEFAULT_MAX_DAYS_IN_PAST,
        }
    }

    /// Number of calendar days in the window, today included
    pub fn window_days(&self) -> u64 {
        u64::from(self.max_days_in_past) + 1
    }

    /// Most commits the window could ever hold
    pub fn capacity(&self) -> u64 {
        self.window_days()
            .saturating_mul(self.max_commits_per_day as u64)
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.total_commits == 0 {
            return Err(ScheduleError::NoCommitsRequested);
        }
        if self.max_commits_per_day == 0 {
            return Err(ScheduleError::ZeroDailyCap);
        }
        if self.total_commits as u64 > self.capacity() {
            return Err(ScheduleError::InsufficientCapacity {
                total: self.total_commits,
                per_day: self.max_commits_per_day,
                days: self.window_days(),
                capacity: self.capacity(),
            });
        }
        Ok(())
    }
}

/// One day of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    pub commits: usize,
}

/// Chronologically ordered plan, one entry per active day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScheduleEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_commits(&self) -> usize {
        self.entries.iter().map(|e| e.commits).sum()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|e| e.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|e| e.date)
    }

    /// Busiest day's commit count
    pub fn peak(&self) -> usize {
        self.entries.iter().map(|e| e.commits).max().unwrap_or(0)
    }
}

impl From<Vec<ScheduleEntry>> for Schedule {
    fn from(mut entries: Vec<ScheduleEntry>) -> Self {
        entries.sort_by_key(|e| e.date);
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a ScheduleEntry;
    type IntoIter = std::slice::Iter<'a, ScheduleEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Build a plan ending at `today`.
///
/// The result is non-empty, strictly increasing by date, stays inside
/// `[today - max_days_in_past, today]`, and its counts sum to exactly
/// `total_commits` with every count in `[1, max_commits_per_day]`.
///
/// Requests that can never fit (more commits than the whole window holds)
/// are rejected up front. When the coin flips pick too few days to hold
/// the total, extra days from the window are drafted in; when they pick
/// more days than there are commits, a random subset is kept.
pub fn build_schedule<R: Rng + ?Sized>(
    params: &ScheduleParams,
    today: NaiveDate,
    rng: &mut R,
) -> Result<Schedule, ScheduleError> {
    params.validate()?;

    let start = today
        .checked_sub_days(Days::new(u64::from(params.max_days_in_past)))
        .ok_or(ScheduleError::WindowOutOfRange(params.max_days_in_past))?;

    let mut dates = select_dates(start, today, params.max_gap, rng);
    ensure_capacity(&mut dates, start, today, params, rng);
    trim_surplus(&mut dates, params.total_commits, rng);

    let counts = allocate_commits(
        dates.len(),
        params.total_commits,
        params.max_commits_per_day,
        rng,
    );

    let entries: Vec<ScheduleEntry> = dates
        .into_iter()
        .zip(counts)
        .map(|(date, commits)| ScheduleEntry { date, commits })
        .collect();

    debug!(
        days = entries.len(),
        total = params.total_commits,
        "built commit schedule"
    );

    Ok(Schedule { entries })
}

/// Walk `start..=end`, picking each day with even odds. After a pick the
/// walk jumps ahead by `1..=max_gap + 1` days. Falls back to `[end]` when
/// nothing was picked.
pub fn select_dates<R: Rng + ?Sized>(
    start: NaiveDate,
    end: NaiveDate,
    max_gap: u32,
    rng: &mut R,
) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;

    while current <= end {
        let step = if rng.random_bool(0.5) {
            dates.push(current);
            rng.random_range(1..=u64::from(max_gap) + 1)
        } else {
            1
        };
        match current.checked_add_days(Days::new(step)) {
            Some(next) => current = next,
            None => break,
        }
    }

    if dates.is_empty() {
        dates.push(end);
    }
    dates
}

/// Draft random unpicked days until the picked set can hold the total.
fn ensure_capacity<R: Rng + ?Sized>(
    dates: &mut Vec<NaiveDate>,
    start: NaiveDate,
    end: NaiveDate,
    params: &ScheduleParams,
    rng: &mut R,
) {
    let needed = params.total_commits.div_ceil(params.max_commits_per_day);
    if dates.len() >= needed {
        return;
    }

    let picked: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let mut spare: Vec<NaiveDate> = start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !picked.contains(d))
        .collect();
    spare.shuffle(rng);

    let missing = needed - dates.len();
    debug!(
        picked = dates.len(),
        needed, "too few days picked for the daily cap, drafting extra days"
    );
    dates.extend(spare.into_iter().take(missing));
    dates.sort_unstable();
}

/// Keep a random, order-preserving subset of `total` dates so every
/// remaining date gets at least one commit.
fn trim_surplus<R: Rng + ?Sized>(dates: &mut Vec<NaiveDate>, total: usize, rng: &mut R) {
    if dates.len() <= total {
        return;
    }
    let mut keep = index::sample(rng, dates.len(), total).into_vec();
    keep.sort_unstable();
    let kept: Vec<NaiveDate> = keep.into_iter().map(|i| dates[i]).collect();
    *dates = kept;
}

/// Split `total` commits over `num_dates` days.
///
/// Every day starts at `max(1, total / num_dates)`. The remainder is then
/// handed out in one randomized pass (each day draws a top-up within its
/// headroom), and whatever is left is dealt one commit at a time to days
/// still under `max_per_day`. If every day is capped the leftover is
/// dropped with a warning; [`build_schedule`] never lets that happen.
pub fn allocate_commits<R: Rng + ?Sized>(
    num_dates: usize,
    total: usize,
    max_per_day: usize,
    rng: &mut R,
) -> Vec<usize> {
    if num_dates == 0 {
        return Vec::new();
    }

    let baseline = (total / num_dates).max(1);
    let mut counts = vec![baseline; num_dates];
    let mut remaining = total.saturating_sub(baseline * num_dates);
    let headroom = max_per_day.saturating_sub(baseline);

    for count in counts.iter_mut() {
        if remaining == 0 {
            break;
        }
        let extra = rng.random_range(0..=remaining.min(headroom));
        *count += extra;
        remaining -= extra;
    }

    while remaining > 0 {
        let mut placed = false;
        for count in counts.iter_mut() {
            if remaining == 0 {
                break;
            }
            if *count < max_per_day {
                *count += 1;
                remaining -= 1;
                placed = true;
            }
        }
        if !placed {
            warn!(remaining, "every day is at the cap, leftover commits dropped");
            break;
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn assert_well_formed(plan: &Schedule, params: &ScheduleParams) {
        let start = today() - Days::new(u64::from(params.max_days_in_past));
        assert!(!plan.is_empty());
        assert_eq!(plan.total_commits(), params.total_commits);
        for entry in plan {
            assert!(entry.commits >= 1, "empty day in {:?}", plan);
            assert!(entry.commits <= params.max_commits_per_day);
            assert!(entry.date >= start && entry.date <= today());
        }
        for pair in plan.entries().windows(2) {
            assert!(pair[0].date < pair[1].date, "dates out of order");
        }
    }

    #[test]
    fn test_sum_and_bounds_hold_across_seeds() {
        let cases = [
            ScheduleParams::new(1),
            ScheduleParams::new(10),
            ScheduleParams::new(40),
            ScheduleParams {
                total_commits: 150,
                max_commits_per_day: 5,
                max_gap: 2,
                max_days_in_past: 30,
            },
            ScheduleParams {
                total_commits: 7,
                max_commits_per_day: 1,
                max_gap: 0,
                max_days_in_past: 10,
            },
            ScheduleParams {
                total_commits: 3,
                max_commits_per_day: 9,
                max_gap: 0,
                max_days_in_past: 60,
            },
        ];
        for params in cases {
            for seed in 0..64 {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let plan = build_schedule(&params, today(), &mut rng).unwrap();
                assert_well_formed(&plan, &params);
            }
        }
    }

    #[test]
    fn test_zero_day_window_is_today_only() {
        let params = ScheduleParams {
            total_commits: 4,
            max_commits_per_day: 5,
            max_gap: 2,
            max_days_in_past: 0,
        };
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let plan = build_schedule(&params, today(), &mut rng).unwrap();
            assert_eq!(plan.len(), 1);
            assert_eq!(plan.entries()[0].date, today());
            assert_eq!(plan.entries()[0].commits, 4);
        }
    }

    #[test]
    fn test_even_split_has_no_remainder() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let counts = allocate_commits(5, 10, 5, &mut rng);
        assert_eq!(counts, vec![2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_remainder_respects_cap() {
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let counts = allocate_commits(4, 19, 5, &mut rng);
            assert_eq!(counts.iter().sum::<usize>(), 19);
            assert!(counts.iter().all(|&c| (4..=5).contains(&c)));
        }
    }

    #[test]
    fn test_allocation_drops_what_cannot_fit() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let counts = allocate_commits(2, 9, 3, &mut rng);
        // baseline already exceeds the cap, nothing left to place
        assert_eq!(counts, vec![4, 4]);
    }

    #[test]
    fn test_rejects_overfull_window() {
        let params = ScheduleParams {
            total_commits: 200,
            max_commits_per_day: 5,
            max_gap: 2,
            max_days_in_past: 30,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = build_schedule(&params, today(), &mut rng).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::InsufficientCapacity {
                total: 200,
                per_day: 5,
                days: 31,
                capacity: 155,
            }
        );
    }

    #[test]
    fn test_rejects_zero_inputs() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = build_schedule(&ScheduleParams::new(0), today(), &mut rng).unwrap_err();
        assert_eq!(err, ScheduleError::NoCommitsRequested);

        let params = ScheduleParams {
            max_commits_per_day: 0,
            ..ScheduleParams::new(3)
        };
        assert_eq!(params.validate(), Err(ScheduleError::ZeroDailyCap));
    }

    #[test]
    fn test_full_window_uses_every_day() {
        let params = ScheduleParams {
            total_commits: 31,
            max_commits_per_day: 1,
            max_gap: 2,
            max_days_in_past: 30,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let plan = build_schedule(&params, today(), &mut rng).unwrap();
        assert_eq!(plan.len(), 31);
        assert_eq!(plan.first_date(), Some(today() - Days::new(30)));
        assert_eq!(plan.last_date(), Some(today()));
    }

    #[test]
    fn test_select_dates_respects_gap_and_bounds() {
        let start = today() - Days::new(45);
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let dates = select_dates(start, today(), 3, &mut rng);
            assert!(!dates.is_empty());
            for pair in dates.windows(2) {
                assert!((pair[1] - pair[0]).num_days() >= 1);
            }
            assert!(dates.iter().all(|d| *d >= start && *d <= today()));
        }
    }

    #[test]
    fn test_same_seed_same_plan() {
        let params = ScheduleParams::new(25);
        let a = build_schedule(&params, today(), &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let b = build_schedule(&params, today(), &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }
}
