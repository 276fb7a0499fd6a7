//! Commit date formatting

use chrono::{FixedOffset, Local, NaiveDateTime, TimeZone};

/// Format a wall-clock time as git's ISO-8601 date with a `+hhmm` offset,
/// e.g. `2024-03-01T14:22:07+0200`.
pub fn format_git_timestamp(local: NaiveDateTime, offset: FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let seconds = seconds.abs();
    format!(
        "{}{}{:02}{:02}",
        local.format("%Y-%m-%dT%H:%M:%S"),
        sign,
        seconds / 3600,
        (seconds % 3600) / 60
    )
}

/// UTC offset the local timezone uses at `local`.
///
/// Takes DST into account. Times that fall into a spring-forward gap use
/// the current offset.
pub fn local_offset_at(local: NaiveDateTime) -> FixedOffset {
    Local
        .from_local_datetime(&local)
        .earliest()
        .map(|dt| *dt.offset())
        .unwrap_or_else(|| *Local::now().offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_positive_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            format_git_timestamp(at(14, 22, 7), offset),
            "2024-03-01T14:22:07+0200"
        );
    }

    #[test]
    fn test_negative_and_half_hour_offsets() {
        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(format_git_timestamp(at(9, 0, 0), west), "2024-03-01T09:00:00-0500");

        let newfoundland = FixedOffset::west_opt(3 * 3600 + 1800).unwrap();
        assert_eq!(
            format_git_timestamp(at(18, 59, 59), newfoundland),
            "2024-03-01T18:59:59-0330"
        );

        let india = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        assert_eq!(format_git_timestamp(at(9, 0, 0), india), "2024-03-01T09:00:00+0530");
    }

    #[test]
    fn test_utc() {
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(format_git_timestamp(at(12, 0, 0), utc), "2024-03-01T12:00:00+0000");
    }

    #[test]
    fn test_local_offset_is_sane() {
        let offset = local_offset_at(at(12, 0, 0));
        assert!(offset.local_minus_utc().abs() <= 14 * 3600);
    }
}
