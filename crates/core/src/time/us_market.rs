use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use std::collections::HashSet;

const EST_OFFSET_SECS: i32 = -5 * 3600;
const EDT_OFFSET_SECS: i32 = -4 * 3600;

// If the run starts before this time (ET), treat it as "yesterday's" market
// date. NYSE close is 16:00 ET; we allow an hour for upstream settlement.
const CLOSE_CUTOFF_HOUR_ET: u32 = 17;
const CLOSE_CUTOFF_MINUTE_ET: u32 = 0;

/// Latest completed US trading day, or the explicit `YYYY-MM-DD` argument
/// when one is given.
pub fn resolve_run_date(
    run_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = run_date_arg {
        return Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?);
    }

    let et = eastern_offset(now_utc)?;
    let now_et = now_utc.with_timezone(&et);

    let cutoff_reached =
        (now_et.hour(), now_et.minute()) >= (CLOSE_CUTOFF_HOUR_ET, CLOSE_CUTOFF_MINUTE_ET);
    let mut date = now_et.date_naive();
    if !cutoff_reached {
        date = date - Duration::days(1);
    }

    // Roll back to the previous business day.
    let holidays = configured_holidays();
    while is_weekend(date) || holidays.contains(&date) {
        date = date - Duration::days(1);
    }

    Ok(date)
}

/// Window length for year-to-date calculations.
pub fn days_since_year_start(today: NaiveDate) -> i64 {
    let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
    (today - year_start).num_days()
}

fn eastern_offset(now_utc: DateTime<Utc>) -> anyhow::Result<chrono::FixedOffset> {
    let est = chrono::FixedOffset::east_opt(EST_OFFSET_SECS).context("invalid EST offset")?;
    let date = now_utc.with_timezone(&est).date_naive();
    let secs = if in_daylight_saving(date) {
        EDT_OFFSET_SECS
    } else {
        EST_OFFSET_SECS
    };
    chrono::FixedOffset::east_opt(secs).context("invalid ET offset")
}

// US daylight saving runs from the second Sunday of March through the first
// Sunday of November. Resolved at day granularity; a run inside the 02:00
// changeover hour sees the outgoing offset.
fn in_daylight_saving(date: NaiveDate) -> bool {
    let start = NaiveDate::from_weekday_of_month_opt(date.year(), 3, chrono::Weekday::Sun, 2);
    let end = NaiveDate::from_weekday_of_month_opt(date.year(), 11, chrono::Weekday::Sun, 1);
    match (start, end) {
        (Some(start), Some(end)) => date >= start && date < end,
        _ => false,
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

fn configured_holidays() -> HashSet<NaiveDate> {
    // Fixed-date market holidays only. Extend via
    // US_MARKET_HOLIDAYS="YYYY-MM-DD,YYYY-MM-DD".
    let mut out = HashSet::new();
    let years = [2024, 2025, 2026, 2027, 2028, 2029, 2030];
    for y in years {
        for (m, d) in [(1, 1), (7, 4), (12, 25)] {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                out.insert(date);
            }
        }
    }

    if let Ok(s) = std::env::var("US_MARKET_HOLIDAYS") {
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Ok(date) = NaiveDate::parse_from_str(part, "%Y-%m-%d") {
                out.insert(date);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn explicit_argument_wins() {
        let now = Utc.with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap();
        let d = resolve_run_date(Some("2026-08-14"), now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 8, 14).unwrap());
    }

    #[test]
    fn uses_previous_day_before_cutoff() {
        // 2026-08-27 18:00 UTC = 14:00 EDT (<17:00 cutoff) on a Thursday.
        let now = Utc.with_ymd_and_hms(2026, 8, 27, 18, 0, 0).unwrap();
        let d = resolve_run_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 8, 26).unwrap());
    }

    #[test]
    fn uses_same_day_after_cutoff() {
        // 2026-08-27 23:00 UTC = 19:00 EDT (>=17:00 cutoff).
        let now = Utc.with_ymd_and_hms(2026, 8, 27, 23, 0, 0).unwrap();
        let d = resolve_run_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 8, 27).unwrap());
    }

    #[test]
    fn cutoff_tracks_daylight_saving() {
        // 2026-08-27 21:30 UTC = 17:30 EDT: past the cutoff in summer even
        // though the standard-time reading (16:30 EST) would not be.
        let summer = Utc.with_ymd_and_hms(2026, 8, 27, 21, 30, 0).unwrap();
        let d = resolve_run_date(None, summer).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 8, 27).unwrap());

        // 2026-01-15 21:30 UTC = 16:30 EST on a Thursday: still before the
        // cutoff in winter.
        let winter = Utc.with_ymd_and_hms(2026, 1, 15, 21, 30, 0).unwrap();
        let d = resolve_run_date(None, winter).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 14).unwrap());
    }

    #[test]
    fn daylight_saving_window_bounds() {
        // 2026: DST runs 2026-03-08 (second Sunday of March) through
        // 2026-11-01 (first Sunday of November), exclusive.
        let d = |m, day| NaiveDate::from_ymd_opt(2026, m, day).unwrap();
        assert!(!in_daylight_saving(d(3, 7)));
        assert!(in_daylight_saving(d(3, 8)));
        assert!(in_daylight_saving(d(10, 31)));
        assert!(!in_daylight_saving(d(11, 1)));
        assert!(!in_daylight_saving(d(1, 15)));
    }

    #[test]
    fn rolls_back_over_weekends() {
        // 2026-08-30 is a Sunday; before cutoff the base date is Saturday,
        // which rolls back to Friday the 28th.
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();
        let d = resolve_run_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 8, 28).unwrap());
    }

    #[test]
    fn ytd_window_in_days() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(days_since_year_start(d), 59);
        let jan1 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(days_since_year_start(jan1), 0);
    }
}
