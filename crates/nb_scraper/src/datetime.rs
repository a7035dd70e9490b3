//! Best-effort timestamp recovery from forum markup fragments.
//!
//! The source renders posting times as `DD.MM.YY HH:MM` somewhere in the row
//! or page text, but not always together and not always both. Strategies are
//! tried in strict priority order and the first one producing a valid
//! datetime wins; an invalid numeric combination (day 32 and friends) only
//! fails that strategy, not the whole recovery.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use lazy_static::lazy_static;
use regex::Regex;
use nb_core::{Error, Result};

lazy_static! {
    static ref DATE_TIME_RE: Regex =
        Regex::new(r"(\d{1,2})\.(\d{1,2})\.(\d{2})\s+(\d{1,2}):(\d{2})").unwrap();
    static ref DATE_RE: Regex = Regex::new(r"(\d{1,2})\.(\d{1,2})\.(\d{2})").unwrap();
    static ref TIME_RE: Regex = Regex::new(r"(\d{1,2}):(\d{2})").unwrap();
}

/// Two-digit years are read as 2000+YY. Postings from other centuries are
/// not a thing on this source.
fn build_date(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let year = 2000 + year.parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

fn build(day: &str, month: &str, year: &str, hour: &str, minute: &str) -> Option<NaiveDateTime> {
    build_date(day, month, year)?.and_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
}

/// Recover a fully specified timestamp from a text fragment, or fail with
/// `NoTimestampFound`.
///
/// `now` is the caller's wall clock, used to complete partial matches: a
/// date without a time gets the current time, a time without a date gets
/// today's date.
pub fn recover_datetime(fragment: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    if let Some(dt) = DATE_TIME_RE
        .captures(fragment)
        .and_then(|c| build(&c[1], &c[2], &c[3], &c[4], &c[5]))
    {
        return Ok(dt);
    }

    let date = DATE_RE.captures(fragment);
    let time = TIME_RE.captures(fragment);

    if let (Some(d), Some(t)) = (&date, &time) {
        if let Some(dt) = build(&d[1], &d[2], &d[3], &t[1], &t[2]) {
            return Ok(dt);
        }
    }

    if let Some(d) = &date {
        if let Some(dt) = build_date(&d[1], &d[2], &d[3])
            .and_then(|nd| nd.and_hms_opt(now.hour(), now.minute(), 0))
        {
            return Ok(dt);
        }
    }

    if let Some(t) = &time {
        if let Some(dt) = t[1]
            .parse()
            .ok()
            .zip(t[2].parse().ok())
            .and_then(|(h, m)| now.date().and_hms_opt(h, m, 0))
        {
            return Ok(dt);
        }
    }

    Err(Error::NoTimestampFound)
}

/// Freshness predicate: `published` is accepted iff it is no more than
/// `window` in the past. Callers discard out-of-window candidates before
/// spending a content fetch on them.
pub fn within_window(now: NaiveDateTime, published: NaiveDateTime, window: Duration) -> bool {
    now - published <= window
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 15)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_combined_pattern() {
        let dt = recover_datetime("some row 14.06.25 09:45 more text", noon()).unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2025, 6, 14)
                .unwrap()
                .and_hms_opt(9, 45, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_separate_date_and_time() {
        let dt = recover_datetime("date 14.06.25 | posted at 09:45", noon()).unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2025, 6, 14)
                .unwrap()
                .and_hms_opt(9, 45, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_date_only_uses_current_time() {
        let dt = recover_datetime("posted 14.06.25", noon()).unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2025, 6, 14)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_time_only_uses_today() {
        let dt = recover_datetime("at 09:45", noon()).unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2025, 6, 15)
                .unwrap()
                .and_hms_opt(9, 45, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_no_digits_fails() {
        let err = recover_datetime("no digits here at all", noon()).unwrap_err();
        assert!(matches!(err, Error::NoTimestampFound));
    }

    #[test]
    fn test_invalid_day_falls_through_to_time() {
        // 32.06.25 fails both the combined and the date strategies, the bare
        // time still recovers against today's date.
        let dt = recover_datetime("32.06.25 09:45", noon()).unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2025, 6, 15)
                .unwrap()
                .and_hms_opt(9, 45, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_two_digit_year_is_2000s() {
        let dt = recover_datetime("01.01.07 00:01", noon()).unwrap();
        assert_eq!(dt.year(), 2007);
    }

    #[test]
    fn test_window_boundaries() {
        let now = noon();
        let window = Duration::hours(24);
        let just_inside = now - Duration::hours(23) - Duration::minutes(59);
        let just_outside = now - Duration::hours(24) - Duration::minutes(1);
        assert!(within_window(now, just_inside, window));
        assert!(!within_window(now, just_outside, window));
    }
}
