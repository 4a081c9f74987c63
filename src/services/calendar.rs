//! Calendar-day arithmetic for anchor days, week buckets and the weekly
//! recalculation schedule.
//!
//! Days are `NaiveDate` values: a log's identity is its calendar day, never a
//! timestamp, so no timezone conversion happens below the handler layer.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// The server's current calendar day in local time.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Most recent Sunday on or before `today`.
pub fn last_sunday(today: NaiveDate) -> NaiveDate {
    today - Duration::days(today.weekday().num_days_from_sunday() as i64)
}

/// The Sunday that opens the week containing `date`. Weeks run Sunday
/// through Saturday.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    last_sunday(date)
}

/// A fixed weekly wall-clock firing time, e.g. Monday 03:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    pub weekday: Weekday,
    pub time: NaiveTime,
}

impl WeeklySchedule {
    pub fn new(weekday: Weekday, time: NaiveTime) -> Self {
        Self { weekday, time }
    }

    /// Next firing strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date();
        let ahead = (7 + self.weekday.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64)
            % 7;
        let candidate = (today + Duration::days(ahead)).and_time(self.time);
        if candidate > now {
            candidate
        } else {
            candidate + Duration::days(7)
        }
    }
}

impl Default for WeeklySchedule {
    fn default() -> Self {
        Self::new(Weekday::Mon, NaiveTime::from_hms_opt(3, 0, 0).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
        d.and_hms_opt(h, min, 0).unwrap()
    }

    // ── last_sunday ──────────────────────────────────────────────────────

    #[test]
    fn test_last_sunday_from_monday() {
        // 2026-10-19 is a Monday
        assert_eq!(last_sunday(date(2026, 10, 19)), date(2026, 10, 18));
    }

    #[test]
    fn test_last_sunday_is_sunday() {
        let sun = date(2026, 10, 18);
        assert_eq!(last_sunday(sun), sun);
    }

    #[test]
    fn test_last_sunday_from_saturday() {
        assert_eq!(last_sunday(date(2026, 10, 24)), date(2026, 10, 18));
    }

    #[test]
    fn test_last_sunday_across_year_boundary() {
        // 2026-01-01 is a Thursday
        assert_eq!(last_sunday(date(2026, 1, 1)), date(2025, 12, 28));
    }

    // ── week_start ───────────────────────────────────────────────────────

    #[test]
    fn test_week_runs_sunday_to_saturday() {
        let sunday = date(2026, 10, 11);
        for offset in 0..7 {
            assert_eq!(week_start(sunday + Duration::days(offset)), sunday);
        }
        assert_eq!(week_start(date(2026, 10, 18)), date(2026, 10, 18));
    }

    // ── WeeklySchedule ───────────────────────────────────────────────────

    #[test]
    fn test_next_after_same_monday_before_time() {
        let schedule = WeeklySchedule::default();
        let now = at(date(2026, 10, 19), 1, 30);
        assert_eq!(schedule.next_after(now), at(date(2026, 10, 19), 3, 0));
    }

    #[test]
    fn test_next_after_exact_firing_moves_a_week() {
        let schedule = WeeklySchedule::default();
        let now = at(date(2026, 10, 19), 3, 0);
        assert_eq!(schedule.next_after(now), at(date(2026, 10, 26), 3, 0));
    }

    #[test]
    fn test_next_after_midweek() {
        let schedule = WeeklySchedule::default();
        // Thursday
        let now = at(date(2026, 10, 22), 12, 0);
        assert_eq!(schedule.next_after(now), at(date(2026, 10, 26), 3, 0));
    }

    #[test]
    fn test_next_after_sunday_night() {
        let schedule = WeeklySchedule::default();
        let now = at(date(2026, 10, 25), 23, 59);
        assert_eq!(schedule.next_after(now), at(date(2026, 10, 26), 3, 0));
    }

    #[test]
    fn test_next_after_custom_weekday() {
        let schedule = WeeklySchedule::new(Weekday::Sun, NaiveTime::from_hms_opt(22, 0, 0).unwrap());
        let now = at(date(2026, 10, 19), 8, 0);
        assert_eq!(schedule.next_after(now), at(date(2026, 10, 25), 22, 0));
    }
}
