//! Period windows within a timeframe

use chrono::{DateTime, Duration, TimeZone, Utc};

/// A contiguous `[start, end]` window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    /// 0 for the nearest window
    pub index: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PeriodWindow {
    /// Hours from `now` until the window closes
    pub fn hours_to_expiry(&self, now: DateTime<Utc>) -> f64 {
        (self.end - now).num_seconds() as f64 / 3600.0
    }
}

/// `count` consecutive `hours`-long windows starting at the next
/// `hours`-aligned boundary after `now`
pub fn period_windows(now: DateTime<Utc>, hours: u32, count: u32) -> Vec<PeriodWindow> {
    if hours == 0 {
        return Vec::new();
    }

    let span = i64::from(hours) * 3600;
    let aligned = now.timestamp().div_euclid(span) * span + span;
    let Some(first) = Utc.timestamp_opt(aligned, 0).single() else {
        return Vec::new();
    };

    (0..count as usize)
        .map(|index| {
            let start = first + Duration::seconds(span * index as i64);
            PeriodWindow {
                index,
                start,
                end: start + Duration::seconds(span),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hourly_windows_start_at_next_hour() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 25, 0).unwrap();
        let windows = period_windows(now, 1, 3);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start, Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap());
        assert_eq!(windows[0].end, windows[1].start);
        assert_eq!(windows[2].end, Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap());
        assert_eq!(windows[2].index, 2);
    }

    #[test]
    fn test_four_hour_alignment() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 25, 0).unwrap();
        let windows = period_windows(now, 4, 1);
        assert_eq!(windows[0].start, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        assert!((windows[0].hours_to_expiry(now) - (5.0 + 35.0 / 60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_on_boundary_moves_to_next() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let windows = period_windows(now, 1, 1);
        assert_eq!(windows[0].start, Utc.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap());
    }

    #[test]
    fn test_zero_hours() {
        assert!(period_windows(Utc::now(), 0, 3).is_empty());
    }
}
