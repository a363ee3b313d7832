use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

use super::{Error, Result, MAX_LONG_WINDOW_DAYS, MAX_SHORT_WINDOW_DAYS};

/// The time span `[start, end)` covered by a report query.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ActivityWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ActivityWindow {
    /// Builds the window of a synchronous trace query, ending now.
    pub fn short(days_back: u32, now: DateTime<Utc>) -> Result<Self> {
        if !(1..=MAX_SHORT_WINDOW_DAYS).contains(&days_back) {
            return Err(Error::InvalidWindow(format!(
                "lookback of {days_back} day(s) is out of range 1..={MAX_SHORT_WINDOW_DAYS}"
            )));
        }

        Ok(Self {
            start: now - Duration::days(days_back.into()),
            end: now,
        })
    }

    /// Builds the window of a historical search.
    ///
    /// The span cannot exceed [`MAX_LONG_WINDOW_DAYS`] and must end
    /// before the short window starts. How far back the search may
    /// reach is left to the server.
    pub fn long(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Result<Self> {
        let window = Self { start, end };

        if start >= end {
            return Err(Error::InvalidWindow(format!(
                "window {window} does not end after it starts"
            )));
        }

        if end - start > Duration::days(MAX_LONG_WINDOW_DAYS.into()) {
            return Err(Error::InvalidWindow(format!(
                "window {window} spans {} days, more than {MAX_LONG_WINDOW_DAYS}",
                window.days()
            )));
        }

        if end > now - Duration::days(MAX_SHORT_WINDOW_DAYS.into()) {
            return Err(Error::InvalidWindow(format!(
                "window {window} overlaps the last {MAX_SHORT_WINDOW_DAYS} days"
            )));
        }

        Ok(window)
    }

    /// The widest historical window available right now.
    pub fn historical(now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::days(MAX_LONG_WINDOW_DAYS.into()),
            end: now - Duration::days(MAX_SHORT_WINDOW_DAYS.into()),
        }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for ActivityWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} → {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn short_window_bounds() {
        let window = ActivityWindow::short(9, now()).unwrap();
        assert_eq!(now() - Duration::days(9), window.start);
        assert_eq!(now(), window.end);

        assert!(ActivityWindow::short(1, now()).is_ok());
        assert!(ActivityWindow::short(10, now()).is_ok());
        assert!(matches!(
            ActivityWindow::short(0, now()),
            Err(Error::InvalidWindow(_))
        ));
        assert!(matches!(
            ActivityWindow::short(11, now()),
            Err(Error::InvalidWindow(_))
        ));
    }

    #[test]
    fn long_window_too_wide() {
        let end = now() - Duration::days(10);
        let start = end - Duration::days(95);
        let err = ActivityWindow::long(start, end, now()).unwrap_err();
        assert!(matches!(err, Error::InvalidWindow(msg) if msg.contains("95 days")));
    }

    #[test]
    fn long_window_overlapping_short_window() {
        let end = now() - Duration::days(5);
        let start = end - Duration::days(30);
        let err = ActivityWindow::long(start, end, now()).unwrap_err();
        assert!(matches!(err, Error::InvalidWindow(msg) if msg.contains("overlaps")));
    }

    #[test]
    fn long_window_reversed() {
        let start = now() - Duration::days(20);
        let end = now() - Duration::days(60);
        assert!(matches!(
            ActivityWindow::long(start, end, now()),
            Err(Error::InvalidWindow(_))
        ));
    }

    #[test]
    fn historical_window_is_valid() {
        let window = ActivityWindow::historical(now());
        assert_eq!(80, window.days());
        assert_eq!(
            window,
            ActivityWindow::long(window.start, window.end, now()).unwrap()
        );
    }
}
