use chrono::{Days, NaiveDate};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("start date {start} is after end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("--end requires --start")]
    EndWithoutStart,

    #[error("day count {0} is out of range")]
    OutOfRange(u32),
}

/// Inclusive range of activity start dates to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub oldest: NaiveDate,
    pub newest: NaiveDate,
}

impl DateWindow {
    /// An explicit `start` (with optional `end`, default `today`) wins;
    /// otherwise the window is the last `days` days up to `today`.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        days: u32,
        today: NaiveDate,
    ) -> Result<Self, WindowError> {
        match (start, end) {
            (Some(oldest), end) => {
                let newest = end.unwrap_or(today);
                if oldest > newest {
                    return Err(WindowError::Inverted {
                        start: oldest,
                        end: newest,
                    });
                }
                Ok(Self { oldest, newest })
            }
            (None, Some(_)) => Err(WindowError::EndWithoutStart),
            (None, None) => {
                let oldest = today
                    .checked_sub_days(Days::new(days.into()))
                    .ok_or(WindowError::OutOfRange(days))?;
                Ok(Self {
                    oldest,
                    newest: today,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_back_from_today() {
        let window = DateWindow::resolve(None, None, 30, date(2024, 3, 15)).unwrap();
        assert_eq!(window.oldest, date(2024, 2, 14));
        assert_eq!(window.newest, date(2024, 3, 15));
    }

    #[test]
    fn test_explicit_range() {
        let window =
            DateWindow::resolve(Some(date(2024, 1, 1)), Some(date(2024, 1, 31)), 30, date(2024, 3, 15))
                .unwrap();
        assert_eq!(window.oldest, date(2024, 1, 1));
        assert_eq!(window.newest, date(2024, 1, 31));
    }

    #[test]
    fn test_start_without_end_runs_to_today() {
        let window = DateWindow::resolve(Some(date(2024, 3, 1)), None, 7, date(2024, 3, 15)).unwrap();
        assert_eq!(window.newest, date(2024, 3, 15));
    }

    #[test]
    fn test_invalid_ranges() {
        let today = date(2024, 3, 15);
        assert!(matches!(
            DateWindow::resolve(Some(date(2024, 2, 1)), Some(date(2024, 1, 1)), 30, today),
            Err(WindowError::Inverted { .. })
        ));
        assert_eq!(
            DateWindow::resolve(None, Some(today), 30, today),
            Err(WindowError::EndWithoutStart)
        );
    }
}
