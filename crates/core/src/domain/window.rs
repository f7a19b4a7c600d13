use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// How the end date of a [`DateRange`] is turned into a timestamp bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndBound {
    /// Both bounds at midnight, both inclusive. Activity later on the end date is excluded.
    #[default]
    Midnight,
    /// Upper bound moves to the next midnight and becomes exclusive.
    EndOfDay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn window(&self, end_bound: EndBound) -> TimeWindow {
        let from = midnight(self.start);
        match end_bound {
            EndBound::Midnight => TimeWindow { from, to: midnight(self.end), to_inclusive: true },
            EndBound::EndOfDay => {
                let next = self.end.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX);
                TimeWindow { from, to: midnight(next), to_inclusive: false }
            }
        }
    }
}

/// Timestamp window used by date-range queries. `from` is always inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub to_inclusive: bool,
}

impl TimeWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if at < self.from {
            return false;
        }
        if self.to_inclusive {
            at <= self.to
        } else {
            at < self.to
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{DateRange, EndBound};
    use crate::errors::DomainError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn midnight_bound_excludes_activity_later_on_end_date() {
        let range = DateRange::new(date(2014, 1, 1), date(2014, 1, 31)).expect("range");
        let window = range.window(EndBound::Midnight);

        assert!(window.contains(Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap()));
        assert!(window.contains(Utc.with_ymd_and_hms(2014, 1, 31, 0, 0, 0).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2014, 1, 31, 9, 30, 0).unwrap()));
    }

    #[test]
    fn end_of_day_bound_includes_whole_end_date() {
        let range = DateRange::new(date(2014, 1, 1), date(2014, 1, 31)).expect("range");
        let window = range.window(EndBound::EndOfDay);

        assert!(window.contains(Utc.with_ymd_and_hms(2014, 1, 31, 23, 59, 59).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2014, 2, 1, 0, 0, 0).unwrap()));
        assert!(!window.to_inclusive);
    }

    #[test]
    fn single_day_range_is_allowed() {
        let range = DateRange::new(date(2013, 6, 1), date(2013, 6, 1)).expect("range");
        let window = range.window(EndBound::Midnight);
        assert_eq!(window.from, window.to);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let error = DateRange::new(date(2014, 2, 1), date(2014, 1, 1)).expect_err("reversed");
        assert!(matches!(error, DomainError::InvalidDateRange { .. }));
    }
}
