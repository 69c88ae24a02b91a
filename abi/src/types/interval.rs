use std::fmt;

use chrono::NaiveDate;

use crate::{format_date, parse_date, DateRange, Error};

/// Closed civil-date interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateInterval {
    pub(crate) start: NaiveDate,
    pub(crate) end: NaiveDate,
}

impl DateInterval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        if end < start {
            return Err(Error::InvalidRange(format!(
                "end {} is before start {}",
                format_date(end),
                format_date(start)
            )));
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, Error> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// True iff both intervals share at least one day.
    pub fn overlaps(&self, other: &DateInterval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True iff `other` lies entirely inside `self`.
    pub fn covers(&self, other: &DateInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersection(&self, other: &DateInterval) -> Option<DateInterval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DateInterval { start, end })
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", format_date(self.start), format_date(self.end))
    }
}

impl From<DateInterval> for DateRange {
    fn from(interval: DateInterval) -> Self {
        DateRange {
            start: format_date(interval.start),
            end: format_date(interval.end),
        }
    }
}

impl TryFrom<&DateRange> for DateInterval {
    type Error = Error;

    fn try_from(range: &DateRange) -> Result<Self, Self::Error> {
        DateInterval::parse(&range.start, &range.end)
    }
}
