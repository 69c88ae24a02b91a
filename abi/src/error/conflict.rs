use std::{convert::Infallible, fmt, str::FromStr};

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::{format_date, DateInterval, Error};

lazy_static! {
    // Key (product_id, span)=(cabin-7, [2025-06-04,2025-06-08))
    static ref KEY_RE: Regex = Regex::new(
        r"\((?P<k1>[a-z_]+),\s*(?P<k2>[a-z_]+)\)=\((?P<rid>[^,()]+),\s*\[(?P<start>\d{4}-\d{2}-\d{2}),(?P<end>\d{4}-\d{2}-\d{2})\)\)"
    )
    .unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationConflictInfo {
    Parsed(ReservationConflict),
    Unparsed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationConflict {
    pub new: ReservationWindow,
    pub old: Vec<ReservationWindow>,
}

/// The dates a product is held for. `end` is the checkout day: the product is
/// occupied on the nights `start..end`, so a new stay may begin on `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationWindow {
    rid: String,
    start: NaiveDate,
    end: NaiveDate,
}

impl ReservationWindow {
    pub fn new(rid: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        if start >= end {
            return Err(Error::InvalidRange(format!(
                "checkout {} must be after check-in {}",
                format_date(end),
                format_date(start)
            )));
        }
        Ok(Self {
            rid: rid.into(),
            start,
            end,
        })
    }

    pub fn rid(&self) -> &str {
        &self.rid
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Occupied nights, `[start, end - 1]`.
    pub fn nights(&self) -> DateInterval {
        // start < end, so the day before end exists and is not before start
        let last = self.end.pred_opt().unwrap_or(self.start);
        DateInterval {
            start: self.start,
            end: last,
        }
    }

    /// Calendar days touched by the stay, checkout included.
    pub fn days(&self) -> DateInterval {
        DateInterval {
            start: self.start,
            end: self.end,
        }
    }

    pub fn conflicts_with(&self, other: &ReservationWindow) -> bool {
        self.rid == other.rid && self.nights().overlaps(&other.nights())
    }
}

impl fmt::Display for ReservationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}, {})",
            self.rid,
            format_date(self.start),
            format_date(self.end)
        )
    }
}

impl fmt::Display for ReservationConflictInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationConflictInfo::Parsed(conflict) => {
                write!(f, "{} overlaps", conflict.new)?;
                for (i, old) in conflict.old.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{}{}", sep, old)?;
                }
                Ok(())
            }
            ReservationConflictInfo::Unparsed(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for ReservationConflictInfo {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match parse_conflict(s) {
            Some(conflict) => ReservationConflictInfo::Parsed(conflict),
            None => ReservationConflictInfo::Unparsed(s.to_string()),
        })
    }
}

// postgres reports the new key first, then the existing one
fn parse_conflict(s: &str) -> Option<ReservationConflict> {
    let mut windows = KEY_RE
        .captures_iter(s)
        .map(|cap| {
            let start = cap["start"].parse().ok()?;
            let end = cap["end"].parse().ok()?;
            ReservationWindow::new(cap["rid"].trim(), start, end).ok()
        })
        .collect::<Option<Vec<_>>>()?;
    if windows.len() != 2 {
        return None;
    }
    let old = windows.pop()?;
    let new = windows.pop()?;
    Some(ReservationConflict {
        new,
        old: vec![old],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_date;

    const ERR_MSG: &str = "Key (product_id, span)=(cabin-7, [2025-06-04,2025-06-08)) conflicts with existing key (product_id, span)=(cabin-7, [2025-06-02,2025-06-05)).";

    fn window(start: &str, end: &str) -> ReservationWindow {
        ReservationWindow::new(
            "cabin-7",
            parse_date(start).unwrap(),
            parse_date(end).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn parse_conflict_detail_should_work() {
        let info: ReservationConflictInfo = ERR_MSG.parse().unwrap();
        assert_eq!(
            info,
            ReservationConflictInfo::Parsed(ReservationConflict {
                new: window("2025-06-04", "2025-06-08"),
                old: vec![window("2025-06-02", "2025-06-05")],
            })
        );
    }

    #[test]
    fn unknown_detail_should_stay_unparsed() {
        let info: ReservationConflictInfo = "could not serialize access".parse().unwrap();
        assert_eq!(
            info,
            ReservationConflictInfo::Unparsed("could not serialize access".into())
        );
    }

    #[test]
    fn window_should_reject_empty_stay() {
        let day = parse_date("2025-06-05").unwrap();
        assert!(matches!(
            ReservationWindow::new("cabin-7", day, day),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn touching_windows_should_not_conflict() {
        let a = window("2025-06-02", "2025-06-05");
        let b = window("2025-06-05", "2025-06-08");
        assert!(!a.conflicts_with(&b));
        assert!(!b.conflicts_with(&a));
        assert!(a.conflicts_with(&window("2025-06-04", "2025-06-08")));
    }

    #[test]
    fn conflict_should_display_all_ranges() {
        let info = ReservationConflictInfo::Parsed(ReservationConflict {
            new: window("2025-06-01", "2025-06-09"),
            old: vec![
                window("2025-06-02", "2025-06-05"),
                window("2025-06-06", "2025-06-07"),
            ],
        });
        assert_eq!(
            info.to_string(),
            "cabin-7 [2025-06-01, 2025-06-09) overlaps cabin-7 [2025-06-02, 2025-06-05), cabin-7 [2025-06-06, 2025-06-07)"
        );
    }
}
