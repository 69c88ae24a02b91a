use std::fmt;

use chrono::NaiveDate;
use sqlx::{postgres::PgRow, FromRow, Row};

use crate::{
    format_date, validate_product_id, AvailabilityWindow, DateInterval, Error, WindowStatus,
};

/// Mirror of `rsvp.window_status` in postgres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "window_status", rename_all = "lowercase")]
pub enum WindowState {
    Unknown,
    Available,
    Unavailable,
}

impl From<WindowState> for WindowStatus {
    fn from(state: WindowState) -> Self {
        match state {
            WindowState::Unknown => WindowStatus::Unknown,
            WindowState::Available => WindowStatus::Available,
            WindowState::Unavailable => WindowStatus::Unavailable,
        }
    }
}

impl fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowStatus::Unknown => write!(f, "unknown"),
            WindowStatus::Available => write!(f, "available"),
            WindowStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl AvailabilityWindow {
    pub fn new(
        pid: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        status: WindowStatus,
    ) -> Self {
        Self {
            id: 0,
            product_id: pid.into(),
            start: format_date(start),
            end: format_date(end),
            status: status as i32,
        }
    }

    pub fn new_available(pid: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(pid, start, end, WindowStatus::Available)
    }

    pub fn validate(&self) -> Result<(), Error> {
        validate_product_id(&self.product_id)?;
        self.interval()?;
        Ok(())
    }

    pub fn interval(&self) -> Result<DateInterval, Error> {
        DateInterval::parse(&self.start, &self.end)
    }

    pub fn is_available(&self) -> bool {
        self.status() == WindowStatus::Available
    }
}

impl FromRow<'_, PgRow> for AvailabilityWindow {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let start: NaiveDate = row.try_get("start_date")?;
        let end: NaiveDate = row.try_get("end_date")?;
        let state: WindowState = row.try_get("status")?;

        Ok(Self {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            start: format_date(start),
            end: format_date(end),
            status: WindowStatus::from(state) as i32,
        })
    }
}
