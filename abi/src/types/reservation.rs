use chrono::NaiveDate;
use sqlx::{
    postgres::PgRow,
    types::Uuid,
    FromRow, Row,
};

use crate::{
    format_date, parse_date, validate_product_id, Error, Reservation, ReservationStatus,
    ReservationWindow, RsvpStatus,
};

impl Reservation {
    pub fn new_pending(
        uid: impl Into<String>,
        pid: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        note: impl Into<String>,
    ) -> Self {
        Self {
            id: "".to_string(),
            user_id: uid.into(),
            product_id: pid.into(),
            status: ReservationStatus::Pending as i32,
            start: format_date(start),
            end: format_date(end),
            note: note.into(),
        }
    }

    /// Checks done before any storage access: identity, product, dates.
    pub fn validate(&self) -> Result<(), Error> {
        if self.user_id.is_empty() {
            return Err(Error::Unauthenticated);
        }
        validate_product_id(&self.product_id)?;
        self.window()?;
        Ok(())
    }

    pub fn window(&self) -> Result<ReservationWindow, Error> {
        ReservationWindow::new(
            &self.product_id,
            parse_date(&self.start)?,
            parse_date(&self.end)?,
        )
    }

    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }
}

impl FromRow<'_, PgRow> for Reservation {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let id: Uuid = row.try_get("id")?;
        let start: NaiveDate = row.try_get("start_date")?;
        let end: NaiveDate = row.try_get("end_date")?;
        let status: RsvpStatus = row.try_get("status")?;

        Ok(Self {
            id: id.to_string(),
            user_id: row.try_get("user_id")?,
            product_id: row.try_get("product_id")?,
            status: ReservationStatus::from(status) as i32,
            start: format_date(start),
            end: format_date(end),
            note: row.try_get("note")?,
        })
    }
}
