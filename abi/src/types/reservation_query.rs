use crate::{Error, Reservation, ReservationQuery, ReservationStatus};

impl ReservationQuery {
    pub fn for_product(pid: impl Into<String>) -> Self {
        Self {
            product_id: pid.into(),
            ..Default::default()
        }
    }

    pub fn for_user(uid: impl Into<String>) -> Self {
        Self {
            user_id: uid.into(),
            ..Default::default()
        }
    }

    /// `None` matches any status.
    pub fn status_filter(&self) -> Option<ReservationStatus> {
        match ReservationStatus::from_i32(self.status) {
            None | Some(ReservationStatus::Unknown) => None,
            status => status,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.product_id.is_empty() && self.user_id.is_empty() {
            return Err(Error::InvalidQuery(
                "either product_id or user_id is required".into(),
            ));
        }
        if ReservationStatus::from_i32(self.status).is_none() {
            return Err(Error::InvalidQuery(format!("unknown status {}", self.status)));
        }
        Ok(())
    }

    pub fn matches(&self, rsvp: &Reservation) -> bool {
        (self.product_id.is_empty() || self.product_id == rsvp.product_id)
            && (self.user_id.is_empty() || self.user_id == rsvp.user_id)
            && self.status_filter().map_or(true, |s| s == rsvp.status())
    }
}
