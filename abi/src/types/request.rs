use crate::{
    AvailabilityRequest, CancelRequest, ConfirmRequest, GetRequest, QueryRequest, Reservation,
    ReservationQuery, ReserveRequest, UpdateRequest, WindowsRequest,
};

impl ReserveRequest {
    pub fn new(rsvp: Reservation) -> Self {
        Self {
            reservation: Some(rsvp),
        }
    }
}

impl ConfirmRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl CancelRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl GetRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl UpdateRequest {
    pub fn new(id: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            note: note.into(),
        }
    }
}

impl WindowsRequest {
    pub fn new(pid: impl Into<String>) -> Self {
        Self {
            product_id: pid.into(),
        }
    }
}

impl AvailabilityRequest {
    pub fn new(pid: impl Into<String>) -> Self {
        Self {
            product_id: pid.into(),
        }
    }
}

impl QueryRequest {
    pub fn new(query: ReservationQuery) -> Self {
        Self { query: Some(query) }
    }
}
