mod conflict;

use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

use crate::ReservationStatus;
pub use conflict::{ReservationConflict, ReservationConflictInfo, ReservationWindow};

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid date range: {0}")]
    InvalidRange(String),

    #[error("{0} is not covered by any bookable window")]
    OutsideAvailability(ReservationWindow),

    #[error("conflict reservation: {0}")]
    ConflictReservation(ReservationConflictInfo),

    #[error("no authenticated user")]
    Unauthenticated,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("storage unavailable")]
    StorageUnavailable(#[source] sqlx::Error),

    #[error("cannot change reservation status from {from} to {to}")]
    InvalidStatusTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    #[error("no reservation found by the given condition")]
    NotFound,

    #[error("invalid reservation id: {0}")]
    InvalidReservationId(String),

    #[error("invalid product id: {0}")]
    InvalidProductId(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("failed to read configuration file")]
    ConfigReadError,

    #[error("failed to parse configuration file")]
    ConfigParseError,
}

// storage errors carry a sqlx::Error, which has no PartialEq
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidRange(a), Self::InvalidRange(b)) => a == b,
            (Self::OutsideAvailability(a), Self::OutsideAvailability(b)) => a == b,
            (Self::ConflictReservation(a), Self::ConflictReservation(b)) => a == b,
            (Self::PermissionDenied(a), Self::PermissionDenied(b)) => a == b,
            (Self::StorageUnavailable(_), Self::StorageUnavailable(_)) => true,
            (
                Self::InvalidStatusTransition { from: f1, to: t1 },
                Self::InvalidStatusTransition { from: f2, to: t2 },
            ) => f1 == f2 && t1 == t2,
            (Self::InvalidReservationId(a), Self::InvalidReservationId(b)) => a == b,
            (Self::InvalidProductId(a), Self::InvalidProductId(b)) => a == b,
            (Self::InvalidQuery(a), Self::InvalidQuery(b)) => a == b,
            (Self::Unauthenticated, Self::Unauthenticated)
            | (Self::NotFound, Self::NotFound)
            | (Self::ConfigReadError, Self::ConfigReadError)
            | (Self::ConfigParseError, Self::ConfigParseError) => true,
            _ => false,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(e) => {
                // exclusion constraint on overlapping spans; anything else,
                // serialization failures included, is a storage error
                let conflict: Option<ReservationConflictInfo> = e
                    .try_downcast_ref::<PgDatabaseError>()
                    .filter(|err| {
                        err.code() == "23P01" && err.constraint() == Some("reservations_conflict")
                    })
                    .and_then(|err| err.detail().unwrap_or_else(|| err.message()).parse().ok());
                match conflict {
                    Some(info) => Error::ConflictReservation(info),
                    None => Error::StorageUnavailable(sqlx::Error::Database(e)),
                }
            }
            sqlx::Error::RowNotFound => Error::NotFound,
            _ => Error::StorageUnavailable(e),
        }
    }
}

impl From<Error> for tonic::Status {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidRange(_)
            | Error::InvalidReservationId(_)
            | Error::InvalidProductId(_)
            | Error::InvalidQuery(_) => tonic::Status::invalid_argument(e.to_string()),
            Error::OutsideAvailability(_) => tonic::Status::out_of_range(e.to_string()),
            Error::ConflictReservation(_) => tonic::Status::already_exists(e.to_string()),
            Error::Unauthenticated => tonic::Status::unauthenticated(e.to_string()),
            Error::PermissionDenied(_) => tonic::Status::permission_denied(e.to_string()),
            Error::StorageUnavailable(_) => tonic::Status::unavailable(e.to_string()),
            Error::InvalidStatusTransition { .. } => {
                tonic::Status::failed_precondition(e.to_string())
            }
            Error::NotFound => tonic::Status::not_found(e.to_string()),
            Error::ConfigReadError | Error::ConfigParseError => {
                tonic::Status::internal(e.to_string())
            }
        }
    }
}
