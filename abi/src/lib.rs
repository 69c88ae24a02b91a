mod config;
mod error;
#[allow(clippy::all, non_camel_case_types)]
mod pb;
mod types;
mod utils;

pub use config::*;
pub use error::{Error, ReservationConflict, ReservationConflictInfo, ReservationWindow};
pub use pb::*;
pub use types::*;
pub use utils::*;

pub type ReservationId = String;
pub type UserId = String;
pub type ProductId = String;
