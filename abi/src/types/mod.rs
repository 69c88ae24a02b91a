mod identity;
mod interval;
mod request;
mod reservation;
mod reservation_query;
mod reservation_status;
mod window;

pub use identity::{Identity, Role};
pub use interval::DateInterval;
pub use reservation_status::RsvpStatus;
pub use window::WindowState;
