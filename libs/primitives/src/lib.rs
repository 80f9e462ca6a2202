//! Plain database row types, one per table

mod blocked_email;
mod court;
mod court_booking;
mod profile;

pub use blocked_email::*;
pub use court::*;
pub use court_booking::*;
pub use profile::*;
