//! Court reservation models and the rules that govern them

#[macro_use]
extern crate tracing;

mod availability;
mod blocked_email;
mod conflict;
mod court;
mod court_booking;
mod profile;
mod schedule;

pub use availability::*;
pub use blocked_email::*;
pub use conflict::*;
pub use court::*;
pub use court_booking::*;
pub use profile::*;
pub use schedule::*;
