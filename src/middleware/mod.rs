//! Custom middleware definitions

mod auth;
mod role;

pub use auth::AuthLayer;
pub use role::RoleLayer;
