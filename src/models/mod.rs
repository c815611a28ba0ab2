pub mod auth;
pub mod common;
pub mod geo;
pub mod listing;

pub use auth::*;
pub use common::*;
pub use geo::*;
pub use listing::*;
