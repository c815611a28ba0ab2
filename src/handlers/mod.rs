pub mod auth;
pub mod geo;
pub mod listing;

pub use auth::auth_config;
pub use geo::geo_config;
pub use listing::listing_config;
