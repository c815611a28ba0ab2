pub mod auth;
pub mod cors;

pub use auth::{AuthIdentity, AuthMiddleware, current_identity, require_farmer};
pub use cors::create_cors;
