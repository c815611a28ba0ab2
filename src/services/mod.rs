pub mod auth_service;
pub mod listing_service;
pub mod otp_service;
pub mod user_service;

pub use auth_service::*;
pub use listing_service::*;
pub use otp_service::*;
pub use user_service::*;
