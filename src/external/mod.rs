pub mod email;
pub mod geocoding;

pub use email::*;
pub use geocoding::*;
