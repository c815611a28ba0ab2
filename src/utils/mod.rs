pub mod code_generator;
pub mod email;
pub mod geogrid;
pub mod jwt;

pub use code_generator::{OTP_LENGTH, generate_six_digit_code};
pub use email::normalize_email;
pub use geogrid::{GRID_RESOLUTION, GeoCell, SearchRadius, index_cell, neighborhood};
pub use jwt::*;
