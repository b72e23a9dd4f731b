// Utility functions
pub mod dates;
pub mod error;
pub mod http_client;
pub mod json_extract;

pub use error::*;
