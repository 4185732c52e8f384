pub mod error;
pub mod rest;

pub use error::{ApiError, ErrorResponse};
pub use rest::RestApi;
