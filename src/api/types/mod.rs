//! API request/response types

pub mod error;
pub mod judge;
mod json;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
