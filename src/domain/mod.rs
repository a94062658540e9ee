//! Domain types and trait seams

pub mod cache;
pub mod embedding;
pub mod judgment;

mod error;

pub use error::DomainError;
