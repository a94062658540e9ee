//! API layer - HTTP surface

pub mod health;
pub mod judge;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;

pub use router::create_router;
pub use state::AppState;
