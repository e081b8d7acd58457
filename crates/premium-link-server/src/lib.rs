//! Premium Link Server - wallet to premium profile linking for the social client
//!
//! This crate binds wallet addresses to externally owned premium profiles,
//! verifies ownership against an upstream oracle, and derives each wallet's
//! membership status. The HTTP API lives in [`routes`].

pub mod config;
pub mod db;
pub mod eligibility;
pub mod error;
pub mod linking;
pub mod models;
pub mod oracle;
pub mod registry;
pub mod routes;
pub mod state;
pub mod status;

pub use error::{AppError, LinkError};
pub use routes::create_router;
pub use state::AppState;
