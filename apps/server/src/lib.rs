//! Sieve search server
//!
//! Serves the dynamic query engine over HTTP against PostgreSQL tables
//! declared in configuration:
//! - filter, sort and page any declared entity from query parameters
//! - join-safe paging with exact totals
//! - eager embedding of configured relations

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
