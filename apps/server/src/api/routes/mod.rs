//! API routes

pub mod search;
