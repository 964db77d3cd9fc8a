//! HTTP API handlers.

pub mod orders;
pub mod products;
