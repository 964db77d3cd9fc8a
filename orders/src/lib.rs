//! # Storefront Orders
//!
//! The order lifecycle and checkout pipeline of the storefront, and the HTTP
//! server that exposes it.
//!
//! ## Architecture
//!
//! ```text
//! cart ─► CheckoutService ─► InventoryReconciler ─► pricing ─► OrderRepository
//!                │                  (stock CAS + retry)            (Created)
//!                └─► pay_order / mark_delivered ─► OrderLifecycle ─► status CAS
//! ```
//!
//! - [`checkout`]: create, pay, deliver, delete, get and list orders
//! - [`inventory`]: all-or-nothing stock reservation with compensation
//! - [`catalog`]: read-only product queries
//! - [`auth`]: bearer token extractors
//! - [`api`] and [`server`]: Axum handlers, state and router
//! - [`bootstrap`]: store wiring for `PostgreSQL` or in-memory demo mode
//! - [`config`]: environment configuration
//! - [`metrics`]: business metrics

#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod inventory;
pub mod metrics;
pub mod server;

pub use bootstrap::Resources;
pub use checkout::{CheckoutEnvironment, CheckoutService, Customer, OrderListing};
pub use config::Config;
pub use inventory::InventoryReconciler;
pub use server::{AppState, build_router};
