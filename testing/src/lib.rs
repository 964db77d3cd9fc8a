//! # Storefront Testing
//!
//! Testing utilities for the storefront workspace.
//!
//! This crate provides:
//! - Mock implementations of environment traits ([`FixedClock`], [`SequentialIds`])
//! - In-memory store backends ([`InMemoryProductCatalog`], [`InMemoryOrderRepository`],
//!   [`InMemoryUserDirectory`])
//! - Builders and sample data ([`fixtures`])
//! - Property-based testing strategies ([`properties`])
//!
//! ## Example
//!
//! ```
//! use storefront_testing::{InMemoryProductCatalog, test_clock};
//! use storefront_testing::fixtures::ProductBuilder;
//!
//! let catalog = InMemoryProductCatalog::with_products([
//!     ProductBuilder::new("p-1").stock(1).build(),
//! ]);
//! let _clock = test_clock();
//! assert_eq!(catalog.stock_of("p-1"), Some(1));
//! ```

pub mod fixtures;
pub mod memory;
pub mod mocks;
pub mod properties;

// Re-export commonly used items
pub use memory::{InMemoryOrderRepository, InMemoryProductCatalog, InMemoryUserDirectory};
pub use mocks::{FixedClock, SequentialIds, SteppingClock, test_clock};

/// Install a test-friendly tracing subscriber.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
