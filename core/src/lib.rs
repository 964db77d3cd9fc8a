//! # Storefront Core
//!
//! Domain types and rules for the storefront order pipeline.
//!
//! This crate holds everything that does not need a database or a network:
//! the order document and its collaborators, pricing, the order lifecycle
//! state machine, and the store traits the imperative shell implements.
//!
//! ## Core Concepts
//!
//! - **Types**: products, cart lines, order documents, prices in cents
//! - **Pricing**: pure function from line items and a destination to a [`PriceBreakdown`]
//! - **Lifecycle**: `Created → Paid → Delivered`, commands validated into events
//! - **Stores**: dyn-compatible traits for catalog, orders and users
//! - **Environment**: injected clock and id generation
//!
//! ## Example
//!
//! ```
//! use storefront_core::pricing::{price, PricingConfig};
//! use storefront_core::types::{LineItem, Money, ProductId, ShippingAddress};
//!
//! let items = vec![LineItem {
//!     product_id: ProductId::new("p-1"),
//!     name: "Airpods".to_string(),
//!     image: "/images/airpods.jpg".to_string(),
//!     quantity: 2,
//!     unit_price: Money::from_units(50),
//! }];
//! let destination = ShippingAddress {
//!     address: "1 Main St".to_string(),
//!     city: "Boston".to_string(),
//!     postal_code: "02101".to_string(),
//!     country: "US".to_string(),
//! };
//!
//! let prices = price(&items, &destination, &PricingConfig::default()).unwrap();
//! assert_eq!(prices.items_price, Money::from_units(100));
//! ```

pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod pricing;
pub mod retry;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use environment::{Clock, IdGenerator, SystemClock, UuidGenerator};
pub use error::{OrderError, Result, StoreError};
pub use lifecycle::{OrderCommand, OrderEvent, OrderLifecycle};
pub use pricing::PricingConfig;
pub use store::{OrderRepository, ProductCatalog, StoreFuture, UserDirectory};
pub use types::{
    CartItem, LineItem, Money, Order, OrderId, OrderStatus, PaymentEvidence, PaymentMethod,
    PaymentRecord, PriceBreakdown, Principal, Product, ProductId, ShippingAddress, User, UserId,
};
