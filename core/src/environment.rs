//! Dependency injection traits.
//!
//! Time and identity generation are injected so that checkout and lifecycle
//! rules stay deterministic under test.

use crate::types::OrderId;
use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```
/// use storefront_core::environment::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let _now = clock.now();
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Generates identities for new orders
pub trait IdGenerator: Send + Sync {
    /// Next order identifier
    fn next_order_id(&self) -> OrderId;
}

/// Random UUID v4 order identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_order_id(&self) -> OrderId {
        OrderId::new(format!("order-{}", uuid::Uuid::new_v4()))
    }
}
