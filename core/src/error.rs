//! Error types for checkout and order lifecycle operations.

use crate::types::{OrderId, OrderStatus, ProductId, UserId};
use thiserror::Error;

/// Result type alias for order operations.
pub type Result<T> = std::result::Result<T, OrderError>;

/// Failures surfaced by the order core.
///
/// Every variant carries the structured detail a caller needs to react
/// programmatically (offending product, quantities, current status).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    // ═══════════════════════════════════════════════════════════
    // Validation
    // ═══════════════════════════════════════════════════════════

    /// Checkout was attempted with no line items.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line item has an invalid quantity or price.
    #[error("Invalid line item for product {product_id}: {reason}")]
    InvalidLineItem {
        /// Offending product
        product_id: ProductId,
        /// What is wrong with the line
        reason: String,
    },

    /// Payment evidence is missing required identifiers.
    #[error("Invalid payment evidence: {reason}")]
    InvalidPaymentEvidence {
        /// What is missing
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Catalog
    // ═══════════════════════════════════════════════════════════

    /// A referenced product does not exist.
    #[error("Product {product_id} not found")]
    ProductNotFound {
        /// Missing product
        product_id: ProductId,
    },

    /// Requested quantity exceeds stock.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Offending product
        product_id: ProductId,
        /// Quantity requested across the cart
        requested: u32,
        /// Quantity currently in stock
        available: u32,
    },

    // ═══════════════════════════════════════════════════════════
    // Order lifecycle
    // ═══════════════════════════════════════════════════════════

    /// The order identity does not resolve.
    #[error("Order {order_id} not found")]
    OrderNotFound {
        /// Missing order
        order_id: OrderId,
    },

    /// Payment was already recorded.
    #[error("Order {order_id} is already paid (status: {status})")]
    AlreadyPaid {
        /// Order
        order_id: OrderId,
        /// Status at the time of the attempt
        status: OrderStatus,
    },

    /// Delivery was attempted before payment.
    #[error("Order {order_id} is not yet paid")]
    NotYetPaid {
        /// Order
        order_id: OrderId,
    },

    /// Delivery was already recorded.
    #[error("Order {order_id} is already delivered")]
    AlreadyDelivered {
        /// Order
        order_id: OrderId,
    },

    // ═══════════════════════════════════════════════════════════
    // Access and infrastructure
    // ═══════════════════════════════════════════════════════════

    /// The caller is neither the owner nor an admin.
    #[error("User {user_id} may not act on order {order_id}")]
    Forbidden {
        /// Order
        order_id: OrderId,
        /// Caller
        user_id: UserId,
    },

    /// The backing store timed out or failed.
    #[error("Store unavailable: {reason}")]
    StoreUnavailable {
        /// Backend detail
        reason: String,
    },
}

impl OrderError {
    /// Validation failures that never leave partial state behind.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyCart
                | Self::InvalidLineItem { .. }
                | Self::InvalidPaymentEvidence { .. }
                | Self::InsufficientStock { .. }
        )
    }

    /// Lifecycle conflicts with the order's current status.
    #[must_use]
    pub const fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyPaid { .. } | Self::NotYetPaid { .. } | Self::AlreadyDelivered { .. }
        )
    }
}

/// Errors raised by store backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Optimistic concurrency conflict on a product's version or stock.
    #[error("Concurrency conflict on product {product_id}")]
    StockConflict {
        /// Product whose version moved
        product_id: ProductId,
    },

    /// A document with the same identity already exists.
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    /// The operation did not finish within its deadline.
    #[error("Store operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),

    /// Document (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_names_product_and_quantities() {
        let err = OrderError::InsufficientStock {
            product_id: ProductId::new("p-1"),
            requested: 3,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p-1: requested 3, available 1"
        );
        assert!(err.is_validation());
        assert!(!err.is_state_conflict());
    }

    #[test]
    fn store_errors_become_unavailable() {
        let err: OrderError = StoreError::Database("connection refused".to_string()).into();
        assert_eq!(
            err,
            OrderError::StoreUnavailable {
                reason: "Database error: connection refused".to_string()
            }
        );
    }

    #[test]
    fn lifecycle_conflicts() {
        let order_id = OrderId::new("o-1");
        assert!(OrderError::NotYetPaid { order_id: order_id.clone() }.is_state_conflict());
        assert!(
            OrderError::AlreadyPaid {
                order_id,
                status: OrderStatus::Delivered
            }
            .is_state_conflict()
        );
        assert!(!OrderError::EmptyCart.is_state_conflict());
    }
}
