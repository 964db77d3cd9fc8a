//! Business metrics for the storefront.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `storefront_orders_total{status}` - Order transitions by resulting status
//!   (`created`, `paid`, `delivered`, `deleted`)
//! - `storefront_checkout_failures_total{reason}` - Rejected or failed checkouts
//! - `storefront_stock_conflicts_total` - Optimistic stock reservation conflicts
//! - `storefront_revenue_cents_total` - Paid order totals in cents
//!
//! ## Histograms
//! - `storefront_checkout_duration_seconds` - Time spent in `create_order`

use metrics::{describe_counter, describe_histogram};
use std::time::Duration;
use storefront_core::error::OrderError;
use storefront_core::types::{Money, OrderStatus};

/// Initialize and register all business metrics descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!(
        "storefront_orders_total",
        "Total number of order transitions by resulting status (created, paid, delivered, deleted)"
    );
    describe_counter!(
        "storefront_checkout_failures_total",
        "Total number of failed checkouts by reason"
    );
    describe_counter!(
        "storefront_stock_conflicts_total",
        "Total number of optimistic concurrency conflicts while reserving stock"
    );
    describe_counter!(
        "storefront_revenue_cents_total",
        "Total revenue from paid orders in cents"
    );
    describe_histogram!(
        "storefront_checkout_duration_seconds",
        "Time taken to create an order"
    );

    tracing::info!("Business metrics registered");
}

/// Record an order reaching a status.
pub fn record_order_transition(status: OrderStatus) {
    metrics::counter!("storefront_orders_total", "status" => status.as_str()).increment(1);
}

/// Record an order deletion.
pub fn record_order_deleted() {
    metrics::counter!("storefront_orders_total", "status" => "deleted").increment(1);
}

/// Record a failed checkout.
pub fn record_checkout_failure(error: &OrderError) {
    metrics::counter!("storefront_checkout_failures_total", "reason" => failure_reason(error))
        .increment(1);
}

/// Record a stock reservation conflict.
pub fn record_stock_conflict() {
    metrics::counter!("storefront_stock_conflicts_total").increment(1);
}

/// Record revenue from a paid order.
pub fn record_revenue(total: Money) {
    if let Ok(cents) = u64::try_from(total.cents()) {
        metrics::counter!("storefront_revenue_cents_total").increment(cents);
    }
}

/// Record checkout latency.
pub fn record_checkout_duration(elapsed: Duration) {
    metrics::histogram!("storefront_checkout_duration_seconds").record(elapsed.as_secs_f64());
}

const fn failure_reason(error: &OrderError) -> &'static str {
    match error {
        OrderError::EmptyCart => "empty_cart",
        OrderError::InvalidLineItem { .. } => "invalid_line_item",
        OrderError::ProductNotFound { .. } => "product_not_found",
        OrderError::InsufficientStock { .. } => "insufficient_stock",
        OrderError::StoreUnavailable { .. } => "store_unavailable",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::types::ProductId;

    #[test]
    fn recording_without_recorder_is_a_noop() {
        register_business_metrics();
        record_order_transition(OrderStatus::Paid);
        record_order_deleted();
        record_stock_conflict();
        record_revenue(Money::from_cents(-5));
        record_revenue(Money::from_cents(11_500));
        record_checkout_duration(Duration::from_millis(3));
    }

    #[test]
    fn failure_reasons_are_stable() {
        assert_eq!(failure_reason(&OrderError::EmptyCart), "empty_cart");
        assert_eq!(
            failure_reason(&OrderError::InsufficientStock {
                product_id: ProductId::new("p-1"),
                requested: 2,
                available: 1,
            }),
            "insufficient_stock"
        );
    }
}
