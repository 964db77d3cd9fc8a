//! Property-based testing strategies using proptest.

use proptest::prelude::*;
use std::collections::HashMap;
use storefront_core::pricing::PricingConfig;
use storefront_core::types::{CartItem, LineItem, Money, ProductId};

/// Valid line items: quantity in `1..50`, price up to $1,000.00
pub fn line_items(max_len: usize) -> impl Strategy<Value = Vec<LineItem>> {
    prop::collection::vec((1u32..50, 0i64..100_000), 1..=max_len.max(1)).prop_map(|lines| {
        lines
            .into_iter()
            .enumerate()
            .map(|(i, (quantity, cents))| LineItem {
                product_id: ProductId::new(format!("p-{i}")),
                name: format!("Product {i}"),
                image: format!("/images/p-{i}.jpg"),
                quantity,
                unit_price: Money::from_cents(cents),
            })
            .collect()
    })
}

/// Carts drawing from the given product ids, possibly repeating a product
pub fn cart(product_ids: Vec<&'static str>, max_qty: u32) -> impl Strategy<Value = Vec<CartItem>> {
    let ids = product_ids;
    prop::collection::vec((0..ids.len().max(1), 1..=max_qty.max(1)), 1..6).prop_map(
        move |lines| {
            lines
                .into_iter()
                .filter_map(|(i, quantity)| ids.get(i).map(|id| CartItem::new(*id, quantity)))
                .collect()
        },
    )
}

/// Pricing configurations with a tax rate up to 50% and optional free shipping
pub fn pricing_config() -> impl Strategy<Value = PricingConfig> {
    (0u32..5000, 0i64..5000, prop::option::of(0i64..1_000_000)).prop_map(
        |(tax_rate_bps, flat, threshold)| PricingConfig {
            tax_rate_bps,
            flat_shipping: Money::from_cents(flat),
            free_shipping_threshold: threshold.map(Money::from_cents),
            shipping_overrides: HashMap::new(),
        },
    )
}
