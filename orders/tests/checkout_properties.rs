//! Property tests for checkout over random carts.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use storefront_core::error::OrderError;
use storefront_core::pricing::{PricingConfig, price};
use storefront_core::types::{CartItem, PaymentMethod, UserId};
use storefront_orders::config::CheckoutConfig;
use storefront_orders::{CheckoutEnvironment, CheckoutService};
use storefront_testing::fixtures::{ProductBuilder, address_in, sample_address};
use storefront_testing::properties::{cart, line_items, pricing_config};
use storefront_testing::{
    InMemoryOrderRepository, InMemoryProductCatalog, InMemoryUserDirectory, SequentialIds,
    SteppingClock,
};

const PRODUCTS: [&str; 3] = ["p-a", "p-b", "p-c"];

fn catalog(stocks: &[u32]) -> InMemoryProductCatalog {
    InMemoryProductCatalog::with_products(PRODUCTS.iter().zip(stocks).enumerate().map(
        |(i, (id, stock))| {
            ProductBuilder::new(id)
                .price_cents(199 + 1000 * i64::try_from(i).unwrap())
                .stock(*stock)
                .build()
        },
    ))
}

fn service(catalog: &InMemoryProductCatalog, pricing: PricingConfig) -> CheckoutService {
    CheckoutService::new(
        CheckoutEnvironment {
            catalog: Arc::new(catalog.clone()),
            orders: Arc::new(InMemoryOrderRepository::new()),
            users: Arc::new(InMemoryUserDirectory::new()),
            clock: Arc::new(SteppingClock::default()),
            ids: Arc::new(SequentialIds::new()),
        },
        &CheckoutConfig {
            pricing,
            ..CheckoutConfig::default()
        },
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Totals always add up and stock only moves for successful checkouts.
    #[test]
    fn checkouts_conserve_stock_and_totals(
        stocks in prop::collection::vec(0u32..8, 3),
        carts in prop::collection::vec(cart(PRODUCTS.to_vec(), 4), 1..6),
        pricing in pricing_config(),
    ) {
        let catalog = catalog(&stocks);
        let service = service(&catalog, pricing);
        let mut sold: HashMap<String, u32> = HashMap::new();

        runtime().block_on(async {
            for cart in &carts {
                match service
                    .create_order(
                        UserId::new("u-1"),
                        cart,
                        sample_address(),
                        PaymentMethod::new("paypal"),
                    )
                    .await
                {
                    Ok(order) => {
                        let prices = order.prices;
                        prop_assert_eq!(
                            prices.total_price.cents(),
                            prices.items_price.cents()
                                + prices.tax_price.cents()
                                + prices.shipping_price.cents()
                        );
                        for CartItem { product_id, quantity } in cart {
                            *sold.entry(product_id.to_string()).or_default() += quantity;
                        }
                    },
                    Err(OrderError::InsufficientStock { requested, available, .. }) => {
                        prop_assert!(requested > available);
                    },
                    Err(other) => {
                        return Err(TestCaseError::fail(format!("unexpected error: {other}")));
                    },
                }
            }
            Ok(())
        })?;

        for (id, initial) in PRODUCTS.iter().zip(&stocks) {
            let sold = sold.get(*id).copied().unwrap_or(0);
            prop_assert_eq!(catalog.stock_of(id), Some(initial - sold));
        }
    }

    /// Prices are exact sums and free shipping only kicks in above the threshold.
    #[test]
    fn price_breakdown_adds_up(
        items in line_items(8),
        pricing in pricing_config(),
        country in prop::sample::select(vec!["US", "ca", "GB"]),
    ) {
        let prices = price(&items, &address_in(country), &pricing).unwrap();

        prop_assert_eq!(
            prices.total_price.cents(),
            prices.items_price.cents() + prices.tax_price.cents() + prices.shipping_price.cents()
        );
        prop_assert!(prices.tax_price.cents() <= prices.items_price.cents());
        let above_threshold = pricing
            .free_shipping_threshold
            .is_some_and(|threshold| prices.items_price > threshold);
        if above_threshold {
            prop_assert_eq!(prices.shipping_price.cents(), 0);
        } else {
            prop_assert_eq!(prices.shipping_price, pricing.flat_shipping);
        }
    }
}
