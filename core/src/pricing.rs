//! Order pricing.
//!
//! Pure functions from line items and a destination to a [`PriceBreakdown`].
//! All arithmetic is done in integer minor units.

use crate::error::{OrderError, Result};
use crate::types::{LineItem, Money, PriceBreakdown, ProductId, ShippingAddress};
use std::collections::HashMap;

/// Basis points in one whole (100%)
const BPS_DENOMINATOR: i128 = 10_000;

/// Highest accepted tax rate (100%)
pub const MAX_TAX_RATE_BPS: u32 = 10_000;

/// Pricing rules applied at checkout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricingConfig {
    /// Tax rate in basis points (1000 = 10%)
    pub tax_rate_bps: u32,
    /// Default shipping charge
    pub flat_shipping: Money,
    /// Shipping is free when the items price strictly exceeds this amount
    pub free_shipping_threshold: Option<Money>,
    /// Per-country shipping charges, keyed by uppercase country
    pub shipping_overrides: HashMap<String, Money>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate_bps: 1500,
            flat_shipping: Money::from_units(10),
            free_shipping_threshold: Some(Money::from_units(100)),
            shipping_overrides: HashMap::new(),
        }
    }
}

impl PricingConfig {
    /// Shipping charge for a destination before the free-shipping rule
    #[must_use]
    pub fn shipping_rate_for(&self, destination: &ShippingAddress) -> Money {
        self.shipping_overrides
            .get(&destination.country.trim().to_uppercase())
            .copied()
            .unwrap_or(self.flat_shipping)
    }
}

/// Sum of `quantity × unit_price` over all line items.
///
/// # Errors
///
/// Returns [`OrderError::InvalidLineItem`] if a quantity is zero, a unit price
/// is negative, or the sum overflows.
pub fn items_price(items: &[LineItem]) -> Result<Money> {
    items.iter().try_fold(Money::ZERO, |acc, item| {
        validate_line_item(item)?;
        item.total()
            .and_then(|line| acc.checked_add(line))
            .ok_or_else(|| invalid(item, "price overflows"))
    })
}

/// Tax on an amount, rounded half-up to the minor unit.
///
/// Returns `None` when the tax does not fit in [`Money`].
#[must_use]
pub fn tax_on(amount: Money, tax_rate_bps: u32) -> Option<Money> {
    let scaled = i128::from(amount.cents()) * i128::from(tax_rate_bps);
    let rounded = (scaled + BPS_DENOMINATOR / 2).div_euclid(BPS_DENOMINATOR);
    i64::try_from(rounded).ok().map(Money::from_cents)
}

/// Prices an order.
///
/// # Errors
///
/// Returns [`OrderError::InvalidLineItem`] for invalid quantities or prices,
/// when an amount overflows, or when the configured shipping charge is negative.
pub fn price(
    items: &[LineItem],
    destination: &ShippingAddress,
    config: &PricingConfig,
) -> Result<PriceBreakdown> {
    let items_price = items_price(items)?;
    let tax_price = tax_on(items_price, config.tax_rate_bps)
        .ok_or_else(|| order_invalid(items, "tax overflows"))?;

    let free_shipping = config
        .free_shipping_threshold
        .is_some_and(|threshold| items_price > threshold);
    let shipping_price = if free_shipping {
        Money::ZERO
    } else {
        config.shipping_rate_for(destination)
    };
    if shipping_price.is_negative() {
        return Err(order_invalid(items, "shipping charge must not be negative"));
    }

    let total_price = items_price
        .checked_add(tax_price)
        .and_then(|sum| sum.checked_add(shipping_price))
        .ok_or_else(|| order_invalid(items, "order total overflows"))?;

    Ok(PriceBreakdown {
        items_price,
        tax_price,
        shipping_price,
        total_price,
    })
}

fn validate_line_item(item: &LineItem) -> Result<()> {
    if item.quantity < 1 {
        return Err(invalid(item, "quantity must be at least 1"));
    }
    if item.unit_price.is_negative() {
        return Err(invalid(item, "unit price must not be negative"));
    }
    Ok(())
}

/// Order-level failure, reported against the first line.
fn order_invalid(items: &[LineItem], reason: &str) -> OrderError {
    OrderError::InvalidLineItem {
        product_id: items
            .first()
            .map(|item| item.product_id.clone())
            .unwrap_or_else(|| ProductId::new("")),
        reason: reason.to_string(),
    }
}

fn invalid(item: &LineItem, reason: &str) -> OrderError {
    OrderError::InvalidLineItem {
        product_id: item.product_id.clone(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(id: &str, quantity: u32, cents: i64) -> LineItem {
        LineItem {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            image: format!("/images/{id}.jpg"),
            quantity,
            unit_price: Money::from_cents(cents),
        }
    }

    fn destination(country: &str) -> ShippingAddress {
        ShippingAddress {
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: country.to_string(),
        }
    }

    fn ten_percent_flat_five() -> PricingConfig {
        PricingConfig {
            tax_rate_bps: 1000,
            flat_shipping: Money::from_units(5),
            free_shipping_threshold: None,
            shipping_overrides: HashMap::new(),
        }
    }

    #[test]
    fn two_items_at_fifty() {
        let prices = price(
            &[item("p1", 2, 5000)],
            &destination("US"),
            &ten_percent_flat_five(),
        )
        .unwrap();

        assert_eq!(prices.items_price, Money::from_units(100));
        assert_eq!(prices.tax_price, Money::from_units(10));
        assert_eq!(prices.shipping_price, Money::from_units(5));
        assert_eq!(prices.total_price, Money::from_units(115));
    }

    #[test]
    fn tax_rounds_half_up() {
        // 0.15 * 1.10 = 0.165 -> 0.17
        assert_eq!(tax_on(Money::from_cents(110), 1500), Some(Money::from_cents(17)));
        // 0.15 * 1.09 = 0.1635 -> 0.16
        assert_eq!(tax_on(Money::from_cents(109), 1500), Some(Money::from_cents(16)));
        assert_eq!(tax_on(Money::ZERO, 1500), Some(Money::ZERO));
    }

    #[test]
    fn oversized_tax_is_rejected_instead_of_wrapping() {
        assert_eq!(tax_on(Money::from_cents(i64::MAX), u32::MAX), None);

        let config = PricingConfig {
            tax_rate_bps: u32::MAX,
            ..ten_percent_flat_five()
        };
        let err = price(
            &[item("p1", 10_000, 100_000_000_000)],
            &destination("US"),
            &config,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidLineItem { ref reason, .. } if reason == "tax overflows"
        ));
    }

    #[test]
    fn negative_shipping_charge_is_rejected() {
        let config = PricingConfig {
            flat_shipping: Money::from_cents(-5000),
            ..ten_percent_flat_five()
        };
        let err = price(&[item("p1", 1, 1000)], &destination("US"), &config).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidLineItem { ref reason, .. } if reason.contains("shipping")
        ));

        let mut config = ten_percent_flat_five();
        config
            .shipping_overrides
            .insert("CA".to_string(), Money::from_cents(-1));
        assert!(price(&[item("p1", 1, 1000)], &destination("CA"), &config).is_err());
        assert!(price(&[item("p1", 1, 1000)], &destination("US"), &config).is_ok());
    }

    #[test]
    fn free_shipping_only_above_threshold() {
        let config = PricingConfig {
            free_shipping_threshold: Some(Money::from_units(100)),
            ..ten_percent_flat_five()
        };

        let at_threshold = price(&[item("p1", 1, 10_000)], &destination("US"), &config).unwrap();
        assert_eq!(at_threshold.shipping_price, Money::from_units(5));

        let above = price(&[item("p1", 1, 10_001)], &destination("US"), &config).unwrap();
        assert_eq!(above.shipping_price, Money::ZERO);
    }

    #[test]
    fn shipping_override_by_country() {
        let mut config = ten_percent_flat_five();
        config
            .shipping_overrides
            .insert("CA".to_string(), Money::from_units(12));

        let prices = price(&[item("p1", 1, 1000)], &destination(" ca "), &config).unwrap();
        assert_eq!(prices.shipping_price, Money::from_units(12));
    }

    #[test]
    fn zero_quantity_is_invalid() {
        let err = price(&[item("p9", 0, 100)], &destination("US"), &ten_percent_flat_five())
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidLineItem { ref product_id, .. } if product_id.as_str() == "p9"
        ));
    }

    #[test]
    fn negative_price_is_invalid() {
        let err = items_price(&[item("p1", 1, 100), item("p2", 1, -1)]).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidLineItem { ref product_id, .. } if product_id.as_str() == "p2"
        ));
    }

    proptest! {
        #[test]
        fn total_is_sum_of_components(
            lines in prop::collection::vec((1u32..50, 0i64..100_000), 1..10),
            tax_rate_bps in 0u32..5000,
            flat in 0i64..5000,
            threshold in prop::option::of(0i64..1_000_000),
        ) {
            let items: Vec<LineItem> = lines
                .iter()
                .enumerate()
                .map(|(i, (qty, cents))| item(&format!("p{i}"), *qty, *cents))
                .collect();
            let config = PricingConfig {
                tax_rate_bps,
                flat_shipping: Money::from_cents(flat),
                free_shipping_threshold: threshold.map(Money::from_cents),
                shipping_overrides: HashMap::new(),
            };

            let prices = price(&items, &destination("US"), &config).unwrap();

            prop_assert_eq!(
                prices.total_price.cents(),
                prices.items_price.cents() + prices.tax_price.cents() + prices.shipping_price.cents()
            );
            prop_assert!(!prices.tax_price.is_negative());
            prop_assert!(!prices.shipping_price.is_negative());
        }
    }
}
