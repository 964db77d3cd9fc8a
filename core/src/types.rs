//! Core domain types for the storefront.
//!
//! Orders progress through states: Created → Paid → Delivered. Products are
//! shared by many orders through immutable line-item snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "` from a string")]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the inner string value
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a catalog product
    ProductId
);
string_id!(
    /// Unique identifier for an order
    OrderId
);
string_id!(
    /// Unique identifier for a user account
    UserId
);

/// Money amount in minor units (cents).
///
/// Signed so that invalid negative amounts coming from a backend or a test can
/// be represented and rejected instead of silently wrapping.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a new money amount from cents
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates a new money amount from whole currency units (converted to cents).
    ///
    /// Takes an `i32` so the conversion to cents can never overflow.
    #[must_use]
    #[allow(clippy::cast_lossless)] // `i64::from` is not const
    pub const fn from_units(units: i32) -> Self {
        Self(units as i64 * 100)
    }

    /// Returns the value in cents
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whether the amount is below zero
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Adds two amounts, returning `None` on overflow
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Multiplies by a quantity, returning `None` on overflow
    #[must_use]
    pub const fn checked_times(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as i64) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

/// A cart line as submitted by a client: which product and how many.
///
/// Carries no price. Unit prices are always taken from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product identifier
    pub product_id: ProductId,
    /// Quantity requested
    pub quantity: u32,
}

impl CartItem {
    /// Creates a new cart item
    #[must_use]
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: ProductId::new(product_id),
            quantity,
        }
    }
}

/// A single line item in an order, snapshotted from the catalog at checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product identifier
    pub product_id: ProductId,
    /// Product name for display
    pub name: String,
    /// Product image URL for display
    pub image: String,
    /// Quantity ordered
    pub quantity: u32,
    /// Price per unit at order time
    pub unit_price: Money,
}

impl LineItem {
    /// Snapshots a catalog product into a line item
    #[must_use]
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            image: product.image.clone(),
            quantity,
            unit_price: product.price,
        }
    }

    /// Calculates the total price for this line item, `None` on overflow
    #[must_use]
    pub const fn total(&self) -> Option<Money> {
        self.unit_price.checked_times(self.quantity)
    }
}

/// Where an order ships to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// Postal code
    pub postal_code: String,
    /// Country (ISO code or name, compared case-insensitively for shipping rates)
    pub country: String,
}

/// Payment method tag chosen at checkout (e.g. `paypal`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethod(String);

impl PaymentMethod {
    /// Creates a new payment method tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Evidence of a completed payment, supplied by the payment gateway callback.
///
/// The gateway signature is verified upstream; the core only requires the
/// identifiers to be present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvidence {
    /// Gateway payer identifier
    pub payer_id: String,
    /// Gateway transaction (payment) identifier
    pub transaction_id: String,
    /// Gateway-side order identifier, when the gateway issues one
    #[serde(default)]
    pub gateway_order_id: Option<String>,
    /// Payer email reported by the gateway
    #[serde(default)]
    pub payer_email: Option<String>,
}

/// Payment recorded on an order. `paid_at` and the evidence are written together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// When the payment was confirmed
    pub paid_at: DateTime<Utc>,
    /// Gateway evidence
    pub result: PaymentEvidence,
}

/// Derived price components of an order
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// Sum of line totals
    pub items_price: Money,
    /// Tax on the items price
    pub tax_price: Money,
    /// Shipping charge
    pub shipping_price: Money,
    /// items + tax + shipping
    pub total_price: Money,
}

/// Status of an order in its lifecycle
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order has been placed and awaits payment
    Created,
    /// Payment was confirmed
    Paid,
    /// Order was handed to the customer
    Delivered,
}

impl OrderStatus {
    /// Stable lowercase name used in storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Paid => "paid",
            Self::Delivered => "delivered",
        }
    }

    /// Parses the storage name produced by [`OrderStatus::as_str`]
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "paid" => Some(Self::Paid),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Paid => write!(f, "Paid"),
            Self::Delivered => write!(f, "Delivered"),
        }
    }
}

/// An order document.
///
/// Payment and delivery are optional records rather than flag/timestamp pairs,
/// so a paid flag can never exist without its timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier
    pub id: OrderId,
    /// Owning user
    pub user_id: UserId,
    /// Line items in the order
    pub items: Vec<LineItem>,
    /// Shipping destination
    pub shipping_address: ShippingAddress,
    /// Payment method chosen at checkout
    pub payment_method: PaymentMethod,
    /// Derived prices
    pub prices: PriceBreakdown,
    /// Set once payment is confirmed
    pub payment: Option<PaymentRecord>,
    /// Set once the order is delivered
    pub delivered_at: Option<DateTime<Utc>>,
    /// When the order was created
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Current lifecycle status
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        if self.delivered_at.is_some() {
            OrderStatus::Delivered
        } else if self.payment.is_some() {
            OrderStatus::Paid
        } else {
            OrderStatus::Created
        }
    }

    /// Whether payment was confirmed
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        self.payment.is_some()
    }

    /// When payment was confirmed
    #[must_use]
    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.payment.as_ref().map(|p| p.paid_at)
    }

    /// Whether the order was delivered
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        self.delivered_at.is_some()
    }
}

/// A customer review attached to a product
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Reviewer display name
    pub name: String,
    /// Rating between 1 and 5
    pub rating: u8,
    /// Review text
    pub comment: String,
    /// When the review was written
    pub created_at: DateTime<Utc>,
}

/// A catalog product.
///
/// `version` increases on every stock change and guards concurrent decrements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Image URL (opaque)
    pub image: String,
    /// Brand
    pub brand: String,
    /// Category
    pub category: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Current unit price
    pub price: Money,
    /// Units available
    pub count_in_stock: u32,
    /// Average review rating
    #[serde(default)]
    pub rating: f64,
    /// Number of reviews
    #[serde(default)]
    pub num_reviews: u32,
    /// Reviews in submission order
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Optimistic concurrency version
    #[serde(default)]
    pub version: u64,
}

/// A user account as seen by the order core.
///
/// Credentials are owned by the auth collaborator and never reach this crate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Unique email
    pub email: String,
    /// Administrator flag
    pub is_admin: bool,
}

/// The authenticated caller of an operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    /// Caller identity
    pub user_id: UserId,
    /// Whether the caller holds admin privileges
    pub is_admin: bool,
}

impl Principal {
    /// Creates a non-admin principal
    #[must_use]
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            is_admin: false,
        }
    }

    /// Creates an admin principal
    #[must_use]
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            is_admin: true,
        }
    }

    /// Owners and admins may act on an order
    #[must_use]
    pub fn can_access(&self, order: &Order) -> bool {
        self.is_admin || self.user_id == order.user_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn order() -> Order {
        Order {
            id: OrderId::new("order-1"),
            user_id: UserId::new("user-1"),
            items: vec![],
            shipping_address: ShippingAddress {
                address: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                postal_code: "12345".to_string(),
                country: "US".to_string(),
            },
            payment_method: PaymentMethod::new("paypal"),
            prices: PriceBreakdown::default(),
            payment: None,
            delivered_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(-5).to_string(), "-$0.05");
        assert_eq!(Money::from_units(7).to_string(), "$7.00");
    }

    #[test]
    fn money_overflow_is_detected() {
        assert!(Money::from_cents(i64::MAX).checked_times(2).is_none());
        assert!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)).is_none());
        assert_eq!(Money::from_cents(250).checked_times(3), Some(Money::from_cents(750)));
        assert_eq!(Money::from_units(i32::MAX).cents(), 214_748_364_700);
        assert_eq!(Money::from_units(i32::MIN).cents(), -214_748_364_800);
    }

    #[test]
    fn status_follows_records() {
        let mut order = order();
        assert_eq!(order.status(), OrderStatus::Created);

        order.payment = Some(PaymentRecord {
            paid_at: Utc::now(),
            result: PaymentEvidence {
                payer_id: "payer".to_string(),
                transaction_id: "txn".to_string(),
                gateway_order_id: None,
                payer_email: None,
            },
        });
        assert_eq!(order.status(), OrderStatus::Paid);
        assert!(order.is_paid());
        assert!(order.paid_at().is_some());

        order.delivered_at = Some(Utc::now());
        assert_eq!(order.status(), OrderStatus::Delivered);
    }

    #[test]
    fn status_storage_names_round_trip() {
        for status in [OrderStatus::Created, OrderStatus::Paid, OrderStatus::Delivered] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("shipped"), None);
    }

    #[test]
    fn principal_access() {
        let order = order();
        assert!(Principal::user("user-1").can_access(&order));
        assert!(!Principal::user("user-2").can_access(&order));
        assert!(Principal::admin("someone").can_access(&order));
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&ProductId::new("p-1")).unwrap();
        assert_eq!(json, "\"p-1\"");
    }
}
