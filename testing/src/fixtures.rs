//! Builders and sample data.
//!
//! [`demo_catalog`] and [`demo_users`] also seed the server when it runs
//! without a database.

use crate::mocks::test_clock;
use storefront_core::environment::Clock;
use storefront_core::types::{
    Money, Order, OrderId, PaymentEvidence, PaymentMethod, PaymentRecord, PriceBreakdown, Product,
    ProductId, ShippingAddress, User, UserId,
};

/// Fluent builder for catalog products
#[derive(Clone, Debug)]
pub struct ProductBuilder {
    product: Product,
}

impl ProductBuilder {
    /// Start a product with sensible defaults ($10.00, 10 in stock)
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            product: Product {
                id: ProductId::new(id),
                name: format!("Product {id}"),
                image: format!("/images/{id}.jpg"),
                brand: "Sample Brand".to_string(),
                category: "Sample Category".to_string(),
                description: "Sample description".to_string(),
                price: Money::from_units(10),
                count_in_stock: 10,
                rating: 0.0,
                num_reviews: 0,
                reviews: Vec::new(),
                version: 0,
            },
        }
    }

    /// Set the display name
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.product.name = name.to_string();
        self
    }

    /// Set brand and category
    #[must_use]
    pub fn classified(mut self, brand: &str, category: &str) -> Self {
        self.product.brand = brand.to_string();
        self.product.category = category.to_string();
        self
    }

    /// Set the unit price in cents
    #[must_use]
    pub const fn price_cents(mut self, cents: i64) -> Self {
        self.product.price = Money::from_cents(cents);
        self
    }

    /// Set units in stock
    #[must_use]
    pub const fn stock(mut self, count: u32) -> Self {
        self.product.count_in_stock = count;
        self
    }

    /// Set the concurrency version
    #[must_use]
    pub const fn version(mut self, version: u64) -> Self {
        self.product.version = version;
        self
    }

    /// Finish the product
    #[must_use]
    pub fn build(self) -> Product {
        self.product
    }
}

/// A domestic shipping address
#[must_use]
pub fn sample_address() -> ShippingAddress {
    address_in("US")
}

/// A shipping address in the given country
#[must_use]
pub fn address_in(country: &str) -> ShippingAddress {
    ShippingAddress {
        address: "742 Evergreen Terrace".to_string(),
        city: "Springfield".to_string(),
        postal_code: "49007".to_string(),
        country: country.to_string(),
    }
}

/// Payment evidence as a gateway callback would supply it
#[must_use]
pub fn evidence() -> PaymentEvidence {
    PaymentEvidence {
        payer_id: "PAYER-1".to_string(),
        transaction_id: "TXN-1".to_string(),
        gateway_order_id: Some("GW-1".to_string()),
        payer_email: Some("buyer@example.com".to_string()),
    }
}

/// A payment record at the test clock's time
#[must_use]
pub fn payment_record() -> PaymentRecord {
    PaymentRecord {
        paid_at: test_clock().now(),
        result: evidence(),
    }
}

/// A created, unpriced order with no items
#[must_use]
pub fn sample_order(id: &str, user_id: &str) -> Order {
    Order {
        id: OrderId::new(id),
        user_id: UserId::new(user_id),
        items: Vec::new(),
        shipping_address: sample_address(),
        payment_method: PaymentMethod::new("paypal"),
        prices: PriceBreakdown::default(),
        payment: None,
        delivered_at: None,
        created_at: test_clock().now(),
    }
}

/// A user profile
#[must_use]
pub fn user(id: &str, name: &str, is_admin: bool) -> User {
    User {
        id: UserId::new(id),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        is_admin,
    }
}

/// Products used to seed a database-less server
#[must_use]
pub fn demo_catalog() -> Vec<Product> {
    vec![
        ProductBuilder::new("airpods")
            .name("Airpods Wireless Bluetooth Headphones")
            .classified("Apple", "Electronics")
            .price_cents(8999)
            .stock(10)
            .build(),
        ProductBuilder::new("iphone")
            .name("iPhone 11 Pro 256GB Memory")
            .classified("Apple", "Electronics")
            .price_cents(59_999)
            .stock(7)
            .build(),
        ProductBuilder::new("camera")
            .name("Cannon EOS 80D DSLR Camera")
            .classified("Cannon", "Electronics")
            .price_cents(92_999)
            .stock(5)
            .build(),
        ProductBuilder::new("playstation")
            .name("Sony Playstation 4 Pro White Version")
            .classified("Sony", "Electronics")
            .price_cents(39_999)
            .stock(11)
            .build(),
        ProductBuilder::new("mouse")
            .name("Logitech G-Series Gaming Mouse")
            .classified("Logitech", "Electronics")
            .price_cents(4999)
            .stock(7)
            .build(),
        ProductBuilder::new("echo")
            .name("Amazon Echo Dot 3rd Generation")
            .classified("Amazon", "Electronics")
            .price_cents(2999)
            .stock(0)
            .build(),
    ]
}

/// Users used to seed a database-less server
#[must_use]
pub fn demo_users() -> Vec<User> {
    vec![
        user("admin", "Admin User", true),
        user("john", "John Doe", false),
        user("jane", "Jane Doe", false),
    ]
}
