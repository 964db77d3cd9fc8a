//! Checkout orchestration and order lifecycle operations.
//!
//! [`CheckoutService`] is the imperative shell around the pure pieces in
//! `storefront-core`: it prices and reserves the cart, persists
//! the order and advances it through payment and delivery with
//! compare-and-set writes on the order's status.
//!
//! Every store call is bounded by the configured timeout and surfaces as
//! [`OrderError::StoreUnavailable`] when it expires or the backend fails.

use crate::config::CheckoutConfig;
use crate::inventory::{InventoryReconciler, Reservation};
use crate::metrics;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use storefront_core::environment::{Clock, IdGenerator};
use storefront_core::error::{OrderError, Result};
use storefront_core::lifecycle::{OrderCommand, OrderLifecycle};
use storefront_core::pricing::PricingConfig;
use storefront_core::store::{
    OrderRepository, ProductCatalog, StoreFuture, UserDirectory, with_timeout,
};
use storefront_core::types::{
    CartItem, LineItem, Order, OrderId, OrderStatus, PaymentEvidence, PaymentMethod, Principal,
    ShippingAddress, User, UserId,
};

/// Everything checkout needs from the outside world.
#[derive(Clone)]
pub struct CheckoutEnvironment {
    /// Product catalog (prices and stock)
    pub catalog: Arc<dyn ProductCatalog>,
    /// Order documents
    pub orders: Arc<dyn OrderRepository>,
    /// Customer lookup for admin listings
    pub users: Arc<dyn UserDirectory>,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Order id source
    pub ids: Arc<dyn IdGenerator>,
}

/// Display details of an order's owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Customer {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

impl From<&User> for Customer {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// An order with its owner resolved, as shown in the admin listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderListing {
    /// The order document
    pub order: Order,
    /// Owner details, `None` when the account no longer exists
    pub customer: Option<Customer>,
}

/// Order lifecycle operations.
#[derive(Clone)]
pub struct CheckoutService {
    env: CheckoutEnvironment,
    inventory: InventoryReconciler,
    pricing: Arc<PricingConfig>,
    store_timeout: Duration,
}

impl CheckoutService {
    /// Create a service from its environment and configuration.
    #[must_use]
    pub fn new(env: CheckoutEnvironment, config: &CheckoutConfig) -> Self {
        let inventory = InventoryReconciler::new(
            Arc::clone(&env.catalog),
            config.retry_policy(),
            config.store_timeout(),
        );
        Self {
            env,
            inventory,
            pricing: Arc::new(config.pricing.clone()),
            store_timeout: config.store_timeout(),
        }
    }

    /// Pricing rules in effect
    #[must_use]
    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    /// Turn a cart into a persisted order in the `Created` state.
    ///
    /// Unit prices come from the catalog, never from the caller. If pricing or
    /// persistence fails after stock was reserved, the stock is released
    /// before the error is returned.
    ///
    /// # Errors
    ///
    /// - [`OrderError::EmptyCart`] when `cart` is empty
    /// - reconciliation failures ([`OrderError::InvalidLineItem`],
    ///   [`OrderError::ProductNotFound`], [`OrderError::InsufficientStock`])
    /// - [`OrderError::StoreUnavailable`] on store failure or timeout
    #[tracing::instrument(skip_all, fields(user_id = %user_id, lines = cart.len()))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        cart: &[CartItem],
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<Order> {
        let started = Instant::now();
        let result = self
            .checkout(user_id, cart, shipping_address, payment_method)
            .await;
        metrics::record_checkout_duration(started.elapsed());

        match &result {
            Ok(order) => {
                metrics::record_order_transition(OrderStatus::Created);
                tracing::info!(
                    order_id = %order.id,
                    total_cents = order.prices.total_price.cents(),
                    "Order created"
                );
            },
            Err(err) => {
                metrics::record_checkout_failure(err);
                if matches!(err, OrderError::StoreUnavailable { .. }) {
                    tracing::error!(error = %err, "Checkout failed");
                } else {
                    tracing::info!(error = %err, "Checkout rejected");
                }
            },
        }

        result
    }

    async fn checkout(
        &self,
        user_id: UserId,
        cart: &[CartItem],
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<Order> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let Reservation { items, prices } = self
            .inventory
            .reserve(cart, &shipping_address, &self.pricing)
            .await?;

        let order = Order {
            id: self.env.ids.next_order_id(),
            user_id,
            items,
            shipping_address,
            payment_method,
            prices,
            payment: None,
            delivered_at: None,
            created_at: self.env.clock.now(),
        };

        if let Err(err) = self.timed(self.env.orders.insert(order.clone())).await {
            self.compensate(&order.items).await;
            return Err(err);
        }

        Ok(order)
    }

    /// Record payment on a `Created` order.
    ///
    /// # Errors
    ///
    /// - [`OrderError::OrderNotFound`] if the id does not resolve
    /// - [`OrderError::InvalidPaymentEvidence`] if payer or transaction id is blank
    /// - [`OrderError::AlreadyPaid`] if the order is past `Created`, including
    ///   when a concurrent payment wins the race
    /// - [`OrderError::StoreUnavailable`] on store failure or timeout
    #[tracing::instrument(skip_all, fields(order_id = %order_id))]
    pub async fn pay_order(&self, order_id: &OrderId, evidence: PaymentEvidence) -> Result<Order> {
        let order = self
            .transition(order_id, OrderCommand::MarkPaid { evidence })
            .await?;

        metrics::record_revenue(order.prices.total_price);
        tracing::info!(
            transaction_id = %order.payment.as_ref().map_or("", |p| p.result.transaction_id.as_str()),
            "Order paid"
        );
        Ok(order)
    }

    /// Record delivery on a `Paid` order.
    ///
    /// # Errors
    ///
    /// - [`OrderError::OrderNotFound`] if the id does not resolve
    /// - [`OrderError::NotYetPaid`] from `Created`
    /// - [`OrderError::AlreadyDelivered`] from `Delivered`
    /// - [`OrderError::StoreUnavailable`] on store failure or timeout
    #[tracing::instrument(skip_all, fields(order_id = %order_id))]
    pub async fn mark_delivered(&self, order_id: &OrderId) -> Result<Order> {
        let order = self
            .transition(order_id, OrderCommand::MarkDelivered)
            .await?;
        tracing::info!("Order delivered");
        Ok(order)
    }

    /// Hard-delete an order on behalf of its owner or an admin.
    ///
    /// # Errors
    ///
    /// - [`OrderError::OrderNotFound`] if the id does not resolve
    /// - [`OrderError::Forbidden`] if the caller is neither owner nor admin
    /// - [`OrderError::StoreUnavailable`] on store failure or timeout
    #[tracing::instrument(skip_all, fields(order_id = %order_id, user_id = %principal.user_id))]
    pub async fn delete_order(&self, order_id: &OrderId, principal: &Principal) -> Result<()> {
        let order = self.get_order(order_id).await?;
        authorize(principal, &order)?;

        if !self.timed(self.env.orders.delete(order_id)).await? {
            return Err(not_found(order_id));
        }

        metrics::record_order_deleted();
        tracing::info!("Order deleted");
        Ok(())
    }

    /// Fetch an order by id. Has no side effects.
    ///
    /// # Errors
    ///
    /// - [`OrderError::OrderNotFound`] if the id does not resolve
    /// - [`OrderError::StoreUnavailable`] on store failure or timeout
    pub async fn get_order(&self, order_id: &OrderId) -> Result<Order> {
        self.timed(self.env.orders.get(order_id))
            .await?
            .ok_or_else(|| not_found(order_id))
    }

    /// Fetch an order the caller is allowed to see.
    ///
    /// # Errors
    ///
    /// As [`get_order`](Self::get_order), plus [`OrderError::Forbidden`] when
    /// the caller is neither owner nor admin.
    pub async fn get_order_for(&self, order_id: &OrderId, principal: &Principal) -> Result<Order> {
        let order = self.get_order(order_id).await?;
        authorize(principal, &order)?;
        Ok(order)
    }

    /// Every order, newest first, with owner name and email resolved.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::StoreUnavailable`] on store failure or timeout.
    pub async fn list_orders(&self) -> Result<Vec<OrderListing>> {
        let mut orders = self.timed(self.env.orders.list_all()).await?;
        sort_newest_first(&mut orders);

        let owners: Vec<UserId> = orders
            .iter()
            .map(|order| order.user_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let customers: HashMap<UserId, Customer> = self
            .timed(self.env.users.get_users(&owners))
            .await?
            .iter()
            .map(|user| (user.id.clone(), Customer::from(user)))
            .collect();

        Ok(orders
            .into_iter()
            .map(|order| OrderListing {
                customer: customers.get(&order.user_id).cloned(),
                order,
            })
            .collect())
    }

    /// Orders owned by one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::StoreUnavailable`] on store failure or timeout.
    pub async fn list_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        let mut orders = self.timed(self.env.orders.list_by_user(user_id)).await?;
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    /// Load, decide, apply and compare-and-set on the prior status.
    async fn transition(&self, order_id: &OrderId, command: OrderCommand) -> Result<Order> {
        let order = self.get_order(order_id).await?;
        let expected = order.status();
        let (updated, event) =
            OrderLifecycle::handle(&order, command.clone(), self.env.clock.as_ref())?;

        if self
            .timed(self.env.orders.replace_if_status(updated.clone(), expected))
            .await?
        {
            metrics::record_order_transition(event.resulting_status());
            return Ok(updated);
        }

        // Lost the race: report the conflict against whatever is stored now.
        tracing::debug!(expected = %expected, "Order status changed concurrently");
        let current = self.get_order(order_id).await?;
        match OrderLifecycle::decide(&current, command, self.env.clock.as_ref()) {
            Err(err) => Err(err),
            Ok(_) => Err(OrderError::StoreUnavailable {
                reason: format!("order {order_id} changed concurrently"),
            }),
        }
    }

    async fn compensate(&self, items: &[LineItem]) {
        if let Err(err) = self.inventory.release(items).await {
            tracing::error!(error = %err, "Failed to release reserved stock");
        }
    }

    async fn timed<T>(&self, future: StoreFuture<'_, T>) -> Result<T> {
        Ok(with_timeout(self.store_timeout, future).await?)
    }
}

fn authorize(principal: &Principal, order: &Order) -> Result<()> {
    if principal.can_access(order) {
        Ok(())
    } else {
        Err(OrderError::Forbidden {
            order_id: order.id.clone(),
            user_id: principal.user_id.clone(),
        })
    }
}

fn not_found(order_id: &OrderId) -> OrderError {
    OrderError::OrderNotFound {
        order_id: order_id.clone(),
    }
}

fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
