//! Order API endpoints.
//!
//! - POST /api/orders - Check out a cart (requires auth)
//! - GET /api/orders - List every order with its customer (admin)
//! - GET /api/orders/mine - List the caller's orders (requires auth)
//! - GET /api/orders/:id - Get an order (owner or admin)
//! - PUT /api/orders/:id/pay - Record payment (owner or admin)
//! - PUT /api/orders/:id/deliver - Record delivery (admin)
//! - DELETE /api/orders/:id - Delete an order (owner or admin)

use crate::auth::{AuthUser, RequireAdmin};
use crate::checkout::{Customer, OrderListing};
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::types::{
    CartItem, LineItem, Order, OrderId, PaymentEvidence, PaymentMethod, ShippingAddress,
};
use storefront_web::{ApiJson, AppError};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to check out a cart.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    /// Cart lines
    pub order_items: Vec<OrderItemRequest>,
    /// Destination
    pub shipping_address: ShippingAddressRequest,
    /// Payment method tag (e.g. `paypal`)
    pub payment_method: String,
}

/// One cart line. Prices are never accepted from clients.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderItemRequest {
    /// Product identifier
    pub product_id: String,
    /// Quantity
    pub quantity: u32,
}

/// Shipping address in a checkout request.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShippingAddressRequest {
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// Postal code
    pub postal_code: String,
    /// Country
    pub country: String,
}

impl From<ShippingAddressRequest> for ShippingAddress {
    fn from(request: ShippingAddressRequest) -> Self {
        Self {
            address: request.address,
            city: request.city,
            postal_code: request.postal_code,
            country: request.country,
        }
    }
}

/// Payment confirmation relayed from the payment gateway.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayOrderRequest {
    /// Payer identifier at the gateway
    pub payer_id: String,
    /// Gateway transaction identifier
    pub transaction_id: String,
    /// Gateway order identifier
    #[serde(default)]
    pub gateway_order_id: Option<String>,
    /// Payer email
    #[serde(default)]
    pub payer_email: Option<String>,
}

impl From<PayOrderRequest> for PaymentEvidence {
    fn from(request: PayOrderRequest) -> Self {
        Self {
            payer_id: request.payer_id,
            transaction_id: request.transaction_id,
            gateway_order_id: request.gateway_order_id,
            payer_email: request.payer_email,
        }
    }
}

/// Line item in an order response.
#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    /// Product identifier
    pub product_id: String,
    /// Product name at checkout
    pub name: String,
    /// Product image at checkout
    pub image: String,
    /// Quantity
    pub quantity: u32,
    /// Unit price in cents at checkout
    pub unit_price: i64,
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            name: item.name.clone(),
            image: item.image.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.cents(),
        }
    }
}

/// Order details response. Amounts are in cents.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// Order ID
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Line items
    pub order_items: Vec<LineItemResponse>,
    /// Destination
    pub shipping_address: ShippingAddress,
    /// Payment method tag
    pub payment_method: String,
    /// Sum of line items
    pub items_price: i64,
    /// Tax
    pub tax_price: i64,
    /// Shipping
    pub shipping_price: i64,
    /// Grand total
    pub total_price: i64,
    /// Lifecycle status
    pub status: &'static str,
    /// Whether payment was recorded
    pub is_paid: bool,
    /// When payment was recorded
    pub paid_at: Option<DateTime<Utc>>,
    /// Gateway evidence recorded with the payment
    pub payment_result: Option<PaymentEvidence>,
    /// Whether delivery was recorded
    pub is_delivered: bool,
    /// When delivery was recorded
    pub delivered_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            user_id: order.user_id.to_string(),
            order_items: order.items.iter().map(LineItemResponse::from).collect(),
            shipping_address: order.shipping_address.clone(),
            payment_method: order.payment_method.as_str().to_string(),
            items_price: order.prices.items_price.cents(),
            tax_price: order.prices.tax_price.cents(),
            shipping_price: order.prices.shipping_price.cents(),
            total_price: order.prices.total_price.cents(),
            status: order.status().as_str(),
            is_paid: order.is_paid(),
            paid_at: order.paid_at(),
            payment_result: order.payment.as_ref().map(|p| p.result.clone()),
            is_delivered: order.is_delivered(),
            delivered_at: order.delivered_at,
            created_at: order.created_at,
        }
    }
}

/// Order in the admin listing.
#[derive(Debug, Serialize)]
pub struct OrderListingResponse {
    /// The order
    #[serde(flatten)]
    pub order: OrderResponse,
    /// Owner name and email, `null` when the account is gone
    pub customer: Option<Customer>,
}

impl From<&OrderListing> for OrderListingResponse {
    fn from(listing: &OrderListing) -> Self {
        Self {
            order: OrderResponse::from(&listing.order),
            customer: listing.customer.clone(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Check out a cart.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/orders \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "order_items": [{"product_id": "airpods", "quantity": 2}],
///     "shipping_address": {
///       "address": "1 Main St", "city": "Boston",
///       "postal_code": "02101", "country": "US"
///     },
///     "payment_method": "paypal"
///   }'
/// ```
pub async fn create_order(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let cart: Vec<CartItem> = request
        .order_items
        .into_iter()
        .map(|item| CartItem::new(item.product_id, item.quantity))
        .collect();

    let order = state
        .checkout
        .create_order(
            principal.user_id,
            &cart,
            request.shipping_address.into(),
            PaymentMethod::new(request.payment_method),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// List every order with its customer. Admin only.
pub async fn list_orders(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderListingResponse>>, AppError> {
    let listings = state.checkout.list_orders().await?;
    Ok(Json(listings.iter().map(OrderListingResponse::from).collect()))
}

/// List the caller's orders.
pub async fn list_my_orders(
    AuthUser(principal): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = state.checkout.list_orders_for_user(&principal.user_id).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// Get an order. Owner or admin.
pub async fn get_order(
    AuthUser(principal): AuthUser,
    Path(order_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .checkout
        .get_order_for(&OrderId::new(order_id), &principal)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// Record payment. Owner or admin.
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:8080/api/orders/<id>/pay \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{"payer_id": "PAYER-1", "transaction_id": "TXN-1"}'
/// ```
pub async fn pay_order(
    AuthUser(principal): AuthUser,
    Path(order_id): Path<String>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PayOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let order_id = OrderId::new(order_id);
    state.checkout.get_order_for(&order_id, &principal).await?;

    let order = state.checkout.pay_order(&order_id, request.into()).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// Record delivery. Admin only.
pub async fn mark_delivered(
    RequireAdmin(_admin): RequireAdmin,
    Path(order_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .checkout
        .mark_delivered(&OrderId::new(order_id))
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// Delete an order. Owner or admin.
pub async fn delete_order(
    AuthUser(principal): AuthUser,
    Path(order_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state
        .checkout
        .delete_order(&OrderId::new(order_id), &principal)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
