//! Read-only catalog endpoints.
//!
//! - GET /api/products - List products
//! - GET /api/products/:id - Get product details
//!
//! Public: no authentication required.

use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use storefront_core::types::{Product, ProductId, Review};
use storefront_web::AppError;

/// Product details response. Price is in cents.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    /// Product ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Image URL
    pub image: String,
    /// Brand
    pub brand: String,
    /// Category
    pub category: String,
    /// Description
    pub description: String,
    /// Unit price in cents
    pub price: i64,
    /// Units in stock
    pub count_in_stock: u32,
    /// Average review rating
    pub rating: f64,
    /// Number of reviews
    pub num_reviews: u32,
    /// Reviews, oldest first
    pub reviews: Vec<Review>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            image: product.image,
            brand: product.brand,
            category: product.category,
            description: product.description,
            price: product.price.cents(),
            count_in_stock: product.count_in_stock,
            rating: product.rating,
            num_reviews: product.num_reviews,
            reviews: product.reviews,
        }
    }
}

/// List products.
///
/// ```bash
/// curl http://localhost:8080/api/products
/// ```
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = state.catalog.list_products().await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// Get product details.
///
/// ```bash
/// curl http://localhost:8080/api/products/airpods
/// ```
pub async fn get_product(
    Path(product_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state.catalog.get_product(&ProductId::new(product_id)).await?;
    Ok(Json(ProductResponse::from(product)))
}
