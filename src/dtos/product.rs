// src/dtos/product.rs
use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sale_price: Decimal,
    pub cost_price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
}

/// Partial update; omitted fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sale_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AddStockRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub sale_price: Decimal,
    pub cost_price: Decimal,
    pub stock_quantity: i32,
    pub created_at: String,
}

// Convert from Model to Response DTO
impl From<crate::models::product::Product> for ProductResponse {
    fn from(product: crate::models::product::Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            sale_price: product.sale_price,
            cost_price: product.cost_price,
            stock_quantity: product.stock_quantity,
            created_at: product.created_at.to_rfc3339(),
        }
    }
}
