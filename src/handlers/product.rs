// src/handlers/product.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use crate::auth::roles::Capability;
use crate::dtos::product::{AddStockRequest, CreateProductRequest, ProductResponse, UpdateProductRequest};
use crate::dtos::MessageResponse;
use crate::middleware::auth::AuthContext;
use crate::models::product::Product;
use crate::state::AppState;
use crate::error::AppError;
use tracing::{error, info, instrument};

// GET /products - List the business's products
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn get_products(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    auth.require(Capability::ViewProducts)?;
    let tenant_id = auth.tenant()?;

    match sqlx::query_as::<_, Product>(
        "SELECT id, name, sale_price, cost_price, stock_quantity, created_at
         FROM products WHERE tenant_id = $1 ORDER BY id DESC"
    )
        .bind(tenant_id)
        .fetch_all(&state.db_pool)
        .await {
        Ok(products) => {
            let response = products.into_iter().map(ProductResponse::from).collect();
            Ok(Json(response))
        }
        Err(e) => {
            error!(?e, "Failed to fetch products");
            Err(e.into())
        }
    }
}

// POST /products - Create new product
#[instrument(skip(state, auth, payload), fields(user_id = auth.user_id))]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    auth.require(Capability::ManageProducts)?;
    let tenant_id = auth.tenant()?;

    let cost_price = payload.cost_price.unwrap_or(Decimal::ZERO);
    let stock_quantity = payload.stock_quantity.unwrap_or(0);

    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Product name is required"));
    }
    if payload.sale_price < Decimal::ZERO || cost_price < Decimal::ZERO {
        return Err(AppError::validation("Prices cannot be negative"));
    }
    if stock_quantity < 0 {
        return Err(AppError::validation("Stock cannot be negative"));
    }

    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (tenant_id, name, sale_price, cost_price, stock_quantity)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, name, sale_price, cost_price, stock_quantity, created_at"
    )
    .bind(tenant_id)
    .bind(payload.name.trim())
    .bind(payload.sale_price)
    .bind(cost_price)
    .bind(stock_quantity)
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

// PUT /products/:id - Edit a product. Past invoices keep their snapshot prices.
#[instrument(skip(state, auth, payload), fields(user_id = auth.user_id))]
pub async fn update_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    auth.require(Capability::ManageProducts)?;
    let tenant_id = auth.tenant()?;

    let name = payload.name.as_deref().map(str::trim);
    if name.is_some_and(str::is_empty) {
        return Err(AppError::validation("Product name cannot be empty"));
    }
    if [payload.sale_price, payload.cost_price]
        .iter()
        .flatten()
        .any(|p| *p < Decimal::ZERO)
    {
        return Err(AppError::validation("Prices cannot be negative"));
    }
    if payload.stock_quantity.is_some_and(|s| s < 0) {
        return Err(AppError::validation("Stock cannot be negative"));
    }

    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET
         name = COALESCE($1, name),
         sale_price = COALESCE($2, sale_price),
         cost_price = COALESCE($3, cost_price),
         stock_quantity = COALESCE($4, stock_quantity)
         WHERE id = $5 AND tenant_id = $6
         RETURNING id, name, sale_price, cost_price, stock_quantity, created_at"
    )
    .bind(name)
    .bind(payload.sale_price)
    .bind(payload.cost_price)
    .bind(payload.stock_quantity)
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found or does not belong to this business"))?;

    info!(product_id = product.id, "Product updated");

    Ok(Json(ProductResponse::from(product)))
}

// DELETE /products/:id - Remove a product; its invoice lines stay as history
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    auth.require(Capability::ManageProducts)?;
    let tenant_id = auth.tenant()?;

    let result = sqlx::query("DELETE FROM products WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product not found or does not belong to this business"));
    }

    info!(product_id = id, "Product deleted");
    Ok(Json(MessageResponse::new("Product deleted")))
}

// PUT /products/:id/stock - Receive more units of a product
#[instrument(skip(state, auth, payload), fields(user_id = auth.user_id))]
pub async fn add_stock(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<AddStockRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    auth.require(Capability::ManageProducts)?;
    let tenant_id = auth.tenant()?;

    if payload.quantity <= 0 {
        return Err(AppError::validation("Quantity must be greater than 0"));
    }

    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET stock_quantity = stock_quantity + $1
         WHERE id = $2 AND tenant_id = $3
         RETURNING id, name, sale_price, cost_price, stock_quantity, created_at"
    )
    .bind(payload.quantity)
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found or does not belong to this business"))?;

    info!(product_id = product.id, added = payload.quantity, stock = product.stock_quantity, "Stock added");

    Ok(Json(ProductResponse::from(product)))
}
