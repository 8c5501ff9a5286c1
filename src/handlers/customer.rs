// src/handlers/customer.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use crate::auth::roles::Capability;
use crate::dtos::customer::{CustomerRequest, CustomerResponse};
use crate::dtos::MessageResponse;
use crate::error::{map_unique_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::customer::Customer;
use crate::state::AppState;
use tracing::{error, info, instrument};

const DUPLICATE_NATIONAL_ID: &str = "National id already registered for this business";
const CUSTOMER_NOT_FOUND: &str = "Customer not found or does not belong to this business";

fn validated(payload: CustomerRequest) -> Result<CustomerRequest, AppError> {
    let payload = payload.normalized();
    if payload.name.is_empty() {
        return Err(AppError::validation("Customer name is required"));
    }
    Ok(payload)
}

// POST /customers - Register a customer
#[instrument(skip(state, auth, payload), fields(user_id = auth.user_id))]
pub async fn create_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    auth.require(Capability::CreateCustomer)?;
    let tenant_id = auth.tenant()?;
    let payload = validated(payload)?;

    let customer = sqlx::query_as::<_, Customer>(
        "INSERT INTO customers (tenant_id, name, phone, national_id, address)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, name, phone, national_id, address, created_at"
    )
    .bind(tenant_id)
    .bind(&payload.name)
    .bind(&payload.phone)
    .bind(&payload.national_id)
    .bind(&payload.address)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, DUPLICATE_NATIONAL_ID))?;

    info!(customer_id = customer.id, "Customer registered");

    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))))
}

// GET /customers - The business's customers, newest first
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn get_customers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    auth.require(Capability::ListCustomers)?;
    let tenant_id = auth.tenant()?;

    match sqlx::query_as::<_, Customer>(
        "SELECT id, name, phone, national_id, address, created_at
         FROM customers WHERE tenant_id = $1
         ORDER BY created_at DESC, id DESC"
    )
        .bind(tenant_id)
        .fetch_all(&state.db_pool)
        .await {
        Ok(customers) => {
            let response = customers.into_iter().map(CustomerResponse::from).collect();
            Ok(Json(response))
        }
        Err(e) => {
            error!(?e, "Failed to fetch customers");
            Err(e.into())
        }
    }
}

// PUT /customers/:id - Replace a customer's details
#[instrument(skip(state, auth, payload), fields(user_id = auth.user_id))]
pub async fn update_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    auth.require(Capability::ManageCustomers)?;
    let tenant_id = auth.tenant()?;
    let payload = validated(payload)?;

    let customer = sqlx::query_as::<_, Customer>(
        "UPDATE customers
         SET name = $1, phone = $2, national_id = $3, address = $4
         WHERE id = $5 AND tenant_id = $6
         RETURNING id, name, phone, national_id, address, created_at"
    )
    .bind(&payload.name)
    .bind(&payload.phone)
    .bind(&payload.national_id)
    .bind(&payload.address)
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, DUPLICATE_NATIONAL_ID))?
    .ok_or_else(|| AppError::not_found(CUSTOMER_NOT_FOUND))?;

    Ok(Json(CustomerResponse::from(customer)))
}

// DELETE /customers/:id - Remove a customer; past invoices fall back to "Sin cliente"
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn delete_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    auth.require(Capability::ManageCustomers)?;
    let tenant_id = auth.tenant()?;

    let result = sqlx::query("DELETE FROM customers WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(CUSTOMER_NOT_FOUND));
    }

    info!(customer_id = id, "Customer deleted");
    Ok(Json(MessageResponse::new("Customer deleted")))
}
