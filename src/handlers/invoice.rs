use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::instrument;

use crate::auth::roles::{Capability, Role};
use crate::dtos::invoice::{
    CreateInvoiceRequest, CreateInvoiceResponse, InvoiceDetailResponse, InvoiceListItem,
    ReverseInvoiceResponse,
};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::invoice::{InvoiceHeader, InvoiceLine, InvoiceSummary};
use crate::sales::{Cart, NewSale, NO_CUSTOMER};
use crate::state::AppState;

// POST /invoices - Register a sale
#[instrument(skip(state, auth, payload), fields(user_id = auth.user_id, user = %auth.name))]
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateInvoiceResponse>), AppError> {
    auth.require(Capability::CreateInvoice)?;
    let tenant_id = auth.tenant()?;

    let Json(req) = payload.map_err(|e| AppError::validation(e.body_text()))?;

    if matches!(req.customer_id, Some(id) if id <= 0) {
        return Err(AppError::validation("Invalid customer id"));
    }

    let cart = Cart::new(req.line_items.iter().map(|l| (l.product_id, l.quantity)))?;

    let created = state
        .engine
        .create_invoice(NewSale {
            tenant_id,
            seller_id: auth.user_id,
            customer_id: req.customer_id,
            cart,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

// DELETE /invoices/:id - Cancel a sale and put its stock back
#[instrument(skip(state, auth), fields(user_id = auth.user_id, role = %auth.role))]
pub async fn reverse_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(invoice_id): Path<i64>,
) -> Result<Json<ReverseInvoiceResponse>, AppError> {
    auth.require(Capability::ReverseInvoice)?;
    let scope = auth.scope()?;

    let reversed = state.engine.reverse_invoice(invoice_id, scope).await?;

    Ok(Json(ReverseInvoiceResponse {
        message: "Invoice cancelled and stock restored".to_string(),
        invoice_id: reversed.invoice_id,
    }))
}

// GET /invoices - Business invoices, newest first (every business for superadmin)
#[instrument(skip(state, auth), fields(user_id = auth.user_id, role = %auth.role))]
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<InvoiceListItem>>, AppError> {
    auth.require(Capability::ListInvoices)?;
    let tenant_id = auth.scope()?.tenant_filter();

    let only_seller = auth.role.sees_only_own_invoices().then_some(auth.user_id);

    let rows = sqlx::query_as::<_, InvoiceSummary>(
        "SELECT i.id AS invoice_id, i.created_at, i.total,
                COALESCE(c.name, $3) AS customer_name,
                u.name AS seller_name
         FROM invoices i
         LEFT JOIN customers c ON c.id = i.customer_id AND c.tenant_id = i.tenant_id
         LEFT JOIN users u ON u.id = i.seller_id
         WHERE ($1::BIGINT IS NULL OR i.tenant_id = $1)
           AND ($2::BIGINT IS NULL OR i.seller_id = $2)
         ORDER BY i.created_at DESC, i.id DESC"
    )
    .bind(tenant_id)
    .bind(only_seller)
    .bind(NO_CUSTOMER)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(rows.into_iter().map(InvoiceListItem::from).collect()))
}

// GET /invoices/:id - One invoice with its lines
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(invoice_id): Path<i64>,
) -> Result<Json<InvoiceDetailResponse>, AppError> {
    auth.require(Capability::ViewInvoice)?;
    let tenant_id = auth.tenant()?;

    let header = sqlx::query_as::<_, InvoiceHeader>(
        "SELECT i.id AS invoice_id, i.seller_id, i.created_at, i.total, i.profit_margin,
                COALESCE(c.name, $3) AS customer_name,
                u.name AS seller_name
         FROM invoices i
         LEFT JOIN customers c ON c.id = i.customer_id AND c.tenant_id = i.tenant_id
         LEFT JOIN users u ON u.id = i.seller_id
         WHERE i.id = $1 AND i.tenant_id = $2"
    )
    .bind(invoice_id)
    .bind(tenant_id)
    .bind(NO_CUSTOMER)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Invoice not found or does not belong to this business"))?;

    if auth.role.sees_only_own_invoices() && header.seller_id != auth.user_id {
        return Err(AppError::forbidden("Not authorized to view this invoice"));
    }

    let lines = sqlx::query_as::<_, InvoiceLine>(
        "SELECT d.product_id, p.name AS product_name, d.quantity, d.unit_price,
                d.unit_price * d.quantity AS subtotal
         FROM invoice_line_items d
         LEFT JOIN products p ON p.id = d.product_id
         WHERE d.invoice_id = $1
         ORDER BY d.id"
    )
    .bind(invoice_id)
    .fetch_all(&state.db_pool)
    .await?;

    let show_margin = auth.role == Role::Admin;
    Ok(Json(InvoiceDetailResponse::new(header, lines, show_margin)))
}
