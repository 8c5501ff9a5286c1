use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::invoice::{InvoiceHeader, InvoiceLine, InvoiceSummary};
use crate::sales::{CreatedInvoice, UNKNOWN_SELLER};

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub customer_id: Option<i64>,
    pub line_items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct LineItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateInvoiceResponse {
    pub invoice_id: i64,
    pub created_at: DateTime<Utc>,
    pub total: Decimal,
    pub customer_name: String,
    pub seller_name: String,
    pub profit_margin: Decimal,
}

impl From<CreatedInvoice> for CreateInvoiceResponse {
    fn from(invoice: CreatedInvoice) -> Self {
        Self {
            invoice_id: invoice.invoice_id,
            created_at: invoice.created_at,
            total: invoice.total,
            customer_name: invoice.customer_name,
            seller_name: invoice.seller_name,
            profit_margin: invoice.profit_margin,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReverseInvoiceResponse {
    pub message: String,
    pub invoice_id: i64,
}

#[derive(Debug, Serialize)]
pub struct InvoiceListItem {
    pub invoice_id: i64,
    pub created_at: DateTime<Utc>,
    pub total: Decimal,
    pub customer_name: String,
    pub seller_name: String,
}

impl From<InvoiceSummary> for InvoiceListItem {
    fn from(row: InvoiceSummary) -> Self {
        Self {
            invoice_id: row.invoice_id,
            created_at: row.created_at,
            total: row.total,
            customer_name: row.customer_name,
            seller_name: row.seller_name.unwrap_or_else(|| UNKNOWN_SELLER.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetailResponse {
    pub invoice_id: i64,
    pub created_at: DateTime<Utc>,
    pub total: Decimal,
    /// Only shown to roles that manage the business.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_margin: Option<Decimal>,
    pub customer_name: String,
    pub seller_name: String,
    pub line_items: Vec<InvoiceLineResponse>,
}

impl InvoiceDetailResponse {
    pub fn new(header: InvoiceHeader, lines: Vec<InvoiceLine>, show_margin: bool) -> Self {
        Self {
            invoice_id: header.invoice_id,
            created_at: header.created_at,
            total: header.total,
            profit_margin: show_margin.then_some(header.profit_margin),
            customer_name: header.customer_name,
            seller_name: header.seller_name.unwrap_or_else(|| UNKNOWN_SELLER.to_string()),
            line_items: lines.into_iter().map(InvoiceLineResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceLineResponse {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl From<InvoiceLine> for InvoiceLineResponse {
    fn from(line: InvoiceLine) -> Self {
        Self {
            product_id: line.product_id,
            product_name: line
                .product_name
                .unwrap_or_else(|| format!("Product {}", line.product_id)),
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal,
        }
    }
}
