use sqlx::FromRow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, FromRow)]
pub struct InvoiceSummary {
    pub invoice_id: i64,
    pub created_at: DateTime<Utc>,
    pub total: Decimal,
    pub customer_name: String,
    pub seller_name: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct InvoiceHeader {
    pub invoice_id: i64,
    pub seller_id: i64,
    pub created_at: DateTime<Utc>,
    pub total: Decimal,
    pub profit_margin: Decimal,
    pub customer_name: String,
    pub seller_name: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct InvoiceLine {
    pub product_id: i64,
    // products may be deleted after the sale
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}
