use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Product row as read under its exclusive lock.
#[derive(Debug, Clone, FromRow)]
pub struct LockedProduct {
    pub product_id: i64,
    pub sale_price: Decimal,
    pub cost_price: Decimal,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub tenant_id: i64,
    pub seller_id: i64,
    pub customer_id: Option<i64>,
    pub total: Decimal,
    pub profit_margin: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct InsertedInvoice {
    pub invoice_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct LockedInvoice {
    pub invoice_id: i64,
    pub tenant_id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct StoredLine {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct DisplayNames {
    pub customer_name: Option<String>,
    pub seller_name: Option<String>,
}

/// Which invoices a caller may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceScope {
    Tenant(i64),
    AnyTenant,
}

impl InvoiceScope {
    /// Tenant to filter on; `None` matches every business.
    pub fn tenant_filter(self) -> Option<i64> {
        match self {
            InvoiceScope::Tenant(id) => Some(id),
            InvoiceScope::AnyTenant => None,
        }
    }
}

/// Handle to the persistent store. Cheap to share across requests.
#[async_trait]
pub trait SalesStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn SalesTx>, sqlx::Error>;

    /// Non-transactional lookup of the labels shown on a receipt.
    async fn display_names(
        &self,
        tenant_id: i64,
        customer_id: Option<i64>,
        seller_id: i64,
    ) -> Result<DisplayNames, sqlx::Error>;
}

/// One open transaction. Dropping it without [`SalesTx::commit`] rolls back.
#[async_trait]
pub trait SalesTx: Send {
    /// Reads and exclusively locks a tenant's product. `None` when the product
    /// does not exist for that tenant.
    async fn lock_product(
        &mut self,
        tenant_id: i64,
        product_id: i64,
    ) -> Result<Option<LockedProduct>, sqlx::Error>;

    /// Conditional decrement; `false` when the stock no longer covers `quantity`.
    async fn decrement_stock(
        &mut self,
        tenant_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<bool, sqlx::Error>;

    async fn insert_invoice(&mut self, invoice: &NewInvoice) -> Result<InsertedInvoice, sqlx::Error>;

    async fn insert_line_item(&mut self, invoice_id: i64, line: &NewLineItem) -> Result<(), sqlx::Error>;

    async fn lock_invoice(
        &mut self,
        invoice_id: i64,
        scope: InvoiceScope,
    ) -> Result<Option<LockedInvoice>, sqlx::Error>;

    async fn invoice_lines(&mut self, invoice_id: i64) -> Result<Vec<StoredLine>, sqlx::Error>;

    /// Adds stock back; `false` when the product no longer exists.
    async fn restore_stock(
        &mut self,
        tenant_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<bool, sqlx::Error>;

    /// Deletes the line items and then the invoice row. Returns invoice rows removed.
    async fn delete_invoice(&mut self, invoice_id: i64) -> Result<u64, sqlx::Error>;

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error>;
}
