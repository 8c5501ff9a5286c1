use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::store::{
    DisplayNames, InsertedInvoice, InvoiceScope, LockedInvoice, LockedProduct, NewInvoice,
    NewLineItem, SalesStore, SalesTx, StoredLine,
};

#[derive(Clone)]
pub struct PgSalesStore {
    pool: PgPool,
}

impl PgSalesStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct PgSalesTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SalesStore for PgSalesStore {
    async fn begin(&self) -> Result<Box<dyn SalesTx>, sqlx::Error> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSalesTx { tx }))
    }

    async fn display_names(
        &self,
        tenant_id: i64,
        customer_id: Option<i64>,
        seller_id: i64,
    ) -> Result<DisplayNames, sqlx::Error> {
        sqlx::query_as::<_, DisplayNames>(
            "SELECT
                (SELECT name FROM customers WHERE id = $1 AND tenant_id = $2) AS customer_name,
                (SELECT name FROM users WHERE id = $3) AS seller_name",
        )
        .bind(customer_id)
        .bind(tenant_id)
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await
    }
}

#[async_trait]
impl SalesTx for PgSalesTx {
    async fn lock_product(
        &mut self,
        tenant_id: i64,
        product_id: i64,
    ) -> Result<Option<LockedProduct>, sqlx::Error> {
        sqlx::query_as::<_, LockedProduct>(
            "SELECT id AS product_id, sale_price, cost_price, stock_quantity
             FROM products
             WHERE id = $1 AND tenant_id = $2
             FOR UPDATE",
        )
        .bind(product_id)
        .bind(tenant_id)
        .fetch_optional(&mut *self.tx)
        .await
    }

    async fn decrement_stock(
        &mut self,
        tenant_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE products
             SET stock_quantity = stock_quantity - $1
             WHERE id = $2
               AND tenant_id = $3
               AND stock_quantity >= $1",
        )
        .bind(quantity)
        .bind(product_id)
        .bind(tenant_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_invoice(&mut self, invoice: &NewInvoice) -> Result<InsertedInvoice, sqlx::Error> {
        sqlx::query_as::<_, InsertedInvoice>(
            "INSERT INTO invoices (tenant_id, customer_id, seller_id, total, profit_margin)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id AS invoice_id, created_at",
        )
        .bind(invoice.tenant_id)
        .bind(invoice.customer_id)
        .bind(invoice.seller_id)
        .bind(invoice.total)
        .bind(invoice.profit_margin)
        .fetch_one(&mut *self.tx)
        .await
    }

    async fn insert_line_item(&mut self, invoice_id: i64, line: &NewLineItem) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO invoice_line_items (invoice_id, product_id, quantity, unit_price)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(invoice_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn lock_invoice(
        &mut self,
        invoice_id: i64,
        scope: InvoiceScope,
    ) -> Result<Option<LockedInvoice>, sqlx::Error> {
        match scope {
            InvoiceScope::Tenant(tenant_id) => {
                sqlx::query_as::<_, LockedInvoice>(
                    "SELECT id AS invoice_id, tenant_id FROM invoices
                     WHERE id = $1 AND tenant_id = $2
                     FOR UPDATE",
                )
                .bind(invoice_id)
                .bind(tenant_id)
                .fetch_optional(&mut *self.tx)
                .await
            }
            InvoiceScope::AnyTenant => {
                sqlx::query_as::<_, LockedInvoice>(
                    "SELECT id AS invoice_id, tenant_id FROM invoices
                     WHERE id = $1
                     FOR UPDATE",
                )
                .bind(invoice_id)
                .fetch_optional(&mut *self.tx)
                .await
            }
        }
    }

    async fn invoice_lines(&mut self, invoice_id: i64) -> Result<Vec<StoredLine>, sqlx::Error> {
        sqlx::query_as::<_, StoredLine>(
            "SELECT product_id, quantity FROM invoice_line_items
             WHERE invoice_id = $1
             ORDER BY id",
        )
        .bind(invoice_id)
        .fetch_all(&mut *self.tx)
        .await
    }

    async fn restore_stock(
        &mut self,
        tenant_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity + $1
             WHERE id = $2 AND tenant_id = $3",
        )
        .bind(quantity)
        .bind(product_id)
        .bind(tenant_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_invoice(&mut self, invoice_id: i64) -> Result<u64, sqlx::Error> {
        sqlx::query("DELETE FROM invoice_line_items WHERE invoice_id = $1")
            .bind(invoice_id)
            .execute(&mut *self.tx)
            .await?;

        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(invoice_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error> {
        let PgSalesTx { tx } = *self;
        tx.commit().await
    }
}
