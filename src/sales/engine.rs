use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::cart::{Cart, Totals};
use super::store::{
    DisplayNames, InsertedInvoice, InvoiceScope, LockedProduct, NewInvoice, NewLineItem, SalesStore,
};
use super::SaleError;

/// Receipt label when the sale has no (resolvable) customer.
pub const NO_CUSTOMER: &str = "Sin cliente";
/// Receipt label when the seller's name cannot be resolved.
pub const UNKNOWN_SELLER: &str = "Desconocido";

/// An already-authorized sale request.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub tenant_id: i64,
    pub seller_id: i64,
    pub customer_id: Option<i64>,
    pub cart: Cart,
}

#[derive(Debug, Clone)]
pub struct CreatedInvoice {
    pub invoice_id: i64,
    pub created_at: DateTime<Utc>,
    pub total: Decimal,
    pub profit_margin: Decimal,
    pub customer_name: String,
    pub seller_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversedInvoice {
    pub invoice_id: i64,
    pub tenant_id: i64,
    pub lines_restored: usize,
}

#[derive(Clone)]
pub struct InvoiceEngine {
    store: Arc<dyn SalesStore>,
    tx_timeout: Duration,
}

impl InvoiceEngine {
    pub fn new(store: Arc<dyn SalesStore>, tx_timeout: Duration) -> Self {
        Self { store, tx_timeout }
    }

    /// Creates an invoice, decrementing stock for every line. Either the
    /// invoice, its line items and every decrement are committed, or nothing is.
    #[instrument(skip(self, sale), fields(tenant_id = sale.tenant_id, seller_id = sale.seller_id, lines = sale.cart.lines().len()))]
    pub async fn create_invoice(&self, sale: NewSale) -> Result<CreatedInvoice, SaleError> {
        let (inserted, totals) = self
            .bounded(self.write_invoice(&sale))
            .await
            .inspect_err(|e| warn!(error = %e, "Invoice creation rolled back"))?;

        let names = self.display_names(&sale).await;

        info!(
            invoice_id = inserted.invoice_id,
            total = %totals.total,
            profit_margin = %totals.profit_margin,
            "Invoice created"
        );

        Ok(CreatedInvoice {
            invoice_id: inserted.invoice_id,
            created_at: inserted.created_at,
            total: totals.total,
            profit_margin: totals.profit_margin,
            customer_name: names.customer_name.unwrap_or_else(|| NO_CUSTOMER.to_string()),
            seller_name: names.seller_name.unwrap_or_else(|| UNKNOWN_SELLER.to_string()),
        })
    }

    /// Cancels an invoice: restores the stock of every line on the invoice's
    /// own tenant, then deletes the line items and the invoice.
    #[instrument(skip(self))]
    pub async fn reverse_invoice(
        &self,
        invoice_id: i64,
        scope: InvoiceScope,
    ) -> Result<ReversedInvoice, SaleError> {
        let reversed = self
            .bounded(self.undo_invoice(invoice_id, scope))
            .await
            .inspect_err(|e| warn!(error = %e, "Invoice reversal rolled back"))?;

        info!(
            invoice_id,
            tenant_id = reversed.tenant_id,
            lines = reversed.lines_restored,
            "Invoice reversed"
        );
        Ok(reversed)
    }

    async fn bounded<T, F>(&self, work: F) -> Result<T, SaleError>
    where
        F: Future<Output = Result<T, SaleError>>,
    {
        // Dropping `work` on expiry drops its open transaction, which rolls back.
        tokio::time::timeout(self.tx_timeout, work)
            .await
            .map_err(|_| SaleError::Timeout(self.tx_timeout))?
    }

    async fn write_invoice(&self, sale: &NewSale) -> Result<(InsertedInvoice, Totals), SaleError> {
        let mut tx = self.store.begin().await?;

        let mut locked: HashMap<i64, LockedProduct> = HashMap::new();
        for product_id in sale.cart.lock_order() {
            let product = tx
                .lock_product(sale.tenant_id, product_id)
                .await?
                .ok_or(SaleError::ProductNotFound(product_id))?;
            locked.insert(product_id, product);
        }

        let mut totals = Totals::default();
        let mut lines = Vec::with_capacity(sale.cart.lines().len());

        for line in sale.cart.lines() {
            let product = locked
                .get_mut(&line.product_id)
                .ok_or(SaleError::ProductNotFound(line.product_id))?;

            if product.stock_quantity < line.quantity {
                return Err(SaleError::InsufficientStock {
                    product_id: product.product_id,
                    requested: line.quantity,
                    available: product.stock_quantity,
                });
            }

            totals.add(product, line.quantity);

            // The row lock makes a zero-row decrement unreachable in practice.
            // If it does happen, `available` is the stock seen under that lock.
            if !tx
                .decrement_stock(sale.tenant_id, line.product_id, line.quantity)
                .await?
            {
                return Err(SaleError::InsufficientStock {
                    product_id: product.product_id,
                    requested: line.quantity,
                    available: product.stock_quantity,
                });
            }
            product.stock_quantity -= line.quantity;

            lines.push(NewLineItem {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: product.sale_price,
            });
        }

        let inserted = tx
            .insert_invoice(&NewInvoice {
                tenant_id: sale.tenant_id,
                seller_id: sale.seller_id,
                customer_id: sale.customer_id,
                total: totals.total,
                profit_margin: totals.profit_margin,
            })
            .await?;

        for line in &lines {
            tx.insert_line_item(inserted.invoice_id, line).await?;
        }

        tx.commit().await?;
        Ok((inserted, totals))
    }

    async fn undo_invoice(
        &self,
        invoice_id: i64,
        scope: InvoiceScope,
    ) -> Result<ReversedInvoice, SaleError> {
        let mut tx = self.store.begin().await?;

        let invoice = tx
            .lock_invoice(invoice_id, scope)
            .await?
            .ok_or(SaleError::InvoiceNotFound(invoice_id))?;

        let mut lines = tx.invoice_lines(invoice_id).await?;
        // same lock order as creation
        lines.sort_by_key(|l| l.product_id);

        for line in &lines {
            let restored = tx
                .restore_stock(invoice.tenant_id, line.product_id, line.quantity)
                .await?;
            if !restored {
                warn!(invoice_id, product_id = line.product_id, "Product gone, stock not restored");
            }
        }

        if tx.delete_invoice(invoice_id).await? == 0 {
            return Err(SaleError::InvoiceNotFound(invoice_id));
        }

        tx.commit().await?;

        Ok(ReversedInvoice {
            invoice_id: invoice.invoice_id,
            tenant_id: invoice.tenant_id,
            lines_restored: lines.len(),
        })
    }

    async fn display_names(&self, sale: &NewSale) -> DisplayNames {
        match self
            .store
            .display_names(sale.tenant_id, sale.customer_id, sale.seller_id)
            .await
        {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Could not resolve receipt names");
                DisplayNames::default()
            }
        }
    }
}
