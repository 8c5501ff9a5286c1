//! In-memory [`SalesStore`] for tests.
//!
//! A transaction holds the table mutex from `begin` until it is committed or
//! dropped, so transactions are fully serialized. Writes go to a private copy
//! that only replaces the shared tables on commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::store::{
    DisplayNames, InsertedInvoice, InvoiceScope, LockedInvoice, LockedProduct, NewInvoice,
    NewLineItem, SalesStore, SalesTx, StoredLine,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MemProduct {
    pub tenant_id: i64,
    pub sale_price: Decimal,
    pub cost_price: Decimal,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemInvoice {
    pub tenant_id: i64,
    pub seller_id: i64,
    pub customer_id: Option<i64>,
    pub total: Decimal,
    pub profit_margin: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemLineItem {
    pub invoice_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub products: BTreeMap<i64, MemProduct>,
    pub invoices: BTreeMap<i64, MemInvoice>,
    pub line_items: Vec<MemLineItem>,
    pub customers: BTreeMap<i64, (i64, String)>,
    pub users: BTreeMap<i64, String>,
    next_invoice_id: i64,
}

/// Store operation that should fail. Most fail with a simulated driver
/// error; `DecrementStock` instead matches no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    DecrementStock,
    InsertInvoice,
    InsertLineItem,
    DeleteInvoice,
    DisplayNames,
    Commit,
}

#[derive(Clone, Default)]
pub struct MemorySalesStore {
    tables: Arc<Mutex<Tables>>,
    fail_point: Arc<std::sync::Mutex<Option<FailPoint>>>,
}

fn injected(point: FailPoint) -> sqlx::Error {
    sqlx::Error::Protocol(format!("injected failure at {point:?}"))
}

impl MemorySalesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_at(&self, point: Option<FailPoint>) {
        *self.fail_point.lock().unwrap() = point;
    }

    fn should_fail(&self, point: FailPoint) -> bool {
        *self.fail_point.lock().unwrap() == Some(point)
    }

    pub async fn add_product(&self, id: i64, tenant_id: i64, sale_price: Decimal, cost_price: Decimal, stock: i32) {
        self.tables.lock().await.products.insert(
            id,
            MemProduct { tenant_id, sale_price, cost_price, stock_quantity: stock },
        );
    }

    pub async fn add_customer(&self, id: i64, tenant_id: i64, name: &str) {
        self.tables.lock().await.customers.insert(id, (tenant_id, name.to_string()));
    }

    pub async fn add_user(&self, id: i64, name: &str) {
        self.tables.lock().await.users.insert(id, name.to_string());
    }

    pub async fn set_sale_price(&self, id: i64, price: Decimal) {
        if let Some(p) = self.tables.lock().await.products.get_mut(&id) {
            p.sale_price = price;
        }
    }

    pub async fn stock_of(&self, id: i64) -> Option<i32> {
        self.tables.lock().await.products.get(&id).map(|p| p.stock_quantity)
    }

    pub async fn snapshot(&self) -> Tables {
        self.tables.lock().await.clone()
    }

    /// Holds the table lock like an open transaction would.
    pub async fn hold(&self) -> OwnedMutexGuard<Tables> {
        self.tables.clone().lock_owned().await
    }
}

pub struct MemorySalesTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    store: MemorySalesStore,
}

impl MemorySalesTx {
    fn check(&self, point: FailPoint) -> Result<(), sqlx::Error> {
        if self.store.should_fail(point) {
            return Err(injected(point));
        }
        Ok(())
    }
}

#[async_trait]
impl SalesStore for MemorySalesStore {
    async fn begin(&self) -> Result<Box<dyn SalesTx>, sqlx::Error> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemorySalesTx { guard, working, store: self.clone() }))
    }

    async fn display_names(
        &self,
        tenant_id: i64,
        customer_id: Option<i64>,
        seller_id: i64,
    ) -> Result<DisplayNames, sqlx::Error> {
        if self.should_fail(FailPoint::DisplayNames) {
            return Err(injected(FailPoint::DisplayNames));
        }
        let tables = self.tables.lock().await;
        let customer_name = customer_id
            .and_then(|id| tables.customers.get(&id))
            .filter(|(tenant, _)| *tenant == tenant_id)
            .map(|(_, name)| name.clone());
        Ok(DisplayNames {
            customer_name,
            seller_name: tables.users.get(&seller_id).cloned(),
        })
    }
}

#[async_trait]
impl SalesTx for MemorySalesTx {
    async fn lock_product(
        &mut self,
        tenant_id: i64,
        product_id: i64,
    ) -> Result<Option<LockedProduct>, sqlx::Error> {
        Ok(self
            .working
            .products
            .get(&product_id)
            .filter(|p| p.tenant_id == tenant_id)
            .map(|p| LockedProduct {
                product_id,
                sale_price: p.sale_price,
                cost_price: p.cost_price,
                stock_quantity: p.stock_quantity,
            }))
    }

    async fn decrement_stock(
        &mut self,
        tenant_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<bool, sqlx::Error> {
        if self.store.should_fail(FailPoint::DecrementStock) {
            return Ok(false);
        }
        match self.working.products.get_mut(&product_id) {
            Some(p) if p.tenant_id == tenant_id && p.stock_quantity >= quantity => {
                p.stock_quantity -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_invoice(&mut self, invoice: &NewInvoice) -> Result<InsertedInvoice, sqlx::Error> {
        self.check(FailPoint::InsertInvoice)?;
        self.working.next_invoice_id += 1;
        let invoice_id = self.working.next_invoice_id;
        self.working.invoices.insert(
            invoice_id,
            MemInvoice {
                tenant_id: invoice.tenant_id,
                seller_id: invoice.seller_id,
                customer_id: invoice.customer_id,
                total: invoice.total,
                profit_margin: invoice.profit_margin,
            },
        );
        Ok(InsertedInvoice { invoice_id, created_at: Utc::now() })
    }

    async fn insert_line_item(&mut self, invoice_id: i64, line: &NewLineItem) -> Result<(), sqlx::Error> {
        self.check(FailPoint::InsertLineItem)?;
        self.working.line_items.push(MemLineItem {
            invoice_id,
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        });
        Ok(())
    }

    async fn lock_invoice(
        &mut self,
        invoice_id: i64,
        scope: InvoiceScope,
    ) -> Result<Option<LockedInvoice>, sqlx::Error> {
        Ok(self
            .working
            .invoices
            .get(&invoice_id)
            .filter(|inv| match scope {
                InvoiceScope::Tenant(tenant_id) => inv.tenant_id == tenant_id,
                InvoiceScope::AnyTenant => true,
            })
            .map(|inv| LockedInvoice { invoice_id, tenant_id: inv.tenant_id }))
    }

    async fn invoice_lines(&mut self, invoice_id: i64) -> Result<Vec<StoredLine>, sqlx::Error> {
        Ok(self
            .working
            .line_items
            .iter()
            .filter(|l| l.invoice_id == invoice_id)
            .map(|l| StoredLine { product_id: l.product_id, quantity: l.quantity })
            .collect())
    }

    async fn restore_stock(
        &mut self,
        tenant_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<bool, sqlx::Error> {
        match self.working.products.get_mut(&product_id) {
            Some(p) if p.tenant_id == tenant_id => {
                p.stock_quantity += quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_invoice(&mut self, invoice_id: i64) -> Result<u64, sqlx::Error> {
        self.check(FailPoint::DeleteInvoice)?;
        self.working.line_items.retain(|l| l.invoice_id != invoice_id);
        Ok(self.working.invoices.remove(&invoice_id).map_or(0, |_| 1))
    }

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error> {
        let MemorySalesTx { mut guard, working, store } = *self;
        if store.should_fail(FailPoint::Commit) {
            return Err(injected(FailPoint::Commit));
        }
        *guard = working;
        Ok(())
    }
}
