//! Invoice transaction engine.
//!
//! Turns a validated [`Cart`] into a committed invoice (stock decrement,
//! totals, line-item price snapshot) and reverses invoices, all inside one
//! store transaction per call. The engine only sees the [`SalesStore`] seam;
//! production wires in [`PgSalesStore`].

pub mod cart;
pub mod engine;
pub mod postgres;
pub mod store;

#[cfg(test)]
pub mod memory;

use std::time::Duration;

pub use cart::Cart;
pub use engine::{CreatedInvoice, InvoiceEngine, NewSale, NO_CUSTOMER, UNKNOWN_SELLER};
pub use postgres::PgSalesStore;
pub use store::InvoiceScope;

#[derive(Debug, thiserror::Error)]
pub enum SaleError {
    #[error("{0}")]
    Validation(String),

    #[error("product {0} not found")]
    ProductNotFound(i64),

    #[error("invoice {0} not found")]
    InvoiceNotFound(i64),

    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: i64,
        requested: i32,
        available: i32,
    },

    #[error("sale transaction did not finish within {0:?}")]
    Timeout(Duration),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}
