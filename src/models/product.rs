use sqlx::FromRow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub sale_price: Decimal,
    pub cost_price: Decimal,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
}
