use rust_decimal::Decimal;

use super::store::LockedProduct;
use super::SaleError;

/// Upper bound on lines per invoice; keeps a single sale from holding
/// hundreds of row locks.
pub const MAX_LINE_ITEMS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i32,
}

/// An ordered, validated list of line items. Repeated products are kept as
/// separate lines.
#[derive(Debug, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Validates raw `(product_id, quantity)` pairs. Nothing is touched in the
    /// store when this fails.
    pub fn new<I>(raw: I) -> Result<Self, SaleError>
    where
        I: IntoIterator<Item = (i64, i64)>,
    {
        let mut lines = Vec::new();

        for (index, (product_id, quantity)) in raw.into_iter().enumerate() {
            if product_id <= 0 {
                return Err(SaleError::Validation(format!(
                    "line {}: invalid product id {}",
                    index + 1,
                    product_id
                )));
            }
            if quantity <= 0 {
                return Err(SaleError::Validation(format!(
                    "line {}: quantity must be greater than 0",
                    index + 1
                )));
            }
            let quantity = i32::try_from(quantity).map_err(|_| {
                SaleError::Validation(format!("line {}: quantity {} is too large", index + 1, quantity))
            })?;
            lines.push(CartLine { product_id, quantity });
        }

        if lines.is_empty() {
            return Err(SaleError::Validation(
                "Invoice must contain at least one line item".to_string(),
            ));
        }
        if lines.len() > MAX_LINE_ITEMS {
            return Err(SaleError::Validation(format!(
                "Invoice cannot contain more than {} line items",
                MAX_LINE_ITEMS
            )));
        }

        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Distinct product ids in ascending order. Row locks are always taken in
    /// this order so two sales over the same products cannot deadlock.
    pub fn lock_order(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.lines.iter().map(|l| l.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Running invoice totals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub total: Decimal,
    pub profit_margin: Decimal,
}

impl Totals {
    pub fn add(&mut self, product: &LockedProduct, quantity: i32) {
        let qty = Decimal::from(quantity);
        self.total += product.sale_price * qty;
        self.profit_margin += (product.sale_price - product.cost_price) * qty;
    }
}
