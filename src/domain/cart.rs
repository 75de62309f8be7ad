//! Cart lines: one product entry with a frozen price snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A persisted cart line. The snapshot is the unit price captured when the
/// line was added or last updated; billing uses it regardless of later
/// catalog price changes.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CartLine {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price_snapshot: Option<Decimal>,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartLine {
    /// Line subtotal at the snapshot price. Unpriced lines count as zero.
    pub fn snapshot_subtotal(&self) -> Decimal {
        self.price_snapshot.unwrap_or(Decimal::ZERO) * Decimal::from(self.quantity)
    }
}

pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::snapshot_subtotal).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i32, snapshot: Option<Decimal>) -> CartLine {
        CartLine {
            customer_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity,
            price_snapshot: snapshot,
            added_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_subtotal() {
        let l = line(3, Some(Decimal::new(1050, 2)));
        assert_eq!(l.snapshot_subtotal(), Decimal::new(3150, 2));
    }

    #[test]
    fn test_unpriced_line_counts_as_zero() {
        assert_eq!(line(5, None).snapshot_subtotal(), Decimal::ZERO);
    }

    #[test]
    fn test_cart_total() {
        let lines = vec![line(2, Some(Decimal::new(1000, 2))), line(1, Some(Decimal::new(550, 2)))];
        assert_eq!(cart_total(&lines), Decimal::new(2550, 2));
    }
}
