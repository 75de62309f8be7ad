//! Order line drafts and billing rules.

use rust_decimal::Decimal;
use uuid::Uuid;

/// One order line as built during checkout, before persistence. The unit
/// price is the cart line's snapshot, never the live catalog price.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderLineDraft {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
}

impl OrderLineDraft {
    /// The price the gateway may charge, if any. Missing and non-positive
    /// snapshots are never billed.
    pub fn billable_price(&self) -> Option<Decimal> {
        self.unit_price.filter(|p| *p > Decimal::ZERO)
    }
}

/// Lines the payment gateway is asked to charge for. Zero-priced and
/// unpriced lines stay on the order (and still consume stock) but are
/// excluded from the payment submission.
pub fn billable_lines(lines: &[OrderLineDraft]) -> Vec<&OrderLineDraft> {
    lines.iter().filter(|l| l.billable_price().is_some()).collect()
}
