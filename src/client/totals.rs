use rust_decimal::Decimal;

use crate::models::{CartProduct, Coupon};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub subtotal: Decimal,
    pub total: Decimal,
}

/// Sum of `price × quantity` over the cart, less the applied coupon's
/// percentage. Pass `None` when no coupon is applied; `total` then equals
/// `subtotal`.
pub fn recompute_totals(cart: &[CartProduct], applied_coupon: Option<&Coupon>) -> Totals {
    let subtotal_minor = cart
        .iter()
        .fold(0i64, |sum, line| sum.saturating_add(line.line_total()));
    let subtotal = Decimal::from(subtotal_minor);

    let total = match applied_coupon {
        Some(coupon) => {
            let percentage = Decimal::from(coupon.discount_percentage.clamp(0, 100));
            subtotal - subtotal * percentage / Decimal::ONE_HUNDRED
        }
        None => subtotal,
    };

    Totals { subtotal, total }
}
