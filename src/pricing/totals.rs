use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::models::OrderLine;
use crate::money;
use crate::pricing::line::compute_line_amounts;

/// Order-level financial summary, derived from the lines and the global
/// discount. All values exact; snapshots of this struct are display caches
/// and are never authoritative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of line gross amounts.
    pub total_gross: Decimal,
    /// Sum of line discount amounts.
    pub total_line_discounts: Decimal,
    /// Global discount taken on the gross total.
    pub global_discount_amount: Decimal,
    /// Line discounts plus the global discount.
    pub total_discounts: Decimal,
    /// Gross minus all discounts.
    pub total_net: Decimal,
    /// Sum of per-line VAT amounts.
    pub total_vat: Decimal,
    /// Net plus VAT: the amount the counterparty owes.
    pub net_payable: Decimal,
}

impl OrderTotals {
    /// Totals of an order with no lines.
    pub fn zero() -> Self {
        Self {
            total_gross: Decimal::ZERO,
            total_line_discounts: Decimal::ZERO,
            global_discount_amount: Decimal::ZERO,
            total_discounts: Decimal::ZERO,
            total_net: Decimal::ZERO,
            total_vat: Decimal::ZERO,
            net_payable: Decimal::ZERO,
        }
    }
}

/// Aggregates line amounts into order totals.
///
/// VAT is summed from the per-line amounts and is not recomputed after the
/// global discount: the global discount reduces the net payable but leaves
/// VAT as invoiced line by line. The order entry screen and every printed
/// document rely on this exact behavior, so it must not be "corrected" here.
/// A consequence worth knowing: with heavily discounted lines and a global
/// discount on top, `total_net` can go negative.
pub fn compute_order_totals(
    lines: &[OrderLine],
    global_discount_percent: Decimal,
) -> Result<OrderTotals, EngineError> {
    if money::validate_percent(&global_discount_percent).is_err() {
        return Err(EngineError::ValidationError(format!(
            "Global discount of {}% is out of range",
            global_discount_percent
        )));
    }

    let mut totals = OrderTotals::zero();
    for line in lines {
        let amounts = compute_line_amounts(line)?;
        totals.total_gross += amounts.gross_amount;
        totals.total_line_discounts += amounts.line_discount_amount;
        totals.total_vat += amounts.vat_amount;
    }

    totals.global_discount_amount = money::percentage(totals.total_gross, global_discount_percent);
    totals.total_discounts = totals.total_line_discounts + totals.global_discount_amount;
    totals.total_net = totals.total_gross - totals.total_discounts;
    totals.net_payable = totals.total_net + totals.total_vat;

    Ok(totals)
}
