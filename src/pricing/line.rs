use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::EngineError;
use crate::models::OrderLine;
use crate::money;

/// Derived amounts of a single order line, all exact and unrounded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineAmounts {
    /// `unit_price * quantity`, before any discount.
    pub gross_amount: Decimal,
    /// Line discount taken on the gross amount.
    pub line_discount_amount: Decimal,
    /// Gross minus the line discount.
    pub net_amount: Decimal,
    /// VAT on the discounted net.
    pub vat_amount: Decimal,
    /// Net plus VAT.
    pub total_amount: Decimal,
}

/// Computes the five derived amounts of one order line.
///
/// The chain is fixed: gross from price and quantity, discount on the gross,
/// VAT on the discounted net, total as net plus VAT. A zero discount or zero
/// VAT rate degenerates cleanly (`net == gross`, `vat == 0`).
pub fn compute_line_amounts(line: &OrderLine) -> Result<LineAmounts, EngineError> {
    line.validate().map_err(|e| {
        EngineError::ValidationError(format!("Line '{}': {}", line.product_ref, e))
    })?;

    let gross_amount = line.unit_price * Decimal::from(line.quantity);
    let line_discount_amount = money::percentage(gross_amount, line.discount_percent);
    let net_amount = gross_amount - line_discount_amount;
    let vat_amount = money::percentage(net_amount, line.vat_percent);
    let total_amount = net_amount + vat_amount;

    Ok(LineAmounts {
        gross_amount,
        line_discount_amount,
        net_amount,
        vat_amount,
        total_amount,
    })
}
