use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::order::OrderLine;

/// On-hand stock with its reorder threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub on_hand: i32,
    pub minimum: i32,
}

impl StockLevel {
    pub fn is_low(&self) -> bool {
        self.on_hand <= self.minimum
    }
}

/// A catalog product as the pricing engine sees it: the fields snapshotted
/// onto order lines plus the stock signal used when a line is entered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog reference, e.g. "ART-0042".
    pub reference: String,
    pub designation: String,
    /// Sale price excluding tax.
    pub sale_price: Decimal,
    pub vat_percent: Decimal,
    pub stock: StockLevel,
}

impl Product {
    /// Snapshots this product onto a new order line.
    pub fn to_line(&self, quantity: i32, discount_percent: Decimal) -> OrderLine {
        OrderLine {
            product_ref: self.reference.clone(),
            designation: self.designation.clone(),
            quantity,
            unit_price: self.sale_price,
            discount_percent,
            vat_percent: self.vat_percent,
        }
    }
}
