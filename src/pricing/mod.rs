//! Pure pricing computations: line amounts and order totals.
//!
//! Both functions are deterministic over their inputs and perform no I/O.
//! Amounts stay exact all the way through; presentation code rounds via
//! [`crate::money`] when displaying or printing.

pub mod line;
pub mod totals;

pub use line::{compute_line_amounts, LineAmounts};
pub use totals::{compute_order_totals, OrderTotals};
