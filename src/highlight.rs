//! Row coloring, shared by the live table and the export.

use crate::colors::{OrderColorMap, Rgb};
use crate::dataset::Dataset;
use crate::ledger::ScanLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowStyle {
    pub color: Rgb,
    /// Scanned rows render bold in the live view.
    pub bold: bool,
}

/// Style for one dataset row: a scan highlight beats the order color, an
/// order color beats nothing. Pure; both rendering paths call this.
pub fn row_style(
    dataset: &Dataset,
    ledger: &ScanLedger,
    order_colors: &OrderColorMap,
    row: usize,
) -> Option<RowStyle> {
    if let Some(color) = ledger.color_of_row(row) {
        return Some(RowStyle { color, bold: true });
    }
    let order = dataset.order_value(row)?;
    if order.is_empty() {
        return None;
    }
    order_colors
        .get(&order.to_string())
        .map(|color| RowStyle { color, bold: false })
}
