//! Append-only record of scanned barcodes.

use chrono::{DateTime, Local};

use crate::colors::{Rgb, SCAN_PALETTE};

/// One successful, previously-unseen scan.
#[derive(Debug, Clone)]
pub struct ScanRecord {
    /// The code exactly as submitted (trimmed).
    pub code: String,
    /// Row index into the original dataset, never into the filtered view.
    pub row: usize,
    pub color: Rgb,
    pub scanned_at: DateTime<Local>,
}

/// Scans in the order they happened, one per distinct code string.
///
/// The color counter is independent from the order-color assignment and is
/// only reset by [`ScanLedger::clear`].
#[derive(Debug, Default, Clone)]
pub struct ScanLedger {
    records: Vec<ScanRecord>,
    color_index: usize,
}

impl ScanLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record for `code`, or returns `None` if the code was
    /// already scanned (the ledger is left untouched).
    pub fn record(&mut self, code: &str, row: usize) -> Option<&ScanRecord> {
        if self.contains(code) {
            return None;
        }
        let color = SCAN_PALETTE[self.color_index % SCAN_PALETTE.len()];
        self.color_index += 1;
        self.records.push(ScanRecord {
            code: code.to_string(),
            row,
            color,
            scanned_at: Local::now(),
        });
        self.records.last()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.records.iter().any(|r| r.code == code)
    }

    /// Scan color for a dataset row, if any record points at it.
    pub fn color_of_row(&self, row: usize) -> Option<Rgb> {
        self.records.iter().find(|r| r.row == row).map(|r| r.color)
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.color_index = 0;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScanRecord> {
        self.records.iter()
    }
}
