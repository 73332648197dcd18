//! The loaded spreadsheet: cell values, header row and column detection.

use std::fmt;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use thiserror::Error;

/// Column names tried, in order, when auto-detecting the barcode column.
pub const CODE_COLUMN_CANDIDATES: &[&str] = &[
    "EAN_PRODUTO",
    "EAN",
    "ean",
    "Código de Barras",
    "codigo",
    "barcode",
];

/// The only name auto-detected for the order column.
pub const ORDER_COLUMN_NAME: &str = "PEDIDO";

/// Optional column shown in the scanned-products report.
pub const DESCRIPTION_COLUMN_NAME: &str = "DESCRICAO_MODELO";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("falha ao ler a planilha: {0}")]
    Workbook(#[from] calamine::XlsxError),
    #[error("a planilha não contém nenhuma aba")]
    NoSheet,
    #[error("a planilha está vazia")]
    Empty,
}

/// A single cell, typed the way calamine hands it to us.
///
/// Spreadsheets are loose about numeric types: an EAN may arrive as an
/// integer, a float with zero fraction, or the text `"123.0"`. The
/// comparison helpers below exist so the rest of the crate can match codes
/// without caring which of those it got.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(f) => CellValue::Float(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Text(e.to_string()),
        }
    }

    /// The cell interpreted as an integer, when it losslessly is one.
    ///
    /// `Float(123.0)` and `Text("123.0")` both yield `Some(123)`; this is
    /// what lets a scanned `123` match a cell that Excel mangled into a
    /// float on the integer-equality step.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f) => float_as_i64(*f),
            CellValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(float_as_i64))
            }
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

fn float_as_i64(f: f64) -> Option<i64> {
    // i64::MAX is not exactly representable as f64; stay well inside.
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for CellValue {
    /// String form used by the UI, the string-equality match and the
    /// order-color keys. Whole floats print without the `.0` artifact,
    /// matching how the source data is meant to be read.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => match float_as_i64(*v) {
                Some(i) => write!(f, "{}", i),
                None => write!(f, "{}", v),
            },
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// The table as loaded, immutable for the rest of the session.
///
/// Rows keep their original 0-based position; every other component (view,
/// scan ledger, export) refers to rows through that index.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub filename: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// Index into `columns` of the barcode column, once known.
    pub code_column: Option<usize>,
    /// Index into `columns` of the order column, once known.
    pub order_column: Option<usize>,
}

impl Dataset {
    /// Load the first worksheet of an xlsx file received as bytes.
    ///
    /// The first row is taken as the header; remaining rows become data
    /// rows padded to the header width. Code and order columns are
    /// auto-detected against the candidate lists; a miss is not an error,
    /// the caller degrades to manual selection.
    pub fn from_xlsx_bytes(filename: &str, bytes: &[u8]) -> Result<Self, LoadError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(LoadError::NoSheet)?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows_iter = range.rows();
        let header = rows_iter.next().ok_or(LoadError::Empty)?;

        let columns: Vec<String> = header
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let name = CellValue::from_data(cell).to_string();
                if name.is_empty() {
                    format!("Coluna {}", i + 1)
                } else {
                    name
                }
            })
            .collect();

        let rows: Vec<Vec<CellValue>> = rows_iter
            .map(|row| {
                let mut cells: Vec<CellValue> = row.iter().map(CellValue::from_data).collect();
                cells.resize(columns.len(), CellValue::Empty);
                cells
            })
            .collect();

        let mut dataset = Dataset {
            filename: filename.to_string(),
            columns,
            rows,
            code_column: None,
            order_column: None,
        };
        dataset.detect_columns();
        Ok(dataset)
    }

    fn detect_columns(&mut self) {
        self.code_column = CODE_COLUMN_CANDIDATES
            .iter()
            .find_map(|name| self.column_index(name));
        self.order_column = self.column_index(ORDER_COLUMN_NAME);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Designates the barcode column by name. Returns false when the name
    /// does not exist; the current designation is then kept.
    pub fn set_code_column(&mut self, name: &str) -> bool {
        match self.column_index(name) {
            Some(i) => {
                self.code_column = Some(i);
                true
            }
            None => false,
        }
    }

    pub fn set_order_column(&mut self, name: &str) -> bool {
        match self.column_index(name) {
            Some(i) => {
                self.order_column = Some(i);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        &self.rows[row][col]
    }

    pub fn code_value(&self, row: usize) -> Option<&CellValue> {
        self.code_column.map(|c| self.cell(row, c))
    }

    pub fn order_value(&self, row: usize) -> Option<&CellValue> {
        self.order_column.map(|c| self.cell(row, c))
    }

    /// Distinct order values in display form, sorted numerically when the
    /// whole column is numeric, lexically otherwise.
    pub fn distinct_orders(&self) -> Vec<String> {
        let Some(col) = self.order_column else {
            return Vec::new();
        };
        let mut orders: Vec<String> = Vec::new();
        for row in &self.rows {
            let s = row[col].to_string();
            if !s.is_empty() && !orders.contains(&s) {
                orders.push(s);
            }
        }
        orders.sort_by(|a, b| match (a.parse::<i64>(), b.parse::<i64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.cmp(b),
        });
        orders
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a dataset directly, bypassing the xlsx decoding.
    pub(crate) fn dataset(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Dataset {
        let mut ds = Dataset {
            filename: "teste.xlsx".to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            code_column: None,
            order_column: None,
        };
        ds.detect_columns();
        ds
    }

    #[test]
    fn as_i64_coercions() {
        assert_eq!(CellValue::Int(5).as_i64(), Some(5));
        assert_eq!(CellValue::Float(5.0).as_i64(), Some(5));
        assert_eq!(CellValue::Text("5".into()).as_i64(), Some(5));
        assert_eq!(CellValue::Text("5.0".into()).as_i64(), Some(5));
        assert_eq!(CellValue::Text(" 5 ".into()).as_i64(), Some(5));
        assert_eq!(CellValue::Float(5.5).as_i64(), None);
        assert_eq!(CellValue::Text("5.5".into()).as_i64(), None);
        assert_eq!(CellValue::Text("abc".into()).as_i64(), None);
        assert_eq!(CellValue::Empty.as_i64(), None);
        assert_eq!(CellValue::Bool(true).as_i64(), None);
    }

    #[test]
    fn display_drops_whole_float_artifact() {
        assert_eq!(CellValue::Float(123.0).to_string(), "123");
        assert_eq!(CellValue::Float(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Text("123.0".into()).to_string(), "123.0");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn detects_code_and_order_columns() {
        let ds = dataset(&["PEDIDO", "EAN_PRODUTO", "DESCRICAO_MODELO"], vec![]);
        assert_eq!(ds.order_column, Some(0));
        assert_eq!(ds.code_column, Some(1));
    }

    #[test]
    fn candidate_priority_follows_the_list() {
        let ds = dataset(&["barcode", "EAN"], vec![]);
        // EAN comes before barcode in the candidate list.
        assert_eq!(ds.code_column, Some(1));
    }

    #[test]
    fn detection_miss_leaves_columns_unset() {
        let mut ds = dataset(&["sku", "pedido_num"], vec![]);
        assert_eq!(ds.code_column, None);
        assert_eq!(ds.order_column, None);
        assert!(ds.set_code_column("sku"));
        assert!(!ds.set_order_column("inexistente"));
        assert_eq!(ds.code_column, Some(0));
        assert_eq!(ds.order_column, None);
    }

    #[test]
    fn distinct_orders_sorted_numerically() {
        let ds = dataset(
            &["PEDIDO"],
            vec![
                vec![CellValue::Int(10)],
                vec![CellValue::Int(2)],
                vec![CellValue::Int(10)],
                vec![CellValue::Float(7.0)],
            ],
        );
        assert_eq!(ds.distinct_orders(), vec!["2", "7", "10"]);
    }
}
