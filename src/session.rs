//! Per-session state and the command handlers behind each user action.
//!
//! Every interaction the UI offers (upload, filter, scan, clear, export)
//! maps to one method here that takes the current state and returns the
//! user-visible notices, so the whole flow is testable without HTTP.

use serde::Serialize;

use crate::colors::{hex, OrderColorMap};
use crate::dataset::{CellValue, Dataset, LoadError, DESCRIPTION_COLUMN_NAME};
use crate::highlight::{row_style, RowStyle};
use crate::ledger::ScanLedger;
use crate::search::{find_code, CodeMatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// One user-visible message produced by a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, text: text.into() }
    }
    pub fn info(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, text: text.into() }
    }
    pub fn warning(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, text: text.into() }
    }
    pub fn error(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, text: text.into() }
    }
}

/// Sentinel the UI sends to drop the order filter.
pub const ALL_ORDERS: &str = "all";

/// Result of a scan command: the match (if any) plus what to tell the user.
#[derive(Debug)]
pub struct ScanOutcome {
    pub matched: Option<CodeMatch>,
    pub notices: Vec<Notice>,
}

/// Row of the scanned-products report, in scan order.
#[derive(Debug, Serialize)]
pub struct ScannedEntry {
    /// 1-based line in the original spreadsheet data.
    pub line: usize,
    pub order: String,
    pub code: String,
    pub description: String,
    pub color: String,
    pub time: String,
}

/// Everything one user accumulates between loading a file and downloading
/// the export. Owned by the serving layer; one command runs at a time.
#[derive(Debug, Default)]
pub struct Session {
    pub dataset: Option<Dataset>,
    /// Original row indices currently shown and searched.
    view: Vec<usize>,
    /// Order value the view is restricted to, in display form.
    filtered_order: Option<String>,
    pub order_colors: OrderColorMap,
    pub ledger: ScanLedger,
    /// Last row a scan landed on, for the UI to point at.
    pub last_found: Option<usize>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the dataset with a freshly decoded file and resets every
    /// annotation. A decode error leaves the previous state untouched.
    pub fn load(&mut self, filename: &str, bytes: &[u8]) -> Result<Vec<Notice>, LoadError> {
        let dataset = Dataset::from_xlsx_bytes(filename, bytes)?;

        let mut notices = vec![
            Notice::success(format!("Planilha carregada: {}", dataset.filename)),
            Notice::info(format!("Total de linhas: {}", dataset.len())),
        ];
        match dataset.code_column {
            Some(i) => notices.push(Notice::success(format!(
                "Coluna de código detectada: {}",
                dataset.columns[i]
            ))),
            None => notices.push(Notice::warning(
                "Coluna de código não detectada automaticamente. Selecione manualmente.",
            )),
        }
        match dataset.order_column {
            Some(i) => notices.push(Notice::success(format!(
                "Coluna de pedido detectada: {}",
                dataset.columns[i]
            ))),
            None => notices.push(Notice::warning(
                "Coluna PEDIDO não encontrada. Selecione manualmente.",
            )),
        }

        self.view = (0..dataset.len()).collect();
        self.dataset = Some(dataset);
        self.filtered_order = None;
        self.order_colors = OrderColorMap::new();
        self.ledger.clear();
        self.last_found = None;
        Ok(notices)
    }

    /// Manual designation of the code and/or order columns.
    pub fn set_columns(&mut self, code: Option<&str>, order: Option<&str>) -> Vec<Notice> {
        let Some(dataset) = self.dataset.as_mut() else {
            return vec![Notice::error("Nenhuma planilha carregada.")];
        };
        let mut notices = Vec::new();
        if let Some(name) = code {
            if dataset.set_code_column(name) {
                notices.push(Notice::success(format!("Coluna de código: {name}")));
            } else {
                notices.push(Notice::error(format!("Coluna inexistente: {name}")));
            }
        }
        if let Some(name) = order {
            if dataset.set_order_column(name) {
                notices.push(Notice::success(format!("Coluna de pedido: {name}")));
            } else {
                notices.push(Notice::error(format!("Coluna inexistente: {name}")));
            }
        }
        notices
    }

    /// Restricts the view to one order, or back to every row for the
    /// [`ALL_ORDERS`] sentinel. A first filter to an order also assigns its
    /// highlight color. A selection the column's type cannot match yields
    /// an empty view, reported as 0 products.
    pub fn apply_filter(&mut self, selection: &str) -> Vec<Notice> {
        let Some(dataset) = self.dataset.as_ref() else {
            return vec![Notice::error("Nenhuma planilha carregada.")];
        };

        if selection == ALL_ORDERS {
            self.view = (0..dataset.len()).collect();
            self.filtered_order = None;
            return vec![Notice::info("Mostrando todos os pedidos")];
        }

        let Some(order_col) = dataset.order_column else {
            return vec![Notice::warning(
                "Selecione a coluna de pedido antes de filtrar.",
            )];
        };

        let numeric: Option<i64> = selection.parse().ok();
        self.view = (0..dataset.len())
            .filter(|&row| order_cell_matches(dataset.cell(row, order_col), selection, numeric))
            .collect();
        self.filtered_order = Some(selection.to_string());
        self.order_colors.assign(selection);

        vec![Notice::success(format!(
            "Filtrado para pedido: {} ({} produtos)",
            selection,
            self.view.len()
        ))]
    }

    pub fn clear_filter(&mut self) -> Vec<Notice> {
        let Some(dataset) = self.dataset.as_ref() else {
            return vec![Notice::error("Nenhuma planilha carregada.")];
        };
        self.view = (0..dataset.len()).collect();
        self.filtered_order = None;
        vec![Notice::info("Filtro removido")]
    }

    /// Looks `raw` up in the current view and records the scan. Duplicate
    /// and not-found are informational outcomes, never errors.
    pub fn scan(&mut self, raw: &str) -> ScanOutcome {
        let code = raw.trim();
        let mut notices = Vec::new();

        if code.is_empty() {
            notices.push(Notice::warning("Informe um código para buscar."));
            return ScanOutcome { matched: None, notices };
        }
        let Some(dataset) = self.dataset.as_ref() else {
            notices.push(Notice::error("Nenhuma planilha carregada."));
            return ScanOutcome { matched: None, notices };
        };
        let Some(code_col) = dataset.code_column else {
            notices.push(Notice::warning(
                "Selecione a coluna de código antes de buscar.",
            ));
            return ScanOutcome { matched: None, notices };
        };

        match find_code(dataset, &self.view, code_col, code) {
            Some(m) => {
                self.last_found = Some(m.row);
                notices.push(Notice::success("PRODUTO ENCONTRADO!"));
                notices.push(Notice::info(format!(
                    "Posição na tabela: linha {} de {}",
                    m.position,
                    self.view.len()
                )));
                if m.count > 1 {
                    notices.push(Notice::warning(format!(
                        "Encontrados {} produtos com este código. Mostrando o primeiro.",
                        m.count
                    )));
                }
                if self.ledger.record(code, m.row).is_none() {
                    notices.push(Notice::info(
                        "Este produto já foi escaneado anteriormente.",
                    ));
                }
                ScanOutcome { matched: Some(m), notices }
            }
            None => {
                notices.push(Notice::error(format!("Produto não encontrado: {code}")));
                if let Some(order) = &self.filtered_order {
                    notices.push(Notice::warning(format!(
                        "Lembre-se: você está filtrando apenas o pedido {order}"
                    )));
                }
                ScanOutcome { matched: None, notices }
            }
        }
    }

    /// Drops every scan highlight and resets the scan color cycle. Order
    /// colors are kept.
    pub fn clear_highlights(&mut self) -> Vec<Notice> {
        self.ledger.clear();
        self.last_found = None;
        vec![Notice::info("Destaques removidos")]
    }

    pub fn view(&self) -> &[usize] {
        &self.view
    }

    pub fn filtered_order(&self) -> Option<&str> {
        self.filtered_order.as_deref()
    }

    pub fn style_of(&self, row: usize) -> Option<RowStyle> {
        let dataset = self.dataset.as_ref()?;
        row_style(dataset, &self.ledger, &self.order_colors, row)
    }

    /// Scanned-products report in scan order.
    pub fn scanned_report(&self) -> Vec<ScannedEntry> {
        let Some(dataset) = self.dataset.as_ref() else {
            return Vec::new();
        };
        let descr_col = dataset.column_index(DESCRIPTION_COLUMN_NAME);
        self.ledger
            .iter()
            .map(|rec| ScannedEntry {
                line: rec.row + 1,
                order: dataset
                    .order_value(rec.row)
                    .map(CellValue::to_string)
                    .unwrap_or_default(),
                code: rec.code.clone(),
                description: descr_col
                    .map(|c| dataset.cell(rec.row, c).to_string())
                    .unwrap_or_default(),
                color: hex(rec.color),
                time: rec.scanned_at.format("%H:%M:%S").to_string(),
            })
            .collect()
    }
}

fn order_cell_matches(cell: &CellValue, selection: &str, numeric: Option<i64>) -> bool {
    match numeric {
        // Numeric selection against a text cell is a type mismatch: no row
        // matches, the filter degrades to an empty view.
        Some(n) => match cell {
            CellValue::Int(_) | CellValue::Float(_) => cell.as_i64() == Some(n),
            _ => false,
        },
        None => cell.to_string() == selection,
    }
}
