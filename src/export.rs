//! Regenerates the spreadsheet with the session's highlights baked in.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Color, Format, Workbook, XlsxError};

use crate::colors::{OrderColorMap, Rgb};
use crate::dataset::{CellValue, Dataset};
use crate::highlight::row_style;
use crate::ledger::ScanLedger;

/// Download filename, stamped the moment the export is requested.
pub fn export_filename(now: DateTime<Local>) -> String {
    format!("verificados_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

/// Builds the output workbook: the complete original dataset (never the
/// filtered view), headers and values verbatim, with each row filled by the
/// same precedence rule as the live table: scan color over order color.
pub fn export_xlsx(
    dataset: &Dataset,
    ledger: &ScanLedger,
    order_colors: &OrderColorMap,
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in dataset.columns.iter().enumerate() {
        worksheet.write_string(0, col as u16, name.as_str())?;
    }

    // One Format per distinct fill color, reused across rows.
    let mut fills: HashMap<Rgb, Format> = HashMap::new();

    for (row, cells) in dataset.rows.iter().enumerate() {
        let fill = row_style(dataset, ledger, order_colors, row).map(|style| {
            fills
                .entry(style.color)
                .or_insert_with(|| Format::new().set_background_color(Color::RGB(style.color)))
                .clone()
        });
        let xl_row = (row + 1) as u32;

        for (col, cell) in cells.iter().enumerate() {
            let xl_col = col as u16;
            match (cell, &fill) {
                (CellValue::Empty, Some(f)) => {
                    worksheet.write_blank(xl_row, xl_col, f)?;
                }
                (CellValue::Empty, None) => {}
                (CellValue::Int(i), Some(f)) => {
                    worksheet.write_number_with_format(xl_row, xl_col, *i as f64, f)?;
                }
                (CellValue::Int(i), None) => {
                    worksheet.write_number(xl_row, xl_col, *i as f64)?;
                }
                (CellValue::Float(v), Some(f)) => {
                    worksheet.write_number_with_format(xl_row, xl_col, *v, f)?;
                }
                (CellValue::Float(v), None) => {
                    worksheet.write_number(xl_row, xl_col, *v)?;
                }
                (CellValue::Bool(b), Some(f)) => {
                    worksheet.write_boolean_with_format(xl_row, xl_col, *b, f)?;
                }
                (CellValue::Bool(b), None) => {
                    worksheet.write_boolean(xl_row, xl_col, *b)?;
                }
                (CellValue::Text(s), Some(f)) => {
                    worksheet.write_string_with_format(xl_row, xl_col, s.as_str(), f)?;
                }
                (CellValue::Text(s), None) => {
                    worksheet.write_string(xl_row, xl_col, s.as_str())?;
                }
            }
        }
    }

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::dataset;
    use calamine::{Data, Reader, Xlsx};
    use chrono::TimeZone;
    use std::io::Cursor;

    fn sample() -> Dataset {
        dataset(
            &["PEDIDO", "EAN_PRODUTO", "DESCRICAO_MODELO"],
            vec![
                vec![
                    CellValue::Int(5),
                    CellValue::Int(111),
                    CellValue::Text("Camiseta".into()),
                ],
                vec![
                    CellValue::Int(7),
                    CellValue::Float(222.0),
                    CellValue::Empty,
                ],
            ],
        )
    }

    fn reopen(bytes: &[u8]) -> Vec<Vec<Data>> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec())).unwrap();
        let name = workbook.sheet_names().first().cloned().unwrap();
        let range = workbook.worksheet_range(&name).unwrap();
        range.rows().map(|r| r.to_vec()).collect()
    }

    #[test]
    fn export_preserves_headers_and_values_verbatim() {
        let ds = sample();
        let bytes = export_xlsx(&ds, &ScanLedger::new(), &OrderColorMap::new()).unwrap();
        let rows = reopen(&bytes);

        assert_eq!(
            rows[0],
            vec![
                Data::String("PEDIDO".into()),
                Data::String("EAN_PRODUTO".into()),
                Data::String("DESCRICAO_MODELO".into()),
            ]
        );
        assert_eq!(rows[1][0], Data::Float(5.0));
        assert_eq!(rows[1][1], Data::Float(111.0));
        assert_eq!(rows[1][2], Data::String("Camiseta".into()));
        assert_eq!(rows[2][1], Data::Float(222.0));
    }

    #[test]
    fn export_with_highlights_keeps_cell_content_unchanged() {
        let ds = sample();
        let mut orders = OrderColorMap::new();
        orders.assign("5");
        let mut ledger = ScanLedger::new();
        ledger.record("111", 0);

        let bytes = export_xlsx(&ds, &ledger, &orders).unwrap();
        let rows = reopen(&bytes);
        // Fills change styling only; values round-trip untouched.
        assert_eq!(rows[1][1], Data::Float(111.0));
        assert_eq!(rows[2][0], Data::Float(7.0));
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn filename_is_timestamped() {
        let at = Local.with_ymd_and_hms(2026, 8, 28, 14, 5, 9).unwrap();
        assert_eq!(export_filename(at), "verificados_20260828_140509.xlsx");
    }
}
