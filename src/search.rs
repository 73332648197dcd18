//! Barcode lookup over the current view.

use crate::dataset::{CellValue, Dataset};

/// Outcome of a successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeMatch {
    /// Original dataset index of the first matching row.
    pub row: usize,
    /// 1-based position of that row within the view.
    pub position: usize,
    /// How many rows of the view matched; more than one means the code is
    /// ambiguous and the first one won.
    pub count: usize,
}

/// Finds `code` in the code column, restricted to `view`.
///
/// Three comparison strategies are tried in order, stopping at the first
/// that matches anything:
///
/// 1. integer equality, skipped when `code` is not an integer;
/// 2. exact equality against the cell's string form;
/// 3. equality against the cell's string form, trimmed, with one trailing
///    `".0"` stripped (spreadsheet integer-as-float artifact).
pub fn find_code(dataset: &Dataset, view: &[usize], code_col: usize, code: &str) -> Option<CodeMatch> {
    let as_int: Option<i64> = code.parse().ok();

    let strategies: [&dyn Fn(&CellValue) -> bool; 3] = [
        &|cell| match as_int {
            Some(n) => cell.as_i64() == Some(n),
            None => false,
        },
        &|cell| cell.to_string() == code,
        &|cell| strip_trailing_zero(cell.to_string().trim()) == code,
    ];

    for matches in strategies {
        let mut first: Option<(usize, usize)> = None;
        let mut count = 0;
        for (pos, &row) in view.iter().enumerate() {
            if matches(dataset.cell(row, code_col)) {
                count += 1;
                if first.is_none() {
                    first = Some((row, pos + 1));
                }
            }
        }
        if let Some((row, position)) = first {
            return Some(CodeMatch { row, position, count });
        }
    }
    None
}

/// Strips a single trailing `".0"`. The original tool stripped the first
/// occurrence anywhere in the string, which also corrupted codes like
/// `1.05`; only the trailing artifact is intended.
fn strip_trailing_zero(s: &str) -> &str {
    s.strip_suffix(".0").unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::dataset;

    fn codes(values: Vec<CellValue>) -> Dataset {
        dataset(
            &["EAN_PRODUTO"],
            values.into_iter().map(|v| vec![v]).collect(),
        )
    }

    fn full_view(ds: &Dataset) -> Vec<usize> {
        (0..ds.len()).collect()
    }

    #[test]
    fn integer_strategy_matches_typed_variants() {
        let ds = codes(vec![
            CellValue::Int(111),
            CellValue::Float(222.0),
            CellValue::Text("333".into()),
        ]);
        let view = full_view(&ds);
        for (code, row) in [("111", 0), ("222", 1), ("333", 2)] {
            let m = find_code(&ds, &view, 0, code).unwrap();
            assert_eq!((m.row, m.count), (row, 1));
        }
    }

    #[test]
    fn float_artifact_text_matches_on_the_integer_step() {
        // "123.0" stored as text still matches a scanned 123 without
        // falling through to the suffix-stripping step.
        let ds = codes(vec![CellValue::Text("123.0".into())]);
        let m = find_code(&ds, &full_view(&ds), 0, "123").unwrap();
        assert_eq!(m.row, 0);
    }

    #[test]
    fn string_strategy_handles_non_numeric_codes() {
        let ds = codes(vec![
            CellValue::Text("ABC-1".into()),
            CellValue::Text("ABC-2".into()),
        ]);
        let m = find_code(&ds, &full_view(&ds), 0, "ABC-2").unwrap();
        assert_eq!((m.row, m.position), (1, 2));
    }

    #[test]
    fn suffix_strategy_neutralizes_trailing_artifact_only() {
        let ds = codes(vec![CellValue::Text("A77.0".into())]);
        let view = full_view(&ds);
        assert!(find_code(&ds, &view, 0, "A77").is_some());
        // Not a trailing occurrence: must not be stripped.
        let ds = codes(vec![CellValue::Text("A.077".into())]);
        assert!(find_code(&ds, &full_view(&ds), 0, "A77").is_none());
    }

    #[test]
    fn ambiguous_code_reports_count_and_first_row() {
        let ds = codes(vec![
            CellValue::Int(9),
            CellValue::Int(111),
            CellValue::Int(111),
        ]);
        let m = find_code(&ds, &full_view(&ds), 0, "111").unwrap();
        assert_eq!((m.row, m.position, m.count), (1, 2, 2));
    }

    #[test]
    fn search_is_restricted_to_the_view() {
        let ds = codes(vec![CellValue::Int(111), CellValue::Int(222)]);
        assert!(find_code(&ds, &[0], 0, "222").is_none());
        let m = find_code(&ds, &[1], 0, "222").unwrap();
        assert_eq!((m.row, m.position), (1, 1));
    }

    #[test]
    fn not_found_is_none() {
        let ds = codes(vec![CellValue::Int(1)]);
        assert!(find_code(&ds, &full_view(&ds), 0, "999").is_none());
    }
}
