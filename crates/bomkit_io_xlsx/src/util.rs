//! Stateless helper utilities used by the XLSX reader/writer kernel.

use std::collections::BTreeMap;

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumCellValue, EnumColumnWidth, SpecSheetGrid, XlsxIoError};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnUtils

/// Report duplicated header names as `"name" xN at indices [..]` items.
pub fn derive_duplicate_columns(columns: &[String]) -> Option<String> {
    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        if c_name.is_empty() {
            continue;
        }
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter(|(_, l_pos)| l_pos.len() > 1)
        .map(|(c_name, l_pos)| format!("{c_name:?} x{} at indices {:?}", l_pos.len(), l_pos))
        .collect::<Vec<_>>()
        .join("; ");

    if c_msg.is_empty() { None } else { Some(c_msg) }
}

/// Convert a zero-based column index to spreadsheet letters (`0 -> A`, `26 -> AA`).
pub fn derive_column_letter(col_idx: usize) -> String {
    let mut n_rest = col_idx + 1;
    let mut l_chars = Vec::new();
    while n_rest > 0 {
        let n_rem = (n_rest - 1) % 26;
        l_chars.push((b'A' + n_rem as u8) as char);
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

/// Build an A1 range for one column over 1-based sheet rows `row_first..=row_last`.
pub fn derive_column_range_ref(col_idx: usize, row_first: usize, row_last: usize) -> String {
    let c_col = derive_column_letter(col_idx);
    format!("{c_col}{row_first}:{c_col}{row_last}")
}

/// Resolve width assignments to `column index -> width` for this grid.
pub fn resolve_column_widths(
    headers: &[String],
    widths: &[EnumColumnWidth],
) -> BTreeMap<usize, f64> {
    let mut dict_widths = BTreeMap::new();
    for width in widths {
        match width {
            EnumColumnWidth::ByName(c_name, n_width) => {
                if let Some(n_idx) = headers.iter().position(|h| h == c_name) {
                    dict_widths.insert(n_idx, *n_width);
                }
            }
            EnumColumnWidth::ByIndex(n_idx, n_width) => {
                if *n_idx < headers.len() {
                    dict_widths.insert(*n_idx, *n_width);
                }
            }
        }
    }
    dict_widths
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Reject grids that do not fit one worksheet (header row included).
pub fn validate_grid_limits(grid: &SpecSheetGrid) -> Result<(), XlsxIoError> {
    if grid.width() > N_NCOLS_EXCEL_MAX {
        return Err(XlsxIoError::Limit(format!(
            "width={} exceeds {N_NCOLS_EXCEL_MAX} columns",
            grid.width()
        )));
    }
    if grid.height() + 1 > N_NROWS_EXCEL_MAX {
        return Err(XlsxIoError::Limit(format!(
            "height={} exceeds {} body rows",
            grid.height(),
            N_NROWS_EXCEL_MAX - 1
        )));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WidthEstimation

/// Estimate displayed width units for one cell value.
///
/// Multi-line text counts its widest line.
pub fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::Number(_) => value.to_text().len(),
        EnumCellValue::String(val) => val
            .lines()
            .map(estimate_unicode_string_width)
            .max()
            .unwrap_or(0),
        EnumCellValue::Formula { result, .. } => result
            .lines()
            .map(estimate_unicode_string_width)
            .max()
            .unwrap_or(0),
    }
}

fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.1).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_column_letter() {
        assert_eq!(derive_column_letter(0), "A");
        assert_eq!(derive_column_letter(6), "G");
        assert_eq!(derive_column_letter(25), "Z");
        assert_eq!(derive_column_letter(26), "AA");
        assert_eq!(derive_column_letter(701), "ZZ");
        assert_eq!(derive_column_range_ref(5, 3, 7), "F3:F7");
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("BOM/compressed", "_"), "BOM_compressed");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"Ж".repeat(40), "_").chars().count(), 31);
    }

    #[test]
    fn test_resolve_column_widths_skips_unknown_names() {
        let headers = vec!["Module".to_string(), "Name".to_string()];
        let dict_widths = resolve_column_widths(
            &headers,
            &[
                EnumColumnWidth::ByName("Name".into(), 60.0),
                EnumColumnWidth::ByName("SupplyDoc".into(), 55.0),
                EnumColumnWidth::ByIndex(0, 16.0),
                EnumColumnWidth::ByIndex(9, 10.0),
            ],
        );
        assert_eq!(dict_widths.len(), 2);
        assert_eq!(dict_widths[&0], 16.0);
        assert_eq!(dict_widths[&1], 60.0);
    }

    #[test]
    fn test_derive_duplicate_columns() {
        let cols = vec!["Name".to_string(), "Qty".to_string(), "Name".to_string()];
        assert_eq!(
            derive_duplicate_columns(&cols).as_deref(),
            Some("\"Name\" x2 at indices [0, 2]")
        );
        assert_eq!(derive_duplicate_columns(&cols[..2]), None);
    }

    #[test]
    fn test_estimate_width_len_uses_widest_line() {
        assert_eq!(estimate_width_len(&EnumCellValue::String("ab\nabcd".into())), 4);
        assert_eq!(estimate_width_len(&EnumCellValue::Number(125.0)), 3);
    }
}
