//! Purchased-items report ("ВП") built from a split sheet.

use bomkit_io_xlsx::{EnumCellValue, SpecSheetGrid, XlsxIoError};

use crate::compress::{build_subtotal_cell, derive_sheet_row, is_subtotal_cell};
use crate::conf::{
    C_COL_CATEGORY, C_COL_COMMENT, C_COL_MODULE, C_COL_NAME_CLEAN, C_COL_QTY, C_COL_SUPPLY_DOC,
    N_REPORT_COL_COMMENT, N_REPORT_COL_MODULE, N_REPORT_COL_NAME, N_REPORT_COL_QTY,
    N_REPORT_COL_SUPPLY_DOC, N_REPORT_COL_TOTAL, TUP_REPORT_HEADERS,
};
use crate::util::clean_text;

/// A report sheet plus the body rows written underlined.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecReportSheet {
    pub grid: SpecSheetGrid,
    /// Zero-based body rows of category headers.
    pub l_rows_underline: Vec<usize>,
}

impl SpecReportSheet {
    /// Empty report with the fixed headers.
    pub fn new() -> Self {
        Self {
            grid: SpecSheetGrid::new(&TUP_REPORT_HEADERS),
            l_rows_underline: Vec::new(),
        }
    }

    /// Append an underlined category row followed by a blank row.
    pub fn push_category(&mut self, label: &str) {
        let mut row = vec![EnumCellValue::None; self.grid.width()];
        row[N_REPORT_COL_NAME] = EnumCellValue::text(label);
        self.l_rows_underline.push(self.grid.height());
        self.grid.push_row(row);
        self.grid.push_blank_row();
    }
}

/// Quantity as written to the report: integers become numbers, other text is
/// kept as read.
fn convert_report_qty(value: &EnumCellValue) -> EnumCellValue {
    match value {
        EnumCellValue::None => EnumCellValue::None,
        EnumCellValue::String(c_val) if c_val.trim().is_empty() => EnumCellValue::None,
        EnumCellValue::Number(_) | EnumCellValue::String(_) => match value.to_i64() {
            Some(n_qty) => EnumCellValue::Number(n_qty as f64),
            None => value.clone(),
        },
        EnumCellValue::Formula { .. } => value.clone(),
    }
}

/// Build the report from a sheet carrying `Category, Name_Clean, SupplyDoc,
/// Module, Qty, Comment`.
///
/// A position group starts at a row with a non-empty `Name_Clean` and takes
/// the following rows with an empty one, up to a blank row. Subtotal rows of
/// the input are skipped; the report computes its own.
pub fn build_report(grid: &SpecSheetGrid) -> Result<SpecReportSheet, XlsxIoError> {
    let l_idx = grid.require_columns(&[
        C_COL_CATEGORY,
        C_COL_NAME_CLEAN,
        C_COL_SUPPLY_DOC,
        C_COL_MODULE,
        C_COL_QTY,
        C_COL_COMMENT,
    ])?;
    let (n_idx_cat, n_idx_name, n_idx_supply, n_idx_module, n_idx_qty, n_idx_comment) =
        (l_idx[0], l_idx[1], l_idx[2], l_idx[3], l_idx[4], l_idx[5]);
    let is_subtotal_row = |n_row: usize| grid.rows[n_row].get(n_idx_qty).is_some_and(is_subtotal_cell);
    let c_text = |n_row: usize, n_col: usize| clean_text(&grid.cell_text(n_row, n_col));

    let mut report = SpecReportSheet::new();
    let mut c_category_last: Option<String> = None;
    let mut n_row = 0;
    while n_row < grid.height() {
        if grid.is_blank_row(n_row) || is_subtotal_row(n_row) || c_text(n_row, n_idx_name).is_empty() {
            n_row += 1;
            continue;
        }

        let c_category = c_text(n_row, n_idx_cat);
        if !c_category.is_empty() && c_category_last.as_deref() != Some(c_category.as_str()) {
            report.push_category(&c_category);
            c_category_last = Some(c_category);
        }

        let mut l_group = vec![n_row];
        let mut n_next = n_row + 1;
        while n_next < grid.height() && !grid.is_blank_row(n_next) {
            if is_subtotal_row(n_next) {
                n_next += 1;
                continue;
            }
            if !c_text(n_next, n_idx_name).is_empty() {
                break;
            }
            l_group.push(n_next);
            n_next += 1;
        }

        let n_out_first = report.grid.height();
        let mut n_sum: i64 = 0;
        for (n_member, &n_src) in l_group.iter().enumerate() {
            let mut row = vec![EnumCellValue::None; report.grid.width()];
            if n_member == 0 {
                row[N_REPORT_COL_NAME] = EnumCellValue::text(c_text(n_src, n_idx_name));
                row[N_REPORT_COL_SUPPLY_DOC] = EnumCellValue::text(c_text(n_src, n_idx_supply));
            }
            row[N_REPORT_COL_COMMENT] = EnumCellValue::text(c_text(n_src, n_idx_comment));
            row[N_REPORT_COL_MODULE] = EnumCellValue::text(c_text(n_src, n_idx_module));
            let qty = grid.rows[n_src]
                .get(n_idx_qty)
                .map(convert_report_qty)
                .unwrap_or(EnumCellValue::None);
            n_sum += qty.to_i64().unwrap_or(0);
            row[N_REPORT_COL_QTY] = qty.clone();
            row[N_REPORT_COL_TOTAL] = qty;
            report.grid.push_row(row);
        }
        let n_out_last = report.grid.height() - 1;

        if l_group.len() > 1 {
            let mut row_total = vec![EnumCellValue::None; report.grid.width()];
            row_total[N_REPORT_COL_TOTAL] = build_subtotal_cell(
                N_REPORT_COL_QTY,
                derive_sheet_row(n_out_first),
                derive_sheet_row(n_out_last),
                n_sum,
            );
            report.grid.push_row(row_total);
        }
        report.grid.push_blank_row();
        n_row = n_next;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TUP_HEADERS: [&str; 7] = ["Module", "Category", "Name", "Qty", "Comment", "Name_Clean", "SupplyDoc"];

    fn push(grid: &mut SpecSheetGrid, cells: [&str; 7]) {
        grid.push_row(cells.iter().map(|c| EnumCellValue::text(*c)).collect());
    }

    fn grid_split() -> SpecSheetGrid {
        let mut grid = SpecSheetGrid::new(&TUP_HEADERS);
        push(&mut grid, ["M1", "Резисторы", "Резистор 1 кОм", "2", "R1 R2", "Резистор 1 кОм", "ТУ 1"]);
        push(&mut grid, ["M2", "", "", "3", "", "", ""]);
        let mut row_total = vec![EnumCellValue::None; 7];
        row_total[3] = build_subtotal_cell(3, 2, 3, 5);
        grid.push_row(row_total);
        grid.push_blank_row();
        push(&mut grid, ["M1", "Резисторы", "Резистор 2 кОм", "1", "R3", "Резистор 2 кОм", ""]);
        grid.push_blank_row();
        push(&mut grid, ["M3", "Конденсаторы", "К 1 мкФ", "x", "", "К 1 мкФ", ""]);
        grid
    }

    #[test]
    fn test_build_report_groups_and_categories() {
        let report = build_report(&grid_split()).expect("report");
        let grid = &report.grid;
        assert_eq!(grid.headers[0], "Наименование");
        assert_eq!(report.l_rows_underline, vec![0, 8]);

        assert_eq!(grid.cell_text(0, 0), "Резисторы");
        assert!(grid.is_blank_row(1));
        assert_eq!(grid.cell_text(2, 0), "Резистор 1 кОм");
        assert_eq!(grid.cell_text(2, 2), "ТУ 1");
        assert_eq!(grid.cell_text(2, 9), "R1 R2");
        assert_eq!(grid.rows[2][5], EnumCellValue::Number(2.0));
        assert_eq!(grid.rows[2][8], EnumCellValue::Number(2.0));
        assert_eq!(grid.cell_text(3, 0), "");
        assert_eq!(grid.cell_text(3, 4), "M2");
        match &grid.rows[4][8] {
            EnumCellValue::Formula { formula, result } => {
                assert_eq!(formula, "=REPT(\"_\",4)&CHAR(10)&SUM(F4:F5)");
                assert_eq!(result, "____\n5");
            }
            other => panic!("expected subtotal, got {other:?}"),
        }
        assert!(grid.is_blank_row(5));

        // Single-row group: no subtotal, same category, no new header.
        assert_eq!(grid.cell_text(6, 0), "Резистор 2 кОм");
        assert!(grid.is_blank_row(7));

        assert_eq!(grid.cell_text(8, 0), "Конденсаторы");
        assert_eq!(grid.rows[10][5], EnumCellValue::String("x".into()));
        assert_eq!(grid.height(), 12);
    }

    #[test]
    fn test_build_report_requires_columns() {
        let grid = SpecSheetGrid::new(&["Module", "Name"]);
        let err = build_report(&grid).expect_err("missing");
        assert!(matches!(err, XlsxIoError::MissingColumns { .. }));
    }
}
