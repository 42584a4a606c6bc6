//! Row compressor: collapse runs of identical names into position groups.

use bomkit_io_xlsx::{EnumCellValue, SpecSheetGrid, XlsxIoError, derive_column_range_ref};

use crate::conf::{C_COL_NAME, C_COL_QTY, N_RULE_LEN, TUP_COMPRESS_KEEP_COLUMNS};

/// Sheet row (1-based, header on row 1) of a zero-based body row.
pub fn derive_sheet_row(n_body_idx: usize) -> usize {
    n_body_idx + 2
}

/// Subtotal cell: a rule plus a line break plus the sum.
///
/// The formula keeps the sheet live; `result` is what non-recalculating
/// readers display.
pub fn build_subtotal_cell(n_col_qty: usize, n_row_first: usize, n_row_last: usize, n_sum: i64) -> EnumCellValue {
    let c_range = derive_column_range_ref(n_col_qty, n_row_first, n_row_last);
    EnumCellValue::Formula {
        formula: format!("=REPT(\"_\",{N_RULE_LEN})&CHAR(10)&SUM({c_range})"),
        result: build_rule_text(n_sum),
    }
}

/// Plain-text subtotal, `____\n<sum>`.
pub fn build_rule_text(n_sum: i64) -> String {
    format!("{}\n{n_sum}", "_".repeat(N_RULE_LEN))
}

/// True when the cell is a subtotal written by this pipeline.
pub fn is_subtotal_cell(value: &EnumCellValue) -> bool {
    match value {
        EnumCellValue::Formula { .. } => true,
        EnumCellValue::String(c_val) => {
            c_val.starts_with('=') || c_val.contains("REPT(") || c_val.contains("____")
        }
        _ => false,
    }
}

/// Compress a name-sorted grid.
///
/// Each maximal run of byte-identical non-empty names keeps its first row whole; later
/// rows keep only the module, position and quantity cells. A run of more than
/// one row is followed by a subtotal row, and every run by a blank row. Rows
/// with an empty name pass through unchanged.
pub fn compress_rows(grid: &SpecSheetGrid) -> Result<SpecSheetGrid, XlsxIoError> {
    let l_idx = grid.require_columns(&[C_COL_NAME, C_COL_QTY])?;
    let (n_idx_name, n_idx_qty) = (l_idx[0], l_idx[1]);
    let set_keep: Vec<bool> = grid
        .headers
        .iter()
        .map(|h| TUP_COMPRESS_KEEP_COLUMNS.contains(&h.as_str()))
        .collect();

    let mut grid_out = SpecSheetGrid::new(&grid.headers);
    let mut n_row = 0;
    while n_row < grid.height() {
        let c_name = grid.cell_text(n_row, n_idx_name);
        if c_name.trim().is_empty() {
            grid_out.push_row(grid.rows[n_row].clone());
            n_row += 1;
            continue;
        }

        let mut n_run_end = n_row + 1;
        while n_run_end < grid.height() && grid.cell_text(n_run_end, n_idx_name) == c_name {
            n_run_end += 1;
        }

        let n_out_first = grid_out.height();
        let mut n_sum: i64 = 0;
        for (n_offset, row) in grid.rows[n_row..n_run_end].iter().enumerate() {
            n_sum += row.get(n_idx_qty).and_then(EnumCellValue::to_i64).unwrap_or(0);
            if n_offset == 0 {
                grid_out.push_row(row.clone());
            } else {
                let row_kept = row
                    .iter()
                    .zip(&set_keep)
                    .map(|(value, if_keep)| if *if_keep { value.clone() } else { EnumCellValue::None })
                    .collect();
                grid_out.push_row(row_kept);
            }
        }
        let n_out_last = grid_out.height() - 1;

        if n_run_end - n_row > 1 {
            let mut row_total = vec![EnumCellValue::None; grid_out.width()];
            row_total[n_idx_qty] = build_subtotal_cell(
                n_idx_qty,
                derive_sheet_row(n_out_first),
                derive_sheet_row(n_out_last),
                n_sum,
            );
            grid_out.push_row(row_total);
        }
        grid_out.push_blank_row();
        n_row = n_run_end;
    }

    log::debug!(
        "Compressed {} rows into {} rows.",
        grid.height(),
        grid_out.height()
    );
    Ok(grid_out)
}
