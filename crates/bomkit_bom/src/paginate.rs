//! Report paginator: word-wrap long cells across the physical rows of each
//! item block.
//!
//! The output is built append-only. For every block (maximal run of non-blank
//! rows) the row count is decided first: each module sub-block grows to fit
//! its wrapped comment, then the block grows to fit the wrapped name and
//! supply-document text. The subtotal row always closes the block.

use bomkit_io_xlsx::{EnumCellValue, SpecSheetGrid, XlsxIoError};

use crate::compress::{build_rule_text, is_subtotal_cell};
use crate::conf::{SpecWrapLimits, TUP_REPORT_HEADERS};
use crate::report::SpecReportSheet;

/// Greedy word wrap; a word longer than `n_len_max` gets a line of its own
/// and is never split. Empty text gives no lines.
pub fn words_wrap(text: &str, n_len_max: usize) -> Vec<String> {
    let mut l_lines = Vec::new();
    let mut c_line = String::new();
    let mut n_line_chars = 0;
    for c_word in text.split_whitespace() {
        let n_word_chars = c_word.chars().count();
        if c_line.is_empty() {
            c_line.push_str(c_word);
            n_line_chars = n_word_chars;
        } else if n_line_chars + 1 + n_word_chars <= n_len_max {
            c_line.push(' ');
            c_line.push_str(c_word);
            n_line_chars += 1 + n_word_chars;
        } else {
            l_lines.push(std::mem::take(&mut c_line));
            c_line.push_str(c_word);
            n_line_chars = n_word_chars;
        }
    }
    if !c_line.is_empty() {
        l_lines.push(c_line);
    }
    l_lines
}

/// Resolved report column indices.
#[derive(Debug, Clone, Copy)]
struct SpecReportColumns {
    name: usize,
    supply_doc: usize,
    module: usize,
    qty: usize,
    total: usize,
    comment: usize,
}

impl SpecReportColumns {
    fn resolve(grid: &SpecSheetGrid) -> Result<Self, XlsxIoError> {
        let l_idx = grid.require_columns(&TUP_REPORT_HEADERS)?;
        Ok(Self {
            name: l_idx[0],
            supply_doc: l_idx[2],
            module: l_idx[4],
            qty: l_idx[5],
            total: l_idx[8],
            comment: l_idx[9],
        })
    }
}

/// Rows of one module sub-block and its wrapped comment.
#[derive(Debug)]
struct SpecModuleBlock<'a> {
    l_rows: Vec<&'a [EnumCellValue]>,
    l_comment_lines: Vec<String>,
}

fn join_column_text<'a>(l_rows: impl Iterator<Item = &'a [EnumCellValue]>, n_col: usize) -> String {
    l_rows
        .filter_map(|row| row.get(n_col))
        .map(|value| value.to_text().trim().to_string())
        .filter(|c_val| !c_val.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// True for a lone row that carries only a name: a category header.
fn is_category_block(l_block: &[&[EnumCellValue]], cols: SpecReportColumns) -> bool {
    matches!(l_block, [row] if row.iter().enumerate().all(|(n_col, value)| (n_col == cols.name) != value.is_blank()))
}

/// Lay out one block; returns its physical rows.
fn layout_block(
    l_block: &[&[EnumCellValue]],
    cols: SpecReportColumns,
    limits: SpecWrapLimits,
    n_width: usize,
) -> Vec<Vec<EnumCellValue>> {
    let n_total = l_block
        .iter()
        .position(|row| row.get(cols.total).is_some_and(is_subtotal_cell));
    let l_body: Vec<&[EnumCellValue]> = l_block
        .iter()
        .enumerate()
        .filter(|(n_idx, _)| Some(*n_idx) != n_total)
        .map(|(_, row)| *row)
        .collect();

    let l_name_lines = words_wrap(&join_column_text(l_block.iter().copied(), cols.name), limits.name);
    let l_supply_lines = words_wrap(
        &join_column_text(l_block.iter().copied(), cols.supply_doc),
        limits.supply_doc,
    );

    // Rows ahead of the first module reference belong to no sub-block.
    let n_lead = l_body
        .iter()
        .position(|row| row.get(cols.module).is_some_and(|v| !v.is_blank()))
        .unwrap_or(l_body.len());
    let mut l_modules: Vec<SpecModuleBlock> = Vec::new();
    for row in l_body[n_lead..].iter().copied() {
        if row.get(cols.module).is_some_and(|v| !v.is_blank()) {
            l_modules.push(SpecModuleBlock {
                l_rows: Vec::new(),
                l_comment_lines: Vec::new(),
            });
        }
        if let Some(block) = l_modules.last_mut() {
            block.l_rows.push(row);
        }
    }
    for block in &mut l_modules {
        let c_comment = join_column_text(block.l_rows.iter().copied(), cols.comment);
        block.l_comment_lines = words_wrap(&c_comment, limits.comment);
    }

    let mut l_out: Vec<Vec<EnumCellValue>> = Vec::new();
    let clear_wrapped = |row: &[EnumCellValue]| {
        let mut row_out = row.to_vec();
        row_out.resize(n_width, EnumCellValue::None);
        for n_col in [cols.name, cols.supply_doc, cols.comment] {
            row_out[n_col] = EnumCellValue::None;
        }
        row_out
    };
    for row in &l_body[..n_lead] {
        l_out.push(clear_wrapped(row));
    }
    for block in &l_modules {
        let n_first = l_out.len();
        for row in &block.l_rows {
            l_out.push(clear_wrapped(row));
        }
        for _ in block.l_rows.len()..block.l_comment_lines.len() {
            l_out.push(vec![EnumCellValue::None; n_width]);
        }
        for (n_offset, c_line) in block.l_comment_lines.iter().enumerate() {
            l_out[n_first + n_offset][cols.comment] = EnumCellValue::text(c_line.clone());
        }
    }

    let n_needed = l_name_lines.len().max(l_supply_lines.len()).max(1);
    while l_out.len() < n_needed {
        l_out.push(vec![EnumCellValue::None; n_width]);
    }
    for (n_col, l_lines) in [(cols.name, &l_name_lines), (cols.supply_doc, &l_supply_lines)] {
        for (n_offset, c_line) in l_lines.iter().enumerate() {
            l_out[n_offset][n_col] = EnumCellValue::text(c_line.clone());
        }
    }

    if n_total.is_some() {
        let n_sum: i64 = l_body
            .iter()
            .filter_map(|row| row.get(cols.qty).and_then(EnumCellValue::to_i64))
            .sum();
        let mut row_total = vec![EnumCellValue::None; n_width];
        row_total[cols.total] = EnumCellValue::text(build_rule_text(n_sum));
        l_out.push(row_total);
    }
    l_out
}

/// Paginate a report sheet read back from disk.
///
/// Blank separator rows are kept one-for-one. Category header rows wrap at the
/// name width; every line is underlined.
pub fn paginate_report(
    grid: &SpecSheetGrid,
    limits: SpecWrapLimits,
) -> Result<SpecReportSheet, XlsxIoError> {
    let cols = SpecReportColumns::resolve(grid)?;
    let mut report = SpecReportSheet {
        grid: SpecSheetGrid::new(&grid.headers),
        l_rows_underline: Vec::new(),
    };
    let n_width = report.grid.width();

    let mut n_row = 0;
    let mut n_blocks = 0;
    while n_row < grid.height() {
        if grid.is_blank_row(n_row) {
            report.grid.push_blank_row();
            n_row += 1;
            continue;
        }
        let n_end = (n_row..grid.height())
            .find(|n_idx| grid.is_blank_row(*n_idx))
            .unwrap_or(grid.height());
        let l_block: Vec<&[EnumCellValue]> = grid.rows[n_row..n_end].iter().map(Vec::as_slice).collect();

        if is_category_block(&l_block, cols) {
            let c_label = l_block[0].get(cols.name).map(EnumCellValue::to_text).unwrap_or_default();
            let l_lines = words_wrap(&c_label, limits.name);
            for c_line in l_lines {
                let mut row_out = vec![EnumCellValue::None; n_width];
                row_out[cols.name] = EnumCellValue::text(c_line);
                report.l_rows_underline.push(report.grid.height());
                report.grid.push_row(row_out);
            }
        } else {
            for row in layout_block(&l_block, cols, limits, n_width) {
                report.grid.push_row(row);
            }
        }
        n_blocks += 1;
        n_row = n_end;
    }
    log::debug!(
        "Paginated {n_blocks} blocks: {} rows -> {} rows.",
        grid.height(),
        report.grid.height()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::build_report;
    use crate::spec::EnumCategory;

    #[test]
    fn test_words_wrap_never_splits_words() {
        assert_eq!(words_wrap("ALPHA BETA GAMMA", 9), vec!["ALPHA", "BETA", "GAMMA"]);
        assert_eq!(words_wrap("ab cd ef", 5), vec!["ab cd", "ef"]);
        assert_eq!(words_wrap("SN74HC245DWR", 4), vec!["SN74HC245DWR"]);
        assert!(words_wrap("   ", 10).is_empty());
        // Width counts characters, not bytes.
        assert_eq!(words_wrap("Винт М3", 7), vec!["Винт М3"]);
    }

    fn row(cells: &[(usize, EnumCellValue)]) -> Vec<EnumCellValue> {
        let mut row = vec![EnumCellValue::None; TUP_REPORT_HEADERS.len()];
        for (n_col, value) in cells {
            row[*n_col] = value.clone();
        }
        row
    }

    fn text(c_val: &str) -> EnumCellValue {
        EnumCellValue::text(c_val)
    }

    #[test]
    fn test_paginate_grows_comment_sub_blocks_and_recomputes_total() {
        let mut grid = SpecSheetGrid::new(&TUP_REPORT_HEADERS);
        grid.push_row(row(&[(0, text("Резисторы"))]));
        grid.push_blank_row();
        grid.push_row(row(&[
            (0, text("Резистор")),
            (4, text("M1")),
            (5, EnumCellValue::Number(2.0)),
            (9, text("R1, R2, R3, R4")),
        ]));
        grid.push_row(row(&[
            (4, text("M2")),
            (5, EnumCellValue::Number(3.0)),
            (9, text("R9")),
        ]));
        grid.push_row(row(&[(
            8,
            EnumCellValue::Formula {
                formula: "=REPT(\"_\",4)&CHAR(10)&SUM(F4:F5)".into(),
                result: "____\n5".into(),
            },
        )]));
        grid.push_blank_row();

        let limits = SpecWrapLimits::default();
        let report = paginate_report(&grid, limits).expect("paginate");
        let out = &report.grid;
        assert_eq!(report.l_rows_underline, vec![0]);
        assert_eq!(out.cell_text(0, 0), "Резисторы");
        assert!(out.is_blank_row(1));

        // "R1, R2, R3, R4" wraps to two lines at width 12.
        assert_eq!(out.cell_text(2, 9), "R1, R2, R3,");
        assert_eq!(out.cell_text(3, 9), "R4");
        assert_eq!(out.cell_text(3, 4), "");
        assert_eq!(out.cell_text(4, 4), "M2");
        assert_eq!(out.cell_text(4, 9), "R9");
        assert_eq!(out.cell_text(5, 8), "____\n5");
        assert!(matches!(out.rows[5][8], EnumCellValue::String(_)));
        assert!(out.is_blank_row(6));
        assert_eq!(out.height(), 7);
    }

    #[test]
    fn test_paginate_extends_block_for_long_name() {
        let mut grid = SpecSheetGrid::new(&TUP_REPORT_HEADERS);
        grid.push_row(row(&[
            (0, text("Микросхема интегральная цифровая восьмиразрядная буферная")),
            (2, text("SN74HC245DW")),
            (4, text("M1")),
            (5, EnumCellValue::Number(1.0)),
        ]));
        let report = paginate_report(&grid, SpecWrapLimits::default()).expect("paginate");
        let out = &report.grid;
        assert_eq!(out.height(), 2);
        assert_eq!(out.cell_text(0, 0), "Микросхема интегральная цифровая");
        assert_eq!(out.cell_text(1, 0), "восьмиразрядная буферная");
        assert_eq!(out.cell_text(0, 2), "SN74HC245DW");
        assert_eq!(out.cell_text(1, 4), "");
        assert!(report.l_rows_underline.is_empty());
    }

    #[test]
    fn test_paginate_wraps_long_category_label() {
        let c_label = EnumCategory::Structural.label();
        let mut grid = SpecSheetGrid::new(&TUP_REPORT_HEADERS);
        grid.push_row(row(&[(0, text(c_label))]));
        grid.push_blank_row();

        let report = paginate_report(&grid, SpecWrapLimits::default()).expect("paginate");
        let out = &report.grid;
        assert_eq!(report.l_rows_underline, vec![0, 1, 2]);
        assert_eq!(out.cell_text(0, 0), "Конструктивные элементы (шкаф, стойки");
        assert_eq!(out.cell_text(1, 0), "резьбовые, кронштейн шрофф, ручка,");
        assert_eq!(out.cell_text(2, 0), "втулки, шасси из главной сп)");
        assert!(out.is_blank_row(3));
        assert_eq!(out.height(), 4);
        let c_joined: Vec<String> = (0..3).map(|r| out.cell_text(r, 0)).collect();
        assert_eq!(c_joined.join(" "), c_label);
    }

    #[test]
    fn test_paginate_built_report_keeps_row_order() {
        let mut grid = SpecSheetGrid::new(&["Category", "Name_Clean", "SupplyDoc", "Module", "Qty", "Comment"]);
        grid.push_row(
            ["Прочие изделия", "Кабель", "", "M1", "4", ""]
                .iter()
                .map(|c| text(c))
                .collect(),
        );
        let report = build_report(&grid).expect("report");
        let wrapped = paginate_report(&report.grid, SpecWrapLimits::default()).expect("paginate");
        assert_eq!(wrapped.grid, report.grid);
        assert_eq!(wrapped.l_rows_underline, report.l_rows_underline);
    }

    #[test]
    fn test_paginate_requires_report_headers() {
        let grid = SpecSheetGrid::new(&["Name"]);
        assert!(paginate_report(&grid, SpecWrapLimits::default()).is_err());
    }
}
