//! XLSX writer kernel that renders sheet grids into workbook output.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, FormatUnderline, Formula, Workbook, Worksheet};

use crate::conf::{EnumFmtKey, N_LEN_EXCEL_SHEET_NAME_MAX, derive_default_xlsx_formats};
use crate::spec::{
    EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat, SpecSheetGrid, SpecXlsxReport,
    SpecXlsxSheetWriteOptions, XlsxIoError,
};
use crate::util::{
    derive_duplicate_columns, estimate_width_len, resolve_column_widths, sanitize_sheet_name,
    validate_grid_limits,
};

/// Stateful workbook writer.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    dict_fmt: BTreeMap<EnumFmtKey, Format>,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path and format presets.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called, so a
    /// failed stage never leaves a partial file behind.
    pub fn new(path_file_out: PathBuf, formats: &BTreeMap<EnumFmtKey, SpecCellFormat>) -> Self {
        let dict_fmt = formats
            .iter()
            .map(|(key, spec)| (*key, derive_rust_xlsx_format(spec)))
            .collect();
        Self {
            path_file_out,
            workbook: Workbook::new(),
            dict_fmt,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Create writer with [`derive_default_xlsx_formats`] presets.
    pub fn with_default_formats(path_file_out: PathBuf) -> Self {
        Self::new(path_file_out, &derive_default_xlsx_formats())
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), XlsxIoError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook.save(&self.path_file_out)?;
        self.if_closed = true;
        log::debug!("saved workbook {}", self.path_file_out.display());
        Ok(())
    }

    /// Write one sheet: header row, then body rows.
    pub fn write_sheet(
        &mut self,
        grid: &SpecSheetGrid,
        sheet_name: &str,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<SpecXlsxReport, XlsxIoError> {
        if self.if_closed {
            return Err(XlsxIoError::Closed);
        }
        validate_policy_autofit(&options.policy_autofit)?;
        validate_grid_limits(grid)?;

        let mut report = SpecXlsxReport::default();
        if let Some(c_msg) = derive_duplicate_columns(&grid.headers) {
            report.warn(format!("Duplicate column names detected: {c_msg}"));
        }

        let sheet_name_unique =
            self.derive_unique_sheet_name(&sanitize_sheet_name(sheet_name, "_"));
        let fmt_text = self.derive_format(EnumFmtKey::Text);
        let fmt_integer = self.derive_format(EnumFmtKey::Integer);
        let fmt_wrap = self.derive_format(EnumFmtKey::Wrap);
        let fmt_underline = self.derive_format(EnumFmtKey::Underline);
        let fmt_header = self.derive_format(EnumFmtKey::Header);

        let set_cols_idx_wrap: BTreeSet<usize> = options
            .cols_wrap
            .iter()
            .filter_map(|c_name| grid.column_index(c_name))
            .collect();
        let set_rows_underline: BTreeSet<usize> = options.rows_underline.iter().copied().collect();

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_unique)?;

        for (n_idx_col, c_header) in grid.headers.iter().enumerate() {
            worksheet.write_string_with_format(
                0,
                cast_col_num(n_idx_col)?,
                c_header,
                &fmt_header,
            )?;
        }

        for (n_idx_row, row) in grid.rows.iter().enumerate() {
            for (n_idx_col, value) in row.iter().enumerate() {
                let format = if set_rows_underline.contains(&n_idx_row) {
                    &fmt_underline
                } else {
                    match value {
                        EnumCellValue::Number(n) if n.fract() == 0.0 => &fmt_integer,
                        EnumCellValue::Formula { .. } => &fmt_wrap,
                        EnumCellValue::String(s)
                            if set_cols_idx_wrap.contains(&n_idx_col) || s.contains('\n') =>
                        {
                            &fmt_wrap
                        }
                        _ => &fmt_text,
                    }
                };
                write_cell_with_format(worksheet, n_idx_row + 1, n_idx_col, value, format)?;
            }
        }

        if let Some(n_row_freeze) = options.row_freeze {
            worksheet.set_freeze_panes(cast_row_num(n_row_freeze)?, 0)?;
        }

        let dict_widths = resolve_column_widths(&grid.headers, &options.column_widths);
        for n_idx_col in 0..grid.width() {
            let n_width = match dict_widths.get(&n_idx_col) {
                Some(n_width) => *n_width,
                None if options.policy_autofit.if_enabled => {
                    derive_autofit_width(grid, n_idx_col, &options.policy_autofit) as f64
                }
                None => continue,
            };
            worksheet.set_column_width(cast_col_num(n_idx_col)?, n_width)?;
        }

        report.sheet_name = sheet_name_unique;
        report.cnt_rows = grid.height();
        for c_warning in &report.warnings {
            log::warn!("[{}] {c_warning}", report.sheet_name);
        }
        self.l_reports.push(report.clone());
        Ok(report)
    }

    fn derive_format(&self, key: EnumFmtKey) -> Format {
        self.dict_fmt.get(&key).cloned().unwrap_or_default()
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(name) {
            self.set_sheet_names_existing.insert(name.to_string());
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if !self.set_sheet_names_existing.contains(&candidate) {
                self.set_sheet_names_existing.insert(candidate.clone());
                return candidate;
            }
            n_idx += 1;
        }
    }
}

/// Write one grid into its own workbook at `path_file_out`.
pub fn write_grid_to_file(
    path_file_out: PathBuf,
    grid: &SpecSheetGrid,
    sheet_name: &str,
    options: &SpecXlsxSheetWriteOptions,
) -> Result<SpecXlsxReport, XlsxIoError> {
    let mut writer = XlsxWriter::with_default_formats(path_file_out);
    let report = writer.write_sheet(grid, sheet_name, options)?;
    writer.close()?;
    Ok(report)
}

fn derive_autofit_width(
    grid: &SpecSheetGrid,
    col_idx: usize,
    policy: &SpecAutofitCellsPolicy,
) -> usize {
    let n_rows_inspected = policy
        .height_body_inferred_max
        .map_or(grid.height(), |n_max| usize::min(n_max, grid.height()));

    let n_width_header = estimate_width_len(&EnumCellValue::String(grid.headers[col_idx].clone()));
    let n_width_body = grid.rows[..n_rows_inspected]
        .iter()
        .filter_map(|row| row.get(col_idx))
        .map(estimate_width_len)
        .max()
        .unwrap_or(0);

    let n_min = usize::max(1, policy.width_cell_min);
    let n_max = usize::min(255, usize::max(n_min, policy.width_cell_max));
    usize::min(
        n_max,
        usize::max(n_min, usize::max(n_width_header, n_width_body) + policy.width_cell_padding),
    )
}

fn validate_policy_autofit(policy_autofit: &SpecAutofitCellsPolicy) -> Result<(), XlsxIoError> {
    if policy_autofit.width_cell_min == 0 {
        return Err(XlsxIoError::Write(
            "policy_autofit.width_cell_min must be >= 1.".to_string(),
        ));
    }
    if policy_autofit.width_cell_max < policy_autofit.width_cell_min {
        return Err(XlsxIoError::Write(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min.".to_string(),
        ));
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), XlsxIoError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::Formula { formula, result } => {
            let formula = Formula::new(formula).set_result(result);
            worksheet.write_formula_with_format(n_row, n_col, formula, format)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }
    if spec.underline.unwrap_or(false) {
        format = format.set_underline(FormatUnderline::Single);
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxIoError> {
    u32::try_from(value).map_err(|_| XlsxIoError::Limit(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxIoError> {
    u16::try_from(value).map_err(|_| XlsxIoError::Limit(format!("column index overflow: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_small() -> SpecSheetGrid {
        let mut grid = SpecSheetGrid::new(&["Name", "Name", "Qty"]);
        grid.push_row(vec![
            EnumCellValue::text("Винт"),
            EnumCellValue::text("M3"),
            EnumCellValue::Number(4.0),
        ]);
        grid
    }

    #[test]
    fn test_write_sheet_dedups_names_and_reports() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = XlsxWriter::with_default_formats(dir.path().join("two.xlsx"));
        let options = SpecXlsxSheetWriteOptions::default();

        let report_first = writer.write_sheet(&grid_small(), "BOM", &options).expect("first");
        let report_second = writer.write_sheet(&grid_small(), "BOM", &options).expect("second");
        assert_eq!(report_first.sheet_name, "BOM");
        assert_eq!(report_second.sheet_name, "BOM__2");
        assert_eq!(report_first.cnt_rows, 1);
        assert!(report_first.warnings.iter().any(|w| w.contains("Duplicate")));
        assert_eq!(writer.report().len(), 2);

        writer.close().expect("close");
        writer.close().expect("close twice");
        assert!(dir.path().join("two.xlsx").exists());
    }

    #[test]
    fn test_write_sheet_after_close_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = XlsxWriter::with_default_formats(dir.path().join("closed.xlsx"));
        writer.close().expect("close");
        let err = writer
            .write_sheet(&grid_small(), "BOM", &SpecXlsxSheetWriteOptions::default())
            .expect_err("closed");
        assert!(matches!(err, XlsxIoError::Closed));
    }
}
