//! Stage runners: one file in, one file out.
//!
//! Every runner validates its input (file present, required columns) before
//! any processing, builds the whole output in memory and saves it once.

use std::path::{Path, PathBuf};

use bomkit_io_docx::{DocxError, read_docx_tables};
use bomkit_io_xlsx::{
    EnumCellValue, EnumColumnWidth, SpecSheetGrid, SpecXlsxSheetWriteOptions, XlsxIoError, read_sheet,
    write_grid_to_file,
};

use crate::classify::classify_name;
use crate::compress::compress_rows;
use crate::conf::{
    C_COL_CATEGORY, C_COL_NAME, C_COL_NAME_CLEAN, C_COL_QTY, C_COL_SUPPLY_DOC, C_REPORT_SHEET,
    N_CATEGORY_WIDTH, SpecPipelineConfig, SpecSourceDoc, SpecWrapLimits, TUP_COMPRESS_WIDTHS,
    TUP_PARSE_WIDTHS, TUP_REPORT_WIDTHS, TUP_WRAP_WIDTHS,
};
use crate::extract::{derive_parse_headers, extract_document_records, push_document_block};
use crate::paginate::paginate_report;
use crate::report::{SpecReportSheet, build_report};
use crate::sort::sort_rows_by_key;
use crate::spec::{BomError, EnumCategory, EnumExtractVariant, ReportStage};
use crate::split::split_name;

////////////////////////////////////////////////////////////////////////////////
// #region StageIo

/// Paths and sheet names of a sheet-to-sheet stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecStageIo {
    pub path_in: PathBuf,
    pub path_out: PathBuf,
    /// Input sheet; the first sheet is read when absent from the workbook.
    pub sheet_in: Option<String>,
    /// Output sheet name.
    pub sheet_out: String,
}

impl SpecStageIo {
    pub fn new(path_in: impl Into<PathBuf>, path_out: impl Into<PathBuf>, sheet: &str) -> Self {
        Self {
            path_in: path_in.into(),
            path_out: path_out.into(),
            sheet_in: Some(sheet.to_string()),
            sheet_out: sheet.to_string(),
        }
    }

    fn read(&self) -> Result<SpecSheetGrid, XlsxIoError> {
        read_sheet(&self.path_in, self.sheet_in.as_deref())
    }

    fn write(&self, grid: &SpecSheetGrid, options: &SpecXlsxSheetWriteOptions) -> Result<(), XlsxIoError> {
        write_grid_to_file(self.path_out.clone(), grid, &self.sheet_out, options)?;
        Ok(())
    }
}

fn derive_options_by_name(l_widths: &[(&str, f64)]) -> SpecXlsxSheetWriteOptions {
    SpecXlsxSheetWriteOptions {
        column_widths: l_widths
            .iter()
            .map(|(c_name, n_width)| EnumColumnWidth::ByName(c_name.to_string(), *n_width))
            .collect(),
        row_freeze: Some(1),
        ..Default::default()
    }
}

fn derive_options_by_index(l_widths: &[f64]) -> SpecXlsxSheetWriteOptions {
    SpecXlsxSheetWriteOptions {
        column_widths: l_widths
            .iter()
            .enumerate()
            .map(|(n_idx, n_width)| EnumColumnWidth::ByIndex(n_idx, *n_width))
            .collect(),
        ..Default::default()
    }
}

fn finish_stage(mut report: ReportStage, n_rows_out: usize, path_out: &Path) -> ReportStage {
    report.rows_out = n_rows_out;
    log::info!("{report} -> {}", path_out.display());
    report
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Stages

/// Extract BOM records from every source document into one sheet.
///
/// Documents are processed in the given order; each block is followed by a
/// blank row.
pub fn run_parse(
    l_sources: &[SpecSourceDoc],
    variant: EnumExtractVariant,
    path_out: &Path,
    sheet_name: &str,
) -> Result<ReportStage, BomError> {
    let mut report = ReportStage::new("parse");
    if l_sources.is_empty() {
        return Err(BomError::InvalidArgument("no source documents given".to_string()));
    }
    if let Some(source) = l_sources.iter().find(|s| !s.path.exists()) {
        return Err(BomError::Docx(DocxError::InputNotFound(source.path.clone())));
    }
    log::info!("[PARSE] {} documents, variant {variant:?}", l_sources.len());

    let mut grid = SpecSheetGrid::new(&derive_parse_headers(variant));
    for source in l_sources {
        let l_tables = read_docx_tables(&source.path)?;
        let l_records = extract_document_records(&l_tables, &source.module, variant);
        log::debug!(
            "{} [{}]: {} tables, {} records",
            source.path.display(),
            source.module,
            l_tables.len(),
            l_records.len()
        );
        if l_records.is_empty() {
            report.warn(format!("no items found in {}", source.path.display()));
        }
        report.rows_in += l_records.len();
        push_document_block(&mut grid, &l_records);
    }

    let options = derive_options_by_index(&TUP_PARSE_WIDTHS);
    write_grid_to_file(path_out.to_path_buf(), &grid, sheet_name, &options)?;
    Ok(finish_stage(report, grid.height(), path_out))
}

/// Fill the `Category` column from `Name`; blank rows stay blank.
pub fn run_classify(io: &SpecStageIo) -> Result<ReportStage, BomError> {
    let mut report = ReportStage::new("classify");
    let mut grid = io.read()?;
    let n_idx_name = grid.require_columns(&[C_COL_NAME])?[0];
    let if_added = grid.column_index(C_COL_CATEGORY).is_none();
    let n_idx_cat = grid.ensure_column(C_COL_CATEGORY);

    for n_row in 0..grid.height() {
        if grid.is_blank_row(n_row) {
            continue;
        }
        report.rows_in += 1;
        let category = classify_name(&grid.cell_text(n_row, n_idx_name));
        grid.rows[n_row][n_idx_cat] = EnumCellValue::text(category.label());
    }

    let mut options = derive_options_by_name(&[]);
    if if_added {
        options.column_widths.push(EnumColumnWidth::ByIndex(n_idx_cat, N_CATEGORY_WIDTH));
    }
    io.write(&grid, &options)?;
    Ok(finish_stage(report, grid.height(), &io.path_out))
}

/// Stable sort by the domain sort key.
pub fn run_sort(io: &SpecStageIo) -> Result<ReportStage, BomError> {
    let mut report = ReportStage::new("sort");
    let mut grid = io.read()?;
    report.rows_in = grid.height();
    let n_dropped = sort_rows_by_key(&mut grid)?;
    if n_dropped > 0 {
        log::debug!("[SORT] dropped {n_dropped} blank rows");
    }

    if let Some(n_idx_cat) = grid.column_index(C_COL_CATEGORY) {
        let n_unknown = (0..grid.height())
            .filter(|n_row| EnumCategory::from_label(&grid.cell_text(*n_row, n_idx_cat)).is_none())
            .count();
        if n_unknown > 0 {
            report.warn(format!("{n_unknown} rows carry an unknown category label"));
        }
    }

    io.write(&grid, &derive_options_by_name(&[]))?;
    Ok(finish_stage(report, grid.height(), &io.path_out))
}

/// Compress runs of equal names into position groups with subtotals.
pub fn run_compress(io: &SpecStageIo) -> Result<ReportStage, BomError> {
    let mut report = ReportStage::new("compress");
    let grid = io.read()?;
    report.rows_in = grid.height();
    let n_idx_qty = grid.require_columns(&[C_COL_NAME, C_COL_QTY])?[1];
    let n_bad_qty = (0..grid.height())
        .filter(|n_row| !grid.is_blank_row(*n_row))
        .filter_map(|n_row| grid.rows[n_row].get(n_idx_qty))
        .filter(|value| !value.is_blank() && value.to_i64().is_none())
        .count();
    if n_bad_qty > 0 {
        report.warn(format!("{n_bad_qty} quantities are not integers and count as 0"));
    }

    let grid_out = compress_rows(&grid)?;
    let mut options = derive_options_by_name(&TUP_COMPRESS_WIDTHS);
    options.cols_wrap.push(C_COL_QTY.to_string());
    io.write(&grid_out, &options)?;
    Ok(finish_stage(report, grid_out.height(), &io.path_out))
}

/// Split `Name` into `Name_Clean` and `SupplyDoc`.
pub fn run_split(io: &SpecStageIo) -> Result<ReportStage, BomError> {
    let mut report = ReportStage::new("split");
    let mut grid = io.read()?;
    let n_idx_name = grid.require_columns(&[C_COL_NAME])?[0];
    let n_idx_clean = grid.ensure_column(C_COL_NAME_CLEAN);
    let n_idx_supply = grid.ensure_column(C_COL_SUPPLY_DOC);

    for n_row in 0..grid.height() {
        let c_name = grid.cell_text(n_row, n_idx_name);
        if !c_name.trim().is_empty() {
            report.rows_in += 1;
        }
        let desc = split_name(&c_name);
        grid.rows[n_row][n_idx_clean] = EnumCellValue::text(desc.name_clean.clone());
        grid.rows[n_row][n_idx_supply] = EnumCellValue::text(desc.supply_doc());
    }

    let mut options = derive_options_by_name(&TUP_COMPRESS_WIDTHS);
    options.cols_wrap.push(C_COL_QTY.to_string());
    io.write(&grid, &options)?;
    Ok(finish_stage(report, grid.height(), &io.path_out))
}

fn write_report(io: &SpecStageIo, report_sheet: &SpecReportSheet, l_widths: &[f64]) -> Result<(), BomError> {
    let mut options = derive_options_by_index(l_widths);
    options.rows_underline = report_sheet.l_rows_underline.clone();
    io.write(&report_sheet.grid, &options)?;
    Ok(())
}

/// Build the purchased-items report sheet.
pub fn run_format(io: &SpecStageIo) -> Result<ReportStage, BomError> {
    let mut report = ReportStage::new("format");
    let grid = io.read()?;
    report.rows_in = grid.height();
    let report_sheet = build_report(&grid)?;
    write_report(io, &report_sheet, &TUP_REPORT_WIDTHS)?;
    Ok(finish_stage(report, report_sheet.grid.height(), &io.path_out))
}

/// Word-wrap the report across physical rows.
pub fn run_wrap(io: &SpecStageIo, limits: SpecWrapLimits) -> Result<ReportStage, BomError> {
    let mut report = ReportStage::new("wrap");
    if limits.name == 0 || limits.supply_doc == 0 || limits.comment == 0 {
        return Err(BomError::InvalidArgument(format!(
            "wrap limits must be positive, got {limits:?}"
        )));
    }
    let grid = io.read()?;
    report.rows_in = grid.height();
    let report_sheet = paginate_report(&grid, limits)?;
    write_report(io, &report_sheet, &TUP_WRAP_WIDTHS)?;
    Ok(finish_stage(report, report_sheet.grid.height(), &io.path_out))
}

/// Run every stage through intermediate files in `output_dir`.
pub fn run_pipeline(cfg: &SpecPipelineConfig) -> Result<Vec<ReportStage>, BomError> {
    std::fs::create_dir_all(&cfg.output_dir).map_err(|source| BomError::OutputDir {
        path: cfg.output_dir.clone(),
        source,
    })?;
    let files = &cfg.files;
    let c_sheet = cfg.sheet_name.as_str();
    let io_step = |c_in: &str, c_out: &str| SpecStageIo::new(cfg.path_out(c_in), cfg.path_out(c_out), c_sheet);

    let mut l_reports = vec![run_parse(&cfg.sources, cfg.variant, &cfg.path_out(&files.parsed), c_sheet)?];
    l_reports.push(run_classify(&io_step(&files.parsed, &files.categorized))?);
    l_reports.push(run_sort(&io_step(&files.categorized, &files.sorted))?);
    l_reports.push(run_compress(&io_step(&files.sorted, &files.compressed))?);
    l_reports.push(run_split(&io_step(&files.compressed, &files.split))?);

    let mut io_format = io_step(&files.split, &files.report);
    io_format.sheet_out = C_REPORT_SHEET.to_string();
    l_reports.push(run_format(&io_format)?);
    l_reports.push(run_wrap(
        &SpecStageIo::new(cfg.path_out(&files.report), cfg.path_out(&files.wrapped), C_REPORT_SHEET),
        cfg.wrap,
    )?);

    let n_warnings: usize = l_reports.iter().map(ReportStage::warning_count).sum();
    log::info!(
        "Pipeline finished: {} stages, {n_warnings} warnings, report at {}",
        l_reports.len(),
        cfg.path_out(&files.wrapped).display()
    );
    Ok(l_reports)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
