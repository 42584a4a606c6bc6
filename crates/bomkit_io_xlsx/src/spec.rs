//! Shared XLSX specification models.

use std::path::PathBuf;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification; every field is an optional override.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Single underline.
    pub underline: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Normalized cell value during read/transform/write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Formula with the cached display result stored alongside it.
    Formula {
        /// Formula text, starting with `=`.
        formula: String,
        /// Cached result shown by readers that do not recalculate.
        result: String,
    },
}

impl EnumCellValue {
    /// Build a text cell, mapping empty text to [`EnumCellValue::None`].
    pub fn text(value: impl Into<String>) -> Self {
        let c_value = value.into();
        if c_value.is_empty() {
            Self::None
        } else {
            Self::String(c_value)
        }
    }

    /// Displayed text of the cell (formula cells show their cached result).
    pub fn to_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::String(val) => val.clone(),
            Self::Number(val) => {
                if val.fract() == 0.0 && val.is_finite() && val.abs() < 1e15 {
                    format!("{}", *val as i64)
                } else {
                    val.to_string()
                }
            }
            Self::Formula { result, .. } => result.clone(),
        }
    }

    /// True when the cell displays nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::None => true,
            Self::String(val) => val.trim().is_empty(),
            Self::Number(_) => false,
            Self::Formula { .. } => false,
        }
    }

    /// Integer reading of the cell: numbers and integer-looking text.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Self::Number(val) if val.is_finite() => Some(*val as i64),
            Self::String(val) => {
                let c_val = val.trim();
                c_val
                    .parse::<i64>()
                    .ok()
                    .or_else(|| c_val.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
            }
            _ => None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetGrid

/// One worksheet as a header row plus body rows addressed by header name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetGrid {
    /// Header names, trimmed.
    pub headers: Vec<String>,
    /// Body rows; every row has exactly `headers.len()` cells.
    pub rows: Vec<Vec<EnumCellValue>>,
}

impl SpecSheetGrid {
    /// Create an empty grid with the given headers.
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.as_ref().trim().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Number of body rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Zero-based index of the first column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Resolve all `names` or fail listing every missing one.
    pub fn require_columns(&self, names: &[&str]) -> Result<Vec<usize>, XlsxIoError> {
        let l_missing: Vec<String> = names
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !l_missing.is_empty() {
            return Err(XlsxIoError::MissingColumns {
                missing: l_missing,
                headers: self.headers.clone(),
            });
        }
        Ok(names
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect())
    }

    /// Return the index of `name`, appending an empty column when absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(n_idx) = self.column_index(name) {
            return n_idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(EnumCellValue::None);
        }
        self.headers.len() - 1
    }

    /// Append one row, padding or truncating it to the grid width.
    pub fn push_row(&mut self, mut row: Vec<EnumCellValue>) {
        row.resize(self.width(), EnumCellValue::None);
        self.rows.push(row);
    }

    /// Append one all-blank row.
    pub fn push_blank_row(&mut self) {
        self.rows.push(vec![EnumCellValue::None; self.width()]);
    }

    /// Displayed text of a cell; out-of-range cells read as empty.
    pub fn cell_text(&self, row_idx: usize, col_idx: usize) -> String {
        self.rows
            .get(row_idx)
            .and_then(|row| row.get(col_idx))
            .map(EnumCellValue::to_text)
            .unwrap_or_default()
    }

    /// True when every cell in the row is blank.
    pub fn is_blank_row(&self, row_idx: usize) -> bool {
        self.rows
            .get(row_idx)
            .is_none_or(|row| row.iter().all(EnumCellValue::is_blank))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetWriteOptions

/// Column width assignment by header name or by zero-based index.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumColumnWidth {
    /// Width for the column whose header equals the name; ignored if absent.
    ByName(String, f64),
    /// Width for the column at the index.
    ByIndex(usize, f64),
}

/// Per-sheet write options.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecXlsxSheetWriteOptions {
    /// Explicit column widths; columns not listed fall back to autofit.
    pub column_widths: Vec<EnumColumnWidth>,
    /// Columns whose cells use the wrap-text format.
    pub cols_wrap: Vec<String>,
    /// Body rows (zero-based) written with the underlined text format.
    pub rows_underline: Vec<usize>,
    /// Frozen row count; `None` freezes nothing.
    pub row_freeze: Option<usize>,
    /// Autofit policy for columns without explicit width.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

/// Autofit policy for per-sheet write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Enable width inference for columns without explicit width.
    pub if_enabled: bool,
    /// Max body rows inspected.
    pub height_body_inferred_max: Option<usize>,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            if_enabled: true,
            height_body_inferred_max: Some(20_000),
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportAndErrors

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Unique sheet name actually used in the workbook.
    pub sheet_name: String,
    /// Body rows written.
    pub cnt_rows: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

/// Fatal workbook read/write errors.
#[derive(Debug, thiserror::Error)]
pub enum XlsxIoError {
    /// Input workbook does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),
    /// Workbook could not be opened or parsed.
    #[error("Failed to read workbook {}: {message}", path.display())]
    Read {
        /// Workbook path.
        path: PathBuf,
        /// Underlying reader error text.
        message: String,
    },
    /// Required header names are absent.
    #[error("Missing required columns {missing:?}. Headers: {headers:?}")]
    MissingColumns {
        /// Names not found.
        missing: Vec<String>,
        /// Headers actually present.
        headers: Vec<String>,
    },
    /// Grid shape exceeds worksheet limits.
    #[error("Excel limit exceeded: {0}")]
    Limit(String),
    /// rust_xlsxwriter failure.
    #[error("xlsx write error: {0}")]
    Write(String),
    /// Write attempted after the workbook was saved.
    #[error("Cannot write after close().")]
    Closed,
}

impl From<rust_xlsxwriter::XlsxError> for XlsxIoError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Write(err.to_string())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_columns_lists_every_missing_name() {
        let grid = SpecSheetGrid::new(&["Module", "Name", "Qty"]);
        let err = grid
            .require_columns(&["Name", "Category", "SupplyDoc"])
            .expect_err("missing columns");
        match err {
            XlsxIoError::MissingColumns { missing, headers } => {
                assert_eq!(missing, vec!["Category".to_string(), "SupplyDoc".to_string()]);
                assert_eq!(headers.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(grid.require_columns(&["Qty", "Module"]).expect("present"), vec![2, 0]);
    }

    #[test]
    fn test_ensure_column_pads_existing_rows() {
        let mut grid = SpecSheetGrid::new(&["Name"]);
        grid.push_row(vec![EnumCellValue::text("Винт")]);
        let n_idx = grid.ensure_column("Category");
        assert_eq!(n_idx, 1);
        assert_eq!(grid.rows[0].len(), 2);
        assert_eq!(grid.ensure_column("Name"), 0);
    }

    #[test]
    fn test_cell_value_text_and_integer_readings() {
        assert_eq!(EnumCellValue::Number(6.0).to_text(), "6");
        assert_eq!(EnumCellValue::Number(2.5).to_text(), "2.5");
        assert_eq!(EnumCellValue::String(" 12 ".into()).to_i64(), Some(12));
        assert_eq!(EnumCellValue::String("abc".into()).to_i64(), None);
        let total = EnumCellValue::Formula {
            formula: "=SUM(A1:A2)".into(),
            result: "3".into(),
        };
        assert_eq!(total.to_text(), "3");
        assert!(!total.is_blank());
        assert!(EnumCellValue::String("  ".into()).is_blank());
    }
}
