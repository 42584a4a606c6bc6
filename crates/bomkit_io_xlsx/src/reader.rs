//! XLSX reader that loads one worksheet into a [`SpecSheetGrid`].

use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};

use crate::spec::{EnumCellValue, SpecSheetGrid, XlsxIoError};
use crate::util::derive_duplicate_columns;

/// Read `sheet_name` (or the first sheet) from a workbook.
///
/// The first row of the used range becomes the header row. Cells keep their
/// absolute column positions, so A1 references in stored formulas stay valid.
/// When `sheet_name` is given but absent, the first sheet is read instead and
/// a warning is logged.
pub fn read_sheet(path: &Path, sheet_name: Option<&str>) -> Result<SpecSheetGrid, XlsxIoError> {
    if !path.exists() {
        return Err(XlsxIoError::InputNotFound(path.to_path_buf()));
    }
    let convert_err = |err: calamine::Error| XlsxIoError::Read {
        path: path.to_path_buf(),
        message: err.to_string(),
    };

    let mut workbook = open_workbook_auto(path).map_err(convert_err)?;
    let l_sheet_names = workbook.sheet_names().to_vec();
    let c_sheet = match sheet_name {
        Some(c_name) if l_sheet_names.iter().any(|s| s == c_name) => c_name.to_string(),
        _ => {
            let c_first = l_sheet_names.first().cloned().ok_or_else(|| XlsxIoError::Read {
                path: path.to_path_buf(),
                message: "workbook has no sheets".to_string(),
            })?;
            if let Some(c_name) = sheet_name {
                log::warn!(
                    "sheet {c_name:?} not found in {}, reading {c_first:?}",
                    path.display()
                );
            }
            c_first
        }
    };

    let range = workbook.worksheet_range(&c_sheet).map_err(convert_err)?;
    let range_formula = match workbook.worksheet_formula(&c_sheet) {
        Ok(range_formula) => Some(range_formula),
        Err(err) => {
            log::debug!("no formulas read from {c_sheet:?}: {err}");
            None
        }
    };

    let grid = convert_range_to_grid(&range, range_formula.as_ref());
    if let Some(c_msg) = derive_duplicate_columns(&grid.headers) {
        log::warn!("[{c_sheet}] duplicate column names: {c_msg}");
    }
    log::debug!(
        "read {} rows x {} cols from {}:{c_sheet}",
        grid.height(),
        grid.width(),
        path.display()
    );
    Ok(grid)
}

fn convert_range_to_grid(range: &Range<Data>, range_formula: Option<&Range<String>>) -> SpecSheetGrid {
    let Some((n_row_start, n_col_start)) = range.start() else {
        return SpecSheetGrid::default();
    };
    let (n_height, n_width_used) = range.get_size();
    let n_width = n_col_start as usize + n_width_used;

    let derive_cell = |n_row: u32, n_col: u32| -> EnumCellValue {
        let value = range
            .get_value((n_row, n_col))
            .map(convert_data_to_cell)
            .unwrap_or(EnumCellValue::None);
        let c_formula = range_formula
            .and_then(|rf| rf.get_value((n_row, n_col)))
            .filter(|f| !f.is_empty());
        match c_formula {
            Some(c_formula) => EnumCellValue::Formula {
                formula: if c_formula.starts_with('=') {
                    c_formula.clone()
                } else {
                    format!("={c_formula}")
                },
                result: value.to_text(),
            },
            None => value,
        }
    };

    let headers: Vec<String> = (0..n_width as u32)
        .map(|n_col| derive_cell(n_row_start, n_col).to_text().trim().to_string())
        .collect();
    let mut grid = SpecSheetGrid {
        headers,
        rows: Vec::with_capacity(n_height.saturating_sub(1)),
    };
    for n_off in 1..n_height as u32 {
        let n_row = n_row_start + n_off;
        let row = (0..n_width as u32).map(|n_col| derive_cell(n_row, n_col)).collect();
        grid.push_row(row);
    }
    grid
}

fn convert_data_to_cell(data: &Data) -> EnumCellValue {
    match data {
        Data::Empty => EnumCellValue::None,
        Data::String(s) => EnumCellValue::text(s.clone()),
        Data::Float(f) => EnumCellValue::Number(*f),
        Data::Int(i) => EnumCellValue::Number(*i as f64),
        Data::Bool(b) => EnumCellValue::String(b.to_string()),
        Data::DateTime(dt) => EnumCellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => EnumCellValue::text(s.clone()),
        Data::Error(e) => EnumCellValue::String(format!("#ERR:{e:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecXlsxSheetWriteOptions;
    use crate::writer::write_grid_to_file;

    #[test]
    fn test_read_sheet_missing_file() {
        let err = read_sheet(Path::new("/nonexistent/bom.xlsx"), None).expect_err("missing");
        assert!(matches!(err, XlsxIoError::InputNotFound(_)));
    }

    #[test]
    fn test_write_then_read_keeps_formula_and_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bom.xlsx");

        let mut grid = SpecSheetGrid::new(&["Module", "Name", "Qty"]);
        grid.push_row(vec![
            EnumCellValue::text("A1"),
            EnumCellValue::text("Резистор R1"),
            EnumCellValue::Number(2.0),
        ]);
        grid.push_row(vec![
            EnumCellValue::text("A2"),
            EnumCellValue::None,
            EnumCellValue::Number(3.0),
        ]);
        grid.push_row(vec![
            EnumCellValue::None,
            EnumCellValue::None,
            EnumCellValue::Formula {
                formula: "=REPT(\"_\",4)&CHAR(10)&SUM(C2:C3)".to_string(),
                result: "____\n5".to_string(),
            },
        ]);
        write_grid_to_file(path.clone(), &grid, "BOM", &SpecXlsxSheetWriteOptions::default())
            .expect("write");

        let grid_read = read_sheet(&path, Some("BOM")).expect("read");
        assert_eq!(grid_read.headers, grid.headers);
        assert_eq!(grid_read.height(), 3);
        assert_eq!(grid_read.cell_text(0, 1), "Резистор R1");
        assert_eq!(grid_read.rows[1][2].to_i64(), Some(3));
        match &grid_read.rows[2][2] {
            EnumCellValue::Formula { formula, result } => {
                assert!(formula.contains("SUM(C2:C3)"));
                assert_eq!(result, "____\n5");
            }
            other => panic!("expected formula, got {other:?}"),
        }
    }

    #[test]
    fn test_read_sheet_falls_back_to_first_sheet() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("one.xlsx");
        let mut grid = SpecSheetGrid::new(&["Name"]);
        grid.push_row(vec![EnumCellValue::text("Винт")]);
        write_grid_to_file(path.clone(), &grid, "Sheet1", &SpecXlsxSheetWriteOptions::default())
            .expect("write");

        let grid_read = read_sheet(&path, Some("BOM")).expect("read");
        assert_eq!(grid_read.cell_text(0, 0), "Винт");
    }
}
