//! `bomkit_io_xlsx`:
//! XLSX read/write kernel for BOM pipeline stages.
//!
//! Modules:
//! - `conf`   : constants and default format presets
//! - `spec`   : grid model, options, reports, errors
//! - `util`   : pure helper functions
//! - `reader` : calamine-backed sheet loader
//! - `writer` : rust_xlsxwriter-backed writer kernel
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    EnumFmtKey, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL, derive_default_xlsx_formats,
};
pub use reader::read_sheet;
pub use spec::{
    EnumCellValue, EnumColumnWidth, SpecAutofitCellsPolicy, SpecCellFormat, SpecSheetGrid,
    SpecXlsxReport, SpecXlsxSheetWriteOptions, XlsxIoError,
};
pub use util::{
    derive_column_letter, derive_column_range_ref, derive_duplicate_columns,
    resolve_column_widths, sanitize_sheet_name,
};
pub use writer::{XlsxWriter, write_grid_to_file};
