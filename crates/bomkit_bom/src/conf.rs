//! Column names, layout constants and the pipeline configuration file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::spec::{BomError, EnumExtractVariant};

////////////////////////////////////////////////////////////////////////////////
// #region Columns

pub const C_COL_MODULE: &str = "Module";
pub const C_COL_SECTION: &str = "Section";
pub const C_COL_POS: &str = "Pos";
pub const C_COL_POS_TEXT: &str = "PosText";
pub const C_COL_NAME: &str = "Name";
pub const C_COL_MANUFACTURER: &str = "Manufacturer";
pub const C_COL_PART_NUMBER: &str = "PartNumber";
pub const C_COL_QTY: &str = "Qty";
pub const C_COL_COMMENT: &str = "Comment";
pub const C_COL_CATEGORY: &str = "Category";
pub const C_COL_NAME_CLEAN: &str = "Name_Clean";
pub const C_COL_SUPPLY_DOC: &str = "SupplyDoc";

/// Columns kept on repeat rows of a compressed group.
pub const TUP_COMPRESS_KEEP_COLUMNS: [&str; 4] = [C_COL_MODULE, C_COL_POS_TEXT, C_COL_POS, C_COL_QTY];

/// Underscores drawn above a subtotal.
pub const N_RULE_LEN: usize = 4;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Widths

/// Parse-stage widths in column order.
pub const TUP_PARSE_WIDTHS: [f64; 8] = [16.0, 14.0, 6.0, 60.0, 28.0, 28.0, 6.0, 60.0];
/// Width of an added `Category` column.
pub const N_CATEGORY_WIDTH: f64 = 45.0;
/// Width of an added `Name_Clean` column.
pub const N_NAME_CLEAN_WIDTH: f64 = 60.0;
/// Width of an added `SupplyDoc` column.
pub const N_SUPPLY_DOC_WIDTH: f64 = 55.0;
/// Compress-stage widths by header name.
pub const TUP_COMPRESS_WIDTHS: [(&str, f64); 11] = [
    (C_COL_MODULE, 16.0),
    (C_COL_SECTION, 14.0),
    (C_COL_POS_TEXT, 8.0),
    (C_COL_CATEGORY, 22.0),
    (C_COL_NAME, 60.0),
    (C_COL_MANUFACTURER, 28.0),
    (C_COL_PART_NUMBER, 28.0),
    (C_COL_QTY, 8.0),
    (C_COL_COMMENT, 60.0),
    (C_COL_SUPPLY_DOC, N_SUPPLY_DOC_WIDTH),
    (C_COL_NAME_CLEAN, N_NAME_CLEAN_WIDTH),
];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Report

/// Report sheet name.
pub const C_REPORT_SHEET: &str = "ВП";
/// Report headers.
pub const TUP_REPORT_HEADERS: [&str; 10] = [
    "Наименование",
    "Код продукции",
    "Обозначение документа на поставку",
    "Поставщик",
    "Куда входит (обозначение)",
    "на изделие",
    "в комплекты",
    "на регулир.",
    "Всего",
    "Примечание",
];
pub const N_REPORT_COL_NAME: usize = 0;
pub const N_REPORT_COL_SUPPLY_DOC: usize = 2;
pub const N_REPORT_COL_MODULE: usize = 4;
pub const N_REPORT_COL_QTY: usize = 5;
pub const N_REPORT_COL_TOTAL: usize = 8;
pub const N_REPORT_COL_COMMENT: usize = 9;
/// Report widths built by the format stage.
pub const TUP_REPORT_WIDTHS: [f64; 10] = [55.0, 14.0, 45.0, 22.0, 22.0, 10.0, 10.0, 10.0, 12.0, 35.0];
/// Report widths after wrapping.
pub const TUP_WRAP_WIDTHS: [f64; 10] = [
    38.77734375,
    20.33203125,
    33.0,
    27.44140625,
    36.33203125,
    8.5546875,
    8.5546875,
    8.5546875,
    12.77734375,
    12.77734375,
];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PipelineConfig

/// One source document and its module code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpecSourceDoc {
    pub path: PathBuf,
    pub module: String,
}

/// Output file names of each stage, relative to `output_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecStageFiles {
    pub parsed: String,
    pub categorized: String,
    pub sorted: String,
    pub compressed: String,
    pub split: String,
    pub report: String,
    pub wrapped: String,
}

impl Default for SpecStageFiles {
    fn default() -> Self {
        Self {
            parsed: "BOMs_parsed.xlsx".to_string(),
            categorized: "BOM_with_category.xlsx".to_string(),
            sorted: "BOM_sorted.xlsx".to_string(),
            compressed: "BOM_compressed_by_name.xlsx".to_string(),
            split: "BOM_split.xlsx".to_string(),
            report: "Vedomost_pokupnyh.xlsx".to_string(),
            wrapped: "Vedomost_pokupnyh_wrapped.xlsx".to_string(),
        }
    }
}

/// Maximum characters per wrapped line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecWrapLimits {
    pub name: usize,
    pub supply_doc: usize,
    pub comment: usize,
}

impl Default for SpecWrapLimits {
    fn default() -> Self {
        Self {
            name: 38,
            supply_doc: 33,
            comment: 12,
        }
    }
}

/// Whole-pipeline configuration read from TOML.
///
/// ```toml
/// variant = "extended"
/// output_dir = "out"
///
/// [[sources]]
/// path = "КОР-01.10.000 Спецификация.docx"
/// module = "КОР-01.10.000"
///
/// [wrap]
/// comment = 14
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpecPipelineConfig {
    /// Documents in processing order.
    pub sources: Vec<SpecSourceDoc>,
    pub variant: EnumExtractVariant,
    pub output_dir: PathBuf,
    /// Sheet name of intermediate workbooks.
    pub sheet_name: String,
    pub files: SpecStageFiles,
    pub wrap: SpecWrapLimits,
}

impl Default for SpecPipelineConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            variant: EnumExtractVariant::default(),
            output_dir: PathBuf::from("."),
            sheet_name: "BOM".to_string(),
            files: SpecStageFiles::default(),
            wrap: SpecWrapLimits::default(),
        }
    }
}

impl SpecPipelineConfig {
    /// Parse TOML text; relative paths are resolved against `dir_base`.
    pub fn from_toml_str(content: &str, dir_base: &Path) -> Result<Self, toml::de::Error> {
        let mut cfg: Self = toml::from_str(content)?;
        cfg.output_dir = resolve_path(dir_base, &cfg.output_dir);
        for source in &mut cfg.sources {
            source.path = resolve_path(dir_base, &source.path);
        }
        Ok(cfg)
    }

    /// Path of a stage output file.
    pub fn path_out(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

/// Load the configuration file; paths inside are relative to its directory.
pub fn load_pipeline_config(path: &Path) -> Result<SpecPipelineConfig, BomError> {
    let content = std::fs::read_to_string(path).map_err(|source| BomError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let dir_base = path.parent().unwrap_or_else(|| Path::new("."));
    SpecPipelineConfig::from_toml_str(&content, dir_base).map_err(|err| BomError::ConfigParse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

fn resolve_path(dir_base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir_base.join(path)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
