//! Domain models, stage reports and errors.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use bomkit_io_docx::DocxError;
use bomkit_io_xlsx::{EnumCellValue, XlsxIoError};
use serde::Deserialize;

////////////////////////////////////////////////////////////////////////////////
// #region Section

/// Grouping of BOM entries mirroring the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumSection {
    /// "Стандартные изделия".
    Standard,
    /// "Прочие изделия".
    Other,
}

impl EnumSection {
    /// Label written to the `Section` column.
    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Стандартные",
            Self::Other => "Прочие",
        }
    }

    /// Parse a `Section` cell; English labels are accepted too.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Стандартные" | "Standard" => Some(Self::Standard),
            "Прочие" | "Other" => Some(Self::Other),
            _ => None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Position

/// Item position label within a source table.
///
/// Ordering puts every number before every dash marker; dash markers compare
/// by label text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumPosition {
    /// Numeric line number.
    Number(u32),
    /// Dash marker (`-`, `–`, `—`).
    Dash(String),
}

impl EnumPosition {
    /// Cell written to the position column.
    pub fn to_cell(&self) -> EnumCellValue {
        match self {
            Self::Number(n) => EnumCellValue::Number(f64::from(*n)),
            Self::Dash(c_label) => EnumCellValue::text(c_label.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Category

/// Category enumeration in its fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumCategory {
    Fasteners,
    PowerSupplies,
    Fuses,
    Connectors,
    Semiconductors,
    Structural,
    Magnetics,
    Capacitors,
    Resistors,
    Indicators,
    Other,
}

/// Every category in classifier rule order.
pub const TUP_CATEGORY_ALL: [EnumCategory; 11] = [
    EnumCategory::Fasteners,
    EnumCategory::PowerSupplies,
    EnumCategory::Fuses,
    EnumCategory::Connectors,
    EnumCategory::Semiconductors,
    EnumCategory::Structural,
    EnumCategory::Magnetics,
    EnumCategory::Capacitors,
    EnumCategory::Resistors,
    EnumCategory::Indicators,
    EnumCategory::Other,
];

impl EnumCategory {
    /// Display label written to the `Category` column.
    pub fn label(self) -> &'static str {
        match self {
            Self::Fasteners => "Крепежные изделия",
            Self::PowerSupplies => "Источники питания (блоки питания из SV01)",
            Self::Fuses => "Предохранители",
            Self::Connectors => "Коммутирующие изделия (разъемы, реле)",
            Self::Semiconductors => "Полупроводниковые изделия",
            Self::Structural => {
                "Конструктивные элементы (шкаф, стойки резьбовые, кронштейн шрофф, ручка, втулки, шасси из главной сп)"
            }
            Self::Magnetics => "Моточные изделия (катушки, дроссели, трансформаторы)",
            Self::Capacitors => "Конденсаторы",
            Self::Resistors => "Резисторы",
            Self::Indicators => "Органы управления и индикации (светодиоды, лампы, кнопки)",
            Self::Other => "Прочие изделия",
        }
    }

    /// Map a label read back from a sheet.
    pub fn from_label(label: &str) -> Option<Self> {
        let c_label = label.trim();
        TUP_CATEGORY_ALL.into_iter().find(|cat| cat.label() == c_label)
    }
}

impl fmt::Display for EnumCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BomRecord

/// One extracted BOM line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecBomRecord {
    /// Module code of the source document.
    pub module: String,
    /// Section the item was listed under.
    pub section: EnumSection,
    /// Position label.
    pub position: EnumPosition,
    /// Whitespace-collapsed name.
    pub name: String,
    /// Last quoted substring of the name.
    pub manufacturer: String,
    /// Designator column text.
    pub part_number: String,
    /// Quantity; zero when not parsable.
    pub qty: u32,
    /// Comment column text.
    pub comment: String,
}

impl SpecBomRecord {
    /// Row cells in parse-stage column order.
    pub fn to_row(&self) -> Vec<EnumCellValue> {
        vec![
            EnumCellValue::text(self.module.clone()),
            EnumCellValue::text(self.section.label()),
            self.position.to_cell(),
            EnumCellValue::text(self.name.clone()),
            EnumCellValue::text(self.manufacturer.clone()),
            EnumCellValue::text(self.part_number.clone()),
            EnumCellValue::Number(f64::from(self.qty)),
            EnumCellValue::text(self.comment.clone()),
        ]
    }
}

/// Table extractor flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumExtractVariant {
    /// Numeric positions and quantities only; materials reset the section.
    Basic,
    /// Dash positions/quantities allowed; materials end the document.
    #[default]
    Extended,
}

impl FromStr for EnumExtractVariant {
    type Err = BomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "extended" => Ok(Self::Extended),
            other => Err(BomError::InvalidArgument(format!(
                "unknown extractor variant {other:?}; expected basic|extended"
            ))),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Report

/// Counters and diagnostics for one stage run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportStage {
    /// Stage name.
    pub stage: String,
    /// Input records (rows or extracted items).
    pub rows_in: usize,
    /// Body rows written.
    pub rows_out: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl ReportStage {
    /// Empty report for `stage`.
    pub fn new(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            ..Default::default()
        }
    }

    /// Record and log a warning.
    pub fn warn(&mut self, msg: impl Into<String>) {
        let c_msg = msg.into();
        log::warn!("[{}] {c_msg}", self.stage);
        self.warnings.push(c_msg);
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} rows_in={} rows_out={} warnings={}",
            self.rows_in,
            self.rows_out,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(&format!("[{}]", self.stage.to_uppercase())))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Fatal pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum BomError {
    #[error(transparent)]
    Xlsx(#[from] XlsxIoError),
    #[error(transparent)]
    Docx(#[from] DocxError),
    /// Configuration file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Configuration file is not valid TOML for the pipeline.
    #[error("Invalid config {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },
    /// Bad argument value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Output directory could not be created.
    #[error("Failed to create {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
