//! `bomkit_bom`:
//! BOM pipeline from specification tables to the purchased-items report.
//!
//! Stages, each one file in and one file out:
//! parse -> classify -> sort -> compress -> split -> format -> wrap.
//!
//! Modules:
//! - `spec`     : domain enums, records, stage report, errors
//! - `conf`     : column names, widths, pipeline configuration
//! - `util`     : text helpers and natural-order keys
//! - `unit`     : numeric extractors (fastener, resistance, capacitance, ...)
//! - `classify` : ordered regex category rules
//! - `sort`     : domain sort key
//! - `extract`  : table extractor state machine
//! - `compress` : name-run compression with subtotals
//! - `split`    : name / supply-document splitter
//! - `report`   : report sheet builder
//! - `paginate` : word-wrap pagination of the report
//! - `stage`    : file-level stage runners and the whole pipeline
pub mod classify;
pub mod compress;
pub mod conf;
pub mod extract;
pub mod paginate;
pub mod report;
pub mod sort;
pub mod spec;
pub mod split;
pub mod stage;
pub mod unit;
pub mod util;

pub use classify::classify_name;
pub use compress::compress_rows;
pub use conf::{SpecPipelineConfig, SpecSourceDoc, SpecStageFiles, SpecWrapLimits, load_pipeline_config};
pub use extract::{SpecExtractor, extract_document_records};
pub use paginate::{paginate_report, words_wrap};
pub use report::{SpecReportSheet, build_report};
pub use sort::{SpecSortKey, derive_sort_key, sort_rows_by_key};
pub use spec::{
    BomError, EnumCategory, EnumExtractVariant, EnumPosition, EnumSection, ReportStage,
    SpecBomRecord,
};
pub use split::{SpecDescriptor, split_name};
pub use stage::{
    SpecStageIo, run_classify, run_compress, run_format, run_parse, run_pipeline, run_sort,
    run_split, run_wrap,
};
