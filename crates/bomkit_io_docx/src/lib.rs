//! `bomkit_io_docx`:
//! table reader for `.docx` specification documents.
//!
//! - `spec`   : table model and errors
//! - `reader` : zip + quick-xml walker over `word/document.xml`
pub mod reader;
pub mod spec;

pub use reader::{parse_document_xml_tables, read_docx_tables, read_docx_tables_from_reader};
pub use spec::{DocxError, SpecDocxTable};
