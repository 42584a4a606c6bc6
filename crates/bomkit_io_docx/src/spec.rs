//! DOCX table models and errors.

use std::path::PathBuf;

/// One top-level document table as rows of logical cell text.
///
/// A cell spanning `n` grid columns contributes its text `n` times, so every
/// row is as wide as the table grid. Continuation cells of a vertical merge
/// read as empty text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecDocxTable {
    /// Table rows in document order.
    pub rows: Vec<Vec<String>>,
}

impl SpecDocxTable {
    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

/// Fatal DOCX read errors.
#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    /// Input document does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),
    /// File could not be opened.
    #[error("Failed to open {}: {source}", path.display())]
    Io {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Container is not a readable ZIP archive.
    #[error("Failed to open DOCX as ZIP: {0}")]
    Archive(#[from] zip::result::ZipError),
    /// Archive lacks the main document part.
    #[error("Missing word/document.xml")]
    MissingDocumentXml,
    /// Main document part is not valid XML.
    #[error("XML error at byte {position}: {message}")]
    Xml {
        /// Reader position when the error occurred.
        position: usize,
        /// Underlying parser error text.
        message: String,
    },
}
