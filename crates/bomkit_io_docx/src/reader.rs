//! Table walker over `word/document.xml`.
//!
//! Only top-level tables are returned. Text of nested tables is skipped, the
//! paragraphs of a cell are joined with `\n`, `w:tab` reads as `\t` and
//! `w:br`/`w:cr` read as `\n`.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::spec::{DocxError, SpecDocxTable};

/// Read all top-level tables of a `.docx` file.
pub fn read_docx_tables(path: &Path) -> Result<Vec<SpecDocxTable>, DocxError> {
    if !path.exists() {
        return Err(DocxError::InputNotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| DocxError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let l_tables = read_docx_tables_from_reader(BufReader::new(file))?;
    log::debug!("{}: {} tables", path.display(), l_tables.len());
    Ok(l_tables)
}

/// Read all top-level tables from any seekable `.docx` byte source.
pub fn read_docx_tables_from_reader<R: Read + Seek>(
    reader: R,
) -> Result<Vec<SpecDocxTable>, DocxError> {
    let mut archive = ZipArchive::new(reader)?;
    let xml_content = {
        let mut document_xml = match archive.by_name("word/document.xml") {
            Ok(document_xml) => document_xml,
            Err(ZipError::FileNotFound) => return Err(DocxError::MissingDocumentXml),
            Err(err) => return Err(err.into()),
        };
        let mut content = String::new();
        document_xml
            .read_to_string(&mut content)
            .map_err(|err| DocxError::Archive(err.into()))?;
        content
    };
    parse_document_xml_tables(&xml_content)
}

/// Walk a `word/document.xml` payload and collect its top-level tables.
pub fn parse_document_xml_tables(xml: &str) -> Result<Vec<SpecDocxTable>, DocxError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut walker = DocxTableWalker::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => walker.handle_start(&e),
            Ok(Event::Empty(e)) => walker.handle_empty(&e),
            Ok(Event::End(e)) => walker.handle_end(e.name().as_ref()),
            Ok(Event::Text(e)) => {
                if walker.if_accepting_text() {
                    let text = e.unescape().map_err(|err| DocxError::Xml {
                        position: reader.buffer_position(),
                        message: err.to_string(),
                    })?;
                    walker.push_text(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(DocxError::Xml {
                    position: reader.buffer_position(),
                    message: err.to_string(),
                });
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(walker.l_tables)
}

////////////////////////////////////////////////////////////////////////////////
// #region Walker

#[derive(Debug, Default)]
struct SpecCellBuffer {
    l_paragraphs: Vec<String>,
    c_paragraph: String,
    n_span: usize,
    if_merge_continue: bool,
}

impl SpecCellBuffer {
    fn new() -> Self {
        Self {
            n_span: 1,
            ..Default::default()
        }
    }

    fn finish(mut self) -> (String, usize) {
        if !self.c_paragraph.is_empty() {
            self.l_paragraphs.push(std::mem::take(&mut self.c_paragraph));
        }
        let c_text = if self.if_merge_continue {
            String::new()
        } else {
            self.l_paragraphs.join("\n")
        };
        (c_text, usize::max(1, self.n_span))
    }
}

#[derive(Debug, Default)]
struct DocxTableWalker {
    l_tables: Vec<SpecDocxTable>,
    n_depth_tbl: usize,
    table_cur: SpecDocxTable,
    row_cur: Option<Vec<String>>,
    cell_cur: Option<SpecCellBuffer>,
    if_in_run: bool,
    if_in_text: bool,
}

impl DocxTableWalker {
    fn if_in_top_cell(&self) -> bool {
        self.n_depth_tbl == 1 && self.cell_cur.is_some()
    }

    fn if_accepting_text(&self) -> bool {
        self.if_in_text && self.if_in_top_cell()
    }

    fn push_text(&mut self, text: &str) {
        if let Some(cell) = self.cell_cur.as_mut() {
            cell.c_paragraph.push_str(text);
        }
    }

    fn handle_start(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"w:tbl" => {
                self.n_depth_tbl += 1;
                if self.n_depth_tbl == 1 {
                    self.table_cur = SpecDocxTable::default();
                }
            }
            b"w:tr" if self.n_depth_tbl == 1 => {
                self.row_cur = Some(Vec::new());
            }
            b"w:tc" if self.n_depth_tbl == 1 => {
                self.cell_cur = Some(SpecCellBuffer::new());
            }
            b"w:r" if self.if_in_top_cell() => {
                self.if_in_run = true;
            }
            b"w:t" if self.if_in_top_cell() => {
                self.if_in_text = true;
            }
            b"w:p" => {}
            _ => self.handle_empty(e),
        }
    }

    fn handle_empty(&mut self, e: &BytesStart<'_>) {
        if !self.if_in_top_cell() {
            return;
        }
        let Some(cell) = self.cell_cur.as_mut() else {
            return;
        };
        match e.name().as_ref() {
            b"w:gridSpan" => {
                if let Some(n_span) = get_attr(e, b"w:val").and_then(|v| v.parse().ok()) {
                    cell.n_span = n_span;
                }
            }
            b"w:vMerge" => {
                cell.if_merge_continue =
                    get_attr(e, b"w:val").is_none_or(|v| v != "restart");
            }
            b"w:tab" if self.if_in_run => cell.c_paragraph.push('\t'),
            b"w:br" | b"w:cr" if self.if_in_run => cell.c_paragraph.push('\n'),
            b"w:p" => cell.l_paragraphs.push(String::new()),
            _ => {}
        }
    }

    fn handle_end(&mut self, name: &[u8]) {
        match name {
            b"w:tbl" => {
                if self.n_depth_tbl == 1 {
                    let table = std::mem::take(&mut self.table_cur);
                    if table.height() > 0 {
                        self.l_tables.push(table);
                    }
                }
                self.n_depth_tbl = self.n_depth_tbl.saturating_sub(1);
            }
            b"w:tr" if self.n_depth_tbl == 1 => {
                if let Some(row) = self.row_cur.take() {
                    self.table_cur.rows.push(row);
                }
            }
            b"w:tc" if self.n_depth_tbl == 1 => {
                if let Some(cell) = self.cell_cur.take() {
                    let (c_text, n_span) = cell.finish();
                    if let Some(row) = self.row_cur.as_mut() {
                        row.extend(std::iter::repeat_n(c_text, n_span));
                    }
                }
            }
            b"w:p" if self.if_in_top_cell() => {
                if let Some(cell) = self.cell_cur.as_mut() {
                    let c_paragraph = std::mem::take(&mut cell.c_paragraph);
                    cell.l_paragraphs.push(c_paragraph);
                }
            }
            b"w:r" => self.if_in_run = false,
            b"w:t" => self.if_in_text = false,
            _ => {}
        }
    }
}

fn get_attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .find(|a| a.as_ref().ok().map(|x| x.key.as_ref()) == Some(key))
        .and_then(Result::ok)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
