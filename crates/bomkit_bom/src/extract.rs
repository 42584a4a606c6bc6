//! Table extractor: a finite-state machine over document table rows.
//!
//! Rows are classified first ([`derive_row_kind`]), then a pure transition
//! ([`derive_next_state`]) moves the machine and hands back any item that the
//! row closed. [`SpecExtractor`] drives both over the tables of one document.

use std::sync::LazyLock;

use bomkit_io_docx::SpecDocxTable;
use bomkit_io_xlsx::SpecSheetGrid;
use regex::Regex;

use crate::conf::{
    C_COL_COMMENT, C_COL_MANUFACTURER, C_COL_MODULE, C_COL_NAME, C_COL_PART_NUMBER, C_COL_POS,
    C_COL_POS_TEXT, C_COL_QTY, C_COL_SECTION,
};
use crate::spec::{EnumExtractVariant, EnumPosition, EnumSection, SpecBomRecord};
use crate::util::clean_text;

const TUP_SENTINEL_STANDARD: [&str; 2] = ["Стандартные изделия", "Standard items"];
const TUP_SENTINEL_OTHER: [&str; 2] = ["Прочие изделия", "Other items"];
const TUP_SENTINEL_TERMINAL: [&str; 4] = ["Документация", "Детали", "Documentation", "Details"];
const TUP_SENTINEL_MATERIALS: [&str; 2] = ["Материалы", "Materials"];
const TUP_HEADER_MARKS: [(&str, &str); 2] = [("Формат", "Поз."), ("Format", "Pos")];

static RE_POSITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}$").expect("valid position regex"));
static RE_QTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,4}$").expect("valid quantity regex"));
static RE_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-–—]$").expect("valid dash regex"));
static RE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["“”«»](.+?)["“”«»]"#).expect("valid quote regex"));

////////////////////////////////////////////////////////////////////////////////
// #region RowModel

/// One table row in logical column order, cells cleaned and padded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTableRow {
    pub format: String,
    pub zone: String,
    pub position: String,
    pub designator: String,
    pub name: String,
    pub qty: String,
    pub comment: String,
    /// All cells joined with one space.
    pub text: String,
}

impl SpecTableRow {
    /// Build from raw cell texts; short rows are padded, extra cells only
    /// contribute to [`Self::text`].
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Self {
        let l_cells: Vec<String> = cells.iter().map(|c| clean_text(c.as_ref())).collect();
        let text = l_cells.join(" ");
        let cell_at = |n_idx: usize| l_cells.get(n_idx).cloned().unwrap_or_default();
        Self {
            format: cell_at(0),
            zone: cell_at(1),
            position: cell_at(2),
            designator: cell_at(3),
            name: cell_at(4),
            qty: cell_at(5),
            comment: cell_at(6),
            text,
        }
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// What a row means to the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumRowKind {
    Blank,
    SectionStart(EnumSection),
    /// Documentation/details, and materials for the basic variant.
    Terminal,
    /// Materials under the extended variant: nothing after it is read.
    EndOfDocument,
    Header,
    ItemStart { position: EnumPosition, qty: u32 },
    Plain,
}

/// Classify one row. Sentinels are matched as substrings of the joined row.
pub fn derive_row_kind(row: &SpecTableRow, variant: EnumExtractVariant) -> EnumRowKind {
    if row.is_blank() {
        return EnumRowKind::Blank;
    }
    let c_text = row.text.as_str();
    if TUP_SENTINEL_STANDARD.iter().any(|s| c_text.contains(s)) {
        return EnumRowKind::SectionStart(EnumSection::Standard);
    }
    if TUP_SENTINEL_OTHER.iter().any(|s| c_text.contains(s)) {
        return EnumRowKind::SectionStart(EnumSection::Other);
    }
    if TUP_SENTINEL_TERMINAL.iter().any(|s| c_text.contains(s)) {
        return EnumRowKind::Terminal;
    }
    if TUP_SENTINEL_MATERIALS.iter().any(|s| c_text.contains(s)) {
        return match variant {
            EnumExtractVariant::Basic => EnumRowKind::Terminal,
            EnumExtractVariant::Extended => EnumRowKind::EndOfDocument,
        };
    }
    if TUP_HEADER_MARKS
        .iter()
        .any(|(c_a, c_b)| c_text.contains(c_a) && c_text.contains(c_b))
    {
        return EnumRowKind::Header;
    }

    let position = if RE_POSITION.is_match(&row.position) {
        row.position.parse::<u32>().ok().map(EnumPosition::Number)
    } else if variant == EnumExtractVariant::Extended && RE_DASH.is_match(&row.position) {
        Some(EnumPosition::Dash(row.position.clone()))
    } else {
        None
    };
    let qty = if RE_QTY.is_match(&row.qty) {
        row.qty.parse::<u32>().ok()
    } else if variant == EnumExtractVariant::Extended && RE_DASH.is_match(&row.qty) {
        Some(0)
    } else {
        None
    };
    match (position, qty) {
        (Some(position), Some(qty)) => EnumRowKind::ItemStart { position, qty },
        _ => EnumRowKind::Plain,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StateMachine

/// Text fragments of the item being read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecItemBuffer {
    pub position: EnumPosition,
    pub qty: u32,
    pub l_designator: Vec<String>,
    pub l_name: Vec<String>,
    pub l_comment: Vec<String>,
}

impl SpecItemBuffer {
    fn new(position: EnumPosition, qty: u32) -> Self {
        Self {
            position,
            qty,
            l_designator: Vec::new(),
            l_name: Vec::new(),
            l_comment: Vec::new(),
        }
    }

    fn append(&mut self, row: &SpecTableRow) {
        for (l_buf, c_val) in [
            (&mut self.l_designator, &row.designator),
            (&mut self.l_name, &row.name),
            (&mut self.l_comment, &row.comment),
        ] {
            if !c_val.is_empty() {
                l_buf.push(c_val.clone());
            }
        }
    }

    /// Assemble the record: fragments space-joined, manufacturer taken from
    /// the last quoted substring of the name.
    pub fn flush(self, module: &str, section: EnumSection) -> SpecBomRecord {
        let name = clean_text(&self.l_name.join(" "));
        let manufacturer = extract_manufacturer(&name);
        SpecBomRecord {
            module: module.to_string(),
            section,
            position: self.position,
            name,
            manufacturer,
            part_number: clean_text(&self.l_designator.join(" ")),
            qty: self.qty,
            comment: clean_text(&self.l_comment.join(" ")),
        }
    }
}

/// Extractor states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumExtractState {
    NoSection,
    Section(EnumSection),
    ItemOpen(EnumSection, SpecItemBuffer),
    Finished,
}

impl EnumExtractState {
    fn section(&self) -> Option<EnumSection> {
        match self {
            Self::Section(section) | Self::ItemOpen(section, _) => Some(*section),
            Self::NoSection | Self::Finished => None,
        }
    }

    /// Close the open item, if any.
    fn close(self) -> Option<(EnumSection, SpecItemBuffer)> {
        match self {
            Self::ItemOpen(section, buffer) => Some((section, buffer)),
            _ => None,
        }
    }
}

/// Pure transition: next state plus the item this row closed.
pub fn derive_next_state(
    state: EnumExtractState,
    row: &SpecTableRow,
    kind: EnumRowKind,
) -> (EnumExtractState, Option<(EnumSection, SpecItemBuffer)>) {
    if state == EnumExtractState::Finished {
        return (state, None);
    }
    match kind {
        EnumRowKind::Blank | EnumRowKind::Header => (state, None),
        EnumRowKind::SectionStart(section) => (EnumExtractState::Section(section), state.close()),
        EnumRowKind::Terminal => (EnumExtractState::NoSection, state.close()),
        EnumRowKind::EndOfDocument => (EnumExtractState::Finished, state.close()),
        EnumRowKind::ItemStart { position, qty } => match state.section() {
            Some(section) => {
                let mut buffer = SpecItemBuffer::new(position, qty);
                buffer.append(row);
                (EnumExtractState::ItemOpen(section, buffer), state.close())
            }
            None => (state, None),
        },
        EnumRowKind::Plain => match state {
            EnumExtractState::ItemOpen(section, mut buffer) => {
                buffer.append(row);
                (EnumExtractState::ItemOpen(section, buffer), None)
            }
            other => (other, None),
        },
    }
}

/// Drives the state machine over the tables of one document.
#[derive(Debug)]
pub struct SpecExtractor {
    module: String,
    variant: EnumExtractVariant,
    state: EnumExtractState,
    l_records: Vec<SpecBomRecord>,
}

impl SpecExtractor {
    pub fn new(module: &str, variant: EnumExtractVariant) -> Self {
        Self {
            module: module.to_string(),
            variant,
            state: EnumExtractState::NoSection,
            l_records: Vec::new(),
        }
    }

    /// Feed one raw table row.
    pub fn feed_row<S: AsRef<str>>(&mut self, cells: &[S]) {
        let row = SpecTableRow::from_cells(cells);
        let kind = derive_row_kind(&row, self.variant);
        let state = std::mem::replace(&mut self.state, EnumExtractState::NoSection);
        let (state_next, closed) = derive_next_state(state, &row, kind);
        if let Some((section, buffer)) = closed {
            self.l_records.push(buffer.flush(&self.module, section));
        }
        self.state = state_next;
    }

    /// True once an end-of-document sentinel was seen.
    pub fn is_finished(&self) -> bool {
        self.state == EnumExtractState::Finished
    }

    /// Flush the open item and return all records in reading order.
    pub fn finish(mut self) -> Vec<SpecBomRecord> {
        let state = std::mem::replace(&mut self.state, EnumExtractState::Finished);
        if let Some((section, buffer)) = state.close() {
            self.l_records.push(buffer.flush(&self.module, section));
        }
        self.l_records
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Documents

/// Last quoted substring, cleaned; empty when there is none.
pub fn extract_manufacturer(text: &str) -> String {
    RE_QUOTED
        .captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| clean_text(m.as_str()))
        .unwrap_or_default()
}

/// Extract and order the records of one document: Standard before Other,
/// then by position.
pub fn extract_document_records(
    l_tables: &[SpecDocxTable],
    module: &str,
    variant: EnumExtractVariant,
) -> Vec<SpecBomRecord> {
    let mut extractor = SpecExtractor::new(module, variant);
    'tables: for table in l_tables {
        for row in &table.rows {
            if extractor.is_finished() {
                break 'tables;
            }
            extractor.feed_row(row);
        }
    }
    let mut l_records = extractor.finish();
    l_records.sort_by(|a, b| {
        a.section
            .cmp(&b.section)
            .then_with(|| a.position.cmp(&b.position))
    });
    l_records
}

/// Output headers of the parse stage.
pub fn derive_parse_headers(variant: EnumExtractVariant) -> [&'static str; 8] {
    let c_col_pos = match variant {
        EnumExtractVariant::Basic => C_COL_POS,
        EnumExtractVariant::Extended => C_COL_POS_TEXT,
    };
    [
        C_COL_MODULE,
        C_COL_SECTION,
        c_col_pos,
        C_COL_NAME,
        C_COL_MANUFACTURER,
        C_COL_PART_NUMBER,
        C_COL_QTY,
        C_COL_COMMENT,
    ]
}

/// Append one document block followed by a blank separator row.
pub fn push_document_block(grid: &mut SpecSheetGrid, l_records: &[SpecBomRecord]) {
    for record in l_records {
        grid.push_row(record.to_row());
    }
    grid.push_blank_row();
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
