//! Materialized table model.
//!
//! A [`RenderedTable`] is what the renderer builds, the formatter styles and
//! the controllers re-stamp. It is written to the page as HTML and never
//! read back from it; filtering reads the value model built alongside it.
//!
//! Every header and body row holds exactly one cell per [`ColumnSlot`]. A
//! cell spanning `n` slots is followed by `n - 1` hidden cells.

use crate::types::Dataset;
use crate::value_parser::ColumnKind;

/// Ordered CSS declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    entries: Vec<(String, String)>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing an earlier value in place.
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(p, _)| p == property) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((property.to_string(), value)),
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, property: &str) {
        self.entries.retain(|(p, _)| p != property);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as an inline `style` attribute value.
    pub fn to_css(&self) -> String {
        self.entries
            .iter()
            .map(|(p, v)| format!("{p}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// What a column slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    /// The leading `#` column
    RowNumber,
    /// Pivot labels from the hierarchy columns
    Label,
    Data,
}

/// One rendered column position
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSlot {
    /// Source column name; `#` for the row-number slot
    pub name: String,
    pub role: SlotRole,
    pub kind: ColumnKind,
    /// Index of the measure group this column belongs to
    pub group: Option<usize>,
    /// Hidden through the columns menu or because row numbering is off
    pub hidden: bool,
}

/// Kind of a table row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Header row 1: measure-group labels
    GroupHeader,
    /// Header row 2: column labels
    ColumnHeader,
    Category,
    SubCategory,
    Segment,
    Detail,
}

impl RowKind {
    pub fn is_header(self) -> bool {
        matches!(self, Self::GroupHeader | Self::ColumnHeader)
    }

    /// Rows produced by the pivot hierarchy
    pub fn is_pivot(self) -> bool {
        matches!(self, Self::Category | Self::SubCategory | Self::Segment)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HtmlCell {
    pub text: String,
    /// Parsed numeric value, if the cell holds one
    pub value: Option<f64>,
    /// True when `value` is a sum rather than a single cell
    pub aggregate: bool,
    /// Structural span
    pub span: usize,
    /// Effective colspan after hidden slots are removed
    pub colspan: usize,
    pub hidden: bool,
    pub style: StyleMap,
    pub attrs: Vec<(String, String)>,
    /// Leading glyph from conditional formatting
    pub icon: Option<String>,
}

impl HtmlCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: None,
            aggregate: false,
            span: 1,
            colspan: 1,
            hidden: false,
            style: StyleMap::new(),
            attrs: Vec::new(),
            icon: None,
        }
    }

    /// A placeholder covered by a spanning neighbour or a collapsed group.
    pub fn hidden() -> Self {
        Self {
            hidden: true,
            ..Self::new("")
        }
    }

    pub fn numeric(text: impl Into<String>, value: Option<f64>, aggregate: bool) -> Self {
        Self {
            value,
            aggregate,
            ..Self::new(text)
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: usize) -> Self {
        self.span = span;
        self.colspan = span;
        self
    }

    #[must_use]
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HtmlRow {
    pub kind: RowKind,
    pub cells: Vec<HtmlCell>,
    /// Hidden by the visibility pass
    pub hidden: bool,
    /// Expansion key for expandable pivot rows
    pub pivot_key: Option<String>,
    pub level: usize,
    pub collapsed: bool,
    pub style: StyleMap,
}

impl HtmlRow {
    pub fn new(kind: RowKind, cells: Vec<HtmlCell>) -> Self {
        Self {
            kind,
            cells,
            hidden: false,
            pivot_key: None,
            level: 0,
            collapsed: false,
            style: StyleMap::new(),
        }
    }
}

/// A fully built table: slots, two header rows and the body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedTable {
    pub slots: Vec<ColumnSlot>,
    pub header: Vec<HtmlRow>,
    pub body: Vec<HtmlRow>,
    /// Plain values of the body rows; see [`RenderedTable::row_model`]
    pub model: Dataset,
    pub style: StyleMap,
    /// Generation of the dataset this table was built from
    pub generation: u64,
}

impl RenderedTable {
    /// Slot index of a data or label column by name.
    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.role != SlotRole::RowNumber && s.name == name)
    }

    /// Mutable cells of one slot across header and body rows.
    pub fn slot_cells_mut(&mut self, slot: usize) -> impl Iterator<Item = &mut HtmlCell> {
        self.header
            .iter_mut()
            .chain(self.body.iter_mut())
            .filter_map(move |row| row.cells.get_mut(slot))
    }

    /// The column-label header row.
    pub fn column_header(&self) -> Option<&HtmlRow> {
        self.header.last()
    }

    pub fn column_header_mut(&mut self) -> Option<&mut HtmlRow> {
        self.header.last_mut()
    }

    /// Body rows as plain values over every slot but the row-number slot.
    ///
    /// Built with the structure, before formatting: detail cells keep the
    /// host text, sums are unformatted and labels carry no glyphs. Cells
    /// hidden by a collapsed measure group are empty. This is the input of
    /// the visibility pass.
    pub fn row_model(&self) -> &Dataset {
        &self.model
    }

    /// Hide body rows whose flag is false. Missing flags mean visible.
    pub fn apply_visibility(&mut self, flags: &[bool]) {
        for (i, row) in self.body.iter_mut().enumerate() {
            row.hidden = !flags.get(i).copied().unwrap_or(true);
        }
    }

    pub fn visible_row_count(&self) -> usize {
        self.body.iter().filter(|r| !r.hidden).count()
    }
}
