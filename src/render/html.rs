//! HTML serialization of a [`RenderedTable`].
//!
//! Hidden cells and rows are emitted with `display: none` so the cell count
//! per row never changes; visibility updates only toggle that style.

use std::fmt::Write as _;

use super::model::{HtmlCell, HtmlRow, RenderedTable};

/// Escape text for element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn write_style(out: &mut String, css: &str, hidden: bool) {
    let css = match (css.is_empty(), hidden) {
        (true, false) => return,
        (true, true) => "display: none".to_string(),
        (false, true) => format!("{css}; display: none"),
        (false, false) => css.to_string(),
    };
    let _ = write!(out, " style=\"{}\"", escape_html(&css));
}

fn write_cell(out: &mut String, cell: &HtmlCell, tag: &str) {
    let _ = write!(out, "<{tag}");
    if cell.colspan > 1 {
        let _ = write!(out, " colspan=\"{}\"", cell.colspan);
    }
    for (name, value) in &cell.attrs {
        let _ = write!(out, " {}=\"{}\"", name, escape_html(value));
    }
    write_style(out, &cell.style.to_css(), cell.hidden);
    out.push('>');
    if let Some(icon) = &cell.icon {
        let _ = write!(
            out,
            "<span class=\"flextable-icon\">{}</span> ",
            escape_html(icon)
        );
    }
    out.push_str(&escape_html(&cell.text));
    let _ = write!(out, "</{tag}>");
}

fn write_row(out: &mut String, row: &HtmlRow, index: Option<usize>, tag: &str) {
    out.push_str("<tr");
    if let Some(i) = index {
        let _ = write!(out, " data-row=\"{i}\"");
    }
    if let Some(key) = &row.pivot_key {
        let _ = write!(
            out,
            " class=\"flextable-pivot-row\" data-pivot-key=\"{}\" data-level=\"{}\" data-collapsed=\"{}\"",
            escape_html(key),
            row.level,
            row.collapsed
        );
    }
    write_style(out, &row.style.to_css(), row.hidden);
    out.push('>');
    for cell in &row.cells {
        write_cell(out, cell, tag);
    }
    out.push_str("</tr>");
}

impl RenderedTable {
    /// Serialize to a `<table>` element.
    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(64 * (self.body.len() + 2) * self.slots.len().max(1));
        out.push_str("<table class=\"flextable\"");
        let _ = write!(out, " data-generation=\"{}\"", self.generation);
        write_style(&mut out, &self.style.to_css(), false);
        out.push_str("><thead>");
        for row in &self.header {
            write_row(&mut out, row, None, "th");
        }
        out.push_str("</thead><tbody>");
        for (i, row) in self.body.iter().enumerate() {
            write_row(&mut out, row, Some(i), "td");
        }
        out.push_str("</tbody></table>");
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::render::model::RowKind;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">Tom & 'Jerry'</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_hidden_cells_keep_cardinality() {
        let row = HtmlRow::new(
            RowKind::Detail,
            vec![HtmlCell::new("a").with_span(2), HtmlCell::hidden()],
        );
        let mut out = String::new();
        write_row(&mut out, &row, Some(3), "td");
        assert_eq!(
            out,
            "<tr data-row=\"3\"><td colspan=\"2\">a</td><td style=\"display: none\"></td></tr>"
        );
    }

    #[test]
    fn test_pivot_row_attributes() {
        let mut row = HtmlRow::new(RowKind::Category, vec![HtmlCell::new("\u{25b6} East")]);
        row.pivot_key = Some("East".into());
        row.collapsed = true;
        let mut out = String::new();
        write_row(&mut out, &row, Some(0), "td");
        assert!(out.contains("data-pivot-key=\"East\""));
        assert!(out.contains("data-collapsed=\"true\""));
    }
}
