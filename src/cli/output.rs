//! Output formatting utilities

use crate::domain::control::Form;
use crate::domain::field::{FieldBound, Schema};
use crate::domain::highlight::Highlighter;
use crate::domain::menu::MenuItem;
use crate::domain::paginator::Pagination;
use crate::domain::selection::{SelectableList, CHECK_FIELD};
use serde_json::Value;

/// Plain-text rendering for the terminal.
pub trait Renderable {
    fn render(&self) -> String;
}

/// One page of rows as an aligned table.
pub struct RowsView<'a> {
    pub schema: &'a Schema,
    pub rows: &'a [Value],
    pub id_attribute: &'a str,
    pub selection: Option<&'a SelectableList<'a>>,
    pub highlighter: Option<&'a Highlighter>,
}

impl<'a> RowsView<'a> {
    pub fn new(schema: &'a Schema, rows: &'a [Value], id_attribute: &'a str) -> Self {
        RowsView {
            schema,
            rows,
            id_attribute,
            selection: None,
            highlighter: None,
        }
    }

    fn columns(&self) -> &Schema {
        match self.selection {
            Some(selection) => selection.schema(),
            None => self.schema,
        }
    }

    fn cell(&self, name: &str, row: &Value) -> String {
        if name == CHECK_FIELD {
            return self
                .selection
                .map(|s| s.check_cell(row, self.id_attribute))
                .unwrap_or_default();
        }
        self.columns()
            .find_by_name(name)
            .map(|field| field.display(row))
            .unwrap_or_default()
    }
}

impl Renderable for RowsView<'_> {
    fn render(&self) -> String {
        if self.rows.is_empty() {
            return "No rows found".to_string();
        }

        let columns = self.columns();
        let names: Vec<&str> = columns.iter().map(|f| f.name.as_str()).collect();
        let header: Vec<String> = columns.iter().map(|f| f.label.clone()).collect();
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| names.iter().map(|name| self.cell(name, row)).collect())
            .collect();

        let widths: Vec<usize> = (0..names.len())
            .map(|i| {
                cells
                    .iter()
                    .map(|line| width(&line[i]))
                    .chain(std::iter::once(width(&header[i])))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut output = String::new();
        output.push_str(&join_padded(&header, &widths, None));
        for line in &cells {
            output.push_str(&join_padded(line, &widths, self.highlighter));
        }
        output
    }
}

fn width(text: &str) -> usize {
    text.chars().count()
}

/// Pad on the plain text so markers added by the highlighter keep columns aligned.
fn join_padded(cells: &[String], widths: &[usize], highlighter: Option<&Highlighter>) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| {
            let padding = " ".repeat(w.saturating_sub(width(cell)));
            match highlighter {
                Some(h) => format!("{}{}", h.apply(cell), padding),
                None => format!("{}{}", cell, padding),
            }
        })
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}

/// One record as `label: value` lines.
pub struct RecordView<'a> {
    pub schema: &'a Schema,
    pub record: &'a Value,
}

impl Renderable for RecordView<'_> {
    fn render(&self) -> String {
        let label_width = self.schema.iter().map(|f| width(&f.label)).max().unwrap_or(0);
        let mut output = String::new();
        for field in self.schema.iter() {
            let padding = " ".repeat(label_width - width(&field.label));
            output.push_str(&format!(
                "{}:{} {}\n",
                field.label,
                padding,
                field.display(self.record)
            ));
        }
        output
    }
}

/// Summary line plus the enabled page links; the current page is bracketed.
impl Renderable for Pagination {
    fn render(&self) -> String {
        let summary = if self.to == 0 || self.to < self.from {
            "No rows".to_string()
        } else {
            match self.total {
                Some(total) => format!("Rows {}-{} of {}", self.from, self.to, total),
                None => format!("Rows {}-{}", self.from, self.to),
            }
        };

        let links: Vec<String> = self
            .links
            .iter()
            .filter(|link| link.enabled)
            .map(|link| {
                if link.active {
                    format!("[{}]", link.text)
                } else {
                    link.text.clone()
                }
            })
            .collect();

        if links.is_empty() {
            summary
        } else {
            format!("{}  {}", summary, links.join(" "))
        }
    }
}

impl Renderable for MenuItem {
    fn render(&self) -> String {
        let items = self.walk();
        if items.is_empty() {
            return "No menu entries".to_string();
        }

        let mut output = String::new();
        for (depth, item) in items {
            output.push_str(&"  ".repeat(depth));
            output.push_str(&item.label);
            if let Some(url) = &item.url {
                output.push_str(&format!("  {}", url));
            }
            output.push('\n');
        }
        output
    }
}

impl Renderable for Form {
    fn render(&self) -> String {
        let mut output = String::new();
        for control in self.controls() {
            let mut line = format!(
                "{}  {}  {}",
                control.field.name, control.label, control.kind
            );
            if !control.editable {
                line.push_str("  (read-only)");
            }
            if !control.help.is_empty() {
                line.push_str(&format!("  {}", control.help));
            }
            output.push_str(&line);
            output.push('\n');
        }
        output
    }
}
