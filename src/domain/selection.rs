//! Row selection for list views
//!
//! [`SelectableList`] borrows a table schema and puts a check column in
//! front of it. The base schema is never modified.

use crate::domain::control::ControlKind;
use crate::domain::field::{get_path, Field, FieldBound, FieldType, Schema};
use crate::domain::flatten::scalar_text;
use serde_json::Value;

pub const CHECK_FIELD: &str = "select_check";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Added,
    Removed,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct SelectableList<'a> {
    base: &'a Schema,
    columns: Schema,
    selected: Vec<String>,
}

impl<'a> SelectableList<'a> {
    pub fn new(base: &'a Schema) -> Self {
        let mut fields = Vec::with_capacity(base.len() + 1);
        fields.push(check_field());
        fields.extend(base.iter().cloned());
        SelectableList {
            base,
            columns: Schema::from_fields(fields),
            selected: Vec::new(),
        }
    }

    pub fn base(&self) -> &Schema {
        self.base
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn set_selected(&mut self, id: &str, selected: bool) -> SelectionChange {
        match (selected, self.is_selected(id)) {
            (true, false) => {
                self.selected.push(id.to_string());
                SelectionChange::Added
            }
            (false, true) => {
                self.selected.retain(|s| s != id);
                SelectionChange::Removed
            }
            _ => SelectionChange::Unchanged,
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Text of the check column for `record`.
    pub fn check_cell(&self, record: &Value, id_attribute: &str) -> String {
        let id = record_id(record, id_attribute);
        if id.is_some_and(|id| self.is_selected(&id)) {
            "[x]".to_string()
        } else {
            "[ ]".to_string()
        }
    }
}

impl FieldBound for SelectableList<'_> {
    fn schema(&self) -> &Schema {
        &self.columns
    }
}

fn check_field() -> Field {
    Field {
        name: CHECK_FIELD.to_string(),
        field_type: FieldType::Check,
        label: String::new(),
        order: None,
        filter_by: None,
        defaults: None,
        read_only: false,
        editable: true,
        control: ControlKind::Check,
        id_attribute: "id".to_string(),
        display_attribute: "id".to_string(),
        options: Vec::new(),
        span: None,
    }
}

/// Id of a record as text.
pub fn record_id(record: &Value, id_attribute: &str) -> Option<String> {
    get_path(record, id_attribute)
        .map(scalar_text)
        .filter(|id| !id.is_empty())
}
