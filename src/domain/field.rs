//! Field definitions and schemas
//!
//! A resource declares its fields once in `schema`; derived schemas
//! (`table_schema`, `form_schema`, `query_schema`) list field names or partial
//! definitions that override the base entry of the same name.

use crate::domain::control::ControlKind;
use crate::domain::flatten::{is_truthy, scalar_text};
use crate::domain::lang;
use crate::error::{CrudError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::str::FromStr;
use std::sync::OnceLock;

/// Kind of value a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Date,
    Check,
    Object,
    #[serde(alias = "arrayObject", alias = "array_object")]
    ArrayObject,
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(FieldType::String),
            "number" => Ok(FieldType::Number),
            "date" => Ok(FieldType::Date),
            "check" => Ok(FieldType::Check),
            "object" => Ok(FieldType::Object),
            "arrayobject" | "array_object" => Ok(FieldType::ArrayObject),
            _ => Err(format!(
                "field type '{}' not supported. supported types: \
                string, number, date, check, object, arrayobject",
                s
            )),
        }
    }
}

/// `order = false` disables ordering, `order = "expr"` orders by `expr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderSetting {
    Enabled(bool),
    Expr(String),
}

/// A field as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderSetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_attribute: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<u32>,
}

impl FieldDef {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        FieldDef {
            name: name.to_string(),
            field_type,
            ..Default::default()
        }
    }
}

/// Entry of a derived schema: a bare field name, or a partial definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaEntry {
    Name(String),
    Partial(Map<String, Value>),
}

/// A resolved field with every default filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub label: String,
    /// Order expression, `None` when ordering by this field is disabled
    pub order: Option<String>,
    /// Quick-filter expression, `None` when the field takes no part in it
    pub filter_by: Option<String>,
    pub defaults: Option<Value>,
    pub read_only: bool,
    pub editable: bool,
    pub control: ControlKind,
    pub id_attribute: String,
    pub display_attribute: String,
    pub options: Vec<String>,
    pub span: Option<u32>,
}

impl Field {
    pub fn from_def(def: &FieldDef) -> Result<Self> {
        if def.name.trim().is_empty() {
            return Err(CrudError::Schema("field.name not specified".to_string()));
        }
        let name = def.name.clone();

        let order = match &def.order {
            Some(OrderSetting::Enabled(false)) => None,
            Some(OrderSetting::Expr(expr)) if !expr.is_empty() => Some(expr.clone()),
            Some(_) => Some(name.clone()),
            None if def.field_type == FieldType::ArrayObject => None,
            None => Some(name.clone()),
        };

        let filter_by = match &def.filter_by {
            Some(expr) if expr.is_empty() => None,
            Some(expr) => Some(expr.clone()),
            None => match def.field_type {
                FieldType::Check | FieldType::ArrayObject => None,
                _ => Some(name.clone()),
            },
        };

        let control = match &def.control {
            Some(tag) => ControlKind::from_str(tag).map_err(CrudError::Control)?,
            None => ControlKind::default_for(def.field_type, !def.options.is_empty()),
        };

        let id_attribute = match &def.id_attribute {
            Some(attr) => attr.clone(),
            None if def.field_type == FieldType::ArrayObject => {
                format!("{}Id", lang::singular(&name))
            }
            None => "id".to_string(),
        };

        let display_attribute = def
            .display_attribute
            .clone()
            .unwrap_or_else(|| id_attribute.clone());

        Ok(Field {
            label: def.label.clone().unwrap_or_else(|| name.clone()),
            field_type: def.field_type,
            order,
            filter_by,
            defaults: def.defaults.clone(),
            read_only: def.read_only,
            editable: def.editable.unwrap_or(!def.read_only),
            control,
            id_attribute,
            display_attribute,
            options: def.options.clone(),
            span: def.span,
            name,
        })
    }

    /// Raw value of this field in `record`, following dotted names.
    pub fn value<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        get_path(record, &self.name)
    }

    /// Text shown for this field of `record`.
    pub fn display(&self, record: &Value) -> String {
        let Some(value) = self.value(record) else {
            return String::new();
        };
        if value.is_null() {
            return String::new();
        }

        match self.field_type {
            FieldType::Check => {
                if is_truthy(value) {
                    "[x]".to_string()
                } else {
                    "[ ]".to_string()
                }
            }
            FieldType::Date => match value.as_str().and_then(parse_date) {
                Some(date) => date.format("%d/%m/%Y").to_string(),
                None => scalar_text(value),
            },
            FieldType::ArrayObject => match value {
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| item.get(&self.id_attribute))
                    .map(scalar_text)
                    .collect::<Vec<_>>()
                    .join(","),
                other => scalar_text(other),
            },
            FieldType::Object => match value {
                Value::Object(map) => match map.get(&self.display_attribute) {
                    Some(v) => scalar_text(v),
                    None => value.to_string(),
                },
                other => scalar_text(other),
            },
            FieldType::String | FieldType::Number => scalar_text(value),
        }
    }

    /// Convert user text into the JSON value stored for this field.
    pub fn parse_input(&self, text: &str) -> Result<Value> {
        let trimmed = text.trim();
        match self.field_type {
            FieldType::String => Ok(Value::String(text.to_string())),
            FieldType::Number => {
                if trimmed.is_empty() {
                    return Ok(Value::Null);
                }
                if let Ok(n) = trimmed.parse::<i64>() {
                    return Ok(Value::Number(n.into()));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        self.invalid(text, "expected a number")
                    })
            }
            FieldType::Date => {
                if trimmed.is_empty() {
                    return Ok(Value::Null);
                }
                parse_date(trimmed)
                    .or_else(|| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y").ok())
                    .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                    .ok_or_else(|| self.invalid(text, "expected YYYY-MM-DD or DD/MM/YYYY"))
            }
            FieldType::Check => parse_bool(trimmed)
                .map(Value::Bool)
                .ok_or_else(|| self.invalid(text, "expected yes/no")),
            FieldType::ArrayObject => {
                if !id_list_regex().is_match(trimmed) {
                    return Err(self.invalid(
                        text,
                        "expected a comma separated list of numeric ids",
                    ));
                }
                let items = trimmed
                    .split(',')
                    .filter(|id| !id.is_empty())
                    .map(|id| {
                        let mut item = Map::new();
                        let n: i64 = id.parse().unwrap_or_default();
                        item.insert(self.id_attribute.clone(), Value::Number(n.into()));
                        Value::Object(item)
                    })
                    .collect();
                Ok(Value::Array(items))
            }
            FieldType::Object => match serde_json::from_str::<Value>(trimmed) {
                Ok(value @ Value::Object(_)) => Ok(value),
                _ => Err(self.invalid(text, "expected a JSON object")),
            },
        }
    }

    fn invalid(&self, text: &str, why: &str) -> CrudError {
        CrudError::InvalidInput(format!("{} = '{}': {}", self.name, text, why))
    }
}

fn id_list_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\d*(?:,\d+)*$").unwrap())
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Parse yes/no style input.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "si" | "sí" | "s" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Read a dotted path. An exact key match wins over nesting.
pub fn get_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if let Some(v) = record.get(path) {
        return Some(v);
    }
    let mut current = record;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

/// Write a dotted path, creating intermediate objects.
pub fn set_path(record: &mut Value, path: &str, value: Value) {
    if !record.is_object() {
        *record = Value::Object(Map::new());
    }
    let mut parts = path.split('.').peekable();
    let mut current = record;
    while let Some(part) = parts.next() {
        let Value::Object(map) = current else {
            return;
        };
        if parts.peek().is_none() {
            map.insert(part.to_string(), value);
            return;
        }
        let entry = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = entry;
    }
}

/// An ordered collection of resolved fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Resolve field definitions. Names must be present and unique.
    pub fn new(defs: &[FieldDef]) -> Result<Self> {
        let mut fields: Vec<Field> = Vec::with_capacity(defs.len());
        for def in defs {
            let field = Field::from_def(def)?;
            if fields.iter().any(|f| f.name == field.name) {
                return Err(CrudError::Schema(format!(
                    "duplicate field '{}' in schema",
                    field.name
                )));
            }
            fields.push(field);
        }
        Ok(Schema { fields })
    }

    pub fn from_fields(fields: Vec<Field>) -> Self {
        Schema { fields }
    }

    /// Complete each derived entry with the base definition of the same name.
    pub fn extend(entries: &[SchemaEntry], base: &[FieldDef]) -> Result<Vec<FieldDef>> {
        entries
            .iter()
            .map(|entry| {
                let overrides = match entry {
                    SchemaEntry::Name(name) => {
                        let mut map = Map::new();
                        map.insert("name".to_string(), Value::String(name.clone()));
                        map
                    }
                    SchemaEntry::Partial(map) => {
                        let mut map = map.clone();
                        if let Some(field) = map.remove("field") {
                            map.entry("name".to_string()).or_insert(field);
                        }
                        map
                    }
                };

                let name = overrides
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        CrudError::Schema("field.name not specified in schema".to_string())
                    })?;

                let base_def = base.iter().find(|d| d.name == name).ok_or_else(|| {
                    CrudError::Schema(format!("field '{}' not found in base schema", name))
                })?;

                let mut merged = match serde_json::to_value(base_def)? {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                for (key, value) in overrides {
                    merged.insert(key, value);
                }
                Ok(serde_json::from_value(Value::Object(merged))?)
            })
            .collect()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// JSON object with every field's default value.
    pub fn defaults(&self) -> Value {
        let mut record = Value::Object(Map::new());
        for field in &self.fields {
            if let Some(default) = &field.defaults {
                set_path(&mut record, &field.name, default.clone());
            }
        }
        record
    }

    /// Comma-joined quick-filter expressions.
    pub fn filter_by(&self) -> String {
        self.fields
            .iter()
            .filter_map(|f| f.filter_by.as_deref())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Anything that exposes a field schema.
pub trait FieldBound {
    fn schema(&self) -> &Schema;

    fn field(&self, name: &str) -> Option<&Field> {
        self.schema().find_by_name(name)
    }
}

impl FieldBound for Schema {
    fn schema(&self) -> &Schema {
        self
    }
}
