//! Offline backend over JSON files
//!
//! Each resource is a JSON array in `<dir>/<url>.json`. Listing requests are
//! answered the way a REST listing endpoint would: `q` conditions, quick
//! filter, `order`, then `offset`/`len`. `<url>/count` returns the number of
//! matching rows.
//!
//! `q` conditions are `field:condition` pairs joined by `,`:
//!
//! | condition  | matches                                  |
//! |------------|------------------------------------------|
//! | `acme`     | equal, ignoring case                     |
//! | `=Acme`    | exactly equal                            |
//! | `*cme*`    | wildcard, ignoring case                  |
//! | `>10`      | greater (`>=`, `<`, `<=` alike)          |
//! | `a\|b`     | any alternative                          |
//!
//! Numbers compare numerically, everything else as text.

use crate::domain::field::{get_path, set_path};
use crate::domain::flatten::{flatten, scalar_text, FlatValue};
use crate::domain::selection::record_id;
use crate::error::{CrudError, Result};
use crate::infrastructure::transport::Transport;
use regex::RegexBuilder;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
    id_attributes: HashMap<String, String>,
}

impl FileBackend {
    pub fn new(dir: &Path) -> Self {
        FileBackend {
            dir: dir.to_path_buf(),
            id_attributes: HashMap::new(),
        }
    }

    /// Use `attribute` as the id of `resource` records instead of `id`.
    pub fn with_id_attribute(mut self, resource: &str, attribute: &str) -> Self {
        self.id_attributes
            .insert(resource.to_string(), attribute.to_string());
        self
    }

    fn id_attribute(&self, resource: &str) -> &str {
        self.id_attributes
            .get(resource)
            .map(String::as_str)
            .unwrap_or("id")
    }

    fn file(&self, resource: &str) -> PathBuf {
        self.dir.join(format!("{}.json", resource))
    }

    fn load(&self, resource: &str) -> Result<Vec<Value>> {
        let path = self.file(resource);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{} does not exist, treating as empty", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&contents)? {
            Value::Array(rows) => Ok(rows),
            _ => Err(CrudError::Protocol(format!(
                "{} must hold a JSON array",
                path.display()
            ))),
        }
    }

    fn store(&self, resource: &str, rows: &[Value]) -> Result<()> {
        let path = self.file(resource);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut contents = serde_json::to_string_pretty(rows)?;
        contents.push('\n');
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Split `wine/4` into resource and id. A path naming an existing file is a resource.
    fn split<'a>(&self, path: &'a str) -> (&'a str, Option<&'a str>) {
        let path = path.trim_matches('/');
        if self.file(path).exists() {
            return (path, None);
        }
        match path.rsplit_once('/') {
            Some((resource, id)) => (resource, Some(id)),
            None => (path, None),
        }
    }

    fn position(&self, resource: &str, rows: &[Value], id: &str) -> Result<usize> {
        let attribute = self.id_attribute(resource);
        rows.iter()
            .position(|row| record_id(row, attribute).as_deref() == Some(id))
            .ok_or_else(|| CrudError::RecordNotFound {
                resource: resource.to_string(),
                id: id.to_string(),
            })
    }

    fn next_id(&self, resource: &str, rows: &[Value]) -> Value {
        let attribute = self.id_attribute(resource);
        let max = rows
            .iter()
            .filter_map(|row| get_path(row, attribute).and_then(number_of))
            .fold(0.0_f64, f64::max);
        Value::from(max as i64 + 1)
    }

    fn matching(&self, resource: &str, params: &[(String, String)]) -> Result<Vec<Value>> {
        let rows = self.load(resource)?;
        let param = |name: &str| {
            params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
                .unwrap_or("")
        };

        let conditions = parse_conditions(param("q"));
        let filter = param("filter").to_lowercase();
        let filter_by: Vec<&str> = param("filterBy")
            .split(',')
            .filter(|f| !f.is_empty())
            .collect();

        let mut matched: Vec<Value> = rows
            .into_iter()
            .filter(|row| {
                let flat = flatten(row);
                conditions.iter().all(|c| c.matches(&flat))
                    && (filter.is_empty() || quick_filter(&flat, &filter, &filter_by))
            })
            .collect();

        let order = parse_order(param("order"));
        if !order.is_empty() {
            matched.sort_by(|a, b| compare_rows(a, b, &order));
        }
        Ok(matched)
    }
}

impl Transport for FileBackend {
    fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        let trimmed = path.trim_matches('/');
        if let Some(resource) = trimmed.strip_suffix("/count") {
            let count = self.matching(resource, params)?.len();
            return Ok(Value::from(count));
        }

        match self.split(trimmed) {
            (resource, Some(id)) => {
                let rows = self.load(resource)?;
                let index = self.position(resource, &rows, id)?;
                Ok(rows[index].clone())
            }
            (resource, None) => {
                let numeric = |name: &str| {
                    params
                        .iter()
                        .find(|(k, _)| k == name)
                        .and_then(|(_, v)| v.parse::<usize>().ok())
                };
                let offset = numeric("offset").unwrap_or(0);
                let len = numeric("len").unwrap_or(usize::MAX);
                let rows = self.matching(resource, params)?;
                Ok(Value::Array(rows.into_iter().skip(offset).take(len).collect()))
            }
        }
    }

    fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let resource = path.trim_matches('/');
        let mut rows = self.load(resource)?;
        let attribute = self.id_attribute(resource).to_string();

        let mut record = body.clone();
        match record_id(&record, &attribute) {
            Some(id) if self.position(resource, &rows, &id).is_ok() => {
                return Err(CrudError::InvalidInput(format!(
                    "{} {} already exists",
                    resource, id
                )));
            }
            Some(_) => {}
            None => {
                let id = self.next_id(resource, &rows);
                set_path(&mut record, &attribute, id);
            }
        }

        rows.push(record.clone());
        self.store(resource, &rows)?;
        Ok(record)
    }

    fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let (resource, id) = match self.split(path) {
            (resource, Some(id)) => (resource, id),
            (resource, None) => {
                return Err(CrudError::InvalidInput(format!(
                    "update of '{}' needs an id",
                    resource
                )))
            }
        };
        let mut rows = self.load(resource)?;
        let index = self.position(resource, &rows, id)?;

        let mut record = match (&rows[index], body) {
            (Value::Object(current), Value::Object(changes)) => {
                let mut merged: Map<String, Value> = current.clone();
                for (k, v) in changes {
                    merged.insert(k.clone(), v.clone());
                }
                Value::Object(merged)
            }
            _ => body.clone(),
        };
        let original_id = get_path(&rows[index], self.id_attribute(resource)).cloned();
        if let Some(original_id) = original_id {
            set_path(&mut record, self.id_attribute(resource), original_id);
        }

        rows[index] = record.clone();
        self.store(resource, &rows)?;
        Ok(record)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let (resource, id) = match self.split(path) {
            (resource, Some(id)) => (resource, id),
            (resource, None) => {
                return Err(CrudError::InvalidInput(format!(
                    "delete of '{}' needs an id",
                    resource
                )))
            }
        };
        let mut rows = self.load(resource)?;
        let index = self.position(resource, &rows, id)?;
        rows.remove(index);
        self.store(resource, &rows)
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone)]
enum Test {
    Equal(String),
    Exact(String),
    Wildcard(regex::Regex),
    Compare(Ordering, bool, String),
}

impl Test {
    fn parse(text: &str) -> Test {
        if let Some(rest) = text.strip_prefix(">=") {
            return Test::Compare(Ordering::Greater, true, rest.to_string());
        }
        if let Some(rest) = text.strip_prefix("<=") {
            return Test::Compare(Ordering::Less, true, rest.to_string());
        }
        if let Some(rest) = text.strip_prefix('>') {
            return Test::Compare(Ordering::Greater, false, rest.to_string());
        }
        if let Some(rest) = text.strip_prefix('<') {
            return Test::Compare(Ordering::Less, false, rest.to_string());
        }
        if let Some(rest) = text.strip_prefix('=') {
            return Test::Exact(rest.to_string());
        }
        if text.contains('*') {
            let pattern = text
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*");
            if let Ok(regex) = RegexBuilder::new(&format!("^{}$", pattern))
                .case_insensitive(true)
                .build()
            {
                return Test::Wildcard(regex);
            }
        }
        Test::Equal(text.to_lowercase())
    }

    fn matches(&self, value: &Value) -> bool {
        let text = scalar_text(value);
        match self {
            Test::Equal(expected) => text.to_lowercase() == *expected,
            Test::Exact(expected) => text == *expected,
            Test::Wildcard(regex) => regex.is_match(&text),
            Test::Compare(wanted, or_equal, bound) => {
                let ordering = compare_text(&text, bound);
                ordering == *wanted || (*or_equal && ordering == Ordering::Equal)
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Condition {
    key: String,
    alternatives: Vec<Test>,
}

impl Condition {
    fn matches(&self, flat: &[(String, FlatValue)]) -> bool {
        let Some((_, value)) = flat.iter().find(|(k, _)| *k == self.key) else {
            return false;
        };
        let values: Vec<&Value> = match value {
            FlatValue::Single(v) => vec![v],
            FlatValue::Many(vs) => vs.iter().collect(),
        };
        values
            .iter()
            .any(|v| self.alternatives.iter().any(|t| t.matches(v)))
    }
}

fn parse_conditions(q: &str) -> Vec<Condition> {
    q.split(',')
        .filter_map(|part| part.split_once(':'))
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, condition)| Condition {
            key: key.trim().to_string(),
            alternatives: condition.split('|').map(Test::parse).collect(),
        })
        .collect()
}

fn quick_filter(flat: &[(String, FlatValue)], filter: &str, filter_by: &[&str]) -> bool {
    flat.iter()
        .filter(|(k, _)| filter_by.is_empty() || filter_by.contains(&k.as_str()))
        .any(|(_, value)| match value {
            FlatValue::Single(v) => scalar_text(v).to_lowercase().contains(filter),
            FlatValue::Many(vs) => vs
                .iter()
                .any(|v| scalar_text(v).to_lowercase().contains(filter)),
        })
}

fn parse_order(order: &str) -> Vec<(String, bool)> {
    order
        .split(',')
        .filter_map(|part| {
            let mut words = part.split_whitespace();
            let field = words.next()?;
            let descending = words
                .next()
                .is_some_and(|dir| dir.eq_ignore_ascii_case("desc"));
            Some((field.to_string(), descending))
        })
        .collect()
}

fn compare_text(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

fn compare_rows(a: &Value, b: &Value, order: &[(String, bool)]) -> Ordering {
    for (field, descending) in order {
        let ordering = match (get_path(a, field), get_path(b, field)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => compare_text(&scalar_text(x), &scalar_text(y)),
        };
        let ordering = if *descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
