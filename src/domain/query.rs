//! Query state for list views
//!
//! Holds pagination, ordering, quick-filter and structured-query state and
//! serializes it to the parameter set understood by REST listing endpoints:
//!
//! | param      | meaning                                   |
//! |------------|-------------------------------------------|
//! | `offset`   | rows to skip                              |
//! | `len`      | page size                                 |
//! | `order`    | comma-separated `field direction` pairs   |
//! | `filter`   | free-text quick filter value              |
//! | `filterBy` | comma-separated field list for the filter |
//! | `q`        | comma-separated `field:condition` list    |
//!
//! # Examples
//!
//! ```
//! use crudkit::domain::QueryState;
//!
//! let mut state = QueryState::new();
//! state.set_len(20).set_page(3);
//! assert_eq!(state.offset(), 40);
//!
//! state.set_filter("acme");
//! assert_eq!(state.page(), 1);
//! ```

use crate::domain::flatten::json_to_query;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_LEN: u64 = 10;

/// Value accepted by `set_query` / `set_base_query`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Json(Value),
}

impl QueryValue {
    fn into_query_string(self) -> String {
        match self {
            QueryValue::Text(text) => text,
            QueryValue::Json(Value::String(text)) => text,
            QueryValue::Json(Value::Null) | QueryValue::Json(Value::Bool(false)) => String::new(),
            QueryValue::Json(json) => json_to_query(&[json]),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<Value> for QueryValue {
    fn from(value: Value) -> Self {
        QueryValue::Json(value)
    }
}

/// Partial parameter set applied in one go by [`QueryState::set_params`].
///
/// Numeric entries stay as text so user input goes through the same lenient
/// coercion as everything else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub offset: Option<String>,
    pub page: Option<String>,
    pub len: Option<String>,
    pub order: Option<String>,
    pub filter: Option<String>,
    pub filter_by: Option<String>,
    pub query: Option<String>,
}

impl ListParams {
    /// Overlay `other` on top of `self`; entries present in `other` win.
    pub fn merge(&mut self, other: ListParams) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.offset, other.offset);
        take(&mut self.page, other.page);
        take(&mut self.len, other.len);
        take(&mut self.order, other.order);
        take(&mut self.filter, other.filter);
        take(&mut self.filter_by, other.filter_by);
        take(&mut self.query, other.query);
    }
}

/// Outbound parameter set. Falsy entries are `None` and never serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WireParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub len: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(rename = "filterBy", skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
}

impl WireParams {
    /// Ordered `(name, value)` pairs, ready for a query string.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(len) = self.len {
            pairs.push(("len".to_string(), len.to_string()));
        }
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.clone()));
        }
        if let Some(q) = &self.q {
            pairs.push(("q".to_string(), q.clone()));
        }
        if let Some(filter) = &self.filter {
            pairs.push(("filter".to_string(), filter.clone()));
        }
        if let Some(filter_by) = &self.filter_by {
            pairs.push(("filterBy".to_string(), filter_by.clone()));
        }
        pairs
    }
}

/// Pagination, ordering and filtering state of one list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    offset: u64,
    page: u64,
    len: u64,
    order: String,
    filter: String,
    filter_by: String,
    base_query: String,
    query: String,
    total: Option<u64>,
    more: Option<bool>,
}

impl Default for QueryState {
    fn default() -> Self {
        QueryState {
            offset: 0,
            page: 1,
            len: DEFAULT_LEN,
            order: String::new(),
            filter: String::new(),
            filter_by: String::new(),
            base_query: String::new(),
            query: String::new(),
            total: None,
            more: None,
        }
    }
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn order(&self) -> &str {
        &self.order
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn filter_by(&self) -> &str {
        &self.filter_by
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn base_query(&self) -> &str {
        &self.base_query
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn more(&self) -> Option<bool> {
        self.more
    }

    /// Set the current page. Zero means "unset" and becomes 1; negatives clamp to 1.
    pub fn set_page(&mut self, value: i64) -> &mut Self {
        let value = if value == 0 { 1 } else { value };
        let value = value.max(1) as u64;
        if value != self.page {
            self.page = value;
            self.update_offset();
        }
        self
    }

    /// Set the raw offset. Does not touch `page`.
    pub fn set_offset(&mut self, value: i64) -> &mut Self {
        let value = value.max(0) as u64;
        if value != self.offset {
            self.offset = value;
        }
        self
    }

    /// Set the page length. Zero or negative falls back to the default of 10.
    /// A changed length moves back to page 1.
    pub fn set_len(&mut self, value: i64) -> &mut Self {
        let value = if value < 1 { DEFAULT_LEN } else { value as u64 };
        if value != self.len {
            self.len = value;
            self.set_page(1);
            self.update_offset();
        }
        self
    }

    /// Saturates instead of overflowing, so any page the lenient parser
    /// accepts yields an offset.
    fn update_offset(&mut self) {
        self.offset = (self.page - 1).saturating_mul(self.len);
    }

    pub fn set_order(&mut self, value: &str) -> &mut Self {
        if value != self.order {
            self.order = value.to_string();
            self.set_page(1);
        }
        self
    }

    pub fn set_filter(&mut self, value: &str) -> &mut Self {
        if value != self.filter {
            self.filter = value.to_string();
            self.set_page(1);
        }
        self
    }

    /// Set the quick-filter field list. Whitespace is stripped.
    pub fn set_filter_by(&mut self, value: &str) -> &mut Self {
        let value: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        if value != self.filter_by {
            self.filter_by = value;
            self.set_page(1);
        }
        self
    }

    pub fn set_query(&mut self, value: impl Into<QueryValue>) -> &mut Self {
        let value = value.into().into_query_string();
        if value != self.query {
            self.query = value;
            self.set_page(1);
        }
        self
    }

    pub fn set_base_query(&mut self, value: impl Into<QueryValue>) -> &mut Self {
        let value = value.into().into_query_string();
        if value != self.base_query {
            self.base_query = value;
            self.set_page(1);
        }
        self
    }

    /// Apply a partial parameter set.
    ///
    /// Absent entries go through the setters' defaults, so a bare
    /// `ListParams::default()` resets paging, ordering, filter and query.
    /// `page` is applied before the length, order, filter and query, so
    /// changing any of those in the same set still lands on page 1.
    /// `page` takes precedence over `offset`; a raw offset is honoured only
    /// when no page is given.
    pub fn set_params(&mut self, params: &ListParams) -> &mut Self {
        self.set_page(lenient_or(params.page.as_deref(), 1));
        self.set_len(lenient_or(params.len.as_deref(), DEFAULT_LEN as i64));
        self.set_order(params.order.as_deref().unwrap_or(""));
        self.set_filter(params.filter.as_deref().unwrap_or(""));
        self.set_filter_by(params.filter_by.as_deref().unwrap_or(""));
        self.set_query(params.query.as_deref().unwrap_or(""));

        match (&params.page, &params.offset) {
            (None, Some(offset)) => {
                self.set_offset(lenient_or(Some(offset), 0));
            }
            _ => self.update_offset(),
        }
        self
    }

    /// Outbound parameters; `q` joins the base query ahead of the user query.
    pub fn get_params(&self) -> WireParams {
        let queries: Vec<&str> = [self.base_query.as_str(), self.query.as_str()]
            .into_iter()
            .filter(|q| !q.is_empty())
            .collect();

        WireParams {
            offset: non_zero(self.offset),
            len: non_zero(self.len),
            order: non_empty(&self.order),
            q: if queries.is_empty() {
                None
            } else {
                Some(queries.join(","))
            },
            filter: non_empty(&self.filter),
            filter_by: non_empty(&self.filter_by),
        }
    }

    /// Parameters for the over-fetch probe used when no count is available.
    pub fn probe_params(&self) -> WireParams {
        let mut params = self.get_params();
        params.len = Some(self.len.saturating_add(1));
        params
    }

    /// Settle `more` from a probe result and drop the extra row.
    pub fn apply_probe<T>(&mut self, rows: &mut Vec<T>) {
        self.total = None;
        let len = self.len as usize;
        self.more = Some(rows.len() > len);
        rows.truncate(len);
    }

    /// Record the total number of matching rows, or forget it with `None`.
    pub fn set_total(&mut self, total: Option<u64>) -> &mut Self {
        match total {
            None => {
                self.total = None;
                self.more = None;
            }
            Some(total) => {
                self.total = Some(total);
                self.more = Some(total > self.offset.saturating_add(self.len));
            }
        }
        self
    }
}

fn non_zero(value: u64) -> Option<u64> {
    if value == 0 {
        None
    } else {
        Some(value)
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn lenient_or(value: Option<&str>, default: i64) -> i64 {
    match value {
        None | Some("") => default,
        Some(text) => parse_int_lenient(text).unwrap_or(default),
    }
}

/// Parse the leading integer of `text`: optional whitespace, optional sign,
/// then digits. Trailing garbage is ignored, `"12abc"` gives `12`.
pub fn parse_int_lenient(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let value: i64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}
