//! Query-string helpers
//!
//! Parameters are ordered `(name, value)` pairs, encoded and decoded as
//! `application/x-www-form-urlencoded`.

use crate::domain::query::ListParams;
use url::form_urlencoded;

pub type Params = Vec<(String, String)>;

const LIST_KEYS: [&str; 5] = ["page", "len", "order", "filter", "q"];

/// Serialize pairs as `a=1&b=2`.
pub fn build_params(params: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

/// Parse `a=1&b=2`. A leading `?` is ignored; later duplicates win.
pub fn parse_params(query: &str) -> Params {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut params: Params = Vec::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key.is_empty() {
            continue;
        }
        match params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value.into_owned(),
            None => params.push((key.into_owned(), value.into_owned())),
        }
    }
    params
}

/// Keep only the list parameters a view restores from a query string.
pub fn parse_query(query: &str) -> Params {
    parse_params(query)
        .into_iter()
        .filter(|(k, _)| LIST_KEYS.contains(&k.as_str()))
        .collect()
}

/// List parameters carried by a query string.
pub fn list_params(query: &str) -> ListParams {
    let mut params = ListParams::default();
    for (key, value) in parse_query(query) {
        match key.as_str() {
            "page" => params.page = Some(value),
            "len" => params.len = Some(value),
            "order" => params.order = Some(value),
            "filter" => params.filter = Some(value),
            "q" => params.query = Some(value),
            _ => {}
        }
    }
    params
}

/// Query string restoring the view described by `params`; the inverse of
/// [`list_params`]. Empty entries are left out.
pub fn query_string(params: &ListParams) -> String {
    let entries = [
        ("page", &params.page),
        ("len", &params.len),
        ("order", &params.order),
        ("filter", &params.filter),
        ("q", &params.query),
    ];
    let pairs: Params = entries
        .into_iter()
        .filter_map(|(key, value)| match value.as_deref() {
            Some(value) if !value.is_empty() => Some((key.to_string(), value.to_string())),
            _ => None,
        })
        .collect();
    build_params(&pairs)
}
