//! Remote collection: query state plus the rows of the last fetch

use crate::domain::paginator::{paginate, PageInput, Pagination};
use crate::domain::query::{ListParams, QueryState};
use crate::domain::selection::record_id;
use crate::error::{CrudError, Result};
use crate::infrastructure::transport::Transport;
use serde_json::Value;

/// Anything with query state and a fetched page of rows.
pub trait Paginatable {
    fn query_state(&self) -> &QueryState;

    fn fetched(&self) -> usize;

    fn pagination(&self, pages_to_show: u64) -> Pagination {
        paginate(
            PageInput::from_state(self.query_state(), self.fetched()),
            pages_to_show,
        )
    }
}

pub struct RemoteCollection<'t> {
    url: String,
    fetch_total: bool,
    state: QueryState,
    rows: Vec<Value>,
    transport: &'t dyn Transport,
}

impl<'t> RemoteCollection<'t> {
    pub fn new(url: &str, transport: &'t dyn Transport) -> Self {
        RemoteCollection {
            url: url.trim_matches('/').to_string(),
            fetch_total: true,
            state: QueryState::new(),
            rows: Vec::new(),
            transport,
        }
    }

    /// Without a total, paging probes one row past the page instead of
    /// asking `<url>/count`.
    pub fn with_fetch_total(mut self, fetch_total: bool) -> Self {
        self.fetch_total = fetch_total;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut QueryState {
        &mut self.state
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn set_params(&mut self, params: &ListParams) -> &mut Self {
        self.state.set_params(params);
        self
    }

    /// Fetch the current page.
    ///
    /// The count request only follows a successful listing. A failed count
    /// leaves total and more unknown; a failed listing does too, drops the
    /// rows of the previous page, and is returned.
    pub fn fetch(&mut self) -> Result<&[Value]> {
        let params = if self.fetch_total {
            self.state.get_params()
        } else {
            self.state.probe_params()
        };
        let pairs = params.to_pairs();

        let listed = self
            .transport
            .get(&self.url, &pairs)
            .and_then(|value| rows_of(&self.url, value));
        let mut rows = match listed {
            Ok(rows) => rows,
            Err(e) => {
                self.state.set_total(None);
                self.rows.clear();
                return Err(e);
            }
        };

        if self.fetch_total {
            let counted = self
                .transport
                .get(&format!("{}/count", self.url), &pairs)
                .and_then(|value| parse_count(&value));
            match counted {
                Ok(total) => {
                    self.state.set_total(Some(total));
                }
                Err(e) => {
                    log::warn!("count of {} failed, total unknown: {}", self.url, e);
                    self.state.set_total(None);
                }
            }
        } else {
            self.state.apply_probe(&mut rows);
        }

        log::debug!(
            "fetched {} rows of {} (total {:?}, more {:?})",
            rows.len(),
            self.url,
            self.state.total(),
            self.state.more()
        );
        self.rows = rows;
        Ok(&self.rows)
    }

    /// A fetched row by id.
    pub fn find(&self, id: &str, id_attribute: &str) -> Option<&Value> {
        self.rows
            .iter()
            .find(|row| record_id(row, id_attribute).as_deref() == Some(id))
    }

    /// One record from the server.
    pub fn get(&self, id: &str) -> Result<Value> {
        self.transport.get(&format!("{}/{}", self.url, id), &[])
    }

    pub fn create(&self, record: &Value) -> Result<Value> {
        self.transport.post(&self.url, record)
    }

    pub fn update(&self, id: &str, record: &Value) -> Result<Value> {
        self.transport.put(&format!("{}/{}", self.url, id), record)
    }

    pub fn destroy(&self, id: &str) -> Result<()> {
        self.transport.delete(&format!("{}/{}", self.url, id))
    }
}

impl Paginatable for RemoteCollection<'_> {
    fn query_state(&self) -> &QueryState {
        &self.state
    }

    fn fetched(&self) -> usize {
        self.rows.len()
    }
}

fn rows_of(url: &str, value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(rows) => Ok(rows),
        other => Err(CrudError::Protocol(format!(
            "listing {} returned {} instead of an array",
            url,
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Count responses are a bare integer, possibly quoted, or `{"count": n}`.
fn parse_count(value: &Value) -> Result<u64> {
    let count = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => map.get("count").and_then(|c| parse_count(c).ok()),
        _ => None,
    };
    count.ok_or_else(|| CrudError::Protocol(format!("unexpected count response: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    /// Serves `total` numbered rows and records every request.
    struct FakeServer {
        total: usize,
        count_fails: bool,
        list_fails: Cell<bool>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeServer {
        fn new(total: usize) -> Self {
            FakeServer {
                total,
                count_fails: false,
                list_fails: Cell::new(false),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for FakeServer {
        fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
            self.requests.borrow_mut().push(path.to_string());
            if path.ends_with("/count") {
                if self.count_fails {
                    return Err(CrudError::Protocol("count unavailable".to_string()));
                }
                return Ok(json!(self.total.to_string()));
            }
            if self.list_fails.get() {
                return Err(CrudError::Protocol("listing unavailable".to_string()));
            }
            let param = |name: &str| {
                params
                    .iter()
                    .find(|(k, _)| k == name)
                    .and_then(|(_, v)| v.parse::<usize>().ok())
            };
            let offset = param("offset").unwrap_or(0);
            let len = param("len").unwrap_or(self.total);
            let rows: Vec<Value> = (offset..self.total)
                .take(len)
                .map(|i| json!({"id": i + 1}))
                .collect();
            Ok(Value::Array(rows))
        }

        fn post(&self, _path: &str, body: &Value) -> Result<Value> {
            Ok(body.clone())
        }

        fn put(&self, _path: &str, body: &Value) -> Result<Value> {
            Ok(body.clone())
        }

        fn delete(&self, _path: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_fetch_with_total() {
        let server = FakeServer::new(25);
        let mut collection = RemoteCollection::new("wine", &server);
        collection.fetch().unwrap();

        assert_eq!(collection.rows().len(), 10);
        assert_eq!(collection.state().total(), Some(25));
        assert_eq!(collection.state().more(), Some(true));
        assert_eq!(*server.requests.borrow(), vec!["wine", "wine/count"]);

        let pagination = collection.pagination(3);
        assert_eq!(pagination.last, 3);
        assert_eq!((pagination.from, pagination.to), (1, 10));
    }

    #[test]
    fn test_fetch_probe_without_total() {
        let server = FakeServer::new(25);
        let mut collection = RemoteCollection::new("wine", &server).with_fetch_total(false);
        collection.state_mut().set_page(3);
        collection.fetch().unwrap();

        assert_eq!(collection.rows().len(), 5);
        assert_eq!(collection.state().more(), Some(false));
        assert_eq!(collection.state().total(), None);
        assert_eq!(*server.requests.borrow(), vec!["wine"]);

        collection.state_mut().set_page(1);
        collection.fetch().unwrap();
        assert_eq!(collection.rows().len(), 10);
        assert_eq!(collection.state().more(), Some(true));
    }

    #[test]
    fn test_failed_count_leaves_total_unknown() {
        let mut server = FakeServer::new(25);
        server.count_fails = true;
        let mut collection = RemoteCollection::new("wine", &server);
        collection.fetch().unwrap();

        assert_eq!(collection.rows().len(), 10);
        assert_eq!(collection.state().total(), None);
        assert_eq!(collection.state().more(), None);
    }

    #[test]
    fn test_failed_listing_skips_count() {
        let server = FakeServer::new(25);
        server.list_fails.set(true);
        let mut collection = RemoteCollection::new("wine", &server);
        collection.state_mut().set_total(Some(25));

        assert!(collection.fetch().is_err());
        assert_eq!(collection.state().total(), None);
        assert_eq!(*server.requests.borrow(), vec!["wine"]);
    }

    #[test]
    fn test_failed_listing_drops_previous_rows() {
        let server = FakeServer::new(25);
        let mut collection = RemoteCollection::new("wine", &server);
        collection.fetch().unwrap();
        assert_eq!(collection.rows().len(), 10);

        server.list_fails.set(true);
        collection.state_mut().set_page(2);
        assert!(collection.fetch().is_err());
        assert!(collection.rows().is_empty());
        assert_eq!(collection.fetched(), 0);
        let pagination = collection.pagination(3);
        assert!(pagination.to < pagination.from);
    }

    #[test]
    fn test_find_fetched_row() {
        let server = FakeServer::new(3);
        let mut collection = RemoteCollection::new("/wine/", &server);
        collection.fetch().unwrap();
        assert_eq!(collection.url(), "wine");
        assert_eq!(collection.find("2", "id"), Some(&json!({"id": 2})));
        assert_eq!(collection.find("9", "id"), None);
    }

    #[test]
    fn test_parse_count_shapes() {
        assert_eq!(parse_count(&json!(7)).unwrap(), 7);
        assert_eq!(parse_count(&json!(" 7 ")).unwrap(), 7);
        assert_eq!(parse_count(&json!({"count": 7})).unwrap(), 7);
        assert!(parse_count(&json!([7])).is_err());
    }

    #[test]
    fn test_listing_must_be_an_array() {
        assert!(matches!(
            rows_of("wine", json!({"rows": []})),
            Err(CrudError::Protocol(_))
        ));
    }
}
