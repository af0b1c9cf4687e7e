//! CRUD controller use case
//!
//! One controller drives one resource: it lists through a
//! [`RemoteCollection`], edits through a [`Form`], and checks every step
//! against the permission [`Session`].

use crate::application::collection::{Paginatable, RemoteCollection};
use crate::domain::control::{ControlRegistry, Form};
use crate::domain::field::{FieldBound, Schema};
use crate::domain::paginator::Pagination;
use crate::domain::permission::{Action, Session, Wanted};
use crate::domain::query::ListParams;
use crate::domain::selection::{record_id, SelectableList};
use crate::error::{CrudError, Result};
use crate::infrastructure::config::ResourceDef;
use crate::infrastructure::transport::Transport;
use serde_json::Value;
use std::fmt;

/// What the controller is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    List,
    Show,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::List => "list",
            Mode::Show => "show",
            Mode::Create => "create",
            Mode::Update => "update",
            Mode::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

/// Success message of a write, with the record the server returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub record: Value,
}

/// Result of a bulk delete. Failures do not stop the remaining ids.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, CrudError)>,
}

pub struct CrudController<'t> {
    resource: ResourceDef,
    table: Schema,
    form: Form,
    filter_by: String,
    collection: RemoteCollection<'t>,
    session: &'t Session,
    query_params: ListParams,
    mode: Mode,
    read_only: bool,
    current: Option<Value>,
}

impl<'t> CrudController<'t> {
    /// Create a controller for `resource`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The session grants nothing on the resource
    /// - A schema or control of the resource is invalid
    pub fn new(
        resource: &ResourceDef,
        transport: &'t dyn Transport,
        session: &'t Session,
        registry: &ControlRegistry,
        page_len: u64,
    ) -> Result<Self> {
        if !session.can(&resource.name, Wanted::Any)? {
            return Err(CrudError::PermissionDenied {
                resource: resource.name.clone(),
                action: "access".to_string(),
            });
        }
        let read_only = resource.read_only || session.can_read_only(&resource.name)?;

        let table = resource.table_schema()?;
        let form = Form::build(&resource.form_schema()?, registry)?;
        let filter_by = resource.filter_by()?;

        let mut collection = RemoteCollection::new(resource.url(), transport)
            .with_fetch_total(resource.fetch_total);
        collection
            .state_mut()
            .set_base_query(resource.base_query.as_deref().unwrap_or(""));

        let mut controller = CrudController {
            resource: resource.clone(),
            table,
            form,
            filter_by,
            collection,
            session,
            query_params: ListParams::default(),
            mode: Mode::List,
            read_only,
            current: None,
        };
        controller.reset_query_params(page_len);
        log::debug!(
            "controller for '{}' ready (read only: {})",
            resource.name,
            read_only
        );
        Ok(controller)
    }

    fn initial_params(&self, page_len: u64) -> ListParams {
        ListParams {
            order: self.resource.order.clone(),
            len: Some(page_len.to_string()),
            ..Default::default()
        }
    }

    /// Forget every remembered list parameter. The collection starts from
    /// the resource order and `page_len`, so only later changes move the
    /// list back to page 1.
    pub fn reset_query_params(&mut self, page_len: u64) {
        self.query_params = self.initial_params(page_len);
        self.collection.set_params(&self.query_params);
    }

    /// Start the list view from `params` without counting them as changes,
    /// so a page asked for together with an order, filter or length is
    /// kept. The page itself is applied by the next [`list`](Self::list).
    pub fn start_from(&mut self, params: ListParams) {
        self.query_params.merge(params);
        let page = self.query_params.page.take();
        self.collection.set_params(&self.query_params);
        self.query_params.page = page;
    }

    pub fn set_base_query(&mut self, base_query: &str) {
        self.collection.state_mut().set_base_query(base_query);
    }

    /// Merge `params` into the remembered ones and fetch the page.
    ///
    /// The remembered page is the one the collection settled on, so a page
    /// dropped by an order or filter change does not come back later.
    pub fn list(&mut self, params: ListParams) -> Result<&[Value]> {
        self.require(Action::Read)?;
        self.query_params.merge(params);
        self.collection.set_params(&self.query_params);
        self.query_params.page = Some(self.collection.state().page().to_string());
        self.set_mode(Mode::List);
        self.collection.fetch()
    }

    /// Quick filter over the resource's filter fields, from page 1.
    pub fn filter(&mut self, text: &str) -> Result<&[Value]> {
        let params = ListParams {
            filter: Some(text.to_string()),
            filter_by: Some(self.filter_by.clone()),
            page: Some("1".to_string()),
            ..Default::default()
        };
        self.list(params)
    }

    /// Load a record for editing, or for showing when read only.
    pub fn edit(&mut self, id: &str) -> Result<&Value> {
        self.require(Action::Read)?;
        let writable = !self.read_only && self.session.can(&self.resource.name, Action::Update)?;

        let fetched = if self.resource.fetch_on_edit {
            None
        } else {
            self.collection
                .find(id, &self.resource.id_attribute)
                .cloned()
        };
        let record = match fetched {
            Some(record) => record,
            None => self.collection.get(id)?,
        };

        self.set_mode(if writable { Mode::Update } else { Mode::Show });
        Ok(self.current.insert(record))
    }

    /// Start a new record from the form defaults.
    pub fn create(&mut self) -> Result<&Value> {
        self.require_writable(Action::Create)?;
        let record = self.form.schema().defaults();
        self.set_mode(Mode::Create);
        Ok(self.current.insert(record))
    }

    pub(crate) fn replace_current(&mut self, record: Value) -> &Value {
        self.current.insert(record)
    }

    /// Apply `changes` to the current record and send it.
    ///
    /// New records are POSTed without their id unless one was given
    /// explicitly; existing ones are PUT to their id. The list is refreshed
    /// afterwards; a failed refresh is only logged.
    pub fn save(&mut self, changes: &[(String, String)]) -> Result<Notice> {
        let action = match self.mode {
            Mode::Create => Action::Create,
            Mode::Update | Mode::Show => Action::Update,
            mode => {
                return Err(CrudError::InvalidInput(format!(
                    "nothing to save in {} mode",
                    mode
                )))
            }
        };
        self.require_writable(action)?;

        let id_attribute = self.resource.id_attribute.clone();
        let mut record = match &self.current {
            Some(record) => record.clone(),
            None => self.form.schema().defaults(),
        };
        self.form.apply(&mut record, changes)?;

        let (saved, verb) = if action == Action::Create {
            let explicit_id = changes.iter().any(|(name, _)| *name == id_attribute);
            if !explicit_id {
                if let Value::Object(map) = &mut record {
                    map.remove(&id_attribute);
                }
            }
            (self.collection.create(&record)?, "created")
        } else {
            let id = self
                .current
                .as_ref()
                .and_then(|current| record_id(current, &id_attribute))
                .ok_or_else(|| {
                    CrudError::InvalidInput(format!("record has no '{}'", id_attribute))
                })?;
            (self.collection.update(&id, &record)?, "updated")
        };

        let saved = if saved.is_null() { record } else { saved };
        let message = match record_id(&saved, &id_attribute) {
            Some(id) => format!("{} {} {}", self.resource.label(), id, verb),
            None => format!("{} {}", self.resource.label(), verb),
        };
        log::info!("{}", message);

        self.current = Some(saved.clone());
        self.set_mode(Mode::List);
        self.refresh();
        Ok(Notice {
            message,
            record: saved,
        })
    }

    /// Delete one record. A failure restores the previous mode.
    pub fn delete(&mut self, id: &str) -> Result<Notice> {
        self.require_writable(Action::Delete)?;
        let previous = self.mode;
        self.set_mode(Mode::Delete);

        let result = self.destroy_existing(id);
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                self.set_mode(previous);
                return Err(e);
            }
        };

        let message = format!("{} {} deleted", self.resource.label(), id);
        log::info!("{}", message);
        self.current = None;
        self.set_mode(Mode::List);
        self.refresh();
        Ok(Notice { message, record })
    }

    fn destroy_existing(&self, id: &str) -> Result<Value> {
        let record = match self.collection.find(id, &self.resource.id_attribute) {
            Some(record) => record.clone(),
            None => self.collection.get(id)?,
        };
        self.collection.destroy(id)?;
        Ok(record)
    }

    /// Delete every selected record, then refresh once.
    pub fn delete_selected(&mut self, selection: &SelectableList) -> Result<BulkOutcome> {
        self.require_writable(Action::Delete)?;
        if selection.selected().is_empty() {
            return Err(CrudError::InvalidInput("no records selected".to_string()));
        }

        let mut outcome = BulkOutcome::default();
        for id in selection.selected() {
            match self.collection.destroy(id) {
                Ok(()) => outcome.deleted.push(id.clone()),
                Err(e) => {
                    log::warn!("deleting {} {} failed: {}", self.resource.name, id, e);
                    outcome.failed.push((id.clone(), e));
                }
            }
        }

        self.set_mode(Mode::List);
        self.refresh();
        Ok(outcome)
    }

    fn refresh(&mut self) {
        if !self.session.can(&self.resource.name, Action::Read).unwrap_or(false) {
            return;
        }
        if let Err(e) = self.collection.fetch() {
            log::warn!("refreshing {} failed: {}", self.resource.name, e);
        }
    }

    fn require(&self, action: Action) -> Result<()> {
        if self.session.can(&self.resource.name, action)? {
            Ok(())
        } else {
            Err(CrudError::PermissionDenied {
                resource: self.resource.name.clone(),
                action: action.to_string(),
            })
        }
    }

    fn require_writable(&self, action: Action) -> Result<()> {
        if self.read_only {
            return Err(CrudError::ReadOnly(self.resource.name.clone()));
        }
        self.require(action)
    }

    fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            log::info!("{}: {} -> {}", self.resource.name, self.mode, mode);
        }
        self.mode = mode;
    }

    pub fn resource(&self) -> &ResourceDef {
        &self.resource
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn table(&self) -> &Schema {
        &self.table
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn filter_by(&self) -> &str {
        &self.filter_by
    }

    pub fn query_params(&self) -> &ListParams {
        &self.query_params
    }

    pub fn collection(&self) -> &RemoteCollection<'t> {
        &self.collection
    }

    pub fn rows(&self) -> &[Value] {
        self.collection.rows()
    }

    pub fn current(&self) -> Option<&Value> {
        self.current.as_ref()
    }

    pub fn pagination(&self, pages_to_show: u64) -> Pagination {
        self.collection.pagination(pages_to_show)
    }
}

impl FieldBound for CrudController<'_> {
    fn schema(&self) -> &Schema {
        &self.table
    }
}
