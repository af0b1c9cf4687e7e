//! CRUD controller of a child resource
//!
//! A child lists only the rows of its current parent: the parent id is
//! folded into the collection's base query as `parent_field:id`.

use crate::application::crud::CrudController;
use crate::domain::control::ControlRegistry;
use crate::domain::field::set_path;
use crate::domain::permission::Session;
use crate::domain::query::ListParams;
use crate::error::{CrudError, Result};
use crate::infrastructure::config::ResourceDef;
use crate::infrastructure::transport::Transport;
use serde_json::Value;

pub struct CrudChildController<'t> {
    controller: CrudController<'t>,
    parent_field: String,
    parent_id: Option<String>,
    page_len: u64,
}

impl<'t> CrudChildController<'t> {
    pub fn new(
        resource: &ResourceDef,
        transport: &'t dyn Transport,
        session: &'t Session,
        registry: &ControlRegistry,
        page_len: u64,
    ) -> Result<Self> {
        let parent_field = resource.parent_field.clone().ok_or_else(|| {
            CrudError::Config(format!("resource '{}' has no parent_field", resource.name))
        })?;
        Ok(CrudChildController {
            controller: CrudController::new(resource, transport, session, registry, page_len)?,
            parent_field,
            parent_id: None,
            page_len,
        })
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Point the child at another parent.
    ///
    /// Remembered list parameters are dropped. Setting the current parent
    /// again changes nothing.
    pub fn set_parent(&mut self, id: &str) {
        if self.parent_id.as_deref() == Some(id) {
            return;
        }
        log::debug!(
            "{}: parent {:?} -> {}",
            self.controller.resource().name,
            self.parent_id,
            id
        );
        self.parent_id = Some(id.to_string());
        self.controller.reset_query_params(self.page_len);

        let restriction = format!("{}:{}", self.parent_field, id);
        let base_query = match self.controller.resource().base_query.as_deref() {
            Some(base) if !base.is_empty() => format!("{},{}", base, restriction),
            _ => restriction,
        };
        self.controller.set_base_query(&base_query);
    }

    fn require_parent(&self) -> Result<&str> {
        self.parent_id.as_deref().ok_or_else(|| {
            CrudError::InvalidInput(format!(
                "{} needs a parent before it can be used",
                self.controller.resource().name
            ))
        })
    }

    pub fn list(&mut self, params: ListParams) -> Result<&[Value]> {
        self.require_parent()?;
        self.controller.list(params)
    }

    pub fn filter(&mut self, text: &str) -> Result<&[Value]> {
        self.require_parent()?;
        self.controller.filter(text)
    }

    /// New record already linked to the current parent.
    pub fn create(&mut self) -> Result<&Value> {
        let parent_id = self.require_parent()?.to_string();
        let parent_field = self.parent_field.clone();
        let mut record = self.controller.create()?.clone();
        set_path(&mut record, &parent_field, parent_value(&parent_id));
        Ok(self.controller.replace_current(record))
    }

    pub fn controller(&self) -> &CrudController<'t> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut CrudController<'t> {
        &mut self.controller
    }
}

/// Numeric ids stay numbers in the stored record.
fn parent_value(id: &str) -> Value {
    match id.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(id.to_string()),
    }
}
