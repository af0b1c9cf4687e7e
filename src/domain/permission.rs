//! Per-user permissions
//!
//! Permissions are a map from lowercase resource name to granted actions.
//! A [`Session`] owns that map for one user and answers access questions;
//! it must be initialized from a [`PermissionSource`] before use.

use crate::error::{CrudError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[serde(alias = "alta")]
    Create,
    #[serde(alias = "consulta")]
    Read,
    #[serde(alias = "modificacion")]
    Update,
    #[serde(alias = "baja")]
    Delete,
}

impl Action {
    pub fn all() -> Vec<Action> {
        vec![Action::Create, Action::Read, Action::Update, Action::Delete]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" | "alta" => Ok(Action::Create),
            "read" | "consulta" => Ok(Action::Read),
            "update" | "modificacion" => Ok(Action::Update),
            "delete" | "baja" => Ok(Action::Delete),
            _ => Err(format!(
                "action '{}' not supported. supported actions: create, read, update, delete",
                s
            )),
        }
    }
}

/// The action a permission check asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wanted {
    Any,
    Action(Action),
}

impl From<Action> for Wanted {
    fn from(action: Action) -> Self {
        Wanted::Action(action)
    }
}

/// Lowercase resource name to granted actions.
pub type PermissionMap = BTreeMap<String, Vec<Action>>;

/// Group `{resource, action}` rows into a permission map.
///
/// Rows may use `resource`/`action` or the `RecursoCodigo`/`AccionCodigo`
/// attribute names. Rows with an unknown action are skipped.
///
/// ```
/// use crudkit::domain::permission::{reduce_permissions, Action};
/// use serde_json::json;
///
/// let map = reduce_permissions(&[
///     json!({"RecursoCodigo": "Accion", "AccionCodigo": "ALTA"}),
///     json!({"resource": "accion", "action": "read"}),
/// ]);
/// assert_eq!(map["accion"], vec![Action::Create, Action::Read]);
/// ```
pub fn reduce_permissions(rows: &[Value]) -> PermissionMap {
    let mut map = PermissionMap::new();
    for row in rows {
        let resource = row
            .get("resource")
            .or_else(|| row.get("RecursoCodigo"))
            .and_then(Value::as_str);
        let action = row
            .get("action")
            .or_else(|| row.get("AccionCodigo"))
            .and_then(Value::as_str);

        let (Some(resource), Some(action)) = (resource, action) else {
            log::debug!("skipping permission row without resource/action: {}", row);
            continue;
        };
        let Ok(action) = Action::from_str(action) else {
            log::debug!("skipping unknown action '{}' on '{}'", action, resource);
            continue;
        };

        let actions = map.entry(resource.to_lowercase()).or_default();
        if !actions.contains(&action) {
            actions.push(action);
        }
    }
    map
}

/// Where a session gets its permissions from.
pub trait PermissionSource {
    fn load(&self, user: &str) -> Result<PermissionMap>;
}

/// Permissions of one user.
///
/// Lifecycle: [`Session::new`], [`Session::init`], queries, then
/// [`Session::discard`]. Queries on a session that is not initialized fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: String,
    permissions: Option<PermissionMap>,
    unrestricted: bool,
}

impl Session {
    pub fn new(user: &str) -> Self {
        Session {
            user: user.to_string(),
            permissions: None,
            unrestricted: false,
        }
    }

    /// A session that allows everything. Used when no permissions are configured.
    pub fn unrestricted(user: &str) -> Self {
        Session {
            user: user.to_string(),
            permissions: Some(PermissionMap::new()),
            unrestricted: true,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn is_initialized(&self) -> bool {
        self.permissions.is_some()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.unrestricted
    }

    pub fn init(&mut self, source: &dyn PermissionSource) -> Result<&mut Self> {
        if self.user.trim().is_empty() {
            return Err(CrudError::Session("user not specified".to_string()));
        }
        let permissions = source.load(&self.user)?;
        log::debug!(
            "session for '{}' initialized with {} resources",
            self.user,
            permissions.len()
        );
        self.permissions = Some(permissions);
        Ok(self)
    }

    /// Initialize directly from a map.
    pub fn init_with(&mut self, permissions: PermissionMap) -> &mut Self {
        self.permissions = Some(permissions);
        self
    }

    /// Drop the loaded permissions. The session must be initialized again.
    pub fn discard(&mut self) {
        self.permissions = None;
        self.unrestricted = false;
    }

    /// Actions granted on `resource`.
    pub fn permissions_for(&self, resource: &str) -> Result<Vec<Action>> {
        let permissions = self
            .permissions
            .as_ref()
            .ok_or_else(|| CrudError::Session("permissions not initialized".to_string()))?;
        if resource.trim().is_empty() {
            return Err(CrudError::Session("resource not specified".to_string()));
        }
        if self.unrestricted {
            return Ok(Action::all());
        }
        Ok(permissions
            .get(&resource.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    /// Whether `wanted` is granted on `resource`. `Wanted::Any` asks for any action.
    pub fn can(&self, resource: &str, wanted: impl Into<Wanted>) -> Result<bool> {
        let actions = self.permissions_for(resource)?;
        if actions.is_empty() {
            return Ok(false);
        }
        Ok(match wanted.into() {
            Wanted::Any => true,
            Wanted::Action(action) => actions.contains(&action),
        })
    }

    /// Whether the only granted action on `resource` is read.
    pub fn can_read_only(&self, resource: &str) -> Result<bool> {
        let actions = self.permissions_for(resource)?;
        Ok(actions == [Action::Read])
    }
}
