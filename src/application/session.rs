//! Opening a permission session

use crate::domain::permission::{
    reduce_permissions, Action, PermissionMap, PermissionSource, Session,
};
use crate::error::{CrudError, Result};
use crate::infrastructure::config::{Config, PermissionsConfig};
use crate::infrastructure::transport::{HttpTransport, Transport};
use crate::infrastructure::url::parse_params;
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_TEMPLATE: &str = "$endpoint/permissions?application=$application&user=$user";
pub const DEFAULT_APPLICATION: &str = "crudkit";

/// Grants from configuration, plus full access to every resource of the user's roles.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    grants: PermissionMap,
    roles: BTreeMap<String, Vec<String>>,
    user_roles: Vec<String>,
}

impl StaticSource {
    pub fn new(grants: PermissionMap) -> Self {
        StaticSource {
            grants,
            ..Default::default()
        }
    }

    pub fn from_config(config: &PermissionsConfig) -> Self {
        StaticSource {
            grants: config.grants.clone(),
            roles: config.roles.clone(),
            user_roles: config.user_roles.clone(),
        }
    }
}

impl PermissionSource for StaticSource {
    fn load(&self, user: &str) -> Result<PermissionMap> {
        let mut permissions: PermissionMap = self
            .grants
            .iter()
            .map(|(resource, actions)| (resource.to_lowercase(), actions.clone()))
            .collect();

        for role in &self.user_roles {
            let found = self
                .roles
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(role));
            let Some((_, resources)) = found else {
                log::warn!("role '{}' of '{}' grants nothing", role, user);
                continue;
            };
            for resource in resources {
                permissions.insert(resource.to_lowercase(), Action::all());
            }
        }
        Ok(permissions)
    }
}

/// Permissions fetched from a URL template.
///
/// `$endpoint`, `$application` and `$user` are replaced before the request.
/// The response is either an array of permission rows or an object carrying
/// them under `Response.Rows`.
pub struct RemoteSource<'t> {
    transport: &'t dyn Transport,
    template: String,
    endpoint: String,
    application: String,
}

impl<'t> RemoteSource<'t> {
    pub fn new(
        transport: &'t dyn Transport,
        template: &str,
        endpoint: &str,
        application: &str,
    ) -> Self {
        RemoteSource {
            transport,
            template: template.to_string(),
            endpoint: endpoint.to_string(),
            application: application.to_string(),
        }
    }

    pub fn url(&self, user: &str) -> String {
        self.template
            .replace("$endpoint", &self.endpoint)
            .replace("$application", &self.application)
            .replace("$user", user)
    }
}

impl PermissionSource for RemoteSource<'_> {
    fn load(&self, user: &str) -> Result<PermissionMap> {
        let url = self.url(user);
        let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
        log::debug!("loading permissions for '{}' from {}", user, path);

        let response = self.transport.get(path, &parse_params(query))?;
        let rows = match &response {
            Value::Array(rows) => rows,
            other => other
                .get("Response")
                .and_then(|r| r.get("Rows"))
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    CrudError::Protocol("permission response has no rows".to_string())
                })?,
        };
        Ok(reduce_permissions(rows))
    }
}

/// Open and initialize the session configured under `[permissions]`.
///
/// Nothing configured gives an unrestricted session.
pub fn open_session(config: &Config, transport: &dyn Transport) -> Result<Session> {
    let permissions = &config.permissions;
    let user = permissions.user();

    if permissions.is_empty() {
        log::debug!("no permissions configured, session is unrestricted");
        return Ok(Session::unrestricted(user));
    }

    let mut session = Session::new(user);
    match &permissions.template {
        Some(template) => {
            let endpoint = permissions.endpoint.as_deref().unwrap_or("");
            let application = permissions
                .application
                .as_deref()
                .unwrap_or(DEFAULT_APPLICATION);

            let remote_endpoint =
                endpoint.starts_with("http://") || endpoint.starts_with("https://");
            if remote_endpoint && !config.is_remote() {
                let http = HttpTransport::new(endpoint, config.timeout_secs)?;
                session.init(&RemoteSource::new(&http, template, endpoint, application))?;
            } else {
                session.init(&RemoteSource::new(transport, template, endpoint, application))?;
            }
        }
        None => {
            session.init(&StaticSource::from_config(permissions))?;
        }
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::permission::Wanted;
    use crate::infrastructure::file_backend::FileBackend;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_static_source_merges_roles() {
        let mut config = PermissionsConfig::default();
        config
            .grants
            .insert("Country".to_string(), vec![Action::Read]);
        config
            .roles
            .insert("admin-catalog".to_string(), vec!["Wine".to_string()]);
        config.user_roles = vec!["Admin-Catalog".to_string(), "ghost".to_string()];

        let map = StaticSource::from_config(&config).load("jdoe").unwrap();
        assert_eq!(map["country"], vec![Action::Read]);
        assert_eq!(map["wine"], Action::all());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_remote_source_expands_template() {
        let temp = TempDir::new().unwrap();
        let backend = FileBackend::new(temp.path());
        let source = RemoteSource::new(&backend, DEFAULT_TEMPLATE, "", "shop");
        assert_eq!(
            source.url("jdoe"),
            "/permissions?application=shop&user=jdoe"
        );
    }

    #[test]
    fn test_remote_source_reads_wrapped_rows() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("permissions.json"),
            json!([
                {"RecursoCodigo": "Wine", "AccionCodigo": "CONSULTA"},
                {"RecursoCodigo": "Wine", "AccionCodigo": "ALTA"}
            ])
            .to_string(),
        )
        .unwrap();
        let backend = FileBackend::new(temp.path());

        let mut session = Session::new("jdoe");
        session
            .init(&RemoteSource::new(&backend, DEFAULT_TEMPLATE, "", "shop"))
            .unwrap();
        assert!(session.can("wine", Action::Create).unwrap());
        assert!(!session.can("wine", Action::Delete).unwrap());
    }

    #[test]
    fn test_open_session_unrestricted_by_default() {
        let temp = TempDir::new().unwrap();
        let backend = FileBackend::new(temp.path());
        let config = Config::new("data");

        let session = open_session(&config, &backend).unwrap();
        assert!(session.is_unrestricted());
        assert!(session.can("anything", Wanted::Any).unwrap());
        assert_eq!(session.user(), "anonymous");
    }

    #[test]
    fn test_open_session_static() {
        let temp = TempDir::new().unwrap();
        let backend = FileBackend::new(temp.path());
        let mut config = Config::new("data");
        config.permissions.user = Some("jdoe".to_string());
        config
            .permissions
            .grants
            .insert("wine".to_string(), vec![Action::Read]);

        let session = open_session(&config, &backend).unwrap();
        assert!(!session.is_unrestricted());
        assert!(session.can_read_only("wine").unwrap());
        assert!(!session.can("country", Wanted::Any).unwrap());
    }
}
