//! Navigation menu tree

use crate::domain::field::get_path;
use crate::domain::flatten::scalar_text;
use crate::domain::permission::{Session, Wanted};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: String,
    pub parent_id: Option<String>,
    pub label: String,
    pub url: Option<String>,
    pub resource: Option<String>,
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    pub fn new(id: &str, label: &str) -> Self {
        MenuItem {
            id: id.to_string(),
            label: label.to_string(),
            ..Default::default()
        }
    }

    pub fn root() -> Self {
        MenuItem::new("", "root")
    }

    pub fn is_root(&self) -> bool {
        self.id.is_empty()
    }

    /// Arrange flat items under this node.
    ///
    /// Items without a parent, or whose parent is not in `items`, hang
    /// directly from this node. Items caught in a parent cycle are dropped.
    pub fn load_children(mut self, items: Vec<MenuItem>) -> Self {
        let ids: HashSet<String> = items.iter().map(|i| i.id.clone()).collect();
        let mut visited = HashSet::new();

        let top: Vec<MenuItem> = items
            .iter()
            .filter(|i| match &i.parent_id {
                Some(parent) => parent.is_empty() || !ids.contains(parent) || *parent == i.id,
                None => true,
            })
            .cloned()
            .collect();

        for mut item in top {
            visited.insert(item.id.clone());
            attach(&mut item, &items, &mut visited);
            self.children.push(item);
        }

        if visited.len() < items.len() {
            log::warn!(
                "{} menu items dropped: parent cycle",
                items.len() - visited.len()
            );
        }
        self
    }

    /// Prune items the session cannot access, then link-less empty branches.
    pub fn apply_permissions(mut self, session: &Session) -> Self {
        self.children = prune(std::mem::take(&mut self.children), session);
        self
    }

    /// Depth-first walk below this node, with depth starting at 0.
    pub fn walk(&self) -> Vec<(usize, &MenuItem)> {
        let mut out = Vec::new();
        for child in &self.children {
            walk_into(child, 0, &mut out);
        }
        out
    }
}

fn attach(parent: &mut MenuItem, items: &[MenuItem], visited: &mut HashSet<String>) {
    for item in items {
        if item.parent_id.as_deref() == Some(parent.id.as_str())
            && item.id != parent.id
            && !visited.contains(&item.id)
        {
            visited.insert(item.id.clone());
            let mut child = item.clone();
            attach(&mut child, items, visited);
            parent.children.push(child);
        }
    }
}

fn prune(items: Vec<MenuItem>, session: &Session) -> Vec<MenuItem> {
    items
        .into_iter()
        .filter_map(|mut item| {
            if let Some(resource) = &item.resource {
                if !session.can(resource, Wanted::Any).unwrap_or(false) {
                    log::debug!("menu item '{}' hidden: no access to '{}'", item.label, resource);
                    return None;
                }
            }
            let had_children = !item.children.is_empty();
            item.children = prune(std::mem::take(&mut item.children), session);
            if had_children && item.children.is_empty() && item.url.is_none() {
                return None;
            }
            Some(item)
        })
        .collect()
}

fn walk_into<'a>(item: &'a MenuItem, depth: usize, out: &mut Vec<(usize, &'a MenuItem)>) {
    out.push((depth, item));
    for child in &item.children {
        walk_into(child, depth + 1, out);
    }
}

/// Attribute names used to read menu records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuAdapter {
    pub id: String,
    pub parent_id: String,
    pub label: String,
    pub url: String,
    pub resource: String,
}

impl Default for MenuAdapter {
    fn default() -> Self {
        MenuAdapter {
            id: "id".to_string(),
            parent_id: "parent_id".to_string(),
            label: "label".to_string(),
            url: "url".to_string(),
            resource: "resource".to_string(),
        }
    }
}

impl MenuAdapter {
    pub fn adapt(&self, record: &Value) -> MenuItem {
        let text = |attr: &str| {
            get_path(record, attr)
                .map(scalar_text)
                .filter(|s| !s.is_empty())
        };
        let id = text(&self.id).unwrap_or_default();
        MenuItem {
            label: text(&self.label).unwrap_or_else(|| id.clone()),
            parent_id: text(&self.parent_id),
            url: text(&self.url),
            resource: text(&self.resource),
            children: Vec::new(),
            id,
        }
    }

    pub fn adapt_all(&self, records: &[Value]) -> Vec<MenuItem> {
        records.iter().map(|r| self.adapt(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::permission::{Action, PermissionMap};
    use serde_json::json;

    fn records() -> Vec<Value> {
        vec![
            json!({"id": 1, "label": "Catalog"}),
            json!({"id": 2, "parent_id": 1, "label": "Wines", "url": "/wine", "resource": "wine"}),
            json!({
                "id": 3, "parent_id": 1, "label": "Countries",
                "url": "/country", "resource": "country"
            }),
            json!({"id": 4, "label": "Admin"}),
            json!({
                "id": 5, "parent_id": 4, "label": "Users", "url": "/usuario", "resource": "usuario"
            }),
            json!({"id": 6, "parent_id": 99, "label": "Help", "url": "/help"}),
        ]
    }

    fn menu() -> MenuItem {
        MenuItem::root().load_children(MenuAdapter::default().adapt_all(&records()))
    }

    #[test]
    fn test_load_children_builds_tree() {
        let root = menu();
        let labels: Vec<&str> = root.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Catalog", "Admin", "Help"]);
        assert_eq!(root.children[0].children.len(), 2);
        assert_eq!(root.children[0].children[1].url.as_deref(), Some("/country"));
    }

    #[test]
    fn test_walk_depths() {
        let root = menu();
        let walked: Vec<(usize, &str)> = root
            .walk()
            .into_iter()
            .map(|(d, i)| (d, i.label.as_str()))
            .collect();
        assert_eq!(
            walked,
            vec![
                (0, "Catalog"),
                (1, "Wines"),
                (1, "Countries"),
                (0, "Admin"),
                (1, "Users"),
                (0, "Help"),
            ]
        );
    }

    #[test]
    fn test_apply_permissions_prunes() {
        let mut permissions = PermissionMap::new();
        permissions.insert("wine".to_string(), vec![Action::Read]);
        let mut session = Session::new("jdoe");
        session.init_with(permissions);

        let root = menu().apply_permissions(&session);
        let labels: Vec<&str> = root.walk().iter().map(|(_, i)| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Catalog", "Wines", "Help"]);
    }

    #[test]
    fn test_cycle_is_dropped() {
        let items = vec![
            MenuItem {
                parent_id: Some("b".to_string()),
                ..MenuItem::new("a", "A")
            },
            MenuItem {
                parent_id: Some("a".to_string()),
                ..MenuItem::new("b", "B")
            },
            MenuItem::new("c", "C"),
        ];
        let root = MenuItem::root().load_children(items);
        assert_eq!(root.walk().len(), 1);
    }

    #[test]
    fn test_adapter_custom_names() {
        let adapter = MenuAdapter {
            id: "MenuId".to_string(),
            parent_id: "PadreId".to_string(),
            label: "Texto".to_string(),
            url: "Url".to_string(),
            resource: "Recurso".to_string(),
        };
        let item =
            adapter.adapt(&json!({"MenuId": 7, "PadreId": 0, "Texto": "Zonas", "Recurso": "zona"}));
        assert_eq!(item.id, "7");
        assert_eq!(item.parent_id.as_deref(), Some("0"));
        assert_eq!(item.resource.as_deref(), Some("zona"));
        assert_eq!(item.url, None);
    }
}
