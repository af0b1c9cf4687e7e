//! Load the navigation menu

use crate::application::collection::RemoteCollection;
use crate::domain::menu::MenuItem;
use crate::domain::permission::Session;
use crate::error::{CrudError, Result};
use crate::infrastructure::config::Config;
use crate::infrastructure::transport::Transport;

/// Menu records fetched in one request.
pub const MENU_LEN: i64 = 1000;

/// Fetch the configured menu resource and build the tree the session may see.
pub fn load_menu(
    config: &Config,
    transport: &dyn Transport,
    session: &Session,
) -> Result<MenuItem> {
    let menu = config.menu.as_ref().ok_or_else(|| {
        CrudError::Config("no [menu] configured in config.toml".to_string())
    })?;
    let url = config
        .find_resource(&menu.resource)
        .map(|resource| resource.url())
        .unwrap_or(menu.resource.as_str());

    let mut collection = RemoteCollection::new(url, transport).with_fetch_total(false);
    collection.state_mut().set_len(MENU_LEN);
    collection.fetch()?;
    if collection.state().more() == Some(true) {
        log::warn!("menu has more than {} items, the rest is ignored", MENU_LEN);
    }

    let items = menu.attributes.adapt_all(collection.rows());
    log::debug!("building menu from {} records", items.len());
    Ok(MenuItem::root()
        .load_children(items)
        .apply_permissions(session))
}
