//! SEO URLs built from menu aliases.
//!
//! A menu item with alias `team` below an item with alias `about` is served
//! at `{base_path}about/team{suffix}`. The default item is served at the
//! base path itself.

use std::sync::Arc;

use big_router::{Route, UrlRouter};
use big_tree::{MenuField, MenuItem, MenuManager, TreeError};

/// [`UrlRouter`] mapping routes to menu item paths and back.
///
/// Routes no menu item points at are handed to the fallback rules in
/// registration order.
pub struct MenuRouter {
    menus: Arc<MenuManager>,
    base_path: String,
    suffix: String,
    rules: Vec<Arc<dyn UrlRouter>>,
}

impl MenuRouter {
    /// Router serving menu paths below `base_path`, with `suffix` appended.
    #[must_use]
    pub fn new(menus: Arc<MenuManager>, base_path: &str, suffix: impl Into<String>) -> Self {
        let mut base_path = base_path.to_owned();
        if !base_path.ends_with('/') {
            base_path.push('/');
        }
        Self {
            menus,
            base_path,
            suffix: suffix.into(),
            rules: Vec::new(),
        }
    }

    /// Add a fallback rule for routes without a menu item.
    #[must_use]
    pub fn with_rule(mut self, rule: Arc<dyn UrlRouter>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Public path of `item`.
    pub fn menu_url(&self, item: &MenuItem) -> Result<String, TreeError> {
        if item.is_default() {
            return Ok(self.base_path.clone());
        }

        // Loads the item's menu so the parent chain is cached.
        let item = self.menus.get_menu_item(item.id)?;
        let mut url = self.base_path.clone();
        for parent in self.menus.ancestors(&item) {
            url.push_str(parent.alias());
            url.push('/');
        }
        url.push_str(item.alias());
        url.push_str(&self.suffix);
        Ok(url)
    }

    /// Path relative to the base path, `None` when outside it.
    fn relative<'a>(&self, path: &'a str) -> Option<&'a str> {
        if let Some(rest) = path.strip_prefix(self.base_path.as_str()) {
            return Some(rest);
        }
        (self.base_path.strip_suffix('/') == Some(path)).then_some("")
    }

    fn activate(&self, item: &MenuItem) {
        if let Err(err) = self.menus.set_active(item.id) {
            tracing::warn!(id = item.id, error = %err, "Failed to activate menu item");
        }
    }

    fn find_by_alias(&self, alias: &str) -> Option<MenuItem> {
        self.menus
            .search(MenuField::Alias, alias, true)
            .unwrap_or_else(|err| {
                tracing::warn!(alias, error = %err, "Menu lookup failed");
                None
            })
    }

    fn parse_menu_path(&self, path: &str) -> Option<Route> {
        let relative = self.relative(path)?;

        if relative.is_empty() {
            let default = self.menus.get_default().ok()?;
            self.activate(&default);
            return Some(default.route());
        }

        let relative = if self.suffix.is_empty() {
            relative
        } else {
            relative.strip_suffix(self.suffix.as_str()).filter(|p| !p.is_empty())?
        };

        let mut segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
        let last = segments.pop()?;
        if let Some(item) = self.find_by_alias(last) {
            self.activate(&item);
            return Some(item.route());
        }

        // An earlier segment still selects the active menu item for
        // pages a fallback rule serves.
        while let Some(segment) = segments.pop() {
            if let Some(item) = self.find_by_alias(segment) {
                self.activate(&item);
                break;
            }
        }
        None
    }
}

impl UrlRouter for MenuRouter {
    fn create_url(&self, route: &Route) -> Option<String> {
        let found = self
            .menus
            .search_route(route, true)
            .and_then(|item| item.map(|item| self.menu_url(&item)).transpose());
        match found {
            Ok(Some(url)) => Some(url),
            Ok(None) => self.rules.iter().find_map(|rule| rule.create_url(route)),
            Err(err) => {
                tracing::warn!(%route, error = %err, "Menu lookup failed");
                None
            }
        }
    }

    fn parse_request(&self, path: &str) -> Option<Route> {
        if let Some(route) = self.parse_menu_path(path) {
            return Some(route);
        }
        let route = self.rules.iter().find_map(|rule| rule.parse_request(path));
        if route.is_none() {
            tracing::debug!(path, "No route for request");
        }
        route
    }
}
