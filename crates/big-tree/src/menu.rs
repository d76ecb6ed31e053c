//! Menu trees.
//!
//! Menus are partitioned by `tree`: each root is a menu and its items are
//! the entries. Exactly one item across all menus may carry the default
//! flag; the menu holding it is the *default menu*.

use std::sync::{Arc, RwLock};

use big_router::Route;
use big_storage::{MenuData, RowFilter, TreeSource};

use crate::error::TreeError;
use crate::node::MenuItem;
use crate::store::TreeStore;

/// Section label used in search results.
const SEARCH_SECTION: &str = "Menus";

/// Behaviour switches for [`MenuManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuOptions {
    /// Load every menu tree during [`MenuManager::initialize`].
    pub auto_load: bool,
    /// Activate the default item during [`MenuManager::initialize`].
    pub set_default_route: bool,
}

impl Default for MenuOptions {
    fn default() -> Self {
        Self {
            auto_load: true,
            set_default_route: false,
        }
    }
}

/// Column searched by [`MenuManager::search`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuField {
    Alias,
    Route,
    Title,
}

impl MenuField {
    fn value_of(self, item: &MenuItem) -> &str {
        match self {
            Self::Alias => &item.data.alias,
            Self::Route => &item.data.route,
            Self::Title => &item.data.title,
        }
    }

    /// Storage filter for the query fallback. Titles are not indexed.
    fn filter(self, value: &str) -> Option<RowFilter> {
        match self {
            Self::Alias => Some(RowFilter::Alias(value.to_owned())),
            Self::Route => Some(RowFilter::Route(value.to_owned())),
            Self::Title => None,
        }
    }
}

/// One entry of the site search index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchItem {
    pub title: String,
    pub route: String,
    pub section: String,
}

/// Menu lookups, default menu resolution and the active item.
pub struct MenuManager {
    store: TreeStore<MenuData>,
    options: MenuOptions,
    /// Root id of the default menu once known.
    default_root: RwLock<Option<i64>>,
    active: RwLock<Option<i64>>,
}

impl MenuManager {
    #[must_use]
    pub fn new(source: Arc<dyn TreeSource<MenuData>>, options: MenuOptions) -> Self {
        Self {
            store: TreeStore::new(source, "menu"),
            options,
            default_root: RwLock::new(None),
            active: RwLock::new(None),
        }
    }

    pub fn options(&self) -> MenuOptions {
        self.options
    }

    /// Apply [`MenuOptions`]: activate the default item and preload menus.
    pub fn initialize(&self) -> Result<(), TreeError> {
        if self.options.set_default_route {
            let default = self.get_default()?;
            self.set_active(default.id)?;
            tracing::info!(id = default.id, route = %default.data.route, "Activated default menu item");
        }
        if self.options.auto_load {
            self.get_menus(true)?;
        }
        Ok(())
    }

    /// All menus (tree roots).
    pub fn get_menus(&self, reload: bool) -> Result<Vec<MenuItem>, TreeError> {
        self.store.get_roots(reload)
    }

    /// Items of menu `id`, or of the default menu when `id` is 0.
    pub fn get_menu_items(&self, id: i64) -> Result<Vec<MenuItem>, TreeError> {
        if id == 0 {
            self.get_default_menu()
        } else {
            self.store.get_items(id)
        }
    }

    pub fn get_menu_item(&self, id: i64) -> Result<MenuItem, TreeError> {
        self.store.get_item(id)
    }

    pub fn get_parent(&self, item: &MenuItem) -> Option<MenuItem> {
        self.store.get_parent(item)
    }

    /// Parent items of `item` below its menu root, outermost first.
    pub fn ancestors(&self, item: &MenuItem) -> Vec<MenuItem> {
        self.store.ancestors(item)
    }

    /// Items of the menu holding the default item.
    ///
    /// Searches loaded menus first and queries for the flagged row only when
    /// none is cached. Returns an empty list when no item is flagged.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn get_default_menu(&self) -> Result<Vec<MenuItem>, TreeError> {
        let known = *self.default_root.read().unwrap();
        if let Some(root_id) = known {
            return self.store.get_items(root_id);
        }

        let cached_root = self
            .store
            .search_items(MenuItem::is_default)
            .and_then(|item| self.store.search_roots(|r| r.tree == item.tree));
        let root = match cached_root {
            Some(root) => root,
            None => match self.store.load_tree(&RowFilter::IsDefault)? {
                Some(root) => root,
                None => {
                    tracing::warn!("No menu item is flagged as default");
                    return Ok(Vec::new());
                }
            },
        };

        *self.default_root.write().unwrap() = Some(root.id);
        self.store.get_items(root.id)
    }

    /// The default menu item.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NoDefault`] when no item is flagged as default.
    pub fn get_default(&self) -> Result<MenuItem, TreeError> {
        self.get_default_menu()?
            .into_iter()
            .find(MenuItem::is_default)
            .ok_or(TreeError::NoDefault("menu item"))
    }

    /// Route of the default menu item.
    pub fn default_route(&self) -> Result<Route, TreeError> {
        Ok(self.get_default()?.route())
    }

    /// Find a loaded item whose `field` equals `value`.
    ///
    /// When menus are not auto-loaded and `extended` is set, a miss falls
    /// back to a single-row query. The queried row is not cached.
    pub fn search(
        &self,
        field: MenuField,
        value: &str,
        extended: bool,
    ) -> Result<Option<MenuItem>, TreeError> {
        if let Some(item) = self.store.search_items(|n| field.value_of(n) == value) {
            return Ok(Some(item));
        }

        if self.options.auto_load || !extended {
            return Ok(None);
        }
        let Some(filter) = field.filter(value) else {
            return Ok(None);
        };
        Ok(self
            .store
            .source()
            .fetch_one(&filter)?
            .filter(|row| !row.is_root())
            .map(MenuItem::from))
    }

    /// Find the item whose stored route names `route`.
    ///
    /// Cached items match regardless of parameter order or encoding. The
    /// query fallback of an `extended` search asks for the canonical form.
    pub fn search_route(&self, route: &Route, extended: bool) -> Result<Option<MenuItem>, TreeError> {
        if let Some(item) = self.store.search_items(|n| route.matches(&n.data.route)) {
            return Ok(Some(item));
        }

        if self.options.auto_load || !extended {
            return Ok(None);
        }
        Ok(self
            .store
            .source()
            .fetch_one(&RowFilter::Route(route.to_internal()))?
            .filter(|row| !row.is_root())
            .map(MenuItem::from))
    }

    /// Select the active menu item.
    ///
    /// A non-zero id loads and activates that item. Zero clears the
    /// selection unless the default item is the active one.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_active(&self, id: i64) -> Result<(), TreeError> {
        if id != 0 {
            let item = self.get_menu_item(id)?;
            *self.active.write().unwrap() = Some(item.id);
            tracing::debug!(id, "Activated menu item");
            return Ok(());
        }

        let current = *self.active.read().unwrap();
        if let Some(current) = current {
            let keeps_default = self.get_menu_item(current).is_ok_and(|i| i.is_default());
            if !keeps_default {
                *self.active.write().unwrap() = None;
            }
        }
        Ok(())
    }

    /// The active menu item, if one was selected.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn active(&self) -> Result<Option<MenuItem>, TreeError> {
        let active = *self.active.read().unwrap();
        active.map(|id| self.get_menu_item(id)).transpose()
    }

    /// Every menu item (roots excluded) as a search index entry.
    pub fn search_index(&self) -> Result<Vec<SearchItem>, TreeError> {
        let rows = self.store.source().fetch_all()?;
        Ok(rows
            .into_iter()
            .filter(|row| !row.is_root())
            .map(|row| SearchItem {
                title: row.data.title,
                route: row.data.route,
                section: SEARCH_SECTION.to_owned(),
            })
            .collect())
    }
}
