//! Category trees keyed by module.
//!
//! Every module owns one category tree whose root carries the module name.
//! A module asking for its categories for the first time gets a fresh,
//! empty root created on the spot.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use big_storage::{CategoryData, RowFilter, StorageErrorKind, TreeSource};

use crate::error::TreeError;
use crate::node::Category;
use crate::store::TreeStore;

pub struct CategoryManager {
    store: TreeStore<CategoryData>,
    /// Module name to root id.
    mapper: RwLock<HashMap<String, i64>>,
}

impl CategoryManager {
    #[must_use]
    pub fn new(source: Arc<dyn TreeSource<CategoryData>>) -> Self {
        Self {
            store: TreeStore::new(source, "category"),
            mapper: RwLock::new(HashMap::new()),
        }
    }

    /// Categories of `module`, in tree order.
    ///
    /// Creates the module's root when it has none yet and returns an empty
    /// list for that call.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidArgument`] for an empty module name.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn get_categories(&self, module: &str) -> Result<Vec<Category>, TreeError> {
        if module.is_empty() {
            return Err(TreeError::InvalidArgument(
                "a module is required when loading categories".to_owned(),
            ));
        }

        let mapped = self.mapper.read().unwrap().get(module).copied();
        if let Some(root_id) = mapped {
            return self.store.get_items(root_id);
        }
        if let Some(root_id) = self.load_category_tree(module)? {
            return self.store.get_items(root_id);
        }

        self.create_root_node(module)?;
        Ok(Vec::new())
    }

    /// Load the tree owned by `module` and record its root.
    ///
    /// Returns the root id, or `None` when the module has no tree.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn load_category_tree(&self, module: &str) -> Result<Option<i64>, TreeError> {
        let Some(root) = self.store.load_tree(&RowFilter::Module(module.to_owned()))? else {
            return Ok(None);
        };
        self.mapper
            .write()
            .unwrap()
            .insert(module.to_owned(), root.id);
        Ok(Some(root.id))
    }

    /// Create and register the root of `module`'s tree.
    ///
    /// When another caller created the root first, its tree is loaded instead.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn create_root_node(&self, module: &str) -> Result<Category, TreeError> {
        let row = match self.store.source().create_root(CategoryData::root(module)) {
            Ok(row) => row,
            Err(e) if e.kind == StorageErrorKind::AlreadyExists => {
                self.load_category_tree(module)?;
                return self.store.get_root(self.root_id(module)?);
            }
            Err(e) => return Err(e.into()),
        };

        let root = self
            .store
            .build_tree(vec![row])?
            .into_iter()
            .next()
            .ok_or_else(|| TreeError::MalformedTree(format!("no root created for {module}")))?;
        self.mapper
            .write()
            .unwrap()
            .insert(module.to_owned(), root.id);

        tracing::info!(module, id = root.id, "Created category root");
        Ok(root)
    }

    fn root_id(&self, module: &str) -> Result<i64, TreeError> {
        self.mapper
            .read()
            .unwrap()
            .get(module)
            .copied()
            .ok_or_else(|| TreeError::NotFound(format!("categories of module {module}")))
    }

    /// A single category by id.
    ///
    /// Also records which module the category's tree belongs to.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn category(&self, id: i64) -> Result<Category, TreeError> {
        let category = self.store.get_item(id)?;
        if let Some(root) = self.store.search_roots(|r| r.tree == category.tree)
            && let Some(module) = root.data.module
        {
            self.mapper.write().unwrap().insert(module, root.id);
        }
        Ok(category)
    }

    /// `(id, label)` pairs for a select box.
    ///
    /// Labels are prefixed with `indenter` once per level below the first.
    /// `unselected` adds a leading entry with id 0.
    pub fn drop_down_list(
        &self,
        module: &str,
        unselected: Option<&str>,
        indenter: &str,
    ) -> Result<Vec<(i64, String)>, TreeError> {
        let mut options: Vec<(i64, String)> =
            unselected.map(|label| (0, label.to_owned())).into_iter().collect();

        for category in self.get_categories(module)? {
            let level = usize::try_from(category.depth - 1).unwrap_or(0);
            options.push((
                category.id,
                format!("{}{}", indenter.repeat(level), category.data.title),
            ));
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::CategoryManager: Send, Sync);

    use big_storage::{MemoryStorage, NodeRow};
    use pretty_assertions::assert_eq;

    use super::*;

    fn category(id: i64, tree: i64, lft: i64, rgt: i64, depth: i64, title: &str) -> NodeRow<CategoryData> {
        NodeRow::new(id, tree, lft, rgt, depth, CategoryData::new(title))
    }

    /// blog (1): news (2) > local (3), events (4). shop (5): empty.
    fn storage() -> Arc<MemoryStorage> {
        Arc::new(
            MemoryStorage::new()
                .with_category(NodeRow::new(1, 1, 1, 8, 0, CategoryData::root("blog")))
                .with_category(category(2, 1, 2, 5, 1, "News"))
                .with_category(category(3, 1, 3, 4, 2, "Local"))
                .with_category(category(4, 1, 6, 7, 1, "Events"))
                .with_category(NodeRow::new(5, 2, 1, 2, 0, CategoryData::root("shop"))),
        )
    }

    fn manager(storage: &Arc<MemoryStorage>) -> CategoryManager {
        CategoryManager::new(Arc::clone(storage) as Arc<dyn TreeSource<CategoryData>>)
    }

    #[test]
    fn test_get_categories_by_module() {
        let storage = storage();
        let categories = manager(&storage);

        let blog: Vec<i64> = categories
            .get_categories("blog")
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        categories.get_categories("blog").unwrap();

        assert_eq!(blog, vec![2, 3, 4]);
        assert_eq!(storage.categories().query_count(), 1);
        assert!(categories.get_categories("shop").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_module_creates_root() {
        let storage = storage();
        let categories = manager(&storage);

        let first = categories.get_categories("forum").unwrap();
        let second = categories.get_categories("forum").unwrap();

        assert!(first.is_empty());
        assert!(second.is_empty());
        let roots: Vec<_> = storage
            .categories()
            .fetch_all()
            .unwrap()
            .into_iter()
            .filter(|r| r.data.module.as_deref() == Some("forum"))
            .collect();
        assert_eq!(roots.len(), 1);
        assert_eq!((roots[0].id, roots[0].tree, roots[0].depth), (6, 3, 0));
    }

    #[test]
    fn test_create_root_node_for_existing_module_loads_it() {
        let storage = storage();
        let categories = manager(&storage);

        let root = categories.create_root_node("blog").unwrap();

        assert_eq!(root.id, 1);
    }

    #[test]
    fn test_empty_module_rejected() {
        let storage = storage();
        let categories = manager(&storage);

        assert!(matches!(
            categories.get_categories(""),
            Err(TreeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_category_records_module() {
        let storage = storage();
        let categories = manager(&storage);

        let local = categories.category(3).unwrap();
        categories.get_categories("blog").unwrap();

        assert_eq!(local.data.title, "Local");
        // The tree was loaded by id; the module lookup hits the mapper.
        assert_eq!(storage.categories().query_count(), 1);
    }

    #[test]
    fn test_drop_down_list() {
        let storage = storage();
        let categories = manager(&storage);

        let options = categories.drop_down_list("blog", Some("- none -"), "- ").unwrap();

        assert_eq!(
            options,
            vec![
                (0, "- none -".to_owned()),
                (2, "News".to_owned()),
                (3, "- Local".to_owned()),
                (4, "Events".to_owned()),
            ]
        );
    }

    #[test]
    fn test_drop_down_list_without_indenter() {
        let storage = storage();
        let categories = manager(&storage);

        let options = categories.drop_down_list("blog", None, "").unwrap();

        assert_eq!(options[1], (3, "Local".to_owned()));
    }
}
