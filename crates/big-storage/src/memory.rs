//! In-memory storage backend.
//!
//! Provides [`MemoryStorage`], which implements every row-source trait over
//! plain vectors. It backs the CLI (loaded from a JSON [`Dataset`]) and is
//! the fake used throughout the test suites.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::default_flag::demote_previous_default;
use crate::row::{BlockRecord, CategoryData, MenuData, NodeData, NodeRow, TemplateRecord};
use crate::storage::{
    BlockSource, RowFilter, StorageError, StorageErrorKind, TemplateFilter, TemplateSource,
    TreeSource,
};

/// Backend identifier for error messages.
const BACKEND: &str = "Memory";

/// Serialized form of a whole site's content tables.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub menus: Vec<NodeRow<MenuData>>,
    pub categories: Vec<NodeRow<CategoryData>>,
    pub templates: Vec<TemplateRecord>,
    pub blocks: Vec<BlockRecord>,
}

/// One nested-set table held in memory.
///
/// Counts the queries it answers so callers can assert that caches
/// actually avoid round-trips.
#[derive(Debug)]
pub struct MemoryTree<D> {
    rows: RwLock<Vec<NodeRow<D>>>,
    queries: AtomicUsize,
}

impl<D> Default for MemoryTree<D> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            queries: AtomicUsize::new(0),
        }
    }
}

impl<D: NodeData> MemoryTree<D> {
    fn from_rows(rows: Vec<NodeRow<D>>) -> Self {
        Self {
            rows: RwLock::new(rows),
            queries: AtomicUsize::new(0),
        }
    }

    /// Number of queries answered so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    fn push(&self, row: NodeRow<D>) {
        self.rows.write().unwrap().push(row);
    }

    /// Rows ordered by `(tree, lft)`.
    fn ordered(&self) -> Vec<NodeRow<D>> {
        let mut rows = self.rows.read().unwrap().clone();
        rows.sort_by_key(|r| (r.tree, r.lft));
        rows
    }

    fn record_query(&self, what: &str) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(backend = BACKEND, query = what, "Tree query");
    }
}

impl<D: NodeData> TreeSource<D> for MemoryTree<D> {
    fn fetch_all(&self) -> Result<Vec<NodeRow<D>>, StorageError> {
        self.record_query("all");
        Ok(self.ordered())
    }

    fn fetch_tree(&self, filter: &RowFilter) -> Result<Vec<NodeRow<D>>, StorageError> {
        self.record_query("tree");
        let rows = self.ordered();
        let Some(tree) = rows.iter().find(|r| filter.matches(r)).map(|r| r.tree) else {
            return Ok(Vec::new());
        };
        // Already ordered by (tree, lft), so filtering keeps lft order.
        Ok(rows.into_iter().filter(|r| r.tree == tree).collect())
    }

    fn fetch_one(&self, filter: &RowFilter) -> Result<Option<NodeRow<D>>, StorageError> {
        self.record_query("one");
        Ok(self.ordered().into_iter().find(|r| filter.matches(r)))
    }

    fn create_root(&self, data: D) -> Result<NodeRow<D>, StorageError> {
        let mut rows = self.rows.write().unwrap();

        if let Some(module) = data.module()
            && rows.iter().any(|r| r.is_root() && r.data.module() == Some(module))
        {
            return Err(StorageError::new(StorageErrorKind::AlreadyExists)
                .with_backend(BACKEND)
                .with_context(format!("root for module '{module}'")));
        }

        let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let tree = rows.iter().map(|r| r.tree).max().unwrap_or(0) + 1;
        let root = NodeRow::new(id, tree, 1, 2, 0, data);
        rows.push(root.clone());
        Ok(root)
    }
}

/// In-memory implementation of every row source.
///
/// # Example
///
/// ```
/// use big_storage::{MemoryStorage, MenuData, NodeRow, TreeSource};
///
/// let storage = MemoryStorage::new()
///     .with_menu(NodeRow::new(1, 1, 1, 4, 0, MenuData::new("Main", "", "")))
///     .with_menu(NodeRow::new(2, 1, 2, 3, 1, MenuData::new("Home", "home", "site/index")));
///
/// let rows = TreeSource::<MenuData>::fetch_all(&storage).unwrap();
/// assert_eq!(rows.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    menus: MemoryTree<MenuData>,
    categories: MemoryTree<CategoryData>,
    templates: RwLock<Vec<TemplateRecord>>,
    blocks: RwLock<Vec<BlockRecord>>,
}

impl MemoryStorage {
    /// Create a new empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build storage from a deserialized dataset.
    #[must_use]
    pub fn from_dataset(dataset: Dataset) -> Self {
        Self {
            menus: MemoryTree::from_rows(dataset.menus),
            categories: MemoryTree::from_rows(dataset.categories),
            templates: RwLock::new(dataset.templates),
            blocks: RwLock::new(dataset.blocks),
        }
    }

    /// Parse a JSON dataset.
    pub fn from_json_str(json: &str) -> Result<Self, StorageError> {
        let dataset: Dataset = serde_json::from_str(json).map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidData)
                .with_backend("Json")
                .with_source(e)
        })?;
        Ok(Self::from_dataset(dataset))
    }

    /// Load a JSON dataset file.
    pub fn from_json_file(path: &Path) -> Result<Self, StorageError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| StorageError::io(e, path.display().to_string()).with_backend("Json"))?;
        let storage = Self::from_json_str(&json)
            .map_err(|e| e.with_context(path.display().to_string()))?;
        tracing::debug!(path = %path.display(), "Loaded dataset");
        Ok(storage)
    }

    /// Add a menu row.
    #[must_use]
    pub fn with_menu(self, row: NodeRow<MenuData>) -> Self {
        self.menus.push(row);
        self
    }

    /// Add a category row.
    #[must_use]
    pub fn with_category(self, row: NodeRow<CategoryData>) -> Self {
        self.categories.push(row);
        self
    }

    /// Add a template record as-is (no default demotion).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_template(self, record: TemplateRecord) -> Self {
        self.templates.write().unwrap().push(record);
        self
    }

    /// Add a block record.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_block(self, record: BlockRecord) -> Self {
        self.blocks.write().unwrap().push(record);
        self
    }

    /// Menu table.
    pub fn menus(&self) -> &MemoryTree<MenuData> {
        &self.menus
    }

    /// Category table.
    pub fn categories(&self) -> &MemoryTree<CategoryData> {
        &self.categories
    }

    /// Flag a menu item as the default, demoting the previous one.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_default_menu(&self, id: i64) -> Result<(), StorageError> {
        let mut rows = self.menus.rows.write().unwrap();
        let mut incoming = rows
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(format!("menu {id}")).with_backend(BACKEND))?;
        incoming.data.is_default = true;

        demote_previous_default(rows.as_mut_slice(), &incoming);
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            *row = incoming;
        }
        Ok(())
    }
}

impl TreeSource<MenuData> for MemoryStorage {
    fn fetch_all(&self) -> Result<Vec<NodeRow<MenuData>>, StorageError> {
        self.menus.fetch_all()
    }

    fn fetch_tree(&self, filter: &RowFilter) -> Result<Vec<NodeRow<MenuData>>, StorageError> {
        self.menus.fetch_tree(filter)
    }

    fn fetch_one(&self, filter: &RowFilter) -> Result<Option<NodeRow<MenuData>>, StorageError> {
        self.menus.fetch_one(filter)
    }

    fn create_root(&self, data: MenuData) -> Result<NodeRow<MenuData>, StorageError> {
        self.menus.create_root(data)
    }
}

impl TreeSource<CategoryData> for MemoryStorage {
    fn fetch_all(&self) -> Result<Vec<NodeRow<CategoryData>>, StorageError> {
        self.categories.fetch_all()
    }

    fn fetch_tree(&self, filter: &RowFilter) -> Result<Vec<NodeRow<CategoryData>>, StorageError> {
        self.categories.fetch_tree(filter)
    }

    fn fetch_one(
        &self,
        filter: &RowFilter,
    ) -> Result<Option<NodeRow<CategoryData>>, StorageError> {
        self.categories.fetch_one(filter)
    }

    fn create_root(&self, data: CategoryData) -> Result<NodeRow<CategoryData>, StorageError> {
        self.categories.create_root(data)
    }
}

impl TemplateSource for MemoryStorage {
    fn fetch(&self, filter: TemplateFilter) -> Result<Option<TemplateRecord>, StorageError> {
        let templates = self.templates.read().unwrap();
        let found = match filter {
            TemplateFilter::Id(id) => templates.iter().find(|t| t.id == id),
            TemplateFilter::Default => templates.iter().find(|t| t.is_default),
        };
        Ok(found.cloned())
    }

    fn fetch_all(&self) -> Result<Vec<TemplateRecord>, StorageError> {
        Ok(self.templates.read().unwrap().clone())
    }

    fn save(&self, mut record: TemplateRecord) -> Result<TemplateRecord, StorageError> {
        let mut templates = self.templates.write().unwrap();
        if record.id == 0 {
            record.id = templates.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        }

        demote_previous_default(templates.as_mut_slice(), &record);

        match templates.iter_mut().find(|t| t.id == record.id) {
            Some(existing) => existing.clone_from(&record),
            None => templates.push(record.clone()),
        }
        Ok(record)
    }
}

impl BlockSource for MemoryStorage {
    fn render_blocks(&self, ids: &[i64]) -> Result<HashMap<i64, String>, StorageError> {
        let blocks = self.blocks.read().unwrap();
        Ok(blocks
            .iter()
            .filter(|b| b.is_active() && ids.contains(&b.id))
            .map(|b| (b.id, b.content.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::row::{Positions, PositionsField};

    fn menu(id: i64, tree: i64, lft: i64, rgt: i64, depth: i64, title: &str) -> NodeRow<MenuData> {
        NodeRow::new(id, tree, lft, rgt, depth, MenuData::new(title, title.to_lowercase(), ""))
    }

    fn two_trees() -> MemoryStorage {
        // Inserted out of order on purpose.
        MemoryStorage::new()
            .with_menu(menu(12, 2, 2, 3, 1, "Contact"))
            .with_menu(menu(1, 1, 1, 6, 0, "Main"))
            .with_menu(menu(11, 2, 1, 4, 0, "Footer"))
            .with_menu(menu(3, 1, 4, 5, 1, "About"))
            .with_menu(menu(2, 1, 2, 3, 1, "Home"))
    }

    fn ids(rows: &[NodeRow<MenuData>]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_fetch_all_orders_by_tree_then_lft() {
        let storage = two_trees();

        let rows = TreeSource::<MenuData>::fetch_all(&storage).unwrap();

        assert_eq!(ids(&rows), vec![1, 2, 3, 11, 12]);
    }

    #[test]
    fn test_fetch_tree_by_item_id_returns_whole_tree() {
        let storage = two_trees();

        let rows = TreeSource::<MenuData>::fetch_tree(&storage, &RowFilter::Id(12)).unwrap();

        assert_eq!(ids(&rows), vec![11, 12]);
    }

    #[test]
    fn test_fetch_tree_no_match_is_empty() {
        let storage = two_trees();

        let rows = TreeSource::<MenuData>::fetch_tree(&storage, &RowFilter::IsDefault).unwrap();

        assert!(rows.is_empty());
    }

    #[test]
    fn test_fetch_one_by_alias() {
        let storage = two_trees();

        let row = TreeSource::<MenuData>::fetch_one(&storage, &RowFilter::Alias("about".to_owned()))
            .unwrap()
            .unwrap();

        assert_eq!(row.id, 3);
    }

    #[test]
    fn test_query_count() {
        let storage = two_trees();
        assert_eq!(storage.menus().query_count(), 0);

        TreeSource::<MenuData>::fetch_all(&storage).unwrap();
        TreeSource::<MenuData>::fetch_one(&storage, &RowFilter::Id(1)).unwrap();

        assert_eq!(storage.menus().query_count(), 2);
        assert_eq!(storage.categories().query_count(), 0);
    }

    #[test]
    fn test_create_root_allocates_new_tree() {
        let storage = MemoryStorage::new().with_category(NodeRow::new(
            5,
            3,
            1,
            2,
            0,
            CategoryData::root("blog"),
        ));

        let root = storage.create_root(CategoryData::root("shop")).unwrap();

        assert_eq!((root.id, root.tree, root.lft, root.rgt, root.depth), (6, 4, 1, 2, 0));
        assert_eq!(storage.categories().fetch_all().unwrap().len(), 2);
    }

    #[test]
    fn test_create_root_rejects_duplicate_module() {
        let storage = MemoryStorage::new();
        storage.create_root(CategoryData::root("blog")).unwrap();

        let err = storage.create_root(CategoryData::root("blog")).unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::AlreadyExists);
    }

    #[test]
    fn test_set_default_menu_demotes_previous() {
        let storage = MemoryStorage::new()
            .with_menu(menu(1, 1, 1, 6, 0, "Main"))
            .with_menu(NodeRow::new(2, 1, 2, 3, 1, MenuData::new("Home", "home", "").as_default()))
            .with_menu(menu(3, 1, 4, 5, 1, "About"));

        storage.set_default_menu(3).unwrap();

        let defaults: Vec<i64> = TreeSource::<MenuData>::fetch_all(&storage)
            .unwrap()
            .into_iter()
            .filter(|r| r.data.is_default)
            .map(|r| r.id)
            .collect();
        assert_eq!(defaults, vec![3]);
        assert!(storage.set_default_menu(99).is_err());
    }

    #[test]
    fn test_save_template_keeps_single_default() {
        let storage = MemoryStorage::new()
            .with_template(TemplateRecord::new(1, "Main", Positions::new()).as_default());

        let saved = storage
            .save(TemplateRecord::new(0, "Landing", Positions::new()).as_default())
            .unwrap();

        assert_eq!(saved.id, 2);
        let default = storage.fetch(TemplateFilter::Default).unwrap().unwrap();
        assert_eq!(default.id, 2);
        let all = TemplateSource::fetch_all(&storage).unwrap();
        assert_eq!(all.iter().filter(|t| t.is_default).count(), 1);
    }

    #[test]
    fn test_render_blocks_skips_inactive_and_missing() {
        let mut hidden = BlockRecord::new(2, "Hidden", "<p>hidden</p>");
        hidden.state = 0;
        let storage = MemoryStorage::new()
            .with_block(BlockRecord::new(1, "Intro", "<p>intro</p>"))
            .with_block(hidden);

        let rendered = storage.render_blocks(&[1, 2, 3]).unwrap();

        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[&1], "<p>intro</p>");
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "menus": [{{"id": 1, "tree": 1, "lft": 1, "rgt": 2, "depth": 0, "title": "Main"}}],
                "templates": [{{"id": "1", "title": "Main", "positions": "{{\"top\":[1]}}", "is_default": "1"}}],
                "blocks": [{{"id": 1, "content": "<p>x</p>"}}]
            }}"#
        )
        .unwrap();

        let storage = MemoryStorage::from_json_file(file.path()).unwrap();

        assert_eq!(TreeSource::<MenuData>::fetch_all(&storage).unwrap().len(), 1);
        assert!(TreeSource::<CategoryData>::fetch_all(&storage).unwrap().is_empty());
        let template = storage.fetch(TemplateFilter::Default).unwrap().unwrap();
        assert_eq!(
            template.positions,
            PositionsField::Encoded(r#"{"top":[1]}"#.to_owned())
        );
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = MemoryStorage::from_json_file(Path::new("/nonexistent/data.json")).unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert_eq!(err.backend, Some("Json"));
    }

    #[test]
    fn test_from_json_str_invalid() {
        let err = MemoryStorage::from_json_str("{not json").unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::InvalidData);
    }
}
