//! Nested-set materialization and query engine.
//!
//! Provides [`TreeStore`], which rebuilds one or more disjoint trees from
//! the flat, pre-ordered rows a [`TreeSource`] returns and answers
//! structural queries from its cache without re-querying.
//!
//! # Loading policy
//!
//! Loading any node pulls its entire tree in one query. Each tree is
//! loaded at most once unless [`TreeStore::get_roots`] is asked to reload.
//! Loads are additive: a load registers the trees it returned and leaves
//! every other cached tree alone.
//!
//! # Thread Safety
//!
//! The cache lives behind an `RwLock`. Loads are serialized by a separate
//! `Mutex<()>` and re-check the cache after acquiring it, so concurrent
//! misses for the same tree issue a single query.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use big_storage::{NodeData, NodeRow, RowFilter, TreeSource};

use crate::error::TreeError;
use crate::node::TreeNode;

/// One tree as registered by [`TreeStore::build_tree`].
type Grouped<D> = (TreeNode<D>, Vec<TreeNode<D>>);

struct TreeCache<D> {
    /// Roots in load order.
    roots: Vec<TreeNode<D>>,
    /// Non-root nodes keyed by their root id, in row order.
    items: HashMap<i64, Vec<TreeNode<D>>>,
    /// Set once every tree has been loaded by a full query.
    fully_loaded: bool,
}

impl<D> Default for TreeCache<D> {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            items: HashMap::new(),
            fully_loaded: false,
        }
    }
}

impl<D> TreeCache<D> {
    fn root(&self, id: i64) -> Option<&TreeNode<D>> {
        self.roots.iter().find(|r| r.id == id)
    }

    fn root_of_tree(&self, tree: i64) -> Option<&TreeNode<D>> {
        self.roots.iter().find(|r| r.tree == tree)
    }

    fn item(&self, id: i64) -> Option<&TreeNode<D>> {
        self.items.values().flatten().find(|n| n.id == id)
    }

    fn node(&self, id: i64) -> Option<&TreeNode<D>> {
        self.item(id).or_else(|| self.root(id))
    }

    /// Items of the tree that `id` (a root or an item) belongs to.
    fn items_containing(&self, id: i64) -> Option<&Vec<TreeNode<D>>> {
        if let Some(items) = self.items.get(&id) {
            return Some(items);
        }
        let root = self.root_of_tree(self.item(id)?.tree)?;
        self.items.get(&root.id)
    }

    fn all_nodes(&self) -> impl Iterator<Item = &TreeNode<D>> {
        self.roots.iter().chain(self.items.values().flatten())
    }

    fn commit(&mut self, trees: Vec<Grouped<D>>) {
        for (root, items) in trees {
            self.items.insert(root.id, items);
            match self.roots.iter_mut().find(|r| r.id == root.id) {
                Some(existing) => *existing = root,
                None => self.roots.push(root),
            }
        }
    }
}

/// Group pre-ordered rows into `(root, items)` pairs.
///
/// Validates the ordering contract without touching any cache, so a
/// malformed batch leaves previously loaded trees intact.
fn group_rows<D>(rows: Vec<NodeRow<D>>) -> Result<Vec<Grouped<D>>, TreeError> {
    let mut trees: Vec<Grouped<D>> = Vec::new();

    for row in rows {
        if row.lft >= row.rgt {
            return Err(TreeError::MalformedTree(format!(
                "node {} has lft {} >= rgt {}",
                row.id, row.lft, row.rgt
            )));
        }

        let node = TreeNode::from(row);
        if node.is_root() {
            trees.push((node, Vec::new()));
            continue;
        }

        let Some((root, items)) = trees.last_mut() else {
            return Err(TreeError::MalformedTree(format!(
                "node {} appears before any root",
                node.id
            )));
        };
        if node.tree != root.tree {
            return Err(TreeError::MalformedTree(format!(
                "node {} of tree {} follows root {} of tree {}",
                node.id, node.tree, root.id, root.tree
            )));
        }
        items.push(node);
    }

    Ok(trees)
}

/// Cached nested-set trees over one [`TreeSource`].
///
/// `kind` names the table in logs and errors ("menu", "category").
pub struct TreeStore<D> {
    source: Arc<dyn TreeSource<D>>,
    kind: &'static str,
    cache: RwLock<TreeCache<D>>,
    /// Serializes loads.
    load_lock: Mutex<()>,
}

impl<D: NodeData> TreeStore<D> {
    /// Create an empty store.
    #[must_use]
    pub fn new(source: Arc<dyn TreeSource<D>>, kind: &'static str) -> Self {
        Self {
            source,
            kind,
            cache: RwLock::new(TreeCache::default()),
            load_lock: Mutex::new(()),
        }
    }

    /// The row source backing this store.
    pub fn source(&self) -> &dyn TreeSource<D> {
        self.source.as_ref()
    }

    /// Register trees from rows ordered by `(tree, lft)`.
    ///
    /// Every row with `lft == 1` starts a new tree; following rows are
    /// items of that tree. Re-registering a root replaces its cached items.
    /// Returns the registered roots in row order.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::MalformedTree`] when a non-root row precedes
    /// every root, a row's interval is empty, or an item's tree differs from
    /// its root's. The cache is left unchanged in that case.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn build_tree(&self, rows: Vec<NodeRow<D>>) -> Result<Vec<TreeNode<D>>, TreeError> {
        let row_count = rows.len();
        let trees = group_rows(rows).inspect_err(|e| {
            tracing::error!(kind = self.kind, error = %e, "Rejected malformed tree rows");
        })?;

        let roots: Vec<TreeNode<D>> = trees.iter().map(|(root, _)| root.clone()).collect();
        self.cache.write().unwrap().commit(trees);

        tracing::debug!(kind = self.kind, roots = roots.len(), rows = row_count, "Built trees");
        Ok(roots)
    }

    /// All roots, loading every tree on first use.
    ///
    /// With `reload`, the cache is cleared and rebuilt from a full query.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn get_roots(&self, reload: bool) -> Result<Vec<TreeNode<D>>, TreeError> {
        if !reload && let Some(roots) = self.fully_loaded_roots() {
            return Ok(roots);
        }

        let _guard = self.load_lock.lock().unwrap();

        if !reload && let Some(roots) = self.fully_loaded_roots() {
            return Ok(roots);
        }

        let rows = self.source.fetch_all()?;
        let trees = group_rows(rows).inspect_err(|e| {
            tracing::error!(kind = self.kind, error = %e, "Rejected malformed tree rows");
        })?;

        let mut cache = self.cache.write().unwrap();
        *cache = TreeCache::default();
        cache.commit(trees);
        cache.fully_loaded = true;

        tracing::debug!(kind = self.kind, roots = cache.roots.len(), reload, "Loaded all trees");
        Ok(cache.roots.clone())
    }

    fn fully_loaded_roots(&self) -> Option<Vec<TreeNode<D>>> {
        let cache = self.cache.read().unwrap();
        cache.fully_loaded.then(|| cache.roots.clone())
    }

    /// Root by id, loading its tree on a miss.
    pub fn get_root(&self, id: i64) -> Result<TreeNode<D>, TreeError> {
        self.cached_or_load(id, |c| c.root(id).cloned())
    }

    /// Items of the tree that `id` belongs to, in `lft` order.
    ///
    /// `id` is normally a root id; an item id resolves to its tree.
    pub fn get_items(&self, id: i64) -> Result<Vec<TreeNode<D>>, TreeError> {
        self.cached_or_load(id, |c| c.items_containing(id).cloned())
    }

    /// Any node by id, searching loaded trees before querying.
    pub fn get_item(&self, id: i64) -> Result<TreeNode<D>, TreeError> {
        self.cached_or_load(id, |c| c.node(id).cloned())
    }

    fn cached_or_load<T>(
        &self,
        id: i64,
        lookup: impl Fn(&TreeCache<D>) -> Option<T>,
    ) -> Result<T, TreeError> {
        if let Some(found) = lookup(&self.cache.read().unwrap()) {
            return Ok(found);
        }

        let _guard = self.load_lock.lock().unwrap();

        if let Some(found) = lookup(&self.cache.read().unwrap()) {
            return Ok(found);
        }

        self.fetch_and_build(&RowFilter::Id(id))?;
        lookup(&self.cache.read().unwrap())
            .ok_or_else(|| TreeError::NotFound(format!("{} {id}", self.kind)))
    }

    /// Load the tree containing the first row matching `filter`.
    ///
    /// Returns the tree's root, or `None` when nothing matched.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn load_tree(&self, filter: &RowFilter) -> Result<Option<TreeNode<D>>, TreeError> {
        let _guard = self.load_lock.lock().unwrap();
        self.fetch_and_build(filter)
    }

    /// Query and register one tree. Callers hold the load lock.
    fn fetch_and_build(&self, filter: &RowFilter) -> Result<Option<TreeNode<D>>, TreeError> {
        let rows = self.source.fetch_tree(filter)?;
        if rows.is_empty() {
            tracing::debug!(kind = self.kind, %filter, "No tree matched");
            return Ok(None);
        }
        Ok(self.build_tree(rows)?.into_iter().next())
    }

    /// Direct parent of `node` among loaded trees.
    ///
    /// Returns `None` for roots, unsaved nodes (`id == 0`), and nodes whose
    /// parent is not cached. Never queries.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn get_parent(&self, node: &TreeNode<D>) -> Option<TreeNode<D>> {
        if node.is_root() || node.id == 0 {
            return None;
        }
        let cache = self.cache.read().unwrap();
        cache.all_nodes().find(|p| p.is_parent_of(node)).cloned()
    }

    /// Parent chain of `node` excluding its root, outermost first.
    pub fn ancestors(&self, node: &TreeNode<D>) -> Vec<TreeNode<D>> {
        let mut chain = Vec::new();
        let mut current = self.get_parent(node);
        while let Some(parent) = current {
            if parent.is_root() {
                break;
            }
            current = self.get_parent(&parent);
            chain.push(parent);
        }
        chain.reverse();
        chain
    }

    /// First cached root matching `predicate`. Never queries.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn search_roots(&self, predicate: impl Fn(&TreeNode<D>) -> bool) -> Option<TreeNode<D>> {
        let cache = self.cache.read().unwrap();
        cache.roots.iter().find(|n| predicate(n)).cloned()
    }

    /// First cached item matching `predicate`, in root load order. Never queries.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn search_items(&self, predicate: impl Fn(&TreeNode<D>) -> bool) -> Option<TreeNode<D>> {
        let cache = self.cache.read().unwrap();
        cache
            .roots
            .iter()
            .filter_map(|root| cache.items.get(&root.id))
            .flatten()
            .find(|n| predicate(n))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::TreeStore<big_storage::MenuData>: Send, Sync);

    use big_storage::{MemoryStorage, MenuData, NodeRow};
    use pretty_assertions::assert_eq;

    use super::*;

    fn row(id: i64, tree: i64, lft: i64, rgt: i64, depth: i64) -> NodeRow<MenuData> {
        NodeRow::new(id, tree, lft, rgt, depth, MenuData::new(format!("n{id}"), format!("a{id}"), ""))
    }

    /// Tree 5: 1 > (2, 3). Tree 6: 10 > 11 > 12, 10 > 13.
    fn two_trees() -> Arc<MemoryStorage> {
        Arc::new(
            MemoryStorage::new()
                .with_menu(row(1, 5, 1, 6, 0))
                .with_menu(row(2, 5, 2, 3, 1))
                .with_menu(row(3, 5, 4, 5, 1))
                .with_menu(row(10, 6, 1, 8, 0))
                .with_menu(row(11, 6, 2, 5, 1))
                .with_menu(row(12, 6, 3, 4, 2))
                .with_menu(row(13, 6, 6, 7, 1)),
        )
    }

    fn store_over(storage: &Arc<MemoryStorage>) -> TreeStore<MenuData> {
        TreeStore::new(Arc::clone(storage) as Arc<dyn TreeSource<MenuData>>, "menu")
    }

    fn ids(nodes: &[TreeNode<MenuData>]) -> Vec<i64> {
        nodes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_concrete_scenario() {
        let storage = Arc::new(
            MemoryStorage::new()
                .with_menu(row(1, 5, 1, 6, 0))
                .with_menu(row(2, 5, 2, 3, 1))
                .with_menu(row(3, 5, 4, 5, 1)),
        );
        let store = store_over(&storage);

        let roots = store.get_roots(false).unwrap();
        let items = store.get_items(1).unwrap();

        assert_eq!(ids(&roots), vec![1]);
        assert_eq!(ids(&items), vec![2, 3]);
        assert_eq!(store.get_parent(&items[0]).map(|p| p.id), Some(1));
        assert_eq!(store.get_parent(&roots[0]), None);
    }

    #[test]
    fn test_round_trip_disjoint_trees() {
        let storage = two_trees();
        let store = store_over(&storage);

        let roots = store.get_roots(false).unwrap();

        assert_eq!(ids(&roots), vec![1, 10]);
        assert_eq!(ids(&store.get_items(1).unwrap()), vec![2, 3]);
        assert_eq!(ids(&store.get_items(10).unwrap()), vec![11, 12, 13]);
    }

    #[test]
    fn test_every_item_has_exactly_one_parent() {
        let storage = two_trees();
        let store = store_over(&storage);

        for root in store.get_roots(false).unwrap() {
            for item in store.get_items(root.id).unwrap() {
                let parent = store.get_parent(&item).unwrap();
                assert!(parent.contains(&item));
                assert_eq!(parent.depth, item.depth - 1);
            }
        }
        let grandchild = store.get_item(12).unwrap();
        assert_eq!(store.get_parent(&grandchild).unwrap().id, 11);
    }

    #[test]
    fn test_roots_loaded_once() {
        let storage = two_trees();
        let store = store_over(&storage);

        store.get_roots(false).unwrap();
        store.get_roots(false).unwrap();
        store.get_items(10).unwrap();
        store.get_item(12).unwrap();

        assert_eq!(storage.menus().query_count(), 1);
    }

    #[test]
    fn test_reload_queries_again() {
        let storage = two_trees();
        let store = store_over(&storage);

        store.get_roots(false).unwrap();
        store.get_roots(true).unwrap();

        assert_eq!(storage.menus().query_count(), 2);
    }

    #[test]
    fn test_get_items_loads_single_tree() {
        let storage = two_trees();
        let store = store_over(&storage);

        let items = store.get_items(10).unwrap();
        store.get_items(10).unwrap();

        assert_eq!(ids(&items), vec![11, 12, 13]);
        assert_eq!(storage.menus().query_count(), 1);
        assert_eq!(store.search_roots(|r| r.id == 1), None);
    }

    #[test]
    fn test_partial_load_then_get_roots_loads_everything() {
        let storage = two_trees();
        let store = store_over(&storage);

        store.get_items(10).unwrap();
        let roots = store.get_roots(false).unwrap();

        assert_eq!(ids(&roots), vec![1, 10]);
    }

    #[test]
    fn test_get_items_by_item_id_resolves_tree() {
        let storage = two_trees();
        let store = store_over(&storage);

        assert_eq!(ids(&store.get_items(12).unwrap()), vec![11, 12, 13]);
        // Second lookup is served from the cache.
        assert_eq!(ids(&store.get_items(13).unwrap()), vec![11, 12, 13]);
        assert_eq!(storage.menus().query_count(), 1);
    }

    #[test]
    fn test_get_items_unknown_id() {
        let storage = two_trees();
        let store = store_over(&storage);

        let err = store.get_items(99).unwrap_err();

        assert!(matches!(err, TreeError::NotFound(_)));
        assert_eq!(err.to_string(), "Node not found: menu 99");
    }

    #[test]
    fn test_get_item_and_root() {
        let storage = two_trees();
        let store = store_over(&storage);

        assert_eq!(store.get_item(3).unwrap().data.title, "n3");
        assert_eq!(store.get_root(10).unwrap().id, 10);
        assert!(matches!(store.get_root(11), Err(TreeError::NotFound(_))));
        assert!(matches!(store.get_item(42), Err(TreeError::NotFound(_))));
    }

    #[test]
    fn test_get_parent_is_cache_only() {
        let storage = two_trees();
        let store = store_over(&storage);
        let orphan: TreeNode<MenuData> = row(2, 5, 2, 3, 1).into();

        assert_eq!(store.get_parent(&orphan), None);
        assert_eq!(storage.menus().query_count(), 0);
    }

    #[test]
    fn test_get_parent_of_unsaved_node() {
        let storage = two_trees();
        let store = store_over(&storage);
        store.get_roots(false).unwrap();
        let unsaved: TreeNode<MenuData> = row(0, 5, 2, 3, 1).into();

        assert_eq!(store.get_parent(&unsaved), None);
    }

    #[test]
    fn test_ancestors_exclude_root() {
        let storage = two_trees();
        let store = store_over(&storage);
        let grandchild = store.get_item(12).unwrap();
        let child = store.get_item(13).unwrap();

        assert_eq!(ids(&store.ancestors(&grandchild)), vec![11]);
        assert!(store.ancestors(&child).is_empty());
    }

    #[test]
    fn test_build_tree_rejects_item_before_root() {
        let storage = two_trees();
        let store = store_over(&storage);
        store.get_items(1).unwrap();

        let err = store
            .build_tree(vec![row(20, 7, 2, 3, 1), row(21, 7, 1, 4, 0)])
            .unwrap_err();

        assert!(matches!(err, TreeError::MalformedTree(_)));
        // Previously loaded tree is untouched.
        assert_eq!(ids(&store.get_items(1).unwrap()), vec![2, 3]);
    }

    #[test]
    fn test_build_tree_rejects_empty_interval() {
        let storage = two_trees();
        let store = store_over(&storage);

        let err = store.build_tree(vec![row(20, 7, 1, 1, 0)]).unwrap_err();

        assert!(matches!(err, TreeError::MalformedTree(_)));
    }

    #[test]
    fn test_build_tree_rejects_item_from_other_tree() {
        let storage = two_trees();
        let store = store_over(&storage);

        let err = store
            .build_tree(vec![row(20, 7, 1, 4, 0), row(21, 8, 2, 3, 1)])
            .unwrap_err();

        assert!(matches!(err, TreeError::MalformedTree(_)));
    }

    #[test]
    fn test_build_tree_is_additive() {
        let storage = two_trees();
        let store = store_over(&storage);
        store.get_items(1).unwrap();

        let roots = store.build_tree(vec![row(20, 7, 1, 4, 0), row(21, 7, 2, 3, 1)]).unwrap();

        assert_eq!(ids(&roots), vec![20]);
        assert_eq!(ids(&store.get_items(1).unwrap()), vec![2, 3]);
        assert_eq!(ids(&store.get_items(20).unwrap()), vec![21]);
    }

    #[test]
    fn test_rebuilding_root_resets_items() {
        let storage = two_trees();
        let store = store_over(&storage);
        store.get_items(1).unwrap();

        store.build_tree(vec![row(1, 5, 1, 4, 0), row(3, 5, 2, 3, 1)]).unwrap();

        assert_eq!(ids(&store.get_items(1).unwrap()), vec![3]);
        assert_eq!(store.get_root(1).unwrap().rgt, 4);
    }

    #[test]
    fn test_root_without_items_has_empty_list() {
        let storage = Arc::new(MemoryStorage::new().with_menu(row(1, 1, 1, 2, 0)));
        let store = store_over(&storage);

        assert!(store.get_items(1).unwrap().is_empty());
    }

    #[test]
    fn test_search() {
        let storage = two_trees();
        let store = store_over(&storage);
        store.get_roots(false).unwrap();

        assert_eq!(store.search_items(|n| n.data.alias == "a13").map(|n| n.id), Some(13));
        assert_eq!(store.search_items(|n| n.id == 1), None);
        assert_eq!(store.search_roots(|n| n.tree == 6).map(|n| n.id), Some(10));
    }

    #[test]
    fn test_load_tree_by_filter() {
        let storage = two_trees();
        let store = store_over(&storage);

        let root = store.load_tree(&RowFilter::Alias("a12".to_owned())).unwrap();
        let missing = store.load_tree(&RowFilter::Alias("nope".to_owned())).unwrap();

        assert_eq!(root.map(|r| r.id), Some(10));
        assert_eq!(missing, None);
    }
}
