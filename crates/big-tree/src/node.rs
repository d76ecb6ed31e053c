//! Materialized tree nodes.

use big_router::Route;
use big_storage::{CategoryData, MenuData, NodeData, NodeRow};

/// A node materialized from one nested-set row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode<D> {
    /// Unique identifier. `0` marks a node that was never saved.
    pub id: i64,
    /// Groups every node of one logical tree.
    pub tree: i64,
    pub lft: i64,
    pub rgt: i64,
    /// 0 for a root.
    pub depth: i64,
    /// Payload columns, opaque to the engine.
    pub data: D,
}

/// A menu item.
pub type MenuItem = TreeNode<MenuData>;

/// A category.
pub type Category = TreeNode<CategoryData>;

impl<D> TreeNode<D> {
    /// Whether this node is the root of its tree.
    pub fn is_root(&self) -> bool {
        self.lft == 1
    }

    /// Whether `other` lies strictly inside this node's interval.
    pub fn contains(&self, other: &Self) -> bool {
        self.tree == other.tree && self.lft < other.lft && self.rgt > other.rgt
    }

    /// Whether this node is the direct parent of `child`.
    pub fn is_parent_of(&self, child: &Self) -> bool {
        self.contains(child) && self.depth == child.depth - 1
    }

    /// Number of descendants, derived from the interval width.
    pub fn descendant_count(&self) -> i64 {
        (self.rgt - self.lft - 1) / 2
    }
}

impl<D: NodeData> TreeNode<D> {
    pub fn title(&self) -> &str {
        self.data.title()
    }
}

impl<D> From<NodeRow<D>> for TreeNode<D> {
    fn from(row: NodeRow<D>) -> Self {
        Self {
            id: row.id,
            tree: row.tree,
            lft: row.lft,
            rgt: row.rgt,
            depth: row.depth,
            data: row.data,
        }
    }
}

impl TreeNode<MenuData> {
    /// Published items are enabled.
    pub fn is_enabled(&self) -> bool {
        self.data.state == 1
    }

    pub fn is_default(&self) -> bool {
        self.data.is_default
    }

    pub fn alias(&self) -> &str {
        &self.data.alias
    }

    /// Internal route this item points to.
    pub fn route(&self) -> Route {
        Route::parse(&self.data.route)
    }
}
