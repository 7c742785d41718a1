use std::sync::Arc;

use thiserror::Error;

use crate::model::ids::NodeId;
use crate::model::path::SelectedPath;
use crate::model::question::OPTION_COUNT;

/// Labels of the four children of an expanded node, in option order.
pub const OPTION_LABELS: [&str; OPTION_COUNT] = ["A", "B", "C", "D"];

const ROOT_LABEL: &str = "Start";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TreeError {
    /// A path step names a node that is not a child of the previous step.
    #[error("path integrity violated: {missing} is not a child of {parent}")]
    PathIntegrity { parent: NodeId, missing: NodeId },
}

//
// ─── NODES ─────────────────────────────────────────────────────────────────────
//

/// Children of a node: none yet, or one per answer option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Children {
    Unexpanded,
    Expanded([Arc<TreeNode>; OPTION_COUNT]),
}

/// A node of the quaternary decision tree.
///
/// Nodes are immutable; updates go through [`DecisionTree::expand_at`], which
/// rebuilds only the nodes on the updated path and shares the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    id: NodeId,
    label: String,
    children: Children,
}

impl TreeNode {
    fn unexpanded(id: NodeId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            children: Children::Unexpanded,
        }
    }

    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Children in option order; empty when the node has not been expanded.
    #[must_use]
    pub fn children(&self) -> &[Arc<TreeNode>] {
        match &self.children {
            Children::Unexpanded => &[],
            Children::Expanded(children) => children,
        }
    }

    #[must_use]
    pub fn is_expanded(&self) -> bool {
        matches!(self.children, Children::Expanded(_))
    }

    /// Child for the zero-based option index, if the node is expanded.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<&TreeNode> {
        self.children().get(index).map(AsRef::as_ref)
    }

    fn find_child(&self, id: &NodeId) -> Option<usize> {
        self.children().iter().position(|child| child.id == *id)
    }

    /// Returns this node with four fresh children, or an unchanged copy if it
    /// is already expanded.
    #[must_use]
    pub fn expand(&self) -> TreeNode {
        match &self.children {
            Children::Expanded(_) => self.clone(),
            Children::Unexpanded => Self {
                id: self.id.clone(),
                label: self.label.clone(),
                children: Children::Expanded(std::array::from_fn(|i| {
                    Arc::new(TreeNode::unexpanded(self.id.child(i), OPTION_LABELS[i]))
                })),
            },
        }
    }

    fn count_expanded(&self) -> usize {
        let own = usize::from(self.is_expanded());
        own + self
            .children()
            .iter()
            .map(|child| child.count_expanded())
            .sum::<usize>()
    }
}

//
// ─── TREE ──────────────────────────────────────────────────────────────────────
//

/// Immutable snapshot of the decision tree. Cloning is cheap and snapshots
/// never observe later updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTree {
    root: Arc<TreeNode>,
}

impl DecisionTree {
    /// The initial tree: an expanded root whose four children are unexpanded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Arc::new(TreeNode::unexpanded(NodeId::root(), ROOT_LABEL).expand()),
        }
    }

    /// Rebuild the tree a session would have after walking `path`.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::PathIntegrity` if `path` leaves the derivable id scheme.
    pub fn replay(path: &SelectedPath) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        let mut prefix = SelectedPath::root();
        for id in &path.ids()[1..] {
            prefix = prefix.extended(id.clone());
            tree = tree.expand_at(&prefix)?;
        }
        Ok(tree)
    }

    #[must_use]
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Walk from the root along `path` and return the node at its end.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::PathIntegrity` if any step has no matching child.
    pub fn resolve(&self, path: &SelectedPath) -> Result<&TreeNode, TreeError> {
        let mut node: &TreeNode = &self.root;
        for id in &path.ids()[1..] {
            let index = node
                .find_child(id)
                .ok_or_else(|| TreeError::PathIntegrity {
                    parent: node.id.clone(),
                    missing: id.clone(),
                })?;
            node = node.children()[index].as_ref();
        }
        Ok(node)
    }

    /// Returns a new snapshot in which the node at the end of `path` is expanded.
    ///
    /// Only the nodes from the root to the target are rebuilt. If the target is
    /// already expanded the returned snapshot shares every node with `self`.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::PathIntegrity` if `path` does not resolve.
    pub fn expand_at(&self, path: &SelectedPath) -> Result<Self, TreeError> {
        Ok(Self {
            root: rebuild_expanded(&self.root, &path.ids()[1..])?,
        })
    }

    /// Number of expanded nodes in the snapshot.
    #[must_use]
    pub fn materialized_count(&self) -> usize {
        self.root.count_expanded()
    }
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

fn rebuild_expanded(node: &Arc<TreeNode>, rest: &[NodeId]) -> Result<Arc<TreeNode>, TreeError> {
    let Some((next, tail)) = rest.split_first() else {
        if node.is_expanded() {
            return Ok(Arc::clone(node));
        }
        return Ok(Arc::new(node.expand()));
    };

    let missing = || TreeError::PathIntegrity {
        parent: node.id.clone(),
        missing: next.clone(),
    };
    let index = node.find_child(next).ok_or_else(missing)?;
    let Children::Expanded(children) = &node.children else {
        return Err(missing());
    };

    let updated = rebuild_expanded(&children[index], tail)?;
    if Arc::ptr_eq(&updated, &children[index]) {
        return Ok(Arc::clone(node));
    }

    let mut children = children.clone();
    children[index] = updated;
    Ok(Arc::new(TreeNode {
        id: node.id.clone(),
        label: node.label.clone(),
        children: Children::Expanded(children),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> SelectedPath {
        raw.parse().unwrap()
    }

    #[test]
    fn initial_tree_has_expanded_root_only() {
        let tree = DecisionTree::new();
        let ids: Vec<_> = tree.root().children().iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4"]);
        let labels: Vec<_> = tree.root().children().iter().map(|c| c.label()).collect();
        assert_eq!(labels, OPTION_LABELS);
        assert_eq!(tree.root().label(), "Start");
        assert_eq!(tree.materialized_count(), 1);
    }

    #[test]
    fn expand_creates_labeled_children() {
        let tree = DecisionTree::new();
        let node = tree.root().child(2).unwrap().expand();
        let ids: Vec<_> = node.children().iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, ["3-0", "3-1", "3-2", "3-3"]);
        assert!(node.children().iter().all(|c| !c.is_expanded()));
    }

    #[test]
    fn expand_is_idempotent() {
        let once = DecisionTree::new().root().child(0).unwrap().expand();
        let twice = once.expand();
        assert_eq!(once, twice);
        assert_eq!(twice.children().len(), OPTION_COUNT);
    }

    #[test]
    fn resolve_walks_to_path_end() {
        let tree = DecisionTree::new().expand_at(&path("root,2")).unwrap();
        let node = tree.resolve(&path("root,2,2-1")).unwrap();
        assert_eq!(node.id().as_str(), "2-1");
        assert_eq!(node.label(), "B");
    }

    #[test]
    fn resolve_rejects_unknown_step() {
        let tree = DecisionTree::new();
        let err = tree.resolve(&path("root,2,2-1")).unwrap_err();
        assert_eq!(
            err,
            TreeError::PathIntegrity {
                parent: "2".parse().unwrap(),
                missing: "2-1".parse().unwrap(),
            }
        );
    }

    #[test]
    fn expand_at_keeps_previous_snapshot_intact() {
        let before = DecisionTree::new();
        let after = before.expand_at(&path("root,4")).unwrap();

        assert!(!before.resolve(&path("root,4")).unwrap().is_expanded());
        assert!(after.resolve(&path("root,4")).unwrap().is_expanded());
        assert!(Arc::ptr_eq(
            &before.root().children()[0],
            &after.root().children()[0]
        ));
    }

    #[test]
    fn expand_at_on_expanded_node_shares_everything() {
        let tree = DecisionTree::new().expand_at(&path("root,1")).unwrap();
        let again = tree.expand_at(&path("root,1")).unwrap();
        assert!(Arc::ptr_eq(&tree.root, &again.root));
    }

    #[test]
    fn replay_materializes_only_the_active_path() {
        let walked = path("root,1,1-3,1-3-0");
        let tree = DecisionTree::replay(&walked).unwrap();
        assert_eq!(tree.materialized_count(), 1 + walked.answered());
        assert!(tree.resolve(&walked).unwrap().is_expanded());
        assert!(!tree.resolve(&path("root,2")).unwrap().is_expanded());
    }

    #[test]
    fn replay_rejects_foreign_ids() {
        assert!(DecisionTree::replay(&path("root,1,2-0")).is_err());
    }
}
