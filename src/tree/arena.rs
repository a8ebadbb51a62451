//! Tree operations: insert, attach, detach, remove, ancestor walks.

use slotmap::{SecondaryMap, SlotMap};

use super::node::{WidgetId, WidgetNode};

const EMPTY_CHILDREN: &[WidgetId] = &[];

/// The composition tree, backed by a slotmap arena.
///
/// Nodes own nothing but their data: the child lists and parent back-references
/// live in secondary maps keyed by [`WidgetId`], so ownership cycles cannot be
/// expressed and a stale id simply fails to resolve.
pub struct WidgetTree {
    nodes: SlotMap<WidgetId, WidgetNode>,
    children: SecondaryMap<WidgetId, Vec<WidgetId>>,
    parent: SecondaryMap<WidgetId, WidgetId>,
    root: Option<WidgetId>,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            root: None,
        }
    }

    /// Insert a detached node.
    pub fn insert(&mut self, node: WidgetNode) -> WidgetId {
        let id = self.nodes.insert(node);
        self.children.insert(id, Vec::new());
        id
    }

    /// Make `child` the last child of `parent`, detaching it from any previous parent.
    ///
    /// Refused (returns `false`) when either id is unknown or when the two widgets
    /// are the same or one is an ancestor of the other.
    pub fn attach(&mut self, parent: WidgetId, child: WidgetId) -> bool {
        if !self.contains(parent) || !self.contains(child) || self.related(parent, child) {
            return false;
        }
        self.detach(child);
        self.parent.insert(child, parent);
        if let Some(kids) = self.children.get_mut(parent) {
            kids.push(child);
        }
        true
    }

    /// Remove `child` from its parent's content. Returns the former parent.
    pub fn detach(&mut self, child: WidgetId) -> Option<WidgetId> {
        let parent = self.parent.remove(child)?;
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.retain(|&c| c != child);
        }
        Some(parent)
    }

    /// Remove a node and all its descendants. Returns the removed ids, parents first.
    pub fn remove(&mut self, id: WidgetId) -> Vec<WidgetId> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.detach(id);
        if self.root == Some(id) {
            self.root = None;
        }
        let removed = self.walk_depth_first(id);
        for &current in &removed {
            self.children.remove(current);
            self.parent.remove(current);
            self.nodes.remove(current);
        }
        removed
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.parent.get(id).copied()
    }

    /// Children in content order. Empty for unknown ids.
    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Whether `ancestor` appears on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: WidgetId, id: WidgetId) -> bool {
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            if p == ancestor {
                return true;
            }
            current = p;
        }
        false
    }

    /// Same widget, or one is an ancestor of the other.
    pub fn related(&self, a: WidgetId, b: WidgetId) -> bool {
        a == b || self.is_ancestor(a, b) || self.is_ancestor(b, a)
    }

    /// Whether the parent chain of `id` ends at the root.
    pub fn is_rooted(&self, id: WidgetId) -> bool {
        match self.root {
            Some(root) => id == root || self.is_ancestor(root, id),
            None => false,
        }
    }

    pub fn get(&self, id: WidgetId) -> Option<&WidgetNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut WidgetNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn root(&self) -> Option<WidgetId> {
        self.root
    }

    pub fn set_root(&mut self, id: WidgetId) {
        self.root = Some(id);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: WidgetId) -> Vec<WidgetId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::{Block, StackPanel};

    /// ```text
    ///       root
    ///      /    \
    ///    a        b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (WidgetTree, WidgetId, WidgetId, WidgetId, WidgetId, WidgetId) {
        let mut tree = WidgetTree::new();
        let root = tree.insert(WidgetNode::new(StackPanel::new()));
        let a = tree.insert(WidgetNode::new(StackPanel::new()));
        let b = tree.insert(WidgetNode::new(Block::new()));
        let c = tree.insert(WidgetNode::new(Block::new()));
        let d = tree.insert(WidgetNode::new(Block::new()));
        tree.set_root(root);
        assert!(tree.attach(root, a));
        assert!(tree.attach(root, b));
        assert!(tree.attach(a, c));
        assert!(tree.attach(a, d));
        (tree, root, a, b, c, d)
    }

    // ── Structure ───────────────────────────────────────────────────

    #[test]
    fn insert_does_not_pick_a_root() {
        let mut tree = WidgetTree::new();
        tree.insert(WidgetNode::new(Block::new()));
        assert_eq!(tree.root(), None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn parents_and_children() {
        let (tree, root, a, b, c, d) = build_tree();
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.parent(c), Some(a));
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.children(a), &[c, d]);
        assert!(tree.children(c).is_empty());
    }

    #[test]
    fn ancestors_nearest_first() {
        let (tree, root, a, _b, c, _d) = build_tree();
        assert_eq!(tree.ancestors(c), vec![a, root]);
        assert!(tree.ancestors(root).is_empty());
        assert!(tree.is_ancestor(root, c));
        assert!(!tree.is_ancestor(c, root));
    }

    // ── Cycle refusal ───────────────────────────────────────────────

    #[test]
    fn attach_refuses_ancestor_or_self() {
        let (mut tree, root, a, _b, c, _d) = build_tree();
        assert!(!tree.attach(c, root));
        assert!(!tree.attach(c, a));
        assert!(!tree.attach(a, a));
        // Also refuses adopting a descendant that is already below it.
        assert!(!tree.attach(root, c));
        assert_eq!(tree.parent(c), Some(a));
    }

    #[test]
    fn attach_moves_between_unrelated_parents() {
        let (mut tree, _root, a, b, c, _d) = build_tree();
        assert!(tree.attach(b, c));
        assert_eq!(tree.parent(c), Some(b));
        assert_eq!(tree.children(a).len(), 1);
        assert_eq!(tree.children(b), &[c]);
    }

    // ── Removal ─────────────────────────────────────────────────────

    #[test]
    fn remove_takes_the_subtree() {
        let (mut tree, root, a, b, c, d) = build_tree();
        let removed = tree.remove(a);
        assert_eq!(removed, vec![a, c, d]);
        assert!(!tree.contains(c));
        assert_eq!(tree.children(root), &[b]);
        assert_eq!(tree.len(), 2);
        assert!(tree.remove(a).is_empty());
    }

    #[test]
    fn remove_root_clears_it() {
        let (mut tree, root, ..) = build_tree();
        tree.remove(root);
        assert_eq!(tree.root(), None);
        assert!(tree.is_empty());
    }

    #[test]
    fn detach_and_rootedness() {
        let (mut tree, root, a, _b, c, _d) = build_tree();
        assert!(tree.is_rooted(c));
        assert_eq!(tree.detach(a), Some(root));
        assert!(!tree.is_rooted(c));
        assert_eq!(tree.detach(a), None);
    }

    #[test]
    fn walk_is_preorder() {
        let (tree, root, a, b, c, d) = build_tree();
        assert_eq!(tree.walk_depth_first(root), vec![root, a, c, d, b]);
    }
}
