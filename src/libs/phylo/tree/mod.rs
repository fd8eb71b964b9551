pub mod io;
pub mod ops;
pub mod query;
pub mod stat;
#[cfg(test)]
pub mod tests;
pub mod traversal;

use super::node::{Node, NodeId};
use std::collections::BTreeMap;

/// Arena-backed rooted tree.
///
/// Nodes are never freed while the tree lives; removal marks them `deleted`
/// and unlinks them. `compact()` reclaims the slots and renumbers ids.
#[derive(Debug, Default, Clone)]
pub struct Tree {
    pub(super) nodes: Vec<Node>,

    pub(super) root: Option<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node. Returns the new node's ID.
    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id));
        id
    }

    /// Add a detached node carrying `name`.
    pub fn add_named_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.add_node();
        self.nodes[id].set_name(name);
        id
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| !n.deleted).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).filter(|n| !n.deleted)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).filter(|n| !n.deleted)
    }

    pub fn set_root(&mut self, id: NodeId) {
        if self.get_node(id).is_some() {
            self.root = Some(id);
        }
    }

    /// Children of `id`, empty for unknown nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get_node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Label of `id`, "" for unknown or unlabeled nodes.
    pub fn label(&self, id: NodeId) -> &str {
        self.get_node(id).map(|n| n.label()).unwrap_or("")
    }

    // --- Delegation to ops ---

    pub fn add_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<(), String> {
        ops::add_child(self, parent_id, child_id)
    }

    pub fn remove_node(&mut self, id: NodeId, recursive: bool) {
        ops::remove_node(self, id, recursive)
    }

    pub fn detach_subtree(&mut self, id: NodeId) -> Result<Tree, String> {
        ops::detach_subtree(self, id)
    }

    pub fn collapse_node(&mut self, id: NodeId) -> Result<(), String> {
        ops::collapse_node(self, id)
    }

    pub fn compact(&mut self) {
        ops::compact(self)
    }

    pub fn insert_parent(&mut self, child_id: NodeId) -> Result<NodeId, String> {
        ops::insert_parent(self, child_id)
    }

    pub fn reroot_at(&mut self, new_root_id: NodeId) -> Result<(), String> {
        ops::reroot_at(self, new_root_id)
    }

    // --- Delegation to traversal ---

    pub fn preorder(&self, start_node: &NodeId) -> Result<Vec<NodeId>, String> {
        Ok(traversal::preorder(self, *start_node))
    }

    pub fn postorder(&self, start_node: &NodeId) -> Result<Vec<NodeId>, String> {
        Ok(traversal::postorder(self, *start_node))
    }

    pub fn extract_subtree(&self, root_id: &NodeId) -> Result<Tree, String> {
        traversal::extract_subtree(self, *root_id)
    }

    // --- Delegation to query ---

    pub fn get_path_from_root(&self, id: &NodeId) -> Result<Vec<NodeId>, String> {
        query::get_path_from_root(self, id)
    }

    pub fn get_common_ancestor(&self, a: &NodeId, b: &NodeId) -> Result<NodeId, String> {
        query::get_common_ancestor(self, a, b)
    }

    pub fn get_depth(&self, id: &NodeId) -> Result<usize, String> {
        query::get_depth(self, id)
    }

    pub fn get_node_by_name(&self, name: &str) -> Option<NodeId> {
        query::get_node_by_name(self, name)
    }

    // --- Delegation to stat ---

    pub fn get_leaves(&self) -> Vec<NodeId> {
        if let Some(root) = self.root {
            stat::get_leaves(self, root)
        } else {
            Vec::new()
        }
    }

    pub fn get_leaf_names(&self) -> Vec<Option<String>> {
        if let Some(root) = self.root {
            stat::get_leaf_names(self, root)
        } else {
            Vec::new()
        }
    }

    pub fn is_binary(&self) -> bool {
        stat::is_binary(self)
    }

    pub fn get_names(&self) -> Vec<String> {
        stat::get_names(self)
    }

    pub fn get_name_id(&self) -> BTreeMap<String, NodeId> {
        stat::get_name_id(self)
    }

    // --- Delegation to io ---

    pub fn from_file(infile: &str) -> anyhow::Result<Vec<Tree>> {
        io::from_file(infile)
    }

    pub fn to_newick(&self) -> String {
        io::to_newick(self)
    }
}
