use super::Tree;
use crate::libs::phylo::node::NodeId;
use std::collections::BTreeMap;

/// IDs of all leaves under `id`, left to right.
pub fn get_leaves(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    super::traversal::preorder(tree, id)
        .into_iter()
        .filter(|&n| tree.children(n).is_empty())
        .collect()
}

/// Names of all leaves under `id`, left to right.
pub fn get_leaf_names(tree: &Tree, id: NodeId) -> Vec<Option<String>> {
    get_leaves(tree, id)
        .into_iter()
        .map(|leaf_id| tree.get_node(leaf_id).and_then(|n| n.name.clone()))
        .collect()
}

/// Every live node has either 0 or 2 children.
pub fn is_binary(tree: &Tree) -> bool {
    tree.nodes
        .iter()
        .all(|n| n.deleted || n.children.is_empty() || n.children.len() == 2)
}

/// Names of all live nodes that have one.
pub fn get_names(tree: &Tree) -> Vec<String> {
    tree.nodes
        .iter()
        .filter(|n| !n.deleted)
        .filter_map(|n| n.name.clone())
        .collect()
}

/// Name -> NodeId; the last node wins on duplicated names.
pub fn get_name_id(tree: &Tree) -> BTreeMap<String, NodeId> {
    tree.nodes
        .iter()
        .filter(|n| !n.deleted)
        .filter_map(|n| n.name.clone().map(|name| (name, n.id)))
        .collect()
}
