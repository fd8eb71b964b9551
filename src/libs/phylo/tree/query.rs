use super::Tree;
use crate::libs::phylo::node::NodeId;
use std::collections::BTreeMap;

/// Nodes from the root down to `id`, both inclusive.
pub fn get_path_from_root(tree: &Tree, id: &NodeId) -> Result<Vec<NodeId>, String> {
    if tree.get_node(*id).is_none() {
        return Err(format!("Node {} not found", id));
    }

    let mut path = vec![*id];
    let mut current = *id;
    while let Some(p) = tree.nodes[current].parent {
        if path.len() > tree.nodes.len() {
            return Err(format!("Cycle detected above node {}", id));
        }
        path.push(p);
        current = p;
    }
    path.reverse();

    if let Some(root) = tree.root {
        if path[0] != root {
            return Err("Node is detached from root".to_string());
        }
    }

    Ok(path)
}

/// Most recent common ancestor of two nodes.
pub fn get_common_ancestor(tree: &Tree, a: &NodeId, b: &NodeId) -> Result<NodeId, String> {
    let path_a = get_path_from_root(tree, a)?;
    let path_b = get_path_from_root(tree, b)?;

    path_a
        .iter()
        .zip(path_b.iter())
        .take_while(|(u, v)| u == v)
        .last()
        .map(|(u, _)| *u)
        .ok_or_else(|| "Nodes are not in the same tree (no common ancestor)".to_string())
}

/// Fold `get_common_ancestor` over a non-empty list of nodes.
pub fn get_common_ancestor_of(tree: &Tree, nodes: &[NodeId]) -> Result<NodeId, String> {
    let (first, rest) = nodes
        .split_first()
        .ok_or_else(|| "No nodes given".to_string())?;
    rest.iter()
        .try_fold(*first, |acc, n| get_common_ancestor(tree, &acc, n))
}

/// Number of edges between the root and `id`.
pub fn get_depth(tree: &Tree, id: &NodeId) -> Result<usize, String> {
    Ok(get_path_from_root(tree, id)?.len() - 1)
}

/// Depth of every node reachable from the root.
pub fn get_depths(tree: &Tree) -> BTreeMap<NodeId, usize> {
    let mut depths = BTreeMap::new();
    if let Some(root) = tree.root {
        for id in super::traversal::preorder(tree, root) {
            let depth = tree.nodes[id]
                .parent
                .and_then(|p| depths.get(&p))
                .map_or(0, |d| d + 1);
            depths.insert(id, depth);
        }
    }
    depths
}

/// Get node ID by name. Returns first match.
pub fn get_node_by_name(tree: &Tree, name: &str) -> Option<NodeId> {
    tree.nodes
        .iter()
        .find(|n| !n.deleted && n.name.as_deref() == Some(name))
        .map(|n| n.id)
}
