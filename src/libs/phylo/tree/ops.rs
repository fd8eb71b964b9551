use super::Tree;
use crate::libs::phylo::node::NodeId;

/// Add a child to a parent node.
/// Updates both parent's `children` list and child's `parent` field.
pub fn add_child(tree: &mut Tree, parent_id: NodeId, child_id: NodeId) -> Result<(), String> {
    if parent_id == child_id {
        return Err("Cannot add node as child of itself".to_string());
    }
    if tree.get_node(parent_id).is_none() {
        return Err(format!("Parent node {} not found or deleted", parent_id));
    }
    if tree.get_node(child_id).is_none() {
        return Err(format!("Child node {} not found or deleted", child_id));
    }
    if let Some(old_parent) = tree.nodes[child_id].parent {
        return Err(format!(
            "Node {} already has parent {}",
            child_id, old_parent
        ));
    }

    tree.nodes[child_id].parent = Some(parent_id);
    tree.nodes[parent_id].children.push(child_id);

    Ok(())
}

/// Replace the child list of `id` wholesale.
///
/// Every new child is re-pointed at `id`; children that are dropped from the
/// list keep their old parent pointer only if it pointed elsewhere.
pub fn set_children(tree: &mut Tree, id: NodeId, children: Vec<NodeId>) -> Result<(), String> {
    if tree.get_node(id).is_none() {
        return Err(format!("Node {} not found", id));
    }
    if children.contains(&id) {
        return Err("Cannot add node as child of itself".to_string());
    }

    let old = std::mem::take(&mut tree.nodes[id].children);
    for child in old {
        if tree.nodes[child].parent == Some(id) {
            tree.nodes[child].parent = None;
        }
    }
    for &child in &children {
        if let Some(node) = tree.get_node_mut(child) {
            node.parent = Some(id);
        }
    }
    tree.nodes[id].children = children;

    Ok(())
}

/// Soft remove a node and optionally its descendants.
/// If recursive is false, children are orphaned (parent set to None) and
/// stay alive in the arena.
pub fn remove_node(tree: &mut Tree, id: NodeId, recursive: bool) {
    if id >= tree.nodes.len() || tree.nodes[id].deleted {
        return;
    }

    if let Some(parent_id) = tree.nodes[id].parent {
        if let Some(parent) = tree.get_node_mut(parent_id) {
            parent.children.retain(|&child| child != id);
        }
    }

    let children = tree.nodes[id].children.clone();
    for child_id in children {
        if recursive {
            remove_node(tree, child_id, true);
        } else if let Some(child) = tree.get_node_mut(child_id) {
            child.parent = None;
        }
    }

    let node = &mut tree.nodes[id];
    node.deleted = true;
    node.children.clear();
    node.parent = None;

    if tree.root == Some(id) {
        tree.root = None;
    }
}

/// Unlink the subtree rooted at `id` and hand it back as an independent tree.
/// The nodes are destroyed in `tree`.
pub fn detach_subtree(tree: &mut Tree, id: NodeId) -> Result<Tree, String> {
    let detached = super::traversal::extract_subtree(tree, id)?;
    remove_node(tree, id, true);
    Ok(detached)
}

/// Collapse a node, removing it and connecting its children to its parent.
/// Edge lengths are summed (parent->node + node->child).
pub fn collapse_node(tree: &mut Tree, id: NodeId) -> Result<(), String> {
    let node = tree.get_node(id).ok_or(format!("Node {} not found", id))?;
    if tree.root == Some(id) {
        return Err("Cannot collapse root node".to_string());
    }
    let parent_id = node
        .parent
        .ok_or(format!("Node {} is detached", id))?;
    let parent_edge = node.length;
    let children = node.children.clone();

    for &child_id in &children {
        if let Some(child) = tree.get_node_mut(child_id) {
            child.length = add_lengths(parent_edge, child.length);
            child.parent = Some(parent_id);
        }
    }

    if let Some(parent) = tree.get_node_mut(parent_id) {
        if let Some(pos) = parent.children.iter().position(|&x| x == id) {
            parent.children.splice(pos..pos + 1, children);
        }
    }

    let node = &mut tree.nodes[id];
    node.deleted = true;
    node.children.clear();
    node.parent = None;

    Ok(())
}

/// Sum of two optional edge lengths; `None` only if both are missing.
pub fn add_lengths(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x + y),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

/// Compact the tree by removing soft-deleted nodes and remapping IDs.
/// This invalidates all existing NodeIds held outside!
pub fn compact(tree: &mut Tree) {
    let mut old_to_new = std::collections::HashMap::new();
    let mut new_nodes = Vec::with_capacity(tree.nodes.len());

    for old_node in tree.nodes.iter().filter(|n| !n.deleted) {
        old_to_new.insert(old_node.id, new_nodes.len());
        let mut new_node = old_node.clone();
        new_node.id = new_nodes.len();
        new_node.parent = None;
        new_node.children.clear();
        new_nodes.push(new_node);
    }

    for node in tree.nodes.iter().filter(|n| !n.deleted) {
        let new_self = old_to_new[&node.id];
        new_nodes[new_self].parent = node.parent.and_then(|p| old_to_new.get(&p).copied());
        new_nodes[new_self].children = node
            .children
            .iter()
            .filter_map(|c| old_to_new.get(c).copied())
            .collect();
    }

    tree.root = tree.root.and_then(|r| old_to_new.get(&r).copied());
    tree.nodes = new_nodes;
}

/// Insert a node in the middle of the edge between `id` and its parent.
/// Returns the new parent node ID.
pub fn insert_parent(tree: &mut Tree, id: NodeId) -> Result<NodeId, String> {
    let node = tree.get_node(id).ok_or(format!("Node {} not found", id))?;
    let parent = node.parent.ok_or("Node has no parent")?;
    let half = node.length.map(|l| l / 2.0);

    let new_node = tree.add_node();
    tree.nodes[new_node].length = half;
    tree.nodes[new_node].parent = Some(parent);
    if let Some(p_node) = tree.get_node_mut(parent) {
        if let Some(pos) = p_node.children.iter().position(|&c| c == id) {
            p_node.children[pos] = new_node;
        }
    }

    tree.nodes[id].parent = None;
    add_child(tree, new_node, id)?;
    tree.nodes[id].length = half;

    Ok(new_node)
}

/// Reroot the tree at the specified node by reversing every edge on the
/// path from the old root. Edge lengths travel with their edges.
pub fn reroot_at(tree: &mut Tree, new_root_id: NodeId) -> Result<(), String> {
    if tree.get_node(new_root_id).is_none() {
        return Err(format!("Node {} not found", new_root_id));
    }

    let old_root_id = tree.root.ok_or("Tree has no root")?;
    if old_root_id == new_root_id {
        return Ok(());
    }

    let path = tree.get_path_from_root(&new_root_id)?;
    // path[i]'s length is the edge path[i-1] -> path[i]
    let lengths: Vec<Option<f64>> = path.iter().map(|&id| tree.nodes[id].length).collect();

    for i in (1..path.len()).rev() {
        let child_id = path[i];
        let parent_id = path[i - 1];

        tree.nodes[parent_id].children.retain(|&x| x != child_id);
        tree.nodes[child_id].children.push(parent_id);
        tree.nodes[parent_id].parent = Some(child_id);
        tree.nodes[parent_id].length = lengths[i];
    }

    tree.nodes[new_root_id].parent = None;
    tree.nodes[new_root_id].length = None;
    tree.root = Some(new_root_id);

    Ok(())
}
