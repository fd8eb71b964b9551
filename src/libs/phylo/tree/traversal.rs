use super::Tree;
use crate::libs::phylo::node::NodeId;

/// Node IDs in preorder (root, then children left to right)
pub fn preorder(tree: &Tree, start_node: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut stack = vec![start_node];

    while let Some(id) = stack.pop() {
        if let Some(node) = tree.get_node(id) {
            result.push(id);
            // reversed so the leftmost child pops first
            stack.extend(node.children.iter().rev());
        }
    }

    result
}

/// Node IDs in postorder (children before their parent)
pub fn postorder(tree: &Tree, start_node: NodeId) -> Vec<NodeId> {
    fn helper(tree: &Tree, id: NodeId, result: &mut Vec<NodeId>) {
        if let Some(node) = tree.get_node(id) {
            for &child in &node.children {
                helper(tree, child, result);
            }
            result.push(id);
        }
    }

    let mut result = Vec::new();
    helper(tree, start_node, &mut result);
    result
}

/// Copy the subtree rooted at `node_id` into a fresh tree.
pub fn extract_subtree(tree: &Tree, node_id: NodeId) -> Result<Tree, String> {
    if tree.get_node(node_id).is_none() {
        return Err(format!("Node {} not found", node_id));
    }

    let mut new_tree = Tree::new();
    let mut stack = vec![(node_id, None::<NodeId>)];

    while let Some((old_id, new_parent)) = stack.pop() {
        let old_node = &tree.nodes[old_id];

        let new_id = new_tree.add_node();
        let new_node = &mut new_tree.nodes[new_id];
        new_node.name = old_node.name.clone();
        new_node.length = old_node.length;
        new_node.properties = old_node.properties.clone();

        match new_parent {
            Some(parent) => super::ops::add_child(&mut new_tree, parent, new_id)?,
            None => new_tree.set_root(new_id),
        }

        for &child in old_node.children.iter().rev() {
            stack.push((child, Some(new_id)));
        }
    }

    Ok(new_tree)
}
