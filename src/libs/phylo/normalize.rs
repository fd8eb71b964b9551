//! Tree-rewriting passes that make alignment-induced gene trees usable by
//! reconciliation and joining.

use super::error::TreeError;
use super::node::{NodeId, SENTINEL_LENGTH};
use super::tree::{ops, query, traversal, Tree};

/// Replace every node that has exactly one child by that child.
///
/// The removed node's branch length is added to the child's, so chains of
/// unary nodes accumulate. A unary root hands its place (and its own length)
/// to its child. Returns the number of nodes removed.
///
/// ```
/// use colphy::libs::phylo::{normalize, Tree};
///
/// let mut tree = Tree::from_newick("(((A:1)B:2)C:3,D:4)R;").unwrap();
/// assert_eq!(normalize::collapse_unary_nodes(&mut tree), 2);
/// assert_eq!(tree.to_newick(), "(A:6,D:4)R;");
/// ```
pub fn collapse_unary_nodes(tree: &mut Tree) -> usize {
    let Some(root) = tree.get_root() else {
        return 0;
    };

    let mut removed = 0;
    for id in traversal::postorder(tree, root) {
        if id != root && tree.children(id).len() == 1 && tree.collapse_node(id).is_ok() {
            removed += 1;
        }
    }

    while let Some(root) = tree.get_root() {
        let &[child] = tree.children(root) else {
            break;
        };
        let length = ops::add_lengths(
            tree.get_node(root).and_then(|n| n.length),
            tree.get_node(child).and_then(|n| n.length),
        );
        tree.remove_node(root, false);
        tree.set_root(child);
        if let Some(node) = tree.get_node_mut(child) {
            node.length = length;
        }
        removed += 1;
    }

    removed
}

/// Resolve every multifurcation into a left-leaning cascade of new
/// zero-length nodes: `(c0,c1,c2,c3)` becomes `(((c0,c1),c2),c3)`.
///
/// Unary nodes are collapsed first so the result has only 0 or 2 children
/// per node. Returns the number of multifurcating nodes that were resolved;
/// a non-zero count means the topology is now an arbitrary approximation.
pub fn binarize(tree: &mut Tree) -> Result<usize, TreeError> {
    collapse_unary_nodes(tree);
    let Some(root) = tree.get_root() else {
        return Ok(0);
    };

    let mut resolved = 0;
    for id in traversal::preorder(tree, root) {
        let children = tree.children(id).to_vec();
        if children.len() <= 2 {
            continue;
        }

        let (last, rest) = children.split_last().ok_or_else(|| {
            TreeError::LogicError(format!("Node {} lost its children", id))
        })?;
        let mut acc = rest[0];
        for &next in &rest[1..] {
            let joined = tree.add_node();
            tree.get_node_mut(joined)
                .ok_or_else(|| TreeError::LogicError(format!("Node {} not found", joined)))?
                .length = Some(0.0);
            ops::set_children(tree, joined, vec![acc, next]).map_err(TreeError::LogicError)?;
            acc = joined;
        }
        ops::set_children(tree, id, vec![acc, *last]).map_err(TreeError::LogicError)?;
        resolved += 1;
    }

    Ok(resolved)
}

/// Remove every node whose label equals its parent's label, splicing its
/// children into its place in the parent's child list.
///
/// Every visited node's branch length is set to `SENTINEL_LENGTH`, so the
/// resulting tree prints without lengths. The root is never removed.
/// Returns the number of nodes removed.
pub fn collapse_identical_ancestors(tree: &mut Tree) -> Result<usize, TreeError> {
    let Some(root) = tree.get_root() else {
        return Ok(0);
    };

    let before = tree.len();
    splice_identical(tree, root, None)?;
    Ok(before - tree.len())
}

// Returns the nodes that take `id`'s place in its parent's child list.
fn splice_identical(
    tree: &mut Tree,
    id: NodeId,
    parent_label: Option<&str>,
) -> Result<Vec<NodeId>, TreeError> {
    if let Some(node) = tree.get_node_mut(id) {
        node.length = Some(SENTINEL_LENGTH);
    }
    let label = tree.label(id).to_string();

    let mut kept = Vec::new();
    for child in tree.children(id).to_vec() {
        kept.extend(splice_identical(tree, child, Some(&label))?);
    }

    if parent_label == Some(label.as_str()) {
        tree.remove_node(id, false);
        Ok(kept)
    } else {
        ops::set_children(tree, id, kept).map_err(TreeError::LogicError)?;
        Ok(vec![id])
    }
}

/// Label every internal node with the species-tree MRCA of its children.
///
/// A child's species is the part of its label before the first `.`, looked
/// up by name in `species`. Children are relabeled before their parents, so
/// internal children contribute the species label they just received.
/// Leaves keep their labels.
pub fn relabel_to_lca(tree: &mut Tree, species: &Tree) -> Result<(), TreeError> {
    let Some(root) = tree.get_root() else {
        return Ok(());
    };

    for id in traversal::postorder(tree, root) {
        let children = tree.children(id).to_vec();
        if children.is_empty() {
            continue;
        }

        let mut nodes = Vec::with_capacity(children.len());
        for child in children {
            let token = genome_token(tree.label(child));
            let found = species
                .get_node_by_name(token)
                .ok_or_else(|| TreeError::MissingLabel {
                    tree: "species",
                    label: token.to_string(),
                })?;
            nodes.push(found);
        }
        let lca = query::get_common_ancestor_of(species, &nodes).map_err(TreeError::LogicError)?;

        let label = species.label(lca).to_string();
        if let Some(node) = tree.get_node_mut(id) {
            node.set_name(label);
        }
    }

    Ok(())
}

/// The leading `genome` token of a `genome.sequence|offset` label.
pub fn genome_token(label: &str) -> &str {
    label.split('.').next().unwrap_or(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_to_leaf_lengths(tree: &Tree) -> Vec<(String, f64)> {
        tree.get_leaves()
            .into_iter()
            .map(|leaf| {
                let total = tree
                    .get_path_from_root(&leaf)
                    .unwrap()
                    .iter()
                    .filter_map(|&id| tree.get_node(id).unwrap().length)
                    .sum();
                (tree.label(leaf).to_string(), total)
            })
            .collect()
    }

    #[test]
    fn test_collapse_unary_nodes() {
        let mut tree = Tree::from_newick("(((A:1)B:2)C:3,(D:4)E:0.5)R;").unwrap();
        let before = root_to_leaf_lengths(&tree);

        assert_eq!(collapse_unary_nodes(&mut tree), 3);
        assert_eq!(tree.to_newick(), "(A:6,D:4.5)R;");
        assert_eq!(root_to_leaf_lengths(&tree), before);

        // a second pass is a no-op
        assert_eq!(collapse_unary_nodes(&mut tree), 0);
        assert_eq!(tree.to_newick(), "(A:6,D:4.5)R;");
    }

    #[test]
    fn test_collapse_unary_root() {
        let mut tree = Tree::from_newick("(((A:1,B:2)X:3))R:1;").unwrap();
        let before = root_to_leaf_lengths(&tree);

        assert_eq!(collapse_unary_nodes(&mut tree), 2);
        assert_eq!(tree.to_newick(), "(A:1,B:2)X:4;");
        assert_eq!(tree.get_node(tree.get_root().unwrap()).unwrap().parent, None);
        assert_eq!(root_to_leaf_lengths(&tree), before);
    }

    #[test]
    fn test_binarize() {
        let mut tree = Tree::from_newick("(A,B,C,D)R;").unwrap();
        assert_eq!(binarize(&mut tree).unwrap(), 1);
        assert_eq!(tree.to_newick(), "(((A,B):0,C):0,D)R;");
        assert!(tree.is_binary());

        let mut tree = Tree::from_newick("((A,B,C),(D,E,F,G),(H)I)R;").unwrap();
        assert_eq!(binarize(&mut tree).unwrap(), 3);
        assert!(tree.is_binary());
        assert_eq!(
            tree.get_leaf_names(),
            ["A", "B", "C", "D", "E", "F", "G", "H"]
                .iter()
                .map(|s| Some(s.to_string()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_binarize_binary_is_noop() {
        let mut tree = Tree::from_newick("((A:1,B:2)AB:3,C:4)R;").unwrap();
        assert_eq!(binarize(&mut tree).unwrap(), 0);
        assert_eq!(tree.to_newick(), "((A:1,B:2)AB:3,C:4)R;");
    }

    #[test]
    fn test_collapse_identical_ancestors() {
        let mut tree = Tree::from_newick("(((a:1,b:1)X:1,c:1)X:1,d:1)X;").unwrap();
        assert_eq!(collapse_identical_ancestors(&mut tree).unwrap(), 2);
        assert_eq!(tree.to_newick(), "(a,b,c,d)X;");

        // idempotent, and leaves survive
        assert_eq!(collapse_identical_ancestors(&mut tree).unwrap(), 0);
        assert_eq!(tree.get_leaves().len(), 4);
    }

    #[test]
    fn test_collapse_identical_ancestors_marks_lengths() {
        let mut tree = Tree::from_newick("((x:1,y:2)A:3,z:4)B;").unwrap();
        assert_eq!(collapse_identical_ancestors(&mut tree).unwrap(), 0);
        assert_eq!(tree.to_newick(), "((x,y)A,z)B;");

        let x = tree.get_node_by_name("x").unwrap();
        assert_eq!(tree.get_node(x).unwrap().length, Some(SENTINEL_LENGTH));
    }

    #[test]
    fn test_collapse_identical_keeps_order() {
        let mut tree = Tree::from_newick("(p,(q,r)H,s)H;").unwrap();
        collapse_identical_ancestors(&mut tree).unwrap();
        assert_eq!(tree.to_newick(), "(p,q,r,s)H;");

        let q = tree.get_node_by_name("q").unwrap();
        assert_eq!(tree.get_node(q).unwrap().parent, tree.get_root());
    }

    #[test]
    fn test_relabel_to_lca() {
        let species = Tree::from_newick("((human,chimp)HC,gorilla)HCG;").unwrap();
        let mut tree = Tree::from_newick(
            "((human.chr1|1,chimp.chr1|2),(gorilla.chr1|3,human.chr1|9));",
        )
        .unwrap();

        relabel_to_lca(&mut tree, &species).unwrap();
        assert_eq!(
            tree.to_newick(),
            "((human.chr1|1,chimp.chr1|2)HC,(gorilla.chr1|3,human.chr1|9)HCG)HCG;"
        );
    }

    #[test]
    fn test_relabel_to_lca_unknown_genome() {
        let species = Tree::from_newick("((human,chimp)HC,gorilla)HCG;").unwrap();
        let mut tree = Tree::from_newick("(mouse.chr2|1,human.chr1|2);").unwrap();

        match relabel_to_lca(&mut tree, &species) {
            Err(TreeError::MissingLabel { label, .. }) => assert_eq!(label, "mouse"),
            other => panic!("Expected MissingLabel, got {:?}", other),
        }
        assert_eq!(tree.label(tree.get_root().unwrap()), "");
    }

    #[test]
    fn test_genome_token() {
        assert_eq!(genome_token("human.chr1|10"), "human");
        assert_eq!(genome_token("Anc0"), "Anc0");
        assert_eq!(genome_token(""), "");
    }
}
