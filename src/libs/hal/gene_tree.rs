//! Gene tree of one alignment column.

use super::alignment::{Alignment, Locus};
use super::column::ColumnEntry;
use super::error::HalError;
use crate::libs::phylo::{NodeId, Tree};
use std::collections::BTreeSet;

/// Build the tree of aligned sites that `column` belongs to.
///
/// The first entry is walked up to the topmost site of the column, then
/// the tree is grown downwards through every child copy, paralogs landing
/// next to their canonical sibling. Sites of internal genomes that end up
/// with no descendants (insertions in an ancestor) are pruned. Nodes are
/// labeled `genome.sequence|offset` and carry no branch lengths.
pub fn build_gene_tree(aln: &Alignment, column: &[ColumnEntry]) -> Result<Tree, HalError> {
    let seed = column.first().ok_or(HalError::EmptyColumn)?.locus;
    let top = root_locus(aln, seed)?;

    let mut tree = Tree::new();
    let root = tree.add_named_node(aln.label(top)?);
    tree.set_root(root);

    if aln.genome(top.genome).has_parse_down(top.pos) {
        let mut visited = BTreeSet::from([top]);
        descend(aln, &mut tree, root, top, &mut visited)?;
        tree.compact();
    }

    Ok(tree)
}

// Follow parent links as far as they go.
fn root_locus(aln: &Alignment, seed: Locus) -> Result<Locus, HalError> {
    let mut current = seed;
    let mut genomes = BTreeSet::from([seed.genome]);

    while let Some((parent, _)) = aln.map_to_parent(current) {
        if !genomes.insert(parent.genome) {
            return Err(HalError::Cycle(format!(
                "genome {} reached twice while ascending",
                aln.genome(parent.genome).name
            )));
        }
        current = parent;
    }

    Ok(current)
}

fn descend(
    aln: &Alignment,
    tree: &mut Tree,
    node: NodeId,
    locus: Locus,
    visited: &mut BTreeSet<Locus>,
) -> Result<(), HalError> {
    for slot in 0..aln.genome(locus.genome).children.len() {
        for (copy, _) in aln.child_copies(locus, slot)? {
            if !visited.insert(copy) {
                return Err(HalError::Cycle(format!(
                    "site {} reached twice while descending",
                    aln.label(copy)?
                )));
            }

            let child = tree.add_named_node(aln.label(copy)?);
            tree.add_child(node, child).map_err(HalError::Cycle)?;

            let genome = aln.genome(copy.genome);
            if genome.has_parse_down(copy.pos) {
                descend(aln, tree, child, copy, visited)?;
            }
            if !genome.is_leaf() && tree.children(child).is_empty() {
                tree.remove_node(child, true);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::hal::column::column;
    use crate::libs::hal::reader::small_alignment;

    fn tree_at(genome: &str, seq: &str, pos: usize, ancestors: bool) -> Tree {
        let aln = small_alignment();
        let anchor = aln.locus(genome, Some(seq), pos).unwrap();
        let col = column(&aln, anchor, ancestors).unwrap();
        build_gene_tree(&aln, &col).unwrap()
    }

    #[test]
    fn test_gene_tree_paralogs() {
        let expected =
            "((human.chr1|1,human.chr1|8,chimp.chr1|1)Anc1.a1|1,gorilla.chr1|1)Anc0.anc0chr|1;";
        assert_eq!(tree_at("human", "chr1", 1, true).to_newick(), expected);
        // the seed only decides where the ascent starts
        assert_eq!(tree_at("human", "chr1", 1, false).to_newick(), expected);
        assert_eq!(tree_at("gorilla", "chr1", 1, false).to_newick(), expected);
    }

    #[test]
    fn test_gene_tree_one_node_per_entry() {
        let aln = small_alignment();
        let anchor = aln.locus("human", Some("chr2"), 0).unwrap();
        let col = column(&aln, anchor, true).unwrap();
        let tree = build_gene_tree(&aln, &col).unwrap();

        assert_eq!(
            tree.to_newick(),
            "((human.chr2|0,chimp.chr1|4)Anc1.a1|6,gorilla.chr1|6)Anc0.anc0chr|6;"
        );
        let labels: BTreeSet<String> = tree.get_names().into_iter().collect();
        let entries: BTreeSet<String> = col.iter().map(|e| aln.label(e.locus).unwrap()).collect();
        assert_eq!(labels, entries);
    }

    #[test]
    fn test_gene_tree_prunes_ancestral_insertion() {
        let tree = tree_at("Anc0", "anc0chr", 4, true);
        assert_eq!(tree.to_newick(), "(gorilla.chr1|4)Anc0.anc0chr|4;");
    }

    #[test]
    fn test_gene_tree_leaf_insertion() {
        let tree = tree_at("human", "chr1", 4, true);
        assert_eq!(tree.to_newick(), "human.chr1|4;");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_gene_tree_empty_column() {
        let aln = small_alignment();
        assert_eq!(build_gene_tree(&aln, &[]).unwrap_err(), HalError::EmptyColumn);
    }
}
