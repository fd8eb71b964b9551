//! Neighbor-joining whose join criterion is biased by species-tree
//! duplication/loss costs.

use super::error::TreeError;
use super::join_cost::JoinCosts;
use super::node::NodeId;
use super::tree::Tree;
use nalgebra::DMatrix;

/// Pairwise distances from a match/mismatch count matrix.
///
/// For `i < j`, cell `(i, j)` holds matches and `(j, i)` mismatches; the
/// distance is the mismatch fraction, or 1.0 if the pair shares no
/// comparable column.
pub fn distance_matrix(similarity: &DMatrix<f64>) -> DMatrix<f64> {
    let n = similarity.nrows();
    let mut dist = DMatrix::<f64>::zeros(n, n);

    for i in 0..n {
        for j in (i + 1)..n {
            let matches = similarity[(i, j)];
            let mismatches = similarity[(j, i)];
            let total = matches + mismatches;
            let d = if total > 0.0 { mismatches / total } else { 1.0 };
            dist[(i, j)] = d;
            dist[(j, i)] = d;
        }
    }

    dist
}

struct Cluster {
    node: NodeId,
    /// Join-cost index of the cluster's species
    species: usize,
}

/// Build a tree from a similarity matrix, guided by the species tree.
///
/// `matrix_to_join[i]` is the join-cost index of row `i`'s species. At each
/// step the pair minimizing `(r - 2)·d(i,j) - R(i) - R(j) + joinCost(i,j)`
/// is joined, and the new cluster is placed at the species MRCA of the two.
/// Leaves are labeled by their row index.
pub fn guided_neighbor_joining(
    similarity: &DMatrix<f64>,
    costs: &JoinCosts,
    matrix_to_join: &[usize],
    species: &Tree,
) -> Result<Tree, TreeError> {
    let n = similarity.nrows();
    if n == 0 {
        return Err(TreeError::LogicError("No sequences to join".to_string()));
    }
    if similarity.ncols() != n || matrix_to_join.len() != n {
        return Err(TreeError::LogicError(format!(
            "Matrix is {}x{} but {} rows are mapped to species",
            n,
            similarity.ncols(),
            matrix_to_join.len()
        )));
    }

    let species_nodes = costs.species_nodes();
    let mut tree = Tree::new();
    let mut clusters = Vec::with_capacity(n);
    for (i, &idx) in matrix_to_join.iter().enumerate() {
        if idx >= species_nodes.len() {
            return Err(TreeError::LogicError(format!(
                "Join-cost index {} out of range",
                idx
            )));
        }
        clusters.push(Cluster {
            node: tree.add_named_node(i.to_string()),
            species: idx,
        });
    }

    let mut dist = distance_matrix(similarity);

    while clusters.len() > 2 {
        let r = clusters.len();
        let sums: Vec<f64> = (0..r).map(|i| dist.row(i).sum()).collect();

        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..r {
            for j in (i + 1)..r {
                let q = (r as f64 - 2.0) * dist[(i, j)] - sums[i] - sums[j]
                    + costs.get(clusters[i].species, clusters[j].species);
                if best.map_or(true, |(_, _, b)| q < b) {
                    best = Some((i, j, q));
                }
            }
        }
        let (i, j, _) = best.ok_or_else(|| TreeError::LogicError("No pair to join".to_string()))?;

        let d_ij = dist[(i, j)];
        let len_i = 0.5 * d_ij + (sums[i] - sums[j]) / (2.0 * (r as f64 - 2.0));
        let len_j = d_ij - len_i;
        let merged_species = merge_species(species, &species_nodes, costs, &clusters[i], &clusters[j])?;
        let node = join(&mut tree, &clusters[i], &clusters[j], len_i, len_j)?;

        for k in 0..r {
            if k != i && k != j {
                let d = 0.5 * (dist[(i, k)] + dist[(j, k)] - d_ij);
                dist[(i, k)] = d;
                dist[(k, i)] = d;
            }
        }
        dist = dist.remove_row(j).remove_column(j);

        clusters[i] = Cluster {
            node,
            species: merged_species,
        };
        clusters.remove(j);
    }

    let root = match clusters.as_slice() {
        [only] => only.node,
        [a, b] => {
            let half = dist[(0, 1)] / 2.0;
            join(&mut tree, a, b, half, half)?
        }
        _ => {
            return Err(TreeError::LogicError(format!(
                "{} clusters left after joining",
                clusters.len()
            )))
        }
    };
    tree.set_root(root);

    Ok(tree)
}

fn merge_species(
    species: &Tree,
    species_nodes: &[NodeId],
    costs: &JoinCosts,
    a: &Cluster,
    b: &Cluster,
) -> Result<usize, TreeError> {
    let lca = species
        .get_common_ancestor(&species_nodes[a.species], &species_nodes[b.species])
        .map_err(TreeError::LogicError)?;
    costs
        .species_index
        .get(&lca)
        .copied()
        .ok_or_else(|| TreeError::LogicError(format!("Species node {} has no join-cost index", lca)))
}

fn join(
    tree: &mut Tree,
    a: &Cluster,
    b: &Cluster,
    len_a: f64,
    len_b: f64,
) -> Result<NodeId, TreeError> {
    let parent = tree.add_node();
    for (child, len) in [(a.node, len_a), (b.node, len_b)] {
        tree.add_child(parent, child).map_err(TreeError::LogicError)?;
        if let Some(node) = tree.get_node_mut(child) {
            node.length = Some(len.max(0.0));
        }
    }
    Ok(parent)
}

/// Replace row-index leaf labels by the corresponding FASTA headers.
pub fn relabel_leaves(tree: &mut Tree, headers: &[String]) -> Result<(), TreeError> {
    for leaf in tree.get_leaves() {
        let label = tree.label(leaf);
        let header = label
            .parse::<usize>()
            .ok()
            .and_then(|idx| headers.get(idx))
            .ok_or_else(|| TreeError::LogicError(format!("Leaf {} is not a row index", label)))?
            .clone();
        if let Some(node) = tree.get_node_mut(leaf) {
            node.set_name(header);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::phylo::join_cost::compute_join_costs;
    use approx::assert_relative_eq;
    use std::collections::BTreeSet;

    // similarity matrix with the given distances and 100 columns per pair
    fn similarity_from(dist: &[&[f64]]) -> DMatrix<f64> {
        let n = dist.len();
        let mut sim = DMatrix::<f64>::zeros(n, n);
        for i in 0..n {
            for j in (i + 1)..n {
                sim[(j, i)] = (dist[i][j] * 100.0).round();
                sim[(i, j)] = 100.0 - sim[(j, i)];
            }
        }
        sim
    }

    fn leaf_set(tree: &Tree, id: NodeId) -> BTreeSet<String> {
        tree.preorder(&id)
            .unwrap()
            .into_iter()
            .filter(|&n| tree.children(n).is_empty())
            .map(|n| tree.label(n).to_string())
            .collect()
    }

    #[test]
    fn test_distance_matrix() {
        let mut sim = DMatrix::<f64>::zeros(3, 3);
        sim[(0, 1)] = 1.0;
        sim[(1, 0)] = 1.0;
        sim[(0, 2)] = 3.0;

        let dist = distance_matrix(&sim);
        assert_relative_eq!(dist[(0, 1)], 0.5);
        assert_relative_eq!(dist[(1, 0)], 0.5);
        assert_relative_eq!(dist[(0, 2)], 0.0);
        // no comparable column
        assert_relative_eq!(dist[(1, 2)], 1.0);
        assert_relative_eq!(dist[(2, 2)], 0.0);
    }

    #[test]
    fn test_unguided_four_taxa() {
        let species = Tree::from_newick("((A,B)AB,(C,D)CD)R;").unwrap();
        let costs = compute_join_costs(&species, 0.0, 0.0).unwrap();
        let sim = similarity_from(&[
            &[0.0, 0.1, 0.5, 0.5],
            &[0.1, 0.0, 0.5, 0.5],
            &[0.5, 0.5, 0.0, 0.1],
            &[0.5, 0.5, 0.1, 0.0],
        ]);

        let tree = guided_neighbor_joining(&sim, &costs, &[2, 3, 5, 6], &species).unwrap();
        assert_eq!(tree.get_leaves().len(), 4);
        assert!(tree.is_binary());

        let a = tree.get_node_by_name("0").unwrap();
        let b = tree.get_node_by_name("1").unwrap();
        let ab = tree.get_common_ancestor(&a, &b).unwrap();
        assert_eq!(leaf_set(&tree, ab).len(), 2);
        assert_relative_eq!(tree.get_node(a).unwrap().length.unwrap(), 0.05, epsilon = 1e-9);
        assert!(tree
            .get_leaves()
            .iter()
            .all(|&l| tree.get_node(l).unwrap().length.unwrap() >= 0.0));
    }

    #[test]
    fn test_join_cost_breaks_ties() {
        let species = Tree::from_newick("(A,(B,C)BC)R;").unwrap();
        let costs = compute_join_costs(&species, 1.0, 1.0).unwrap();
        let index = |name: &str| costs.species_index[&species.get_node_by_name(name).unwrap()];
        let sim = similarity_from(&[&[0.0, 0.3, 0.3], &[0.3, 0.0, 0.3], &[0.3, 0.3, 0.0]]);

        let tree =
            guided_neighbor_joining(&sim, &costs, &[index("A"), index("B"), index("C")], &species)
                .unwrap();

        let b = tree.get_node_by_name("1").unwrap();
        let c = tree.get_node_by_name("2").unwrap();
        let bc = tree.get_common_ancestor(&b, &c).unwrap();
        assert_ne!(Some(bc), tree.get_root());
        assert_eq!(
            leaf_set(&tree, bc),
            ["1", "2"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn test_guided_nj_small_inputs() {
        let species = Tree::from_newick("(A,B)R;").unwrap();
        let costs = compute_join_costs(&species, 0.0, 0.0).unwrap();

        let tree = guided_neighbor_joining(&DMatrix::zeros(1, 1), &costs, &[1], &species).unwrap();
        assert_eq!(tree.to_newick(), "0;");

        let sim = similarity_from(&[&[0.0, 0.2], &[0.2, 0.0]]);
        let tree = guided_neighbor_joining(&sim, &costs, &[1, 2], &species).unwrap();
        assert_eq!(tree.to_newick(), "(0:0.1,1:0.1);");

        assert!(guided_neighbor_joining(&DMatrix::zeros(0, 0), &costs, &[], &species).is_err());
        assert!(guided_neighbor_joining(&sim, &costs, &[1], &species).is_err());
    }

    #[test]
    fn test_relabel_leaves() {
        let mut tree = Tree::from_newick("((0,2),1);").unwrap();
        let headers = vec![
            "human.chr1".to_string(),
            "chimp.chr1".to_string(),
            "gorilla.chr1".to_string(),
        ];
        relabel_leaves(&mut tree, &headers).unwrap();
        assert_eq!(tree.to_newick(), "((human.chr1,gorilla.chr1),chimp.chr1);");

        let mut tree = Tree::from_newick("(0,7);").unwrap();
        assert!(relabel_leaves(&mut tree, &headers).is_err());
    }
}
