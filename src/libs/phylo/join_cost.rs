use super::error::TreeError;
use super::node::NodeId;
use super::tree::{query, traversal, Tree};
use indexmap::IndexMap;
use nalgebra::DMatrix;
use std::collections::BTreeMap;

/// Pairwise join costs between species-tree nodes.
#[derive(Debug, Clone)]
pub struct JoinCosts {
    /// Indexed by join-cost index, symmetric
    pub matrix: DMatrix<f64>,
    /// Species node -> join-cost index (its pre-order rank)
    pub species_index: BTreeMap<NodeId, usize>,
}

impl JoinCosts {
    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.matrix[(a, b)]
    }

    /// Join-cost index -> species node
    pub fn species_nodes(&self) -> Vec<NodeId> {
        let mut nodes = vec![0; self.species_index.len()];
        for (&node, &idx) in &self.species_index {
            nodes[idx] = node;
        }
        nodes
    }
}

/// Cost of joining two lineages found in species `a` and `b`.
///
/// With `m` their MRCA: if `m` is `a` or `b` the join is a duplication at `m`
/// and every level between `m` and the two species is a loss. Otherwise it
/// is a speciation and the two children of `m` on the paths are free.
pub fn compute_join_costs(
    species: &Tree,
    dup_cost: f64,
    loss_cost: f64,
) -> Result<JoinCosts, TreeError> {
    if dup_cost < 0.0 || loss_cost < 0.0 {
        return Err(TreeError::LogicError(format!(
            "Join costs must be non-negative (dup {}, loss {})",
            dup_cost, loss_cost
        )));
    }
    let root = species
        .get_root()
        .ok_or_else(|| TreeError::LogicError("Empty species tree".to_string()))?;

    let nodes = traversal::preorder(species, root);
    let depths = query::get_depths(species);
    let n = nodes.len();

    let mut matrix = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let (a, b) = (nodes[i], nodes[j]);
            let m = species
                .get_common_ancestor(&a, &b)
                .map_err(TreeError::LogicError)?;
            let span = depths[&a] + depths[&b] - 2 * depths[&m];

            let (dups, losses) = if m == a || m == b {
                (1, span)
            } else {
                (0, span - 2)
            };
            let cost = dups as f64 * dup_cost + losses as f64 * loss_cost;
            matrix[(i, j)] = cost;
            matrix[(j, i)] = cost;
        }
    }

    let species_index = nodes.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    Ok(JoinCosts {
        matrix,
        species_index,
    })
}

/// For every similarity-matrix row, the join-cost index of its genome.
///
/// `genome_to_indices` groups matrix rows by genome name; all rows of one
/// genome share an index. Every row in `0..n` must be covered.
pub fn map_matrix_indices(
    genome_to_indices: &IndexMap<String, Vec<usize>>,
    species: &Tree,
    costs: &JoinCosts,
) -> Result<Vec<usize>, TreeError> {
    let n: usize = genome_to_indices.values().map(Vec::len).sum();
    let mut mapped: Vec<Option<usize>> = vec![None; n];

    for (genome, rows) in genome_to_indices {
        let node = species
            .get_node_by_name(genome)
            .ok_or_else(|| TreeError::MissingLabel {
                tree: "species",
                label: genome.clone(),
            })?;
        let idx = *costs.species_index.get(&node).ok_or_else(|| {
            TreeError::LogicError(format!("Species node {} is detached", genome))
        })?;

        for &row in rows {
            let slot = mapped.get_mut(row).ok_or_else(|| {
                TreeError::LogicError(format!("Matrix index {} out of range", row))
            })?;
            *slot = Some(idx);
        }
    }

    mapped
        .into_iter()
        .enumerate()
        .map(|(row, idx)| {
            idx.ok_or_else(|| TreeError::LogicError(format!("Matrix index {} has no genome", row)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn index_of(species: &Tree, costs: &JoinCosts, name: &str) -> usize {
        costs.species_index[&species.get_node_by_name(name).unwrap()]
    }

    #[test]
    fn test_compute_join_costs() {
        let species = Tree::from_newick("((A,B)AB,C)ABC;").unwrap();
        let costs = compute_join_costs(&species, 2.0, 1.0).unwrap();

        assert_eq!(costs.matrix.nrows(), 5);
        assert_eq!(index_of(&species, &costs, "ABC"), 0);
        assert_eq!(index_of(&species, &costs, "C"), 4);

        let cost = |a: &str, b: &str| {
            costs.get(index_of(&species, &costs, a), index_of(&species, &costs, b))
        };
        // speciation, no loss
        assert_relative_eq!(cost("A", "B"), 0.0);
        assert_relative_eq!(cost("AB", "C"), 0.0);
        // speciation, one loss on the C side
        assert_relative_eq!(cost("A", "C"), 1.0);
        assert_relative_eq!(cost("C", "A"), 1.0);
        // duplication in A
        assert_relative_eq!(cost("A", "A"), 2.0);
        // duplication in AB, B lost below it
        assert_relative_eq!(cost("A", "AB"), 3.0);
        assert_relative_eq!(cost("ABC", "B"), 4.0);
    }

    #[test]
    fn test_compute_join_costs_negative() {
        let species = Tree::from_newick("(A,B);").unwrap();
        assert!(compute_join_costs(&species, -1.0, 0.0).is_err());
        assert!(compute_join_costs(&species, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_map_matrix_indices() {
        let species = Tree::from_newick("((A,B)AB,C)ABC;").unwrap();
        let costs = compute_join_costs(&species, 1.0, 1.0).unwrap();

        let mut groups = IndexMap::new();
        groups.insert("A".to_string(), vec![0, 2]);
        groups.insert("C".to_string(), vec![1]);

        let mapped = map_matrix_indices(&groups, &species, &costs).unwrap();
        assert_eq!(mapped, vec![2, 4, 2]);

        groups.insert("D".to_string(), vec![3]);
        let err = map_matrix_indices(&groups, &species, &costs).unwrap_err();
        assert_eq!(err.to_string(), "Node with name D not found in species tree");
    }
}
