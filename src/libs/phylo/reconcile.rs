//! LCA reconciliation of an at-most-binary gene tree against a species tree.

use super::error::TreeError;
use super::node::NodeId;
use super::species::LeafToSpecies;
use super::tree::{query, traversal, Tree};
use super::normalize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Every gene-tree node -> species-tree node
    pub mapping: BTreeMap<NodeId, NodeId>,
    /// Internal gene-tree nodes classified as duplications
    pub duplications: BTreeSet<NodeId>,
    pub losses: usize,
}

impl Reconciliation {
    pub fn dups(&self) -> usize {
        self.duplications.len()
    }

    /// Duplications plus losses
    pub fn cost(&self) -> usize {
        self.dups() + self.losses
    }
}

/// Map every gene node to the MRCA of its children's species.
///
/// A node is a duplication when it maps to the same species as one of its
/// children. Each edge below a speciation implies `depth(child) -
/// depth(parent) - 1` losses; below a duplication, `depth(child) -
/// depth(parent)`.
pub fn reconcile(
    gene: &Tree,
    species: &Tree,
    leaf_to_species: &LeafToSpecies,
) -> Result<Reconciliation, TreeError> {
    let root = gene
        .get_root()
        .ok_or_else(|| TreeError::LogicError("Empty gene tree".to_string()))?;
    let depths = query::get_depths(species);
    let depth = |id: NodeId| {
        depths
            .get(&id)
            .copied()
            .ok_or_else(|| TreeError::LogicError(format!("Species node {} is detached", id)))
    };

    let mut result = Reconciliation::default();
    for id in traversal::postorder(gene, root) {
        let children = gene.children(id);

        let sp = match children {
            [] => *leaf_to_species.get(&id).ok_or_else(|| {
                TreeError::LogicError(format!(
                    "Leaf {} has no species assigned",
                    gene.label(id)
                ))
            })?,
            [child] => result.mapping[child],
            [left, right] => {
                let (a, b) = (result.mapping[left], result.mapping[right]);
                let m = species
                    .get_common_ancestor(&a, &b)
                    .map_err(TreeError::LogicError)?;

                let is_dup = m == a || m == b;
                let below = if is_dup { 0 } else { 1 };
                for s in [a, b] {
                    result.losses += depth(s)? - depth(m)? - below;
                }
                if is_dup {
                    result.duplications.insert(id);
                }
                m
            }
            _ => {
                return Err(TreeError::NotBinary(format!(
                    "node {} has {} children",
                    id,
                    children.len()
                )))
            }
        };

        result.mapping.insert(id, sp);
    }

    Ok(result)
}

/// Label internal nodes with their species and a `D=Y|N` duplication flag.
pub fn label_by_reconciliation(gene: &mut Tree, species: &Tree, rec: &Reconciliation) {
    for (&id, &sp) in &rec.mapping {
        if gene.children(id).is_empty() {
            continue;
        }
        let label = species.label(sp).to_string();
        let dup = if rec.duplications.contains(&id) { "Y" } else { "N" };
        if let Some(node) = gene.get_node_mut(id) {
            node.set_name(label);
            node.add_property("D", dup);
        }
    }
}

/// Reconcile and relabel in one go.
pub fn reconcile_and_label(
    gene: &mut Tree,
    species: &Tree,
    leaf_to_species: &LeafToSpecies,
) -> Result<Reconciliation, TreeError> {
    let rec = reconcile(gene, species, leaf_to_species)?;
    label_by_reconciliation(gene, species, &rec);
    Ok(rec)
}

/// Try every edge as the root position and keep the rooting with the fewest
/// duplications plus losses. Ties keep the first edge in pre-order.
///
/// The returned tree is compacted, so node ids differ from `gene`'s and the
/// leaf mapping has to be rebuilt for it.
pub fn root_by_reconciliation(
    gene: &Tree,
    species: &Tree,
    leaf_to_species: &LeafToSpecies,
) -> Result<Tree, TreeError> {
    let root = gene
        .get_root()
        .ok_or_else(|| TreeError::LogicError("Empty gene tree".to_string()))?;

    let mut best: Option<(usize, Tree)> = None;
    for id in traversal::preorder(gene, root) {
        if id == root {
            continue;
        }

        let mut candidate = gene.clone();
        let mid = candidate.insert_parent(id).map_err(TreeError::LogicError)?;
        candidate.reroot_at(mid).map_err(TreeError::LogicError)?;
        normalize::collapse_unary_nodes(&mut candidate);

        let cost = reconcile(&candidate, species, leaf_to_species)?.cost();
        log::debug!("Rooting above {}: cost {}", gene.label(id), cost);
        if best.as_ref().map_or(true, |(c, _)| cost < *c) {
            best = Some((cost, candidate));
        }
    }

    let mut tree = match best {
        Some((_, tree)) => tree,
        None => gene.clone(),
    };
    tree.compact();
    Ok(tree)
}
