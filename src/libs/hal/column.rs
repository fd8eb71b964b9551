use super::alignment::{Alignment, Locus};
use super::error::HalError;
use std::collections::{BTreeMap, VecDeque};

/// One site of an alignment column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnEntry {
    pub locus: Locus,
    /// Opposite orientation to the anchor site
    pub reversed: bool,
}

/// Every site aligned to `anchor`, ordered by genome id and position.
///
/// Links are followed in both directions: up to the parent, down to every
/// child copy including paralogs. With `ancestors` unset, sites of genomes
/// that have children are left out.
pub fn column(aln: &Alignment, anchor: Locus, ancestors: bool) -> Result<Vec<ColumnEntry>, HalError> {
    let genome = aln
        .genomes()
        .get(anchor.genome)
        .ok_or_else(|| HalError::UnknownGenome(anchor.genome.to_string()))?;
    if anchor.pos >= genome.length() {
        return Err(HalError::OutOfRange {
            genome: genome.name.clone(),
            position: anchor.pos,
        });
    }

    let mut seen: BTreeMap<Locus, bool> = BTreeMap::new();
    let mut queue = VecDeque::new();
    seen.insert(anchor, false);
    queue.push_back((anchor, false));

    while let Some((locus, reversed)) = queue.pop_front() {
        let mut linked = Vec::new();
        if let Some(up) = aln.map_to_parent(locus) {
            linked.push(up);
        }
        for slot in 0..aln.genome(locus.genome).children.len() {
            linked.extend(aln.child_copies(locus, slot)?);
        }

        for (next, flip) in linked {
            if !seen.contains_key(&next) {
                seen.insert(next, reversed ^ flip);
                queue.push_back((next, reversed ^ flip));
            }
        }
    }

    Ok(seen
        .into_iter()
        .filter(|(locus, _)| ancestors || aln.genome(locus.genome).is_leaf())
        .map(|(locus, reversed)| ColumnEntry { locus, reversed })
        .collect())
}
