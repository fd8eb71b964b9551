//! Compare where leaf pairs coalesce in an alignment-induced tree and in an
//! independently estimated, reconciled tree.

use super::error::TreeError;
use super::normalize::genome_token;
use super::tree::Tree;
use itertools::Itertools;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Coalescence {
    /// Both trees put the pair's MRCA in the same species
    Identical,
    /// The alignment tree's MRCA species is a strict descendant of, or
    /// unrelated to, the reconciled one
    Early,
    /// The alignment tree's MRCA species is a strict ancestor of the
    /// reconciled one
    Late,
}

impl fmt::Display for Coalescence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Coalescence::Identical => "identical",
            Coalescence::Early => "early",
            Coalescence::Late => "late",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairScore {
    pub first: String,
    pub second: String,
    /// Species of the pair's MRCA in the alignment tree
    pub aligned: String,
    /// Species of the pair's MRCA in the reconciled tree
    pub reconciled: String,
    pub kind: Coalescence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub identical: usize,
    pub early: usize,
    pub late: usize,
}

impl Summary {
    pub fn from_scores(scores: &[PairScore]) -> Self {
        let mut summary = Summary::default();
        for score in scores {
            summary.add(score.kind);
        }
        summary
    }

    pub fn add(&mut self, kind: Coalescence) {
        match kind {
            Coalescence::Identical => self.identical += 1,
            Coalescence::Early => self.early += 1,
            Coalescence::Late => self.late += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.identical + self.early + self.late
    }

    pub fn count(&self, kind: Coalescence) -> usize {
        match kind {
            Coalescence::Identical => self.identical,
            Coalescence::Early => self.early,
            Coalescence::Late => self.late,
        }
    }

    /// Fraction of pairs of the given kind, 0 when nothing was scored.
    pub fn fraction(&self, kind: Coalescence) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.count(kind) as f64 / self.total() as f64
        }
    }
}

/// Counts broken down by the genomes of the two leaves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenomeSummaries {
    /// Pairs with at least one leaf in the genome
    pub genomes: BTreeMap<String, Summary>,
    /// Keyed by the two genome names in sorted order
    pub pairs: BTreeMap<(String, String), Summary>,
}

impl GenomeSummaries {
    pub fn from_scores(scores: &[PairScore]) -> Self {
        let mut summaries = GenomeSummaries::default();
        for score in scores {
            let first = genome_token(&score.first);
            let second = genome_token(&score.second);

            summaries.genomes.entry(first.to_string()).or_default().add(score.kind);
            if second != first {
                summaries.genomes.entry(second.to_string()).or_default().add(score.kind);
            }

            let (a, b) = if first <= second { (first, second) } else { (second, first) };
            summaries
                .pairs
                .entry((a.to_string(), b.to_string()))
                .or_default()
                .add(score.kind);
        }
        summaries
    }
}

/// Score leaf pairs shared by both trees.
///
/// The species of an MRCA is the genome token of its label, looked up in
/// `species`. With more than `max_pairs` pairs, `max_pairs` of them are
/// sampled with `rng`; the scores come back in leaf-pair order.
pub fn score_coalescences<R: Rng>(
    aligned: &Tree,
    reconciled: &Tree,
    species: &Tree,
    max_pairs: usize,
    rng: &mut R,
) -> Result<Vec<PairScore>, TreeError> {
    let aligned_ids = aligned.get_name_id();
    let reconciled_ids = reconciled.get_name_id();

    let shared: BTreeSet<&str> = aligned
        .get_leaves()
        .into_iter()
        .map(|id| aligned.label(id))
        .filter(|label| reconciled_ids.contains_key(*label))
        .collect();

    let pairs: Vec<(&str, &str)> = shared.iter().copied().tuple_combinations().collect();
    let picked: Vec<(&str, &str)> = if pairs.len() <= max_pairs {
        pairs
    } else {
        let mut idx = rand::seq::index::sample(rng, pairs.len(), max_pairs).into_vec();
        idx.sort_unstable();
        idx.into_iter().map(|i| pairs[i]).collect()
    };

    let species_of = |label: &str| {
        let token = genome_token(label);
        species
            .get_node_by_name(token)
            .ok_or_else(|| TreeError::MissingLabel {
                tree: "species",
                label: token.to_string(),
            })
    };

    let mut scores = Vec::with_capacity(picked.len());
    for (first, second) in picked {
        let in_aligned = aligned
            .get_common_ancestor(&aligned_ids[first], &aligned_ids[second])
            .map_err(TreeError::LogicError)?;
        let in_reconciled = reconciled
            .get_common_ancestor(&reconciled_ids[first], &reconciled_ids[second])
            .map_err(TreeError::LogicError)?;

        let sp_aligned = species_of(aligned.label(in_aligned))?;
        let sp_reconciled = species_of(reconciled.label(in_reconciled))?;

        let kind = if sp_aligned == sp_reconciled {
            Coalescence::Identical
        } else if species
            .get_common_ancestor(&sp_aligned, &sp_reconciled)
            .map_err(TreeError::LogicError)?
            == sp_aligned
        {
            Coalescence::Late
        } else {
            Coalescence::Early
        };

        scores.push(PairScore {
            first: first.to_string(),
            second: second.to_string(),
            aligned: species.label(sp_aligned).to_string(),
            reconciled: species.label(sp_reconciled).to_string(),
            kind,
        });
    }

    Ok(scores)
}
