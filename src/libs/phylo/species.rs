use super::error::TreeError;
use super::node::NodeId;
use super::normalize::genome_token;
use super::tree::Tree;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::io::BufRead;

/// Gene-tree leaf node -> species-tree node.
pub type LeafToSpecies = BTreeMap<NodeId, NodeId>;

/// Gene name -> species name, two whitespace separated columns per line.
pub fn parse_gene2species<R: BufRead>(reader: R) -> anyhow::Result<IndexMap<String, String>> {
    let mut table = IndexMap::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [] => continue,
            [gene, species] => {
                table.insert(gene.to_string(), species.to_string());
            }
            _ => anyhow::bail!(
                "gene2species line {}: expected 2 fields, found {}",
                i + 1,
                fields.len()
            ),
        }
    }

    Ok(table)
}

pub fn read_gene2species(infile: &str) -> anyhow::Result<IndexMap<String, String>> {
    parse_gene2species(intspan::reader(infile))
}

/// Table mapping every gene-tree leaf to the genome token of its label.
///
/// Alignment-derived leaves are named `genome.sequence|offset`, so this is
/// the table such trees imply.
pub fn table_from_leaf_labels(gene: &Tree) -> IndexMap<String, String> {
    gene.get_leaves()
        .into_iter()
        .map(|leaf| {
            let label = gene.label(leaf);
            (label.to_string(), genome_token(label).to_string())
        })
        .collect()
}

/// Map each gene named in `table` to its species-tree node.
///
/// Every gene in the table must label a node of `gene`, and every species
/// it names must label a node of `species`.
pub fn map_leaves_to_species(
    gene: &Tree,
    species: &Tree,
    table: &IndexMap<String, String>,
) -> Result<LeafToSpecies, TreeError> {
    let gene_ids = gene.get_name_id();
    let species_ids = species.get_name_id();

    table
        .iter()
        .map(|(gene_name, species_name)| {
            let gene_id = gene_ids
                .get(gene_name)
                .ok_or_else(|| TreeError::MissingLabel {
                    tree: "gene",
                    label: gene_name.clone(),
                })?;
            let species_id =
                species_ids
                    .get(species_name)
                    .ok_or_else(|| TreeError::MissingLabel {
                        tree: "species",
                        label: species_name.clone(),
                    })?;
            Ok((*gene_id, *species_id))
        })
        .collect()
}
