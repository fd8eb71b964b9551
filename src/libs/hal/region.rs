use super::alignment::Alignment;
use super::column::ColumnEntry;
use super::error::HalError;
use bio::alphabets::dna::revcomp;

/// Bases around one column entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// `genome.sequence|offset` of the entry
    pub header: String,
    pub seq: Vec<u8>,
}

impl Region {
    pub fn to_fasta(&self) -> String {
        format!(">{}\n{}\n", self.header, String::from_utf8_lossy(&self.seq))
    }
}

/// Up to `width` bases on each side of every entry, clipped to the entry's
/// sequence. Entries reversed relative to the anchor are reverse
/// complemented, so all regions read in the anchor's orientation.
pub fn flanking_regions(
    aln: &Alignment,
    column: &[ColumnEntry],
    width: usize,
) -> Result<Vec<Region>, HalError> {
    let mut regions = Vec::with_capacity(column.len());

    for entry in column {
        let locus = entry.locus;
        let genome = aln.genome(locus.genome);
        let seq = genome
            .sequence_at(locus.pos)
            .ok_or_else(|| HalError::OutOfRange {
                genome: genome.name.clone(),
                position: locus.pos,
            })?;
        let dna = seq
            .dna
            .as_ref()
            .ok_or_else(|| HalError::MissingDna(genome.name.clone()))?;

        let offset = locus.pos - seq.start;
        let begin = offset.saturating_sub(width);
        let end = (offset + width + 1).min(seq.length);
        let bases = &dna[begin..end];

        regions.push(Region {
            header: aln.label(locus)?,
            seq: if entry.reversed {
                revcomp(bases)
            } else {
                bases.to_vec()
            },
        });
    }

    Ok(regions)
}
