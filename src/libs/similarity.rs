//! Pairwise match/mismatch counts over an aligned multi-FASTA.

use anyhow::{anyhow, bail};
use indexmap::IndexMap;
use nalgebra::DMatrix;
use std::io::BufRead;

/// Sequences of one alignment, in input order.
#[derive(Debug, Clone, Default)]
pub struct AlignedSequences {
    pub headers: Vec<String>,
    pub sequences: Vec<Vec<u8>>,
    /// Row indices per genome, genomes in order of first appearance
    pub genome_to_indices: IndexMap<String, Vec<usize>>,
}

impl AlignedSequences {
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Append one sequence whose header has the `genome.sequence` form.
    pub fn push(&mut self, header: &str, seq: &[u8]) -> anyhow::Result<()> {
        let (genome, _) = header
            .split_once('.')
            .ok_or_else(|| anyhow!("Header {} is not in genome.sequence form", header))?;
        if let Some(first) = self.sequences.first() {
            if first.len() != seq.len() {
                bail!(
                    "Sequence {} has length {}, expected {}",
                    header,
                    seq.len(),
                    first.len()
                );
            }
        }

        let idx = self.headers.len();
        self.genome_to_indices
            .entry(genome.to_string())
            .or_default()
            .push(idx);
        self.headers.push(header.to_string());
        self.sequences.push(seq.to_vec());
        Ok(())
    }
}

pub fn parse_aligned_fasta<R: BufRead>(reader: R) -> anyhow::Result<AlignedSequences> {
    let mut fa_in = noodles_fasta::io::Reader::new(reader);
    let mut aligned = AlignedSequences::default();

    for result in fa_in.records() {
        let record = result?;
        let name = String::from_utf8(record.name().into())?;
        aligned.push(&name, record.sequence().as_ref())?;
    }

    Ok(aligned)
}

/// Read an aligned multi-FASTA ("stdin" for standard input).
pub fn read_aligned_fasta(infile: &str) -> anyhow::Result<AlignedSequences> {
    parse_aligned_fasta(intspan::reader(infile))
}

fn is_wildcard(base: u8) -> bool {
    matches!(base, b'N' | b'n' | b'-')
}

fn check_base(base: u8, header: &str, column: usize) -> anyhow::Result<()> {
    if is_wildcard(base) || matches!(base.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T') {
        Ok(())
    } else {
        Err(anyhow!(
            "Invalid base '{}' in {} at column {}",
            base as char,
            header,
            column + 1
        ))
    }
}

/// Count matches into the upper triangle and mismatches into the lower one.
///
/// For `i < j`, cell `(i, j)` counts columns where both bases are equal
/// (ignoring case) and `(j, i)` columns where they differ. Columns with a
/// gap or `N` in either sequence are skipped for that pair.
pub fn similarity_matrix(aligned: &AlignedSequences) -> anyhow::Result<DMatrix<f64>> {
    let n = aligned.len();
    let mut matrix = DMatrix::<f64>::zeros(n, n);
    let width = aligned.sequences.first().map_or(0, |s| s.len());

    for col in 0..width {
        for (seq, header) in aligned.sequences.iter().zip(&aligned.headers) {
            check_base(seq[col], header, col)?;
        }

        for i in 0..n {
            let a = aligned.sequences[i][col];
            if is_wildcard(a) {
                continue;
            }
            for j in (i + 1)..n {
                let b = aligned.sequences[j][col];
                if is_wildcard(b) {
                    continue;
                }
                if a.eq_ignore_ascii_case(&b) {
                    matrix[(i, j)] += 1.0;
                } else {
                    matrix[(j, i)] += 1.0;
                }
            }
        }
    }

    Ok(matrix)
}
