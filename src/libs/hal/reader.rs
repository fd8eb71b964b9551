//! Line-oriented text form of a hierarchical alignment (`.halt`).
//!
//! ```text
//! genome <name> <parent|->
//! sequence <genome> <name> <length|DNA>
//! top <genome> <start> <length> <parentBottom|-> <+|-> <nextParalogy|->
//! bottom <genome> <start> <length> <childTop|->...
//! ```
//!
//! Fields are whitespace separated and `#` starts a comment. Parents are
//! declared before their children; segments may come in any record order
//! but must be sorted by start within each genome.

use super::alignment::{Alignment, BottomSegment, GenomeId, TopSegment};
use super::error::HalError;
use std::io::Read;

#[derive(Default)]
struct Lines {
    top: Vec<Vec<usize>>,
    bottom: Vec<Vec<usize>>,
}

fn format_err(line: usize, message: impl Into<String>) -> HalError {
    HalError::Format {
        line,
        message: message.into(),
    }
}

fn number(field: &str, what: &str, line: usize) -> Result<usize, HalError> {
    field
        .parse::<usize>()
        .map_err(|_| format_err(line, format!("invalid {}: {}", what, field)))
}

fn optional(field: &str, what: &str, line: usize) -> Result<Option<usize>, HalError> {
    if field == "-" {
        Ok(None)
    } else {
        number(field, what, line).map(Some)
    }
}

pub fn parse_halt(text: &str) -> Result<Alignment, HalError> {
    let mut aln = Alignment::new();
    let mut lines = Lines::default();

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let fields: Vec<&str> = content.split_whitespace().collect();

        let genome_of = |name: &str| {
            aln.genome_id(name)
                .ok_or_else(|| format_err(line, format!("unknown genome {}", name)))
        };

        match fields.as_slice() {
            ["genome", name, parent] => {
                let parent = (*parent != "-").then_some(*parent);
                aln.add_genome(name, parent)
                    .map_err(|e| format_err(line, e.to_string()))?;
                lines.top.push(Vec::new());
                lines.bottom.push(Vec::new());
            }
            ["sequence", genome, name, value] => {
                let id = genome_of(*genome)?;
                if value.bytes().all(|b| b.is_ascii_digit()) {
                    aln.add_sequence(id, name, number(value, "length", line)?, None);
                } else if value.bytes().all(|b| b.is_ascii_alphabetic() || b == b'-') {
                    aln.add_sequence(id, name, value.len(), Some(value.as_bytes().to_vec()));
                } else {
                    return Err(format_err(line, format!("invalid bases in {}", name)));
                }
            }
            ["top", genome, start, length, parent, strand, next] => {
                let id = genome_of(*genome)?;
                let reversed = match *strand {
                    "+" => false,
                    "-" => true,
                    _ => return Err(format_err(line, format!("invalid strand {}", strand))),
                };
                let segment = TopSegment {
                    start: number(start, "start", line)?,
                    length: number(length, "length", line)?,
                    parent_index: optional(parent, "parent index", line)?,
                    reversed,
                    next_paralogy: optional(next, "paralogy index", line)?,
                };
                aln.genome_mut(id).top.push(segment);
                lines.top[id].push(line);
            }
            ["bottom", genome, start, length, children @ ..] => {
                let id = genome_of(*genome)?;
                let segment = BottomSegment {
                    start: number(start, "start", line)?,
                    length: number(length, "length", line)?,
                    children: children
                        .iter()
                        .map(|c| optional(c, "child index", line))
                        .collect::<Result<_, _>>()?,
                };
                aln.genome_mut(id).bottom.push(segment);
                lines.bottom[id].push(line);
            }
            [kind, ..] => {
                return Err(format_err(
                    line,
                    format!("unexpected {} record with {} fields", kind, fields.len()),
                ))
            }
            [] => continue,
        }
    }

    validate(&aln, &lines)?;
    Ok(aln)
}

fn validate(aln: &Alignment, lines: &Lines) -> Result<(), HalError> {
    for genome in aln.genomes() {
        let id = genome.id;
        if genome.parent.is_none() && !genome.top.is_empty() {
            return Err(format_err(
                lines.top[id][0],
                format!("root genome {} has top segments", genome.name),
            ));
        }

        let top_spans = genome.top.iter().map(|s| (s.start, s.length));
        check_spans(top_spans, genome.length(), &lines.top[id])?;
        let bottom_spans = genome.bottom.iter().map(|s| (s.start, s.length));
        check_spans(bottom_spans, genome.length(), &lines.bottom[id])?;

        for (idx, top) in genome.top.iter().enumerate() {
            check_top(aln, id, idx, top, lines.top[id][idx])?;
        }
        for (idx, bottom) in genome.bottom.iter().enumerate() {
            check_bottom(aln, id, idx, bottom, lines.bottom[id][idx])?;
        }
    }
    Ok(())
}

fn check_spans(
    spans: impl Iterator<Item = (usize, usize)>,
    genome_length: usize,
    lines: &[usize],
) -> Result<(), HalError> {
    let mut prev_end = 0;
    for ((start, length), &line) in spans.zip(lines) {
        if length == 0 {
            return Err(format_err(line, "empty segment"));
        }
        if start < prev_end {
            return Err(format_err(line, "segments overlap or are not sorted"));
        }
        if start + length > genome_length {
            return Err(format_err(
                line,
                format!("segment ends past genome length {}", genome_length),
            ));
        }
        prev_end = start + length;
    }
    Ok(())
}

fn check_top(
    aln: &Alignment,
    id: GenomeId,
    idx: usize,
    top: &TopSegment,
    line: usize,
) -> Result<(), HalError> {
    let genome = aln.genome(id);

    if let Some(b) = top.parent_index {
        let parent = genome
            .parent
            .map(|p| aln.genome(p))
            .ok_or_else(|| format_err(line, format!("root genome {} has a parent link", genome.name)))?;
        let bottom = parent
            .bottom
            .get(b)
            .ok_or_else(|| format_err(line, format!("{} has no bottom segment {}", parent.name, b)))?;
        if bottom.length != top.length {
            return Err(format_err(
                line,
                format!(
                    "length {} differs from {} bottom segment {} ({})",
                    top.length, parent.name, b, bottom.length
                ),
            ));
        }
    }

    if let Some(next) = top.next_paralogy {
        let other = genome
            .top
            .get(next)
            .ok_or_else(|| format_err(line, format!("no paralogous segment {}", next)))?;
        if other.parent_index != top.parent_index || top.parent_index.is_none() {
            return Err(format_err(line, "paralogous segments must share a parent segment"));
        }

        // the cycle has to lead back here
        let mut current = next;
        let mut steps = 0;
        while current != idx {
            steps += 1;
            let segment = genome
                .top
                .get(current)
                .ok_or_else(|| format_err(line, format!("no paralogous segment {}", current)))?;
            match segment.next_paralogy {
                Some(n) if steps <= genome.top.len() => current = n,
                _ => return Err(format_err(line, "paralogy cycle does not close")),
            }
        }
    }

    Ok(())
}

fn check_bottom(
    aln: &Alignment,
    id: GenomeId,
    idx: usize,
    bottom: &BottomSegment,
    line: usize,
) -> Result<(), HalError> {
    let genome = aln.genome(id);
    if bottom.children.len() != genome.children.len() {
        return Err(format_err(
            line,
            format!(
                "{} has {} children but the segment lists {}",
                genome.name,
                genome.children.len(),
                bottom.children.len()
            ),
        ));
    }

    for (&child_id, &link) in genome.children.iter().zip(&bottom.children) {
        let Some(t) = link else { continue };
        let child = aln.genome(child_id);
        let top = child
            .top
            .get(t)
            .ok_or_else(|| format_err(line, format!("{} has no top segment {}", child.name, t)))?;
        if top.length != bottom.length {
            return Err(format_err(
                line,
                format!("length differs from {} top segment {}", child.name, t),
            ));
        }
        if top.parent_index != Some(idx) {
            return Err(format_err(
                line,
                format!("{} top segment {} does not link back", child.name, t),
            ));
        }
    }

    Ok(())
}

/// Read a `.halt` alignment ("stdin" for standard input).
pub fn read_halt(infile: &str) -> anyhow::Result<Alignment> {
    let mut reader = intspan::reader(infile);
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| anyhow::anyhow!("Read error: {}", e))?;
    Ok(parse_halt(&text)?)
}

impl Alignment {
    pub fn from_file(infile: &str) -> anyhow::Result<Self> {
        read_halt(infile)
    }
}

#[cfg(test)]
pub(crate) fn small_alignment() -> Alignment {
    parse_halt(include_str!("../../../tests/hal/small.halt")).unwrap()
}
