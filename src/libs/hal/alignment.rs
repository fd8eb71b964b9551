use super::error::HalError;
use crate::libs::phylo::Tree;

/// GenomeId is an index into the Alignment's genome vector.
pub type GenomeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub name: String,
    /// Offset of the first base in the genome coordinate space
    pub start: usize,
    pub length: usize,
    pub dna: Option<Vec<u8>>,
}

impl Sequence {
    /// Exclusive end in genome coordinates
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Name with `:` replaced, so it survives inside a Newick label.
    pub fn safe_name(&self) -> String {
        self.name.replace(':', "_")
    }
}

/// Segment mapping up into the parent genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopSegment {
    pub start: usize,
    pub length: usize,
    /// Bottom segment of the parent genome, `None` for an insertion
    pub parent_index: Option<usize>,
    /// Orientation relative to the parent bottom segment
    pub reversed: bool,
    /// Next top segment in this genome aligned to the same parent bottom
    pub next_paralogy: Option<usize>,
}

/// Segment mapping down into the child genomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BottomSegment {
    pub start: usize,
    pub length: usize,
    /// Canonical top segment per child genome, in `Genome::children` order
    pub children: Vec<Option<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genome {
    pub id: GenomeId,
    pub name: String,
    pub parent: Option<GenomeId>,
    pub children: Vec<GenomeId>,
    pub sequences: Vec<Sequence>,
    /// Sorted by start, non-overlapping
    pub top: Vec<TopSegment>,
    /// Sorted by start, non-overlapping
    pub bottom: Vec<BottomSegment>,
}

// Index of the segment covering `pos` in a sorted, non-overlapping list.
fn covering<T>(segments: &[T], pos: usize, span: impl Fn(&T) -> (usize, usize)) -> Option<usize> {
    let idx = segments.partition_point(|s| span(s).0 <= pos);
    let i = idx.checked_sub(1)?;
    let (start, length) = span(&segments[i]);
    (pos < start + length).then_some(i)
}

// Offset `o` of a segment of `length` bases, seen from a linked segment.
fn map_offset(offset: usize, length: usize, reversed: bool) -> usize {
    if reversed {
        length - 1 - offset
    } else {
        offset
    }
}

impl Genome {
    pub fn new(id: GenomeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            children: Vec::new(),
            sequences: Vec::new(),
            top: Vec::new(),
            bottom: Vec::new(),
        }
    }

    /// Total number of bases
    pub fn length(&self) -> usize {
        self.sequences.last().map_or(0, |s| s.end())
    }

    pub fn sequence(&self, name: &str) -> Option<&Sequence> {
        self.sequences.iter().find(|s| s.name == name)
    }

    pub fn sequence_at(&self, pos: usize) -> Option<&Sequence> {
        covering(&self.sequences, pos, |s| (s.start, s.length)).map(|i| &self.sequences[i])
    }

    pub fn top_at(&self, pos: usize) -> Option<usize> {
        covering(&self.top, pos, |s| (s.start, s.length))
    }

    pub fn bottom_at(&self, pos: usize) -> Option<usize> {
        covering(&self.bottom, pos, |s| (s.start, s.length))
    }

    /// The site has finer structure towards the children
    pub fn has_parse_down(&self, pos: usize) -> bool {
        self.bottom_at(pos).is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// One site of one genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Locus {
    pub genome: GenomeId,
    pub pos: usize,
}

impl Locus {
    pub fn new(genome: GenomeId, pos: usize) -> Self {
        Self { genome, pos }
    }
}

/// A hierarchical alignment: a tree of genomes, each linked to its parent
/// through top segments and to its children through bottom segments.
#[derive(Debug, Clone, Default)]
pub struct Alignment {
    genomes: Vec<Genome>,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a genome. The parent must already exist, and only the first
    /// genome may go without one.
    pub fn add_genome(&mut self, name: &str, parent: Option<&str>) -> Result<GenomeId, HalError> {
        if self.genome_id(name).is_some() {
            return Err(HalError::DuplicateGenome(name.to_string()));
        }
        if let (None, Some(root)) = (parent, self.root()) {
            return Err(HalError::SecondRoot {
                genome: name.to_string(),
                root: self.genomes[root].name.clone(),
            });
        }
        let parent = parent
            .map(|p| {
                self.genome_id(p)
                    .ok_or_else(|| HalError::UnknownGenome(p.to_string()))
            })
            .transpose()?;

        let id = self.genomes.len();
        let mut genome = Genome::new(id, name);
        genome.parent = parent;
        self.genomes.push(genome);
        if let Some(p) = parent {
            self.genomes[p].children.push(id);
        }
        Ok(id)
    }

    /// Append a sequence after the genome's existing ones.
    pub fn add_sequence(&mut self, genome: GenomeId, name: &str, length: usize, dna: Option<Vec<u8>>) {
        let g = &mut self.genomes[genome];
        let start = g.length();
        g.sequences.push(Sequence {
            name: name.to_string(),
            start,
            length,
            dna,
        });
    }

    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Panics on ids that did not come from this alignment.
    pub fn genome(&self, id: GenomeId) -> &Genome {
        &self.genomes[id]
    }

    pub(super) fn genome_mut(&mut self, id: GenomeId) -> &mut Genome {
        &mut self.genomes[id]
    }

    pub fn genome_id(&self, name: &str) -> Option<GenomeId> {
        self.genomes.iter().position(|g| g.name == name)
    }

    pub fn root(&self) -> Option<GenomeId> {
        self.genomes.iter().position(|g| g.parent.is_none())
    }

    /// Resolve a genome name, optional sequence and position.
    ///
    /// Without a sequence the position is in genome coordinates, otherwise
    /// it is an offset inside that sequence.
    pub fn locus(&self, genome: &str, sequence: Option<&str>, pos: usize) -> Result<Locus, HalError> {
        let id = self
            .genome_id(genome)
            .ok_or_else(|| HalError::UnknownGenome(genome.to_string()))?;
        let g = &self.genomes[id];

        let (start, length) = match sequence {
            Some(name) => {
                let seq = g.sequence(name).ok_or_else(|| HalError::UnknownSequence {
                    genome: genome.to_string(),
                    sequence: name.to_string(),
                })?;
                (seq.start, seq.length)
            }
            None => (0, g.length()),
        };
        if pos >= length {
            return Err(HalError::OutOfRange {
                genome: genome.to_string(),
                position: pos,
            });
        }

        Ok(Locus::new(id, start + pos))
    }

    /// `genome.sequence|offset`, with `:` in the sequence name replaced.
    pub fn label(&self, locus: Locus) -> Result<String, HalError> {
        let g = &self.genomes[locus.genome];
        let seq = g.sequence_at(locus.pos).ok_or_else(|| HalError::OutOfRange {
            genome: g.name.clone(),
            position: locus.pos,
        })?;
        Ok(format!("{}.{}|{}", g.name, seq.safe_name(), locus.pos - seq.start))
    }

    /// The parent-genome site aligned to `locus`, and whether the two are in
    /// opposite orientation. `None` for roots and insertions.
    pub fn map_to_parent(&self, locus: Locus) -> Option<(Locus, bool)> {
        let g = &self.genomes[locus.genome];
        let top = &g.top[g.top_at(locus.pos)?];
        let parent = &self.genomes[g.parent?];
        let bottom = &parent.bottom[top.parent_index?];

        let offset = map_offset(locus.pos - top.start, top.length, top.reversed);
        Some((Locus::new(parent.id, bottom.start + offset), top.reversed))
    }

    /// Every site of the `slot`-th child genome aligned to `locus`: the
    /// canonical copy first, then the rest of its paralogy cycle.
    pub fn child_copies(&self, locus: Locus, slot: usize) -> Result<Vec<(Locus, bool)>, HalError> {
        let g = &self.genomes[locus.genome];
        let Some(bottom) = g.bottom_at(locus.pos).map(|b| &g.bottom[b]) else {
            return Ok(Vec::new());
        };
        let (Some(&child_id), Some(&Some(canonical))) = (g.children.get(slot), bottom.children.get(slot))
        else {
            return Ok(Vec::new());
        };
        let child = &self.genomes[child_id];
        let offset = locus.pos - bottom.start;

        let mut copies = Vec::new();
        let mut current = canonical;
        loop {
            if copies.len() > child.top.len() {
                return Err(HalError::Cycle(format!(
                    "paralogy cycle of {} segment {} does not close",
                    child.name, canonical
                )));
            }
            let top = child.top.get(current).ok_or_else(|| {
                HalError::Cycle(format!("{} has no top segment {}", child.name, current))
            })?;
            let pos = top.start + map_offset(offset, top.length, top.reversed);
            copies.push((Locus::new(child_id, pos), top.reversed));

            match top.next_paralogy {
                Some(next) if next != canonical => current = next,
                _ => break,
            }
        }

        Ok(copies)
    }

    /// The genome topology as a tree labeled by genome names.
    pub fn species_tree(&self) -> Result<Tree, HalError> {
        let mut tree = Tree::new();
        for genome in &self.genomes {
            tree.add_named_node(genome.name.as_str());
        }
        for genome in &self.genomes {
            for &child in &genome.children {
                // node ids are genome ids
                tree.add_child(genome.id, child).map_err(HalError::Cycle)?;
            }
        }
        if let Some(root) = self.root() {
            tree.set_root(root);
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::hal::column::ColumnEntry;
    use crate::libs::hal::gene_tree::build_gene_tree;

    // Anc0 -> (Anc1 -> (h), g), one 4-base sequence each
    fn tiny() -> Alignment {
        let mut aln = Alignment::new();
        let anc0 = aln.add_genome("Anc0", None).unwrap();
        let anc1 = aln.add_genome("Anc1", Some("Anc0")).unwrap();
        let h = aln.add_genome("h", Some("Anc1")).unwrap();
        let g = aln.add_genome("g", Some("Anc0")).unwrap();
        for id in [anc0, anc1, h, g] {
            aln.add_sequence(id, "s:1", 4, None);
        }

        aln.genome_mut(anc0).bottom.push(BottomSegment {
            start: 0,
            length: 4,
            children: vec![Some(0), Some(0)],
        });
        aln.genome_mut(anc1).top.push(TopSegment {
            start: 0,
            length: 4,
            parent_index: Some(0),
            reversed: false,
            next_paralogy: None,
        });
        aln.genome_mut(anc1).bottom.push(BottomSegment {
            start: 0,
            length: 4,
            children: vec![Some(0)],
        });
        aln.genome_mut(h).top.push(TopSegment {
            start: 0,
            length: 4,
            parent_index: Some(0),
            reversed: false,
            next_paralogy: None,
        });
        aln.genome_mut(g).top.push(TopSegment {
            start: 0,
            length: 4,
            parent_index: Some(0),
            reversed: true,
            next_paralogy: None,
        });
        aln
    }

    #[test]
    fn test_alignment_topology() {
        let mut aln = tiny();
        assert_eq!(aln.root(), Some(0));
        assert_eq!(aln.genome(0).children, vec![1, 3]);
        assert_eq!(aln.genome_id("g"), Some(3));
        assert!(aln.add_genome("h", Some("Anc1")).is_err());

        let mut aln = tiny();
        assert_eq!(
            aln.add_genome("x", Some("nope")),
            Err(HalError::UnknownGenome("nope".to_string()))
        );

        let species = aln.species_tree().unwrap();
        assert_eq!(species.to_newick(), "((h)Anc1,g)Anc0;");

        assert_eq!(
            aln.add_genome("x", None),
            Err(HalError::SecondRoot {
                genome: "x".to_string(),
                root: "Anc0".to_string(),
            })
        );
    }

    #[test]
    fn test_alignment_locus_and_label() {
        let aln = tiny();
        let locus = aln.locus("h", Some("s:1"), 2).unwrap();
        assert_eq!(locus, Locus::new(2, 2));
        assert_eq!(aln.label(locus).unwrap(), "h.s_1|2");

        assert!(aln.locus("h", None, 4).is_err());
        assert!(aln.locus("h", Some("chrX"), 0).is_err());
        assert!(aln.locus("mouse", None, 0).is_err());
    }

    #[test]
    fn test_alignment_mapping() {
        let aln = tiny();
        assert_eq!(
            aln.map_to_parent(Locus::new(2, 1)),
            Some((Locus::new(1, 1), false))
        );
        // reversed segment
        assert_eq!(
            aln.map_to_parent(Locus::new(3, 1)),
            Some((Locus::new(0, 2), true))
        );
        assert_eq!(aln.map_to_parent(Locus::new(0, 1)), None);

        assert_eq!(
            aln.child_copies(Locus::new(0, 2), 1).unwrap(),
            vec![(Locus::new(3, 1), true)]
        );
        assert!(aln.child_copies(Locus::new(2, 0), 0).unwrap().is_empty());
    }

    fn entry(genome: GenomeId, pos: usize) -> ColumnEntry {
        ColumnEntry {
            locus: Locus::new(genome, pos),
            reversed: false,
        }
    }

    #[test]
    fn test_open_paralogy_ring() {
        let mut aln = tiny();
        // h: 0 -> 1 -> 1, never back to 0
        let h = aln.genome_mut(2);
        h.top[0].next_paralogy = Some(1);
        let mut copy = h.top[0];
        copy.next_paralogy = Some(1);
        h.top.push(copy);

        assert!(matches!(
            aln.child_copies(Locus::new(1, 1), 0),
            Err(HalError::Cycle(_))
        ));
        assert!(matches!(
            build_gene_tree(&aln, &[entry(3, 1)]),
            Err(HalError::Cycle(_))
        ));

        // a dangling link fails the same way
        aln.genome_mut(2).top[1].next_paralogy = Some(9);
        assert!(matches!(
            aln.child_copies(Locus::new(1, 1), 0),
            Err(HalError::Cycle(_))
        ));
    }

    #[test]
    fn test_site_reached_twice() {
        let mut aln = tiny();
        // two paralogs on the same bases of h
        let h = aln.genome_mut(2);
        h.top[0].next_paralogy = Some(1);
        let mut copy = h.top[0];
        copy.next_paralogy = Some(0);
        h.top.push(copy);

        assert_eq!(aln.child_copies(Locus::new(1, 1), 0).unwrap().len(), 2);
        assert_eq!(
            build_gene_tree(&aln, &[entry(3, 1)]).unwrap_err(),
            HalError::Cycle("site h.s_1|2 reached twice while descending".to_string())
        );
    }

    #[test]
    fn test_cyclic_parents() {
        let mut aln = tiny();
        // Anc0 hangs below h
        aln.genome_mut(0).parent = Some(2);
        aln.genome_mut(0).top.push(TopSegment {
            start: 0,
            length: 4,
            parent_index: Some(0),
            reversed: false,
            next_paralogy: None,
        });
        aln.genome_mut(2).bottom.push(BottomSegment {
            start: 0,
            length: 4,
            children: Vec::new(),
        });

        assert_eq!(
            build_gene_tree(&aln, &[entry(3, 1)]).unwrap_err(),
            HalError::Cycle("genome Anc0 reached twice while ascending".to_string())
        );
    }

    #[test]
    fn test_genome_segments() {
        let aln = tiny();
        let anc1 = aln.genome(1);
        assert!(anc1.has_parse_down(0));
        assert!(!anc1.has_parse_down(4));
        assert_eq!(anc1.sequence_at(3).unwrap().name, "s:1");
        assert!(anc1.sequence_at(4).is_none());
        assert_eq!(anc1.length(), 4);
    }
}
