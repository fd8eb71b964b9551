//! Hierarchical genome alignments: genomes arranged on a tree, each linked
//! to its parent and children through segments.

pub mod alignment;
pub mod column;
pub mod error;
pub mod gene_tree;
pub mod reader;
pub mod region;

pub use alignment::{Alignment, Genome, GenomeId, Locus};
pub use column::{column, ColumnEntry};
pub use error::HalError;
pub use gene_tree::build_gene_tree;
pub use reader::{parse_halt, read_halt};
pub use region::{flanking_regions, Region};
