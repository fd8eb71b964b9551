use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HalError {
    /// Malformed or inconsistent alignment text
    Format { line: usize, message: String },
    UnknownGenome(String),
    DuplicateGenome(String),
    /// A parentless genome declared when the alignment already has a root
    SecondRoot { genome: String, root: String },
    UnknownSequence { genome: String, sequence: String },
    /// Site outside the genome or outside any of its sequences
    OutOfRange { genome: String, position: usize },
    /// A gene tree was requested for a column without entries
    EmptyColumn,
    /// A genome or locus was reached twice while walking the topology
    Cycle(String),
    /// Bases were needed but the genome only stores lengths
    MissingDna(String),
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalError::Format { line, message } => write!(f, "Line {}: {}", line, message),
            HalError::UnknownGenome(name) => {
                write!(f, "Genome {} not found in alignment", name)
            }
            HalError::DuplicateGenome(name) => write!(f, "Genome {} declared twice", name),
            HalError::SecondRoot { genome, root } => {
                write!(f, "Genome {} has no parent but {} is already the root", genome, root)
            }
            HalError::UnknownSequence { genome, sequence } => {
                write!(f, "Sequence {} not found in genome {}", sequence, genome)
            }
            HalError::OutOfRange { genome, position } => {
                write!(f, "Position {} is out of range in genome {}", position, genome)
            }
            HalError::EmptyColumn => write!(f, "Alignment column has no entries"),
            HalError::Cycle(msg) => write!(f, "Cyclic alignment structure: {}", msg),
            HalError::MissingDna(genome) => write!(f, "Genome {} has no DNA", genome),
        }
    }
}

impl std::error::Error for HalError {}
