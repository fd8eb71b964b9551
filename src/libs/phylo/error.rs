use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Newick syntax error
    ParseError {
        message: String,
        /// 1-based
        line: usize,
        /// 1-based
        column: usize,
        snippet: String,
    },
    /// A label expected in a tree is not there
    MissingLabel { tree: &'static str, label: String },
    /// Operation requires every internal node to have at most two children
    NotBinary(String),
    /// Structural problem (empty tree, unlabeled node, broken links)
    LogicError(String),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::ParseError {
                message,
                line,
                column,
                snippet,
            } => {
                write!(
                    f,
                    "Parse error at line {}, column {}:\n{}\nSnippet: \"{}\"",
                    line, column, message, snippet
                )
            }
            TreeError::MissingLabel { tree, label } => {
                write!(f, "Node with name {} not found in {} tree", label, tree)
            }
            TreeError::NotBinary(msg) => write!(f, "Tree is not binary: {}", msg),
            TreeError::LogicError(msg) => write!(f, "Tree logic error: {}", msg),
        }
    }
}

impl std::error::Error for TreeError {}
