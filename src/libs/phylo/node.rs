use std::collections::BTreeMap;

/// NodeId is an index into the Tree's node vector.
pub type NodeId = usize;

/// Branch length of an edge that no longer carries a meaningful length.
///
/// Writers skip it, so a node marked this way prints without `:length`.
pub const SENTINEL_LENGTH: f64 = f64::INFINITY;

#[derive(Debug, Clone)]
pub struct Node {
    /// Index in the arena
    pub id: NodeId,

    /// Parent node ID (None for root or detached nodes)
    pub parent: Option<NodeId>,

    /// Ordered child IDs; order only affects Newick output
    pub children: Vec<NodeId>,

    /// Label, e.g. "human.chr1|1024" or a species name
    pub name: Option<String>,

    /// Length of the edge to the parent
    pub length: Option<f64>,

    /// NHX properties ([&&NHX:D=Y]), BTreeMap keeps output deterministic
    pub properties: Option<BTreeMap<String, String>>,

    /// Soft deletion flag, see `Tree::compact()`
    pub deleted: bool,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            name: None,
            length: None,
            properties: None,
            deleted: false,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    /// The label, or "" for unlabeled nodes.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn add_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
    }

    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|props| props.get(key))
            .map(|v| v.as_str())
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// True when the length exists and is not the sentinel.
    pub fn has_length(&self) -> bool {
        self.length.is_some_and(f64::is_finite)
    }
}
