use super::Tree;
use crate::libs::phylo::node::NodeId;
use std::io::Read;

/// Read every Newick tree in a file ("stdin" for standard input).
pub fn from_file(infile: &str) -> anyhow::Result<Vec<Tree>> {
    let mut reader = intspan::reader(infile);
    let mut newick = String::new();
    reader
        .read_to_string(&mut newick)
        .map_err(|e| anyhow::anyhow!("Read error: {}", e))?;
    Ok(Tree::from_newick_multi(newick.as_str())?)
}

/// Read exactly one tree, either from a file or from a literal Newick string.
///
/// Arguments that start with `(` or end with `;` are treated as literals,
/// matching how species trees are usually passed on the command line.
pub fn from_arg(arg: &str) -> anyhow::Result<Tree> {
    let trimmed = arg.trim();
    let mut trees = if trimmed.starts_with('(') || trimmed.ends_with(';') {
        Tree::from_newick_multi(trimmed)?
    } else {
        from_file(arg)?
    };
    if trees.len() != 1 {
        anyhow::bail!("Expected one tree in {}, found {}", arg, trees.len());
    }
    Ok(trees.remove(0))
}

pub fn to_newick(tree: &Tree) -> String {
    match tree.get_root() {
        Some(root) => format!("{};", to_newick_recursive(tree, root)),
        None => ";".to_string(),
    }
}

fn to_newick_recursive(tree: &Tree, node_id: NodeId) -> String {
    let node = match tree.get_node(node_id) {
        Some(n) => n,
        None => return String::new(),
    };

    // Label + Length + Comment
    let mut node_info = String::new();
    if let Some(name) = &node.name {
        node_info.push_str(&quote_label(name));
    }
    if let Some(len) = node.length.filter(|l| l.is_finite()) {
        node_info.push_str(&format!(":{}", len));
    }
    if let Some(props) = node.properties.as_ref().filter(|p| !p.is_empty()) {
        node_info.push_str("[&&NHX");
        for (k, v) in props {
            if v.is_empty() {
                node_info.push_str(&format!(":{}", k));
            } else {
                node_info.push_str(&format!(":{}={}", k, v));
            }
        }
        node_info.push(']');
    }

    if node.children.is_empty() {
        return node_info;
    }

    let children_strs: Vec<String> = node
        .children
        .iter()
        .map(|&child| to_newick_recursive(tree, child))
        .collect();
    format!("({}){}", children_strs.join(","), node_info)
}

fn quote_label(label: &str) -> String {
    let needs_quote = label.chars().any(|c| "(),:;[] \t\n".contains(c));
    if needs_quote {
        format!("'{}'", label)
    } else {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::phylo::node::SENTINEL_LENGTH;

    #[test]
    fn test_to_newick() {
        let mut tree = Tree::new();
        let n0 = tree.add_named_node("Root");
        let n1 = tree.add_named_node("A");
        let n2 = tree.add_named_node("B");

        tree.set_root(n0);
        tree.add_child(n0, n1).unwrap();
        tree.add_child(n0, n2).unwrap();
        tree.get_node_mut(n1).unwrap().length = Some(0.1);
        tree.get_node_mut(n2).unwrap().length = Some(0.2);

        assert_eq!(to_newick(&tree), "(A:0.1,B:0.2)Root;");
    }

    #[test]
    fn test_to_newick_skips_sentinel_length() {
        let mut tree = Tree::new();
        let n0 = tree.add_named_node("anc");
        let n1 = tree.add_named_node("human.chr1|3");
        tree.set_root(n0);
        tree.add_child(n0, n1).unwrap();
        tree.get_node_mut(n0).unwrap().length = Some(SENTINEL_LENGTH);
        tree.get_node_mut(n1).unwrap().length = Some(SENTINEL_LENGTH);

        assert_eq!(to_newick(&tree), "(human.chr1|3)anc;");
    }

    #[test]
    fn test_to_newick_special_chars() {
        let mut tree = Tree::new();
        let n0 = tree.add_named_node("Homo sapiens");
        tree.set_root(n0);
        assert_eq!(to_newick(&tree), "'Homo sapiens';");

        tree.get_node_mut(n0).unwrap().set_name("chr1:100");
        assert_eq!(to_newick(&tree), "'chr1:100';");
    }

    #[test]
    fn test_to_newick_properties() {
        let mut tree = Tree::new();
        let n0 = tree.add_named_node("A");
        tree.set_root(n0);
        tree.get_node_mut(n0).unwrap().add_property("D", "Y");

        assert_eq!(to_newick(&tree), "A[&&NHX:D=Y];");
    }

    #[test]
    fn test_from_arg_literal() {
        let tree = from_arg("(A,(B,C)BC)root;").unwrap();
        assert_eq!(tree.len(), 5);
        assert!(from_arg("(A,B);(C,D);").is_err());
    }
}
