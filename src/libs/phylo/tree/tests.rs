use super::*;

// ((A,B)AB,(C,D)CD)root;
fn four_leaves() -> (Tree, [NodeId; 7]) {
    let mut tree = Tree::new();
    let root = tree.add_named_node("root");
    let ab = tree.add_named_node("AB");
    let cd = tree.add_named_node("CD");
    let a = tree.add_named_node("A");
    let b = tree.add_named_node("B");
    let c = tree.add_named_node("C");
    let d = tree.add_named_node("D");

    tree.set_root(root);
    tree.add_child(root, ab).unwrap();
    tree.add_child(root, cd).unwrap();
    tree.add_child(ab, a).unwrap();
    tree.add_child(ab, b).unwrap();
    tree.add_child(cd, c).unwrap();
    tree.add_child(cd, d).unwrap();

    (tree, [root, ab, cd, a, b, c, d])
}

#[test]
fn test_tree_traversals() {
    let (tree, [root, ab, cd, a, b, c, d]) = four_leaves();

    assert_eq!(tree.preorder(&root).unwrap(), vec![root, ab, a, b, cd, c, d]);
    assert_eq!(tree.postorder(&root).unwrap(), vec![a, b, ab, c, d, cd, root]);
    assert_eq!(tree.get_leaves(), vec![a, b, c, d]);
}

#[test]
fn test_tree_add_child_rejects_second_parent() {
    let (mut tree, [_, ab, cd, a, ..]) = four_leaves();

    assert!(tree.add_child(cd, a).is_err());
    assert!(tree.add_child(ab, ab).is_err());
    assert_eq!(tree.children(ab).len(), 2);
}

#[test]
fn test_tree_remove_and_compact() {
    let (mut tree, [root, ab, cd, a, b, ..]) = four_leaves();

    // orphan A and B
    tree.remove_node(ab, false);
    assert!(tree.get_node(ab).is_none());
    assert_eq!(tree.get_node(a).unwrap().parent, None);
    assert_eq!(tree.children(root), &[cd]);
    assert_eq!(tree.len(), 6);

    tree.remove_node(a, true);
    tree.remove_node(b, true);
    tree.compact();

    assert_eq!(tree.len(), 4);
    assert_eq!(tree.to_newick(), "((C,D)CD)root;");
}

#[test]
fn test_tree_detach_subtree() {
    let (mut tree, [_, _, cd, ..]) = four_leaves();

    let detached = tree.detach_subtree(cd).unwrap();
    assert_eq!(detached.to_newick(), "(C,D)CD;");
    assert_eq!(tree.to_newick(), "((A,B)AB)root;");
    assert_eq!(tree.len(), 4);
}

#[test]
fn test_tree_paths_and_ancestors() {
    let (tree, [root, ab, _, a, b, c, _]) = four_leaves();

    assert_eq!(tree.get_path_from_root(&a).unwrap(), vec![root, ab, a]);
    assert_eq!(tree.get_common_ancestor(&a, &b).unwrap(), ab);
    assert_eq!(tree.get_common_ancestor(&a, &c).unwrap(), root);
    assert_eq!(tree.get_common_ancestor(&ab, &a).unwrap(), ab);
    assert_eq!(query::get_common_ancestor_of(&tree, &[a, b, c]).unwrap(), root);
    assert_eq!(tree.get_depth(&root).unwrap(), 0);
    assert_eq!(tree.get_depth(&c).unwrap(), 2);
}

#[test]
fn test_tree_set_children() {
    let (mut tree, [root, ab, cd, a, b, ..]) = four_leaves();

    // splice A and B directly under root, in place of AB
    tree.remove_node(ab, false);
    ops::set_children(&mut tree, root, vec![a, b, cd]).unwrap();

    assert_eq!(tree.get_node(a).unwrap().parent, Some(root));
    assert_eq!(tree.to_newick(), "(A,B,(C,D)CD)root;");
}

#[test]
fn test_tree_collapse_node_sums_lengths() {
    let mut tree = Tree::from_newick("((A:1,B:2)AB:3,C:4)root;").unwrap();
    let ab = tree.get_node_by_name("AB").unwrap();

    tree.collapse_node(ab).unwrap();
    assert_eq!(tree.to_newick(), "(A:4,B:5,C:4)root;");

    let root = tree.get_root().unwrap();
    assert!(tree.collapse_node(root).is_err());
}

#[test]
fn test_tree_insert_parent_and_reroot() {
    let mut tree = Tree::from_newick("((A:1,B:2)AB:4,C:6)root;").unwrap();
    let c = tree.get_node_by_name("C").unwrap();

    let mid = tree.insert_parent(c).unwrap();
    assert_eq!(tree.get_node(mid).unwrap().length, Some(3.0));

    tree.reroot_at(mid).unwrap();
    assert_eq!(tree.get_root(), Some(mid));
    assert_eq!(tree.to_newick(), "(C:3,((A:1,B:2)AB:4)root:3);");
}

#[test]
fn test_is_binary() {
    assert!(Tree::from_newick("((A,B),C);").unwrap().is_binary());
    assert!(!Tree::from_newick("(A,B,C);").unwrap().is_binary());
    assert!(!Tree::from_newick("((A),B);").unwrap().is_binary());
}
