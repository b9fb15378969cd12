//! Tree traversal

use super::node::Node;

/// Pre-order traversal calling `enter` before a node's children and `exit` after them.
pub fn walk<'a>(
    node: &'a Node,
    enter: &mut impl FnMut(&'a Node),
    exit: &mut impl FnMut(&'a Node),
) {
    enter(node);
    for child in &node.children {
        walk(child, enter, exit);
    }
    exit(node);
}
