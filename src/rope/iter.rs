use super::node::Node;

/// Iterator over a rope's leaf text, left to right
///
/// Empty leaves are skipped.
pub struct Chunks<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Chunks<'a> {
    pub(crate) fn new(root: &'a Node) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf(leaf) => {
                    let text = leaf.as_str();
                    if !text.is_empty() {
                        return Some(text);
                    }
                }
                Node::Internal(inner) => {
                    self.stack.push(&*inner.right);
                    self.stack.push(&*inner.left);
                }
            }
        }
        None
    }
}
