//! Rope nodes: shared leaf views and immutable internal nodes
//!
//! Nodes are reference counted and never mutated once another handle can
//! see them. The single exception is [`Node::push_char`], which goes
//! through `Arc::make_mut` so a node is only written when the caller holds
//! the last reference to it, and a leaf's backing string is only extended
//! when the leaf is the last view onto it.

use crate::config::RopeConfig;
use std::sync::Arc;

pub(crate) fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

/// A contiguous run of characters
///
/// A leaf is a `[start, end)` byte window onto a backing string that may
/// be shared with other leaves produced by splitting. Lengths are counted
/// in characters.
#[derive(Debug, Clone)]
pub(crate) struct Leaf {
    buf: Arc<String>,
    start: usize,
    end: usize,
    chars: usize,
    newlines: usize,
}

impl Leaf {
    pub(crate) fn new(text: &str) -> Self {
        Self::counted(text, text.chars().count())
    }

    fn counted(text: &str, chars: usize) -> Self {
        Self {
            buf: Arc::new(text.to_string()),
            start: 0,
            end: text.len(),
            chars,
            newlines: count_newlines(text),
        }
    }

    pub(crate) fn empty() -> Self {
        Self::counted("", 0)
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.buf[self.start..self.end]
    }

    pub(crate) fn len(&self) -> usize {
        self.chars
    }

    /// Absolute byte position in the backing string of character `index`
    fn byte_of(&self, index: usize) -> usize {
        self.as_str()
            .char_indices()
            .nth(index)
            .map_or(self.end, |(offset, _)| self.start + offset)
    }

    /// Split into two views over the same backing string
    fn split(&self, index: usize) -> (Leaf, Leaf) {
        let mid = self.byte_of(index);
        let left_newlines = count_newlines(&self.buf[self.start..mid]);

        let left = Leaf {
            buf: Arc::clone(&self.buf),
            start: self.start,
            end: mid,
            chars: index,
            newlines: left_newlines,
        };
        let right = Leaf {
            buf: Arc::clone(&self.buf),
            start: mid,
            end: self.end,
            chars: self.chars - index,
            newlines: self.newlines - left_newlines,
        };
        (left, right)
    }

    /// Append one character, returning whether the backing string was
    /// extended in place
    ///
    /// In-place requires the view to reach the end of its backing string
    /// and to be the only view onto it; otherwise the visible span is
    /// copied into fresh storage first.
    fn push(&mut self, ch: char) -> bool {
        let at_end = self.end == self.buf.len();
        let in_place = match Arc::get_mut(&mut self.buf) {
            Some(buf) if at_end => {
                buf.push(ch);
                true
            }
            _ => false,
        };

        if !in_place {
            let mut owned = String::with_capacity(self.end - self.start + ch.len_utf8());
            owned.push_str(self.as_str());
            owned.push(ch);
            self.buf = Arc::new(owned);
            self.start = 0;
        }

        self.end = self.buf.len();
        self.chars += 1;
        if ch == '\n' {
            self.newlines += 1;
        }
        in_place
    }
}

/// Concatenation of two child ropes
#[derive(Debug, Clone)]
pub(crate) struct Internal {
    pub(crate) left: Arc<Node>,
    pub(crate) right: Arc<Node>,
    len: usize,
    newlines: usize,
    depth: usize,
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Leaf(Leaf),
    Internal(Internal),
}

impl Node {
    pub(crate) fn leaf(text: &str) -> Arc<Node> {
        Arc::new(Node::Leaf(Leaf::new(text)))
    }

    pub(crate) fn empty() -> Arc<Node> {
        Arc::new(Node::Leaf(Leaf::empty()))
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.chars,
            Node::Internal(node) => node.len,
        }
    }

    pub(crate) fn newlines(&self) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.newlines,
            Node::Internal(node) => node.newlines,
        }
    }

    pub(crate) fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Internal(node) => node.depth,
        }
    }

    pub(crate) fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Internal(node) => node.left.leaf_count() + node.right.leaf_count(),
        }
    }

    /// Internal node over two children, no fusion or balance check
    fn join(left: Arc<Node>, right: Arc<Node>) -> Arc<Node> {
        Arc::new(Node::Internal(Internal {
            len: left.len() + right.len(),
            newlines: left.newlines() + right.newlines(),
            depth: 1 + left.depth().max(right.depth()),
            left,
            right,
        }))
    }

    /// Build a near-balanced tree by bisecting `text` down to leaves of at
    /// most `node_size` characters
    pub(crate) fn build(text: &str, config: &RopeConfig) -> Arc<Node> {
        Self::build_counted(text, text.chars().count(), config)
    }

    fn build_counted(text: &str, chars: usize, config: &RopeConfig) -> Arc<Node> {
        if chars <= config.node_size {
            return Arc::new(Node::Leaf(Leaf::counted(text, chars)));
        }

        let half = chars / 2;
        let mid = text
            .char_indices()
            .nth(half)
            .map_or(text.len(), |(offset, _)| offset);
        let (left, right) = text.split_at(mid);

        // Halves differ in depth by at most one, so the join is balanced
        Self::join(
            Self::build_counted(left, half, config),
            Self::build_counted(right, chars - half, config),
        )
    }

    pub(crate) fn concat(left: Arc<Node>, right: Arc<Node>, config: &RopeConfig) -> Arc<Node> {
        if left.len() == 0 {
            return right;
        }
        if right.len() == 0 {
            return left;
        }

        if left.len() + right.len() < config.fusion_threshold {
            let mut text = String::new();
            left.write_text(&mut text);
            right.write_text(&mut text);
            return Self::leaf(&text);
        }

        let node = Self::join(left, right);
        if node.depth() > config.depth_threshold && !node.is_balanced(config.balance_factor) {
            return Self::rebalance(&node, config);
        }
        node
    }

    /// Split into `[0, index)` and `[index, len)`; `index` must be in bounds
    pub(crate) fn split(
        node: &Arc<Node>,
        index: usize,
        config: &RopeConfig,
    ) -> (Arc<Node>, Arc<Node>) {
        if index == 0 {
            return (Self::empty(), Arc::clone(node));
        }
        if index >= node.len() {
            return (Arc::clone(node), Self::empty());
        }

        match &**node {
            Node::Leaf(leaf) => {
                let (left, right) = leaf.split(index);
                (Arc::new(Node::Leaf(left)), Arc::new(Node::Leaf(right)))
            }
            Node::Internal(inner) => {
                let left_len = inner.left.len();
                if index < left_len {
                    let (left, middle) = Self::split(&inner.left, index, config);
                    (left, Self::concat(middle, Arc::clone(&inner.right), config))
                } else if index == left_len {
                    (Arc::clone(&inner.left), Arc::clone(&inner.right))
                } else {
                    let (middle, right) = Self::split(&inner.right, index - left_len, config);
                    (Self::concat(Arc::clone(&inner.left), middle, config), right)
                }
            }
        }
    }

    pub(crate) fn char_at(&self, pos: usize) -> Option<char> {
        let mut node = self;
        let mut pos = pos;
        loop {
            match node {
                Node::Leaf(leaf) => return leaf.as_str().chars().nth(pos),
                Node::Internal(inner) => {
                    let left_len = inner.left.len();
                    if pos < left_len {
                        node = &*inner.left;
                    } else {
                        pos -= left_len;
                        node = &*inner.right;
                    }
                }
            }
        }
    }

    /// Depth-ratio check at this node only
    pub(crate) fn is_balanced(&self, balance_factor: usize) -> bool {
        match self {
            Node::Leaf(_) => true,
            Node::Internal(inner) => {
                let left = inner.left.depth();
                let right = inner.right.depth();
                left <= balance_factor * right && right <= balance_factor * left
            }
        }
    }

    pub(crate) fn rebalance(node: &Arc<Node>, config: &RopeConfig) -> Arc<Node> {
        let mut text = String::with_capacity(node.len());
        node.write_text(&mut text);
        let rebuilt = Self::build(&text, config);

        tracing::debug!(
            old_depth = node.depth(),
            new_depth = rebuilt.depth(),
            len = node.len(),
            "rebalanced rope"
        );
        rebuilt
    }

    pub(crate) fn write_text(&self, out: &mut String) {
        match self {
            Node::Leaf(leaf) => out.push_str(leaf.as_str()),
            Node::Internal(inner) => {
                inner.left.write_text(out);
                inner.right.write_text(out);
            }
        }
    }

    pub(crate) fn write_tree(&self, out: &mut String) {
        match self {
            Node::Leaf(leaf) => out.push_str(&format!("{:?}", leaf.as_str())),
            Node::Internal(inner) => {
                out.push('(');
                inner.left.write_tree(out);
                out.push(' ');
                inner.right.write_tree(out);
                out.push(')');
            }
        }
    }

    /// The leaf whose span ends exactly at `index`, if any
    pub(crate) fn leaf_ending_at(&self, index: usize) -> Option<&Leaf> {
        match self {
            Node::Leaf(leaf) => (leaf.chars == index).then_some(leaf),
            Node::Internal(inner) => {
                let left_len = inner.left.len();
                if index <= left_len && left_len > 0 {
                    inner.left.leaf_ending_at(index)
                } else {
                    inner.right.leaf_ending_at(index - left_len)
                }
            }
        }
    }

    /// Append `ch` to the leaf ending at `index`, copying shared nodes on
    /// the way down
    ///
    /// Callers must check [`Node::leaf_ending_at`] first. Returns whether
    /// the leaf's backing string was extended in place.
    pub(crate) fn push_char(node: &mut Arc<Node>, ch: char, index: usize) -> bool {
        match Arc::make_mut(node) {
            Node::Leaf(leaf) => leaf.push(ch),
            Node::Internal(inner) => {
                let left_len = inner.left.len();
                let in_place = if index <= left_len && left_len > 0 {
                    Self::push_char(&mut inner.left, ch, index)
                } else {
                    Self::push_char(&mut inner.right, ch, index - left_len)
                };
                inner.len += 1;
                if ch == '\n' {
                    inner.newlines += 1;
                }
                in_place
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(node: &Node) -> String {
        let mut out = String::new();
        node.write_text(&mut out);
        out
    }

    #[test]
    fn test_leaf_split_shares_storage() {
        let leaf = Leaf::new("hello\nworld");
        let (left, right) = leaf.split(6);

        assert_eq!(left.as_str(), "hello\n");
        assert_eq!(right.as_str(), "world");
        assert_eq!(left.newlines, 1);
        assert_eq!(right.newlines, 0);
        assert!(Arc::ptr_eq(&left.buf, &right.buf));
        assert!(Arc::ptr_eq(&left.buf, &leaf.buf));
    }

    #[test]
    fn test_leaf_split_multibyte() {
        let leaf = Leaf::new("añb👋c");
        let (left, right) = leaf.split(3);
        assert_eq!(left.as_str(), "añb");
        assert_eq!(right.as_str(), "👋c");
        assert_eq!(left.len(), 3);
        assert_eq!(right.len(), 2);
    }

    #[test]
    fn test_push_in_place_when_exclusive() {
        let mut leaf = Leaf::new("abc");
        assert!(leaf.push('d'));
        assert_eq!(leaf.as_str(), "abcd");
        assert_eq!(leaf.len(), 4);
    }

    #[test]
    fn test_push_copies_when_shared() {
        let leaf = Leaf::new("abcdef");
        let (mut left, right) = leaf.split(3);

        // Left does not reach the end of the backing string
        assert!(!left.push('X'));
        assert_eq!(left.as_str(), "abcX");
        assert_eq!(right.as_str(), "def");
    }

    #[test]
    fn test_push_copies_when_other_view_alive() {
        let leaf = Leaf::new("abc");
        let stale = leaf.clone();
        let mut fresh = leaf;

        assert!(!fresh.push('d'));
        assert_eq!(fresh.as_str(), "abcd");
        // The older view never sees the appended character
        assert_eq!(stale.as_str(), "abc");
    }

    #[test]
    fn test_build_depth() {
        let config = RopeConfig {
            node_size: 4,
            ..RopeConfig::default()
        };
        let node = Node::build("abcdefghijklmnop", &config);
        assert_eq!(node.len(), 16);
        assert_eq!(node.leaf_count(), 4);
        assert_eq!(node.depth(), 3);
        assert_eq!(text_of(&node), "abcdefghijklmnop");
    }

    #[test]
    fn test_concat_empty_is_identity() {
        let config = RopeConfig::default();
        let a = Node::leaf("abc");
        let joined = Node::concat(Arc::clone(&a), Node::empty(), &config);
        assert!(Arc::ptr_eq(&a, &joined));
        let joined = Node::concat(Node::empty(), Arc::clone(&a), &config);
        assert!(Arc::ptr_eq(&a, &joined));
    }

    #[test]
    fn test_concat_fuses_small() {
        let config = RopeConfig::default();
        let node = Node::concat(Node::leaf("ab"), Node::leaf("cd"), &config);
        assert!(matches!(&*node, Node::Leaf(_)));
        assert_eq!(text_of(&node), "abcd");
    }

    #[test]
    fn test_leaf_ending_at() {
        let config = RopeConfig {
            fusion_threshold: 0,
            ..RopeConfig::default()
        };
        let node = Node::concat(Node::leaf("abc"), Node::leaf("def"), &config);
        assert_eq!(node.leaf_ending_at(3).map(Leaf::as_str), Some("abc"));
        assert_eq!(node.leaf_ending_at(6).map(Leaf::as_str), Some("def"));
        assert!(node.leaf_ending_at(4).is_none());
    }
}
