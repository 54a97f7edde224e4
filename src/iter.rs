use alloc::vec::Vec;

use crate::{NodeColor, NodeIndex, Redwood};

/// In-order iterator over a [`Redwood`] tree, yielding elements ascending.
pub struct RedwoodSortedIterator<'a, K: Ord> {
    pub(crate) tree: &'a Redwood<K>,
    pub(crate) curr: NodeIndex,
    pub(crate) stack: Vec<NodeIndex>,
}

impl<'a, K: Ord> Iterator for RedwoodSortedIterator<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr != Redwood::<K>::BLACK_NIL {
            self.stack.push(self.curr);
            self.curr = self.tree.get_node_by_idx(self.curr).left_child();
        }

        if let Some(node) = self.stack.pop() {
            self.curr = self.tree.get_node_by_idx(node).right_child();

            return Some(&self.tree.get_node_by_idx(node).key);
        }

        None
    }
}

/// Rendering traversal over a [`Redwood`] tree: the right subtree comes
/// first, then the node itself, then the left subtree, so printing one
/// element per line indented by `depth` draws the tree lying on its side.
pub struct RedwoodVisualIterator<'a, K: Ord> {
    pub(crate) tree: &'a Redwood<K>,
    pub(crate) curr: NodeIndex,
    pub(crate) depth: usize,
    pub(crate) stack: Vec<(NodeIndex, usize)>,
}

impl<'a, K: Ord> Iterator for RedwoodVisualIterator<'a, K> {
    type Item = (&'a K, NodeColor, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr != Redwood::<K>::BLACK_NIL {
            self.stack.push((self.curr, self.depth));
            self.curr = self.tree.get_node_by_idx(self.curr).right_child();
            self.depth += 1;
        }

        if let Some((node, depth)) = self.stack.pop() {
            let node_storage = self.tree.get_node_by_idx(node);
            self.curr = node_storage.left_child();
            self.depth = depth + 1;

            return Some((&node_storage.key, node_storage.color(), depth));
        }

        None
    }
}
