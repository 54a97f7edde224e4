extern crate alloc;

use std::cmp::Ordering;

use alloc::vec::Vec;

pub use crate::iter::{RedwoodSortedIterator, RedwoodVisualIterator};
pub use crate::map::RedwoodMap;

mod iter;
mod map;

/*
nodes live in a flat storage vector addressed by index. slot 0 is the shared
black nil leaf; every absent child or parent link points there, which lets the
fixups read a color (and a scratch parent) off a missing neighbor without
special cases. vacated cells form a linked free list threaded through their
parent field, head kept in the tree structure, so remove/insert churn reuses
slots instead of growing the vector.
*/

/// Color of a tree node. Freshly inserted nodes start red; a node only turns
/// black through a fixup or the root rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeColor {
    #[default]
    Red,
    Black,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeIndex(pub(crate) usize);

#[derive(Debug)]
pub(crate) struct RedwoodNode<K> {
    pub(crate) key: K,
    color: NodeColor,
    parent: NodeIndex,
    left: NodeIndex,
    right: NodeIndex,
}

impl<K> RedwoodNode<K> {
    fn new_isolated(key: K) -> Self {
        Self {
            key,
            color: NodeColor::default(),
            parent: NodeIndex(0),
            left: NodeIndex(0),
            right: NodeIndex(0),
        }
    }

    pub(crate) fn left_child(&self) -> NodeIndex {
        self.left
    }

    pub(crate) fn right_child(&self) -> NodeIndex {
        self.right
    }

    pub(crate) fn color(&self) -> NodeColor {
        self.color
    }
}

impl<K: Default> Default for RedwoodNode<K> {
    // only ever instantiated for slot 0, the shared nil leaf, black by
    // convention
    fn default() -> Self {
        Self {
            key: K::default(),
            color: NodeColor::Black,
            parent: NodeIndex(0),
            left: NodeIndex(0),
            right: NodeIndex(0),
        }
    }
}

/// An ordered set backed by a red-black tree over flat index-based storage.
///
/// Duplicate keys are rejected: inserting a key that is already present
/// leaves the stored element untouched and reports `false`.
#[derive(Debug)]
pub struct Redwood<K: Ord> {
    storage: Vec<RedwoodNode<K>>,
    root: NodeIndex,
    free_head: NodeIndex,
    length: usize,
}

impl<K: Ord> Redwood<K> {
    pub(crate) const BLACK_NIL: NodeIndex = NodeIndex(0);

    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn reserve(&mut self, additional: usize) {
        self.storage.reserve(additional);
    }

    /// Drops every element and resets the storage to the lone nil cell.
    pub fn clear(&mut self) {
        self.storage.truncate(1);
        self.root = Self::BLACK_NIL;
        self.free_head = Self::BLACK_NIL;
        self.length = 0;
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find_node(key) != Self::BLACK_NIL
    }

    fn find_node(&self, key: &K) -> NodeIndex {
        let mut current_node = self.root;

        while current_node != Self::BLACK_NIL {
            let curr_node_storage = &self.storage[current_node.0];

            match key.cmp(&curr_node_storage.key) {
                Ordering::Less => {
                    current_node = curr_node_storage.left;
                }
                Ordering::Equal => {
                    return current_node;
                }
                Ordering::Greater => {
                    current_node = curr_node_storage.right;
                }
            }
        }

        Self::BLACK_NIL
    }

    /// Returns the smallest element greater than or equal to `key`.
    pub fn find_lower_bound(&self, key: &K) -> Option<&K> {
        let found = self.lower_bound_node(key);

        (found != Self::BLACK_NIL).then(|| &self.storage[found.0].key)
    }

    /// Mutable variant of [`Self::find_lower_bound`]. Mutating the parts of
    /// the element that participate in its ordering breaks the tree.
    pub fn find_lower_bound_mut(&mut self, key: &K) -> Option<&mut K> {
        let found = self.lower_bound_node(key);

        (found != Self::BLACK_NIL).then(move || &mut self.storage[found.0].key)
    }

    fn lower_bound_node(&self, key: &K) -> NodeIndex {
        let mut current_node = self.root;
        let mut candidate = Self::BLACK_NIL;

        while current_node != Self::BLACK_NIL {
            let curr_node_storage = &self.storage[current_node.0];

            match key.cmp(&curr_node_storage.key) {
                Ordering::Less => {
                    candidate = current_node;
                    current_node = curr_node_storage.left;
                }
                Ordering::Equal => {
                    return current_node;
                }
                Ordering::Greater => {
                    current_node = curr_node_storage.right;
                }
            }
        }

        candidate
    }

    /// Inserts `key`, rebalancing as needed. Returns `false` if the key was
    /// already present.
    pub fn insert(&mut self, key: K) -> bool {
        let mut current_node = self.root;
        let mut parent_node = Self::BLACK_NIL;
        let mut went_left = false;

        while current_node != Self::BLACK_NIL {
            parent_node = current_node;
            let curr_node_storage = &self.storage[current_node.0];

            match key.cmp(&curr_node_storage.key) {
                Ordering::Less => {
                    current_node = curr_node_storage.left;
                    went_left = true;
                }
                Ordering::Equal => {
                    return false;
                }
                Ordering::Greater => {
                    current_node = curr_node_storage.right;
                    went_left = false;
                }
            }
        }

        let new_node_pos = self.allocate(key, parent_node);

        if parent_node == Self::BLACK_NIL {
            self.root = new_node_pos;
        } else if went_left {
            self.storage[parent_node.0].left = new_node_pos;
        } else {
            self.storage[parent_node.0].right = new_node_pos;
        }

        self.length += 1;
        self.fix_red_violation(new_node_pos);

        true
    }

    /// Removes `key` from the set. Returns `false` if it was not present;
    /// the tree is left untouched in that case.
    pub fn remove(&mut self, key: &K) -> bool {
        let target = self.find_node(key);
        if target == Self::BLACK_NIL {
            return false;
        }

        self.remove_node(target);
        self.length -= 1;

        true
    }

    /// In-order iterator over the elements, ascending.
    pub fn iter(&self) -> RedwoodSortedIterator<'_, K> {
        RedwoodSortedIterator {
            tree: self,
            curr: self.root,
            stack: Vec::new(),
        }
    }

    /// Rendering traversal: yields `(key, color, depth)` visiting the right
    /// subtree first, then the node, then the left subtree. The sequence is
    /// lazy and a fresh iterator restarts from the root.
    pub fn visual_iter(&self) -> RedwoodVisualIterator<'_, K> {
        RedwoodVisualIterator {
            tree: self,
            curr: self.root,
            depth: 0,
            stack: Vec::new(),
        }
    }

    /// Checks the red-black structural invariants: the root is black, no red
    /// node has a red child, every root-to-nil path crosses the same number
    /// of black nodes, and parent back-links agree with child links.
    ///
    /// A failure here is a bug in the fixups, never a consequence of the
    /// operation sequence. The check walks the whole tree.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        if self.root == Self::BLACK_NIL {
            return true;
        }

        if matches!(self.storage[self.root.0].color, NodeColor::Red) {
            return false;
        }

        if self.storage[self.root.0].parent != Self::BLACK_NIL {
            return false;
        }

        let expected_blacks = self.leftmost_black_count();
        self.check_subtree(self.root, expected_blacks, 0)
    }

    fn leftmost_black_count(&self) -> u32 {
        let mut blacks = 0;
        let mut current_node = self.root;

        while current_node != Self::BLACK_NIL {
            if matches!(self.storage[current_node.0].color, NodeColor::Black) {
                blacks += 1;
            }
            current_node = self.storage[current_node.0].left;
        }

        blacks
    }

    fn check_subtree(&self, idx: NodeIndex, expected_blacks: u32, blacks_above: u32) -> bool {
        if idx == Self::BLACK_NIL {
            return blacks_above == expected_blacks;
        }

        let node = &self.storage[idx.0];
        let blacks = blacks_above + u32::from(matches!(node.color, NodeColor::Black));

        if matches!(node.color, NodeColor::Red)
            && (!self.is_black(node.left) || !self.is_black(node.right))
        {
            return false;
        }

        if node.left != Self::BLACK_NIL && self.storage[node.left.0].parent != idx {
            return false;
        }
        if node.right != Self::BLACK_NIL && self.storage[node.right.0].parent != idx {
            return false;
        }

        self.check_subtree(node.left, expected_blacks, blacks)
            && self.check_subtree(node.right, expected_blacks, blacks)
    }

    pub(crate) fn get_node_by_idx(&self, idx: NodeIndex) -> &RedwoodNode<K> {
        &self.storage[idx.0]
    }

    fn allocate(&mut self, key: K, parent: NodeIndex) -> NodeIndex {
        let mut node = RedwoodNode::new_isolated(key);
        node.parent = parent;

        if self.free_head != Self::BLACK_NIL {
            let slot = self.free_head;
            self.free_head = self.storage[slot.0].parent;
            self.storage[slot.0] = node;
            return slot;
        }

        self.storage.push(node);
        NodeIndex(self.storage.len() - 1)
    }

    fn release(&mut self, slot: NodeIndex) {
        self.storage[slot.0].left = Self::BLACK_NIL;
        self.storage[slot.0].right = Self::BLACK_NIL;
        self.storage[slot.0].parent = self.free_head;
        self.free_head = slot;
    }

    fn parent_of(&self, idx: NodeIndex) -> NodeIndex {
        self.storage[idx.0].parent
    }

    fn sibling_of(&self, idx: NodeIndex) -> NodeIndex {
        let parent_idx = self.parent_of(idx);
        if parent_idx == Self::BLACK_NIL {
            return Self::BLACK_NIL;
        }

        if self.storage[parent_idx.0].left == idx {
            self.storage[parent_idx.0].right
        } else {
            self.storage[parent_idx.0].left
        }
    }

    fn grandparent_of(&self, idx: NodeIndex) -> NodeIndex {
        self.parent_of(self.parent_of(idx))
    }

    fn uncle_of(&self, idx: NodeIndex) -> NodeIndex {
        if self.grandparent_of(idx) == Self::BLACK_NIL {
            return Self::BLACK_NIL;
        }

        self.sibling_of(self.parent_of(idx))
    }

    // absent children count as black
    fn is_black(&self, idx: NodeIndex) -> bool {
        idx == Self::BLACK_NIL || matches!(self.storage[idx.0].color, NodeColor::Black)
    }

    fn subtree_max(&self, start: NodeIndex) -> NodeIndex {
        let mut current_node = start;

        while self.storage[current_node.0].right != Self::BLACK_NIL {
            current_node = self.storage[current_node.0].right;
        }

        current_node
    }

    fn fix_red_violation(&mut self, start_node_idx: NodeIndex) {
        let mut curr_node = start_node_idx;

        while matches!(
            self.storage[self.parent_of(curr_node).0].color,
            NodeColor::Red
        ) {
            let parent_idx = self.parent_of(curr_node);
            let grandparent_idx = self.grandparent_of(curr_node);

            if grandparent_idx == Self::BLACK_NIL {
                self.storage[parent_idx.0].color = NodeColor::Black;
                break;
            }

            let parent_is_right_child = self.storage[grandparent_idx.0].right == parent_idx;
            let uncle_idx = self.uncle_of(curr_node);

            if matches!(self.storage[uncle_idx.0].color, NodeColor::Red) {
                self.storage[parent_idx.0].color = NodeColor::Black;
                self.storage[uncle_idx.0].color = NodeColor::Black;
                self.storage[grandparent_idx.0].color = NodeColor::Red;

                curr_node = grandparent_idx;
                continue;
            }

            let parent = &self.storage[parent_idx.0];
            if (parent_is_right_child && parent.left == curr_node)
                || (!parent_is_right_child && parent.right == curr_node)
            {
                // inner grandchild: straighten the zig-zag first
                if parent_is_right_child {
                    self.rotate_right(parent_idx);
                } else {
                    self.rotate_left(parent_idx);
                }

                curr_node = parent_idx;
                continue;
            }

            self.storage[parent_idx.0].color = NodeColor::Black;
            self.storage[grandparent_idx.0].color = NodeColor::Red;

            if parent_is_right_child {
                self.rotate_left(grandparent_idx);
            } else {
                self.rotate_right(grandparent_idx);
            }
        }

        self.storage[self.root.0].color = NodeColor::Black;
    }

    fn remove_node(&mut self, target: NodeIndex) {
        let mut removed_color = self.storage[target.0].color;
        let replacement;

        let left = self.storage[target.0].left;
        let right = self.storage[target.0].right;

        if left == Self::BLACK_NIL {
            replacement = right;
            self.transplant(target, right);
        } else if right == Self::BLACK_NIL {
            replacement = left;
            self.transplant(target, left);
        } else {
            // two children: the in-order predecessor (rightmost node of the
            // left subtree) takes over the target's position and color
            let pred = self.subtree_max(left);
            removed_color = self.storage[pred.0].color;
            replacement = self.storage[pred.0].left;

            if self.parent_of(pred) == target {
                self.storage[replacement.0].parent = pred;
            } else {
                self.transplant(pred, replacement);
                self.storage[pred.0].left = self.storage[target.0].left;
                let pred_left = self.storage[pred.0].left;
                self.storage[pred_left.0].parent = pred;
            }

            self.transplant(target, pred);
            self.storage[pred.0].right = self.storage[target.0].right;
            let pred_right = self.storage[pred.0].right;
            self.storage[pred_right.0].parent = pred;
            self.storage[pred.0].color = self.storage[target.0].color;
        }

        if matches!(removed_color, NodeColor::Black) {
            self.fix_double_black(replacement);
        }

        self.release(target);
    }

    /// Replaces the subtree rooted at `old` with the one rooted at `new` in
    /// `old`'s parent. `new` may be the nil leaf; its scratch parent field is
    /// still updated so the deletion fixup can navigate upward from it.
    fn transplant(&mut self, old: NodeIndex, new: NodeIndex) {
        let parent_idx = self.storage[old.0].parent;

        if parent_idx == Self::BLACK_NIL {
            self.root = new;
        } else if self.storage[parent_idx.0].left == old {
            self.storage[parent_idx.0].left = new;
        } else {
            self.storage[parent_idx.0].right = new;
        }

        self.storage[new.0].parent = parent_idx;
    }

    fn fix_double_black(&mut self, start_node_idx: NodeIndex) {
        let mut curr_node = start_node_idx;

        while curr_node != self.root && self.is_black(curr_node) {
            let parent_idx = self.parent_of(curr_node);
            let curr_is_left = self.storage[parent_idx.0].left == curr_node;

            let mut sibling_idx = self.sibling_of(curr_node);

            if matches!(self.storage[sibling_idx.0].color, NodeColor::Red) {
                self.storage[sibling_idx.0].color = NodeColor::Black;
                self.storage[parent_idx.0].color = NodeColor::Red;

                if curr_is_left {
                    self.rotate_left(parent_idx);
                } else {
                    self.rotate_right(parent_idx);
                }

                sibling_idx = self.sibling_of(curr_node);
            }

            let near_idx;
            let far_idx;
            if curr_is_left {
                near_idx = self.storage[sibling_idx.0].left;
                far_idx = self.storage[sibling_idx.0].right;
            } else {
                near_idx = self.storage[sibling_idx.0].right;
                far_idx = self.storage[sibling_idx.0].left;
            }

            if self.is_black(near_idx) && self.is_black(far_idx) {
                // the deficit is absorbed here if the parent is red,
                // otherwise it moves one level up
                self.storage[sibling_idx.0].color = NodeColor::Red;
                curr_node = parent_idx;
                continue;
            }

            if self.is_black(far_idx) {
                // near child red: convert to the far-red shape
                self.storage[near_idx.0].color = NodeColor::Black;
                self.storage[sibling_idx.0].color = NodeColor::Red;

                if curr_is_left {
                    self.rotate_right(sibling_idx);
                } else {
                    self.rotate_left(sibling_idx);
                }

                sibling_idx = self.sibling_of(curr_node);
            }

            let far_idx = if curr_is_left {
                self.storage[sibling_idx.0].right
            } else {
                self.storage[sibling_idx.0].left
            };

            self.storage[sibling_idx.0].color = self.storage[parent_idx.0].color;
            self.storage[parent_idx.0].color = NodeColor::Black;
            self.storage[far_idx.0].color = NodeColor::Black;

            if curr_is_left {
                self.rotate_left(parent_idx);
            } else {
                self.rotate_right(parent_idx);
            }

            curr_node = self.root;
        }

        self.storage[curr_node.0].color = NodeColor::Black;
    }

    fn rotate_left(&mut self, center: NodeIndex) {
        let pivot_idx = self.storage[center.0].right;
        if pivot_idx == Self::BLACK_NIL {
            return;
        }

        let parent_idx = self.storage[center.0].parent;
        let inner_idx = self.storage[pivot_idx.0].left;

        self.storage[center.0].right = inner_idx;
        self.storage[inner_idx.0].parent = center;

        self.storage[pivot_idx.0].left = center;
        self.storage[center.0].parent = pivot_idx;
        self.storage[pivot_idx.0].parent = parent_idx;

        if parent_idx != Self::BLACK_NIL {
            if self.storage[parent_idx.0].right == center {
                self.storage[parent_idx.0].right = pivot_idx;
            } else {
                self.storage[parent_idx.0].left = pivot_idx;
            }
        } else {
            self.root = pivot_idx;
        }
    }

    fn rotate_right(&mut self, center: NodeIndex) {
        let pivot_idx = self.storage[center.0].left;
        if pivot_idx == Self::BLACK_NIL {
            return;
        }

        let parent_idx = self.storage[center.0].parent;
        let inner_idx = self.storage[pivot_idx.0].right;

        self.storage[center.0].left = inner_idx;
        self.storage[inner_idx.0].parent = center;

        self.storage[pivot_idx.0].right = center;
        self.storage[center.0].parent = pivot_idx;
        self.storage[pivot_idx.0].parent = parent_idx;

        if parent_idx != Self::BLACK_NIL {
            if self.storage[parent_idx.0].right == center {
                self.storage[parent_idx.0].right = pivot_idx;
            } else {
                self.storage[parent_idx.0].left = pivot_idx;
            }
        } else {
            self.root = pivot_idx;
        }
    }
}

impl<K: Default + Ord> Redwood<K> {
    pub fn new() -> Self {
        Self {
            storage: alloc::vec![RedwoodNode::default()],
            root: Self::BLACK_NIL,
            free_head: Self::BLACK_NIL,
            length: 0,
        }
    }
}

impl<K: Default + Ord> Default for Redwood<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::prelude::*;

    use crate::{NodeColor, NodeIndex, Redwood};

    fn tree_height<K: Ord>(tree: &Redwood<K>) -> usize {
        fn subtree_height<K: Ord>(tree: &Redwood<K>, idx: NodeIndex) -> usize {
            if idx == Redwood::<K>::BLACK_NIL {
                return 0;
            }

            let node = tree.get_node_by_idx(idx);
            1 + subtree_height(tree, node.left_child())
                .max(subtree_height(tree, node.right_child()))
        }

        subtree_height(tree, tree.root)
    }

    fn root_key<K: Copy + Ord>(tree: &Redwood<K>) -> K {
        tree.storage[tree.root.0].key
    }

    fn collect<K: Copy + Ord>(tree: &Redwood<K>) -> Vec<K> {
        tree.iter().copied().collect()
    }

    #[test]
    pub fn create_tree() {
        let tree = Redwood::<usize>::new();

        assert!(tree.is_empty());
        assert!(tree.is_valid());
    }

    #[test]
    pub fn empty_tree_insertion() {
        let mut tree = Redwood::<usize>::new();

        assert!(tree.insert(5));
        assert!(tree.insert(7));
        assert!(tree.insert(9));
        assert!(tree.insert(3));

        assert_eq!(tree.len(), 4);
        assert!(tree.is_valid());
    }

    #[test]
    fn duplicate_insertion_is_rejected() {
        let mut tree = Redwood::<usize>::new();

        assert!(tree.insert(5));
        assert!(!tree.insert(5));

        assert_eq!(tree.len(), 1);
        assert!(tree.is_valid());
    }

    #[test]
    fn lookups_hit_and_miss() {
        let mut tree = Redwood::<usize>::new();

        for key in [10, 20, 5, 15] {
            tree.insert(key);
        }

        assert!(tree.contains(&10));
        assert!(tree.contains(&20));
        assert!(tree.contains(&5));
        assert!(tree.contains(&15));

        assert!(!tree.contains(&25));
        assert!(!tree.contains(&0));
    }

    #[test]
    fn empty_tree_operations_are_noops() {
        let mut tree = Redwood::<usize>::new();

        assert!(!tree.contains(&1));
        assert!(!tree.remove(&1));
        assert_eq!(tree.iter().next(), None);
        assert!(tree.visual_iter().next().is_none());
        assert!(tree.is_valid());
    }

    #[test]
    fn red_red_conflict_rotates_to_new_root() {
        let mut tree = Redwood::<usize>::new();

        tree.insert(10);
        tree.insert(20);
        tree.insert(30);

        let rendered: Vec<(usize, NodeColor, usize)> = tree
            .visual_iter()
            .map(|(&key, color, depth)| (key, color, depth))
            .collect();

        assert_eq!(
            rendered,
            vec![
                (30, NodeColor::Red, 1),
                (20, NodeColor::Black, 0),
                (10, NodeColor::Red, 1),
            ]
        );
        assert!(tree.is_valid());
    }

    #[test]
    fn ascending_insertion_stays_balanced() {
        let mut tree = Redwood::<usize>::new();

        for key in 1..=7 {
            tree.insert(key);
        }

        assert!(tree.is_valid());
        assert_eq!(collect(&tree), vec![1, 2, 3, 4, 5, 6, 7]);
        // the recolor chain keeps 2 at the root and leaves the right spine
        // one level deeper, well under the 2*log2(n+1) bound
        assert_eq!(root_key(&tree), 2);
        assert_eq!(tree_height(&tree), 4);
    }

    #[test]
    fn two_children_removal_promotes_predecessor() {
        let mut tree = Redwood::<usize>::new();

        for key in [30, 20, 40, 10, 50] {
            tree.insert(key);
        }

        assert!(tree.remove(&30));

        assert!(!tree.contains(&30));
        // the rightmost key of the left subtree takes the removed node's place
        assert_eq!(root_key(&tree), 20);
        assert_eq!(collect(&tree), vec![10, 20, 40, 50]);
        assert!(tree.is_valid());
    }

    #[test]
    fn removing_missing_key_reports_not_found() {
        let mut tree = Redwood::<usize>::new();

        for key in [10, 20, 30, 40, 50] {
            tree.insert(key);
        }

        assert!(!tree.remove(&35));

        assert_eq!(tree.len(), 5);
        assert_eq!(collect(&tree), vec![10, 20, 30, 40, 50]);
        assert!(tree.is_valid());
    }

    #[test]
    fn red_leaf_removal_needs_no_fixup() {
        let mut tree = Redwood::<usize>::new();

        for key in [10, 20, 30, 40, 50] {
            tree.insert(key);
        }

        // 30 sits as a red leaf under 40 in this insertion order
        assert!(tree.remove(&30));

        assert_eq!(collect(&tree), vec![10, 20, 40, 50]);
        assert!(tree.is_valid());
    }

    #[test]
    fn black_node_with_red_child_recolors() {
        let mut tree = Redwood::<usize>::new();

        for key in [10, 20, 30, 40, 50] {
            tree.insert(key);
        }
        tree.remove(&50);

        // 40 is black with the lone red child 30
        assert!(tree.remove(&40));

        assert_eq!(collect(&tree), vec![10, 20, 30]);
        assert!(tree.is_valid());
    }

    #[test]
    fn black_leaf_removal_with_red_far_nephew() {
        let mut tree = Redwood::<usize>::new();

        for key in [10, 20, 30, 40, 50] {
            tree.insert(key);
        }

        // 10 is a black leaf; its sibling 40 is black with both children red
        assert!(tree.remove(&10));

        assert_eq!(root_key(&tree), 40);
        assert_eq!(collect(&tree), vec![20, 30, 40, 50]);
        assert!(tree.is_valid());
    }

    #[test]
    fn black_leaf_removal_with_red_near_nephew() {
        let mut tree = Redwood::<usize>::new();

        for key in [10, 20, 30, 40, 50] {
            tree.insert(key);
        }
        tree.remove(&50);

        // sibling 40 is black, near child 30 red, far child absent
        assert!(tree.remove(&10));

        assert_eq!(root_key(&tree), 30);
        assert_eq!(collect(&tree), vec![20, 30, 40]);
        assert!(tree.is_valid());
    }

    #[test]
    fn black_leaf_removal_with_red_sibling() {
        let mut tree = Redwood::<usize>::new();

        for key in [20, 30, 40, 50, 60, 70] {
            tree.insert(key);
        }

        // 20 is a black leaf whose sibling 50 is red
        assert!(tree.remove(&20));

        assert_eq!(collect(&tree), vec![30, 40, 50, 60, 70]);
        assert!(tree.is_valid());
    }

    #[test]
    fn removing_last_element_empties_the_tree() {
        let mut tree = Redwood::<usize>::new();

        tree.insert(42);
        assert!(tree.remove(&42));

        assert!(tree.is_empty());
        assert_eq!(tree.root, Redwood::<usize>::BLACK_NIL);
        assert!(tree.is_valid());
    }

    #[test]
    fn full_permutation_round_trip() {
        let mut rng = rand::thread_rng();
        let mut keys: Vec<usize> = (0..100).collect();
        keys.shuffle(&mut rng);

        let mut tree = Redwood::new();
        for &key in &keys {
            assert!(tree.insert(key));
            assert!(tree.is_valid());
        }

        keys.shuffle(&mut rng);
        for &key in &keys {
            assert!(tree.remove(&key));
            assert!(tree.is_valid());
        }

        assert!(tree.is_empty());
        assert_eq!(tree.iter().next(), None);
    }

    #[test]
    fn random_operations_mirror_std_btreeset() {
        let mut rng = rand::thread_rng();
        let mut tree = Redwood::new();
        let mut mirror = BTreeSet::new();

        for _ in 0..2000 {
            let key = rng.gen_range(0..256usize);
            if rng.gen_bool(0.5) {
                assert_eq!(tree.insert(key), mirror.insert(key));
            } else {
                assert_eq!(tree.remove(&key), mirror.remove(&key));
            }
        }

        assert!(tree.is_valid());
        assert_eq!(tree.len(), mirror.len());
        assert!(tree.iter().copied().eq(mirror.iter().copied()));
    }

    #[test]
    fn height_stays_logarithmic() {
        let mut rng = rand::thread_rng();
        let mut keys: Vec<usize> = (0..1000).collect();
        keys.shuffle(&mut rng);

        let mut tree = Redwood::new();
        for &key in &keys {
            tree.insert(key);
        }

        let bound = 2.0 * ((tree.len() + 1) as f64).log2();
        assert!((tree_height(&tree) as f64) <= bound);
    }

    #[test]
    fn iteration_is_strictly_ascending() {
        let mut rng = rand::thread_rng();
        let mut tree = Redwood::new();

        for _ in 0..500 {
            tree.insert(rng.gen_range(0..10000usize));
        }

        let elements = collect(&tree);
        assert!(elements.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn visual_traversal_is_restartable() {
        let mut tree = Redwood::<usize>::new();

        for key in [4, 2, 6, 1, 3, 5, 7] {
            tree.insert(key);
        }

        let first: Vec<usize> = tree.visual_iter().map(|(&key, _, _)| key).collect();
        let second: Vec<usize> = tree.visual_iter().map(|(&key, _, _)| key).collect();

        assert_eq!(first, second);
        assert_eq!(first, vec![7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn lower_bound_probes() {
        let mut tree = Redwood::<usize>::new();

        for key in [10, 20, 30, 40] {
            tree.insert(key);
        }

        assert_eq!(tree.find_lower_bound(&20), Some(&20));
        assert_eq!(tree.find_lower_bound(&21), Some(&30));
        assert_eq!(tree.find_lower_bound(&5), Some(&10));
        assert_eq!(tree.find_lower_bound(&41), None);
    }

    #[test]
    fn removed_cells_are_reused() {
        let mut tree = Redwood::<usize>::new();

        for key in 0..8 {
            tree.insert(key);
        }
        let cells = tree.storage.len();

        assert!(tree.remove(&3));
        assert!(tree.remove(&5));
        tree.insert(100);
        tree.insert(101);

        assert_eq!(tree.storage.len(), cells);
        assert!(tree.is_valid());
    }

    #[test]
    fn clear_resets_the_tree() {
        let mut tree = Redwood::<usize>::new();

        for key in 0..32 {
            tree.insert(key);
        }
        tree.clear();

        assert!(tree.is_empty());
        assert!(!tree.contains(&4));
        assert!(tree.insert(4));
        assert!(tree.is_valid());
    }
}
