//! Root-list tree shells and suffix-minimum maintenance.
//!
//! Each tree in a heap's root list wraps one owned node subtree and caches
//! `sufmin`: the tree with the minimum root ckey among itself and all
//! successors. Extraction always targets `first.sufmin`, so the cache turns
//! find-min into a single pointer chase.

use std::ptr::NonNull;

use crate::node::{free_node, make_node, Node};
use crate::rank::Rank;

/// A tree in the root list.
///
/// Owns its root subtree. `prev`, `next`, and `sufmin` are non-owning links
/// into the same root list; `sufmin` points at the tree itself until the
/// first suffix-minimum pass.
pub(crate) struct Tree<T, P> {
    pub(crate) root: NonNull<Node<T, P>>,
    pub(crate) prev: Option<NonNull<Tree<T, P>>>,
    pub(crate) next: Option<NonNull<Tree<T, P>>>,
    pub(crate) sufmin: NonNull<Tree<T, P>>,
    pub(crate) rank: Rank,
}

/// Allocate a rank-0 tree holding a single `(priority, item)` node.
pub(crate) fn make_tree<T, P: Ord + Clone>(priority: P, item: T) -> NonNull<Tree<T, P>> {
    let tree = Box::into_raw(Box::new(Tree {
        root: make_node(priority, item),
        prev: None,
        next: None,
        sufmin: NonNull::dangling(),
        rank: 0,
    }));
    unsafe {
        let tree = NonNull::new_unchecked(tree);
        (*tree.as_ptr()).sufmin = tree;
        tree
    }
}

/// Recompute `sufmin` for `from` and every tree before it in the root list.
///
/// Must run after any mutation that can change a root ckey at `from` or
/// alter the set of its successors; trees after `from` are untouched, so
/// their cached suffix minima remain valid and seed the backward walk.
pub(crate) unsafe fn update_suffix_min<T, P: Ord>(from: NonNull<Tree<T, P>>) {
    let mut curr = Some(from);
    while let Some(t) = curr {
        let tp = t.as_ptr();
        (*tp).sufmin = match (*tp).next {
            None => t,
            Some(next) => {
                let next_sufmin = (*next.as_ptr()).sufmin;
                let own = &(*(*tp).root.as_ptr()).ckey;
                let best = &(*(*next_sufmin.as_ptr()).root.as_ptr()).ckey;
                if own <= best {
                    t
                } else {
                    next_sufmin
                }
            }
        };
        curr = (*tp).prev;
    }
}

/// Free a tree shell and the subtree it owns.
pub(crate) unsafe fn free_tree<T, P>(tree: NonNull<Tree<T, P>>) {
    free_node((*tree.as_ptr()).root);
    drop(Box::from_raw(tree.as_ptr()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_tree_points_sufmin_at_itself() {
        let t = make_tree(9, "nine");
        unsafe {
            assert_eq!((*t.as_ptr()).sufmin, t);
            assert_eq!((*t.as_ptr()).rank, 0);
            assert_eq!((*(*t.as_ptr()).root.as_ptr()).ckey, 9);
            free_tree(t);
        }
    }

    #[test]
    fn test_update_suffix_min_walks_backwards() {
        // Hand-link three trees with root ckeys 5, 2, 7.
        let a = make_tree(5, ());
        let b = make_tree(2, ());
        let c = make_tree(7, ());
        unsafe {
            (*a.as_ptr()).next = Some(b);
            (*b.as_ptr()).prev = Some(a);
            (*b.as_ptr()).next = Some(c);
            (*c.as_ptr()).prev = Some(b);

            update_suffix_min(c);
            assert_eq!((*c.as_ptr()).sufmin, c);
            assert_eq!((*b.as_ptr()).sufmin, b);
            assert_eq!((*a.as_ptr()).sufmin, b);

            free_tree(a);
            free_tree(b);
            free_tree(c);
        }
    }
}
