//! Tree nodes and the sift/combine primitives.
//!
//! A node owns a doubly-linked list of item cells, all of which travel under
//! the node's single working key (`ckey`). The ckey is an upper bound on
//! every original key in the list and only ever increases over the node's
//! lifetime; an item whose original key is below the ckey it travels under
//! is *corrupted*.
//!
//! Nodes are allocated with `Box::into_raw` and linked with `NonNull`
//! pointers. Nothing here implements `Drop`: ownership lives with the
//! enclosing [`SoftHeap`](crate::SoftHeap), which tears the forest down
//! through [`free_node`].

use std::mem;
use std::ptr::NonNull;

use crate::rank::{checked_increment, Rank};

/// One item cell: the original key it was inserted with, the payload, and
/// its links in the owning node's list.
pub(crate) struct Cell<T, P> {
    pub(crate) key: P,
    pub(crate) item: T,
    pub(crate) prev: Option<NonNull<Cell<T, P>>>,
    pub(crate) next: Option<NonNull<Cell<T, P>>>,
}

/// Internal node structure for the soft heap
///
/// Each node maintains:
/// - `ckey`: the working key shared by every item in the node's list
/// - `rank`: 0 for singletons, child rank + 1 for combined nodes
/// - `size`: target list population for this rank (see [`crate::rank`])
/// - `nelems`: current list population
/// - `first`, `last`: the owned item list
/// - `left`, `right`: owned children, absent once drained and destroyed
pub(crate) struct Node<T, P> {
    pub(crate) ckey: P,
    pub(crate) rank: Rank,
    pub(crate) size: usize,
    pub(crate) nelems: usize,
    pub(crate) first: Option<NonNull<Cell<T, P>>>,
    pub(crate) last: Option<NonNull<Cell<T, P>>>,
    pub(crate) left: Option<NonNull<Node<T, P>>>,
    pub(crate) right: Option<NonNull<Node<T, P>>>,
}

#[inline]
pub(crate) unsafe fn is_leaf<T, P>(x: *const Node<T, P>) -> bool {
    (*x).left.is_none() && (*x).right.is_none()
}

/// Allocate a rank-0 node holding a single `(priority, item)` cell.
///
/// The cell keeps its own copy of the key so corruption stays observable
/// after the node's ckey has moved on.
pub(crate) fn make_node<T, P: Ord + Clone>(priority: P, item: T) -> NonNull<Node<T, P>> {
    let cell = Box::into_raw(Box::new(Cell {
        key: priority.clone(),
        item,
        prev: None,
        next: None,
    }));
    let cell = unsafe { NonNull::new_unchecked(cell) };

    let node = Box::into_raw(Box::new(Node {
        ckey: priority,
        rank: 0,
        size: 1,
        nelems: 1,
        first: Some(cell),
        last: Some(cell),
        left: None,
        right: None,
    }));
    unsafe { NonNull::new_unchecked(node) }
}

/// Transfer `src`'s entire item list to the tail of `dst`'s list.
///
/// `src` must have a non-empty list; it is left empty (but alive).
pub(crate) unsafe fn move_list<T, P>(src: *mut Node<T, P>, dst: *mut Node<T, P>) {
    debug_assert!((*src).first.is_some());

    let src_first = (*src).first;
    match (*dst).last {
        Some(last) => (*last.as_ptr()).next = src_first,
        None => (*dst).first = src_first,
    }
    if let Some(first) = src_first {
        (*first.as_ptr()).prev = (*dst).last;
    }
    (*dst).last = (*src).last;

    (*dst).nelems += (*src).nelems;
    (*src).nelems = 0;
    (*src).first = None;
    (*src).last = None;
}

/// Remove and return the head cell of `x`'s list.
///
/// `x` must have a non-empty list. The caller reads `x`'s ckey separately if
/// it needs the working key the item was traveling under.
pub(crate) unsafe fn extract_first<T, P>(x: *mut Node<T, P>) -> (P, T) {
    debug_assert!((*x).first.is_some());

    let head = (*x).first.unwrap();
    let cell = Box::from_raw(head.as_ptr());

    (*x).first = cell.next;
    match (*x).first {
        Some(first) => (*first.as_ptr()).prev = None,
        None => (*x).last = None,
    }
    (*x).nelems -= 1;

    (cell.key, cell.item)
}

/// Refill a size-deficient node by pulling item lists up from the
/// smaller-ckey child, repeatedly, until the node meets its target size or
/// runs out of children.
///
/// A child drained to an empty leaf cannot be refilled and is destroyed;
/// a drained non-leaf child is sifted in turn. Each pull raises `x`'s ckey
/// to the child's, which is where corruption enters: items already in `x`'s
/// list now travel under the larger key.
pub(crate) unsafe fn sift<T, P: Ord + Clone>(x: NonNull<Node<T, P>>) {
    let xp = x.as_ptr();

    while (*xp).nelems < (*xp).size && !is_leaf(xp) {
        // Make `left` the child with the smaller ckey.
        let swap = match ((*xp).left, (*xp).right) {
            (None, _) => true,
            (Some(l), Some(r)) => (*l.as_ptr()).ckey > (*r.as_ptr()).ckey,
            (Some(_), None) => false,
        };
        if swap {
            mem::swap(&mut (*xp).left, &mut (*xp).right);
        }

        let left = (*xp).left.unwrap();
        move_list(left.as_ptr(), xp);
        (*xp).ckey = (*left.as_ptr()).ckey.clone();

        if is_leaf(left.as_ptr()) {
            // A drained leaf cannot be replenished.
            drop(Box::from_raw(left.as_ptr()));
            (*xp).left = None;
        } else {
            sift(left);
        }
    }
}

/// Merge two equal-rank nodes into a new node of rank one higher, then sift
/// to populate its list.
///
/// `r` is the error rank: the new node's target size stays 1 up to rank `r`
/// and follows the 3/2 growth recurrence beyond it.
pub(crate) unsafe fn combine<T, P: Ord + Clone>(
    x: NonNull<Node<T, P>>,
    y: NonNull<Node<T, P>>,
    r: u32,
) -> NonNull<Node<T, P>> {
    debug_assert_eq!((*x.as_ptr()).rank, (*y.as_ptr()).rank);

    let rank = checked_increment((*x.as_ptr()).rank);
    let size = if u32::from(rank) <= r {
        1
    } else {
        (3 * (*x.as_ptr()).size + 1) / 2
    };

    let z = Box::into_raw(Box::new(Node {
        // Placeholder; the sift below overwrites it on its first pull.
        ckey: (*x.as_ptr()).ckey.clone(),
        rank,
        size,
        nelems: 0,
        first: None,
        last: None,
        left: Some(x),
        right: Some(y),
    }));
    let z = NonNull::new_unchecked(z);
    sift(z);
    z
}

/// Free a node's item list.
pub(crate) unsafe fn free_cells<T, P>(x: *mut Node<T, P>) {
    let mut cell = (*x).first;
    while let Some(c) = cell {
        cell = (*c.as_ptr()).next;
        drop(Box::from_raw(c.as_ptr()));
    }
    (*x).first = None;
    (*x).last = None;
    (*x).nelems = 0;
}

/// Free a whole subtree: item lists, children, then the node itself.
pub(crate) unsafe fn free_node<T, P>(x: NonNull<Node<T, P>>) {
    let xp = x.as_ptr();
    free_cells(xp);
    if let Some(left) = (*xp).left {
        free_node(left);
    }
    if let Some(right) = (*xp).right {
        free_node(right);
    }
    drop(Box::from_raw(xp));
}
