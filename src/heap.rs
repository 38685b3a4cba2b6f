//! Soft heap implementation
//!
//! A soft heap is an approximate min-priority queue with:
//! - O(log(1/ε)) amortized insert and meld
//! - O(log(1/ε)) amortized extract-min
//! - at most ⌊εn⌋ corrupted elements after n inserts
//!
//! The structure is a forest of heap-ordered binary trees linked into a
//! root list of strictly increasing rank, following Kaplan and Zwick's
//! binary-tree reformulation of Chazelle's soft heap.
//!
//! # Algorithm Overview
//!
//! Every node carries one working key (*ckey*) for its whole item list.
//! Deliberately letting items travel under a ckey larger than their own key
//! ("corruption") is what buys the constant amortized bounds: lists of
//! corrupted items move between nodes wholesale instead of one comparison
//! at a time. The error parameter ε caps how much of this blurring may
//! happen, via the error rank `r = max(5, ⌈log₂(1/ε)⌉ + 5)`: nodes of rank
//! at most `r` keep singleton lists and stay exact, higher nodes grow their
//! target size geometrically.
//!
//! The key operations are:
//!
//! - **Push**: meld with a singleton tree — splice a rank-0 tree into the
//!   root list, then resolve equal-rank collisions like binary addition
//!   with carries.
//! - **Meld**: splice the lower-rank heap's trees into the higher-rank
//!   heap's root list (keeping rank order), then combine equal-rank trees
//!   until every rank is unique again.
//! - **Extract-min**: pop one item from the root of `first.sufmin`, the
//!   tree with the globally minimum root ckey; sift the root back up to
//!   strength if the extraction left it deficient, or drop the tree when
//!   the root is a drained leaf.
//!
//! # Key Invariants
//!
//! 1. **Heap order on ckeys**: `ckey(parent) ≤ ckey(child)` everywhere
//! 2. **ckey dominance**: a node's ckey ≥ every original key in its list
//! 3. **Rank monotonicity**: root-list ranks are strictly increasing
//! 4. **Suffix minima**: each tree caches the minimum-root-ckey tree among
//!    itself and its successors, so find-min is one pointer chase
//! 5. **Corruption bound**: at most ⌊εn⌋ items travel above their own key

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use crate::error::SoftHeapError;
use crate::node::{combine, extract_first, is_leaf, sift, Cell, Node};
use crate::rank::{error_rank, size_for_rank, Rank};
use crate::tree::{free_tree, make_tree, update_suffix_min, Tree};

/// An approximate min-priority queue storing `(priority, item)` pairs.
///
/// Parameterized by an error rate ε ∈ (0, 1): in any sequence of operations
/// containing `n` pushes, at most ⌊εn⌋ items in the heap are *corrupted* —
/// traveling under a working key larger than the priority they were pushed
/// with. Pop order is nondecreasing in working keys, not necessarily in
/// original priorities.
///
/// Melding consumes the other heap; there is no decrease-key and no
/// delete-by-handle. All operations are single-threaded and synchronous.
///
/// # Example
///
/// ```rust
/// use soft_heap::SoftHeap;
///
/// let mut heap = SoftHeap::new(0.1).unwrap();
/// heap.push(5, "five");
/// heap.push(3, "three");
/// heap.push(7, "seven");
/// // Few enough elements that no corruption is possible yet.
/// assert_eq!(heap.pop(), Some((3, "three")));
/// assert_eq!(heap.pop(), Some((5, "five")));
/// assert_eq!(heap.pop(), Some((7, "seven")));
/// assert_eq!(heap.pop(), None);
/// ```
pub struct SoftHeap<T, P: Ord + Clone> {
    /// Head of the root list, ordered by strictly increasing rank.
    first: Option<NonNull<Tree<T, P>>>,
    /// Rank of the last tree in the root list; `None` while empty.
    rank: Option<Rank>,
    /// Number of items currently stored.
    len: usize,
    /// The error parameter, fixed for the heap's lifetime.
    epsilon: f64,
    /// Error rank derived from ε; ranks at most `r` stay uncorrupted.
    r: u32,
    _phantom: PhantomData<(P, T)>,
}

impl<T, P: Ord + Clone> SoftHeap<T, P> {
    /// Creates a new empty soft heap with error parameter `epsilon`.
    ///
    /// # Errors
    /// Returns [`SoftHeapError::EpsilonOutOfRange`] unless `0 < ε < 1`.
    pub fn new(epsilon: f64) -> Result<Self, SoftHeapError> {
        if !(epsilon > 0.0 && epsilon < 1.0) {
            return Err(SoftHeapError::EpsilonOutOfRange(epsilon));
        }
        Ok(SoftHeap {
            first: None,
            rank: None,
            len: 0,
            epsilon,
            r: error_rank(epsilon),
            _phantom: PhantomData,
        })
    }

    /// Creates a soft heap containing a single `(priority, item)` pair.
    ///
    /// # Errors
    /// Returns [`SoftHeapError::EpsilonOutOfRange`] unless `0 < ε < 1`.
    pub fn singleton(epsilon: f64, priority: P, item: T) -> Result<Self, SoftHeapError> {
        let mut heap = Self::new(epsilon)?;
        heap.push(priority, item);
        Ok(heap)
    }

    /// Returns true if the heap contains no items.
    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// Returns the number of items in the heap.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the error parameter the heap was created with.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Inserts an item with the given priority.
    ///
    /// Semantically a meld with a singleton heap: the new rank-0 tree is
    /// spliced in at the head of the root list and carries are propagated.
    ///
    /// # Time Complexity
    /// O(log(1/ε)) amortized.
    pub fn push(&mut self, priority: P, item: T) {
        let tree = make_tree(priority, item);
        match self.first {
            None => {
                self.first = Some(tree);
                self.rank = Some(0);
            }
            Some(_) => unsafe {
                self.merge_into(tree);
                self.repeated_combine(0);
            },
        }
        self.len += 1;
    }

    /// Melds `other` into this heap, consuming it.
    ///
    /// # Errors
    /// If the two ε parameters disagree by more than a relative tolerance
    /// of 10⁻³, returns [`SoftHeapError::EpsilonMismatch`] along with
    /// `other`, both heaps untouched.
    ///
    /// # Time Complexity
    /// O(log(1/ε)) amortized.
    ///
    /// # Example
    ///
    /// ```rust
    /// use soft_heap::SoftHeap;
    ///
    /// let mut p = SoftHeap::new(0.1).unwrap();
    /// p.push(4, "four");
    /// let mut q = SoftHeap::new(0.1).unwrap();
    /// q.push(1, "one");
    ///
    /// p.meld(q).unwrap();
    /// assert_eq!(p.len(), 2);
    /// assert_eq!(p.pop(), Some((1, "one")));
    /// ```
    pub fn meld(&mut self, mut other: Self) -> Result<(), (Self, SoftHeapError)> {
        let tolerance = 1e-3 * self.epsilon.max(other.epsilon);
        if (self.epsilon - other.epsilon).abs() > tolerance {
            let error = SoftHeapError::EpsilonMismatch {
                left: self.epsilon,
                right: other.epsilon,
            };
            return Err((other, error));
        }

        if other.first.is_none() {
            return Ok(());
        }
        if self.first.is_none() {
            self.first = other.first.take();
            self.rank = other.rank;
            self.len = other.len;
            other.len = 0;
            return Ok(());
        }

        // Meld the lower-rank forest into the higher-rank one.
        if self.rank < other.rank {
            mem::swap(self, &mut other);
        }
        let src = other.first.take().unwrap();
        let smaller_rank = other.rank.unwrap();
        let moved = other.len;
        other.len = 0;

        unsafe {
            self.merge_into(src);
            self.repeated_combine(smaller_rank);
        }
        self.len += moved;
        Ok(())
    }

    /// Returns the `(priority, item)` pair that [`pop`](Self::pop) would
    /// remove, without removing it.
    ///
    /// The pair exposed is the head of the minimum-ckey root's item list;
    /// its priority is the *original* key, which may lie below the working
    /// key it travels under.
    pub fn peek(&self) -> Option<(&P, &T)> {
        let first = self.first?;
        unsafe {
            let tree = (*first.as_ptr()).sufmin;
            let root = (*tree.as_ptr()).root;
            let head = (*root.as_ptr()).first.unwrap();
            let cell = &*head.as_ptr();
            Some((&cell.key, &cell.item))
        }
    }

    /// Removes and returns the item of minimum working key, as
    /// `(priority, item)` with the item's original priority.
    ///
    /// Returns `None` if the heap is empty. The removed item has the
    /// minimum *ckey* in the heap; its original priority is at most that
    /// ckey but not necessarily the global minimum.
    ///
    /// # Time Complexity
    /// O(log(1/ε)) amortized.
    pub fn pop(&mut self) -> Option<(P, T)> {
        self.pop_with_ckey().map(|(priority, item, _)| (priority, item))
    }

    /// Removes the item of minimum working key, additionally reporting the
    /// ckey it was traveling under.
    ///
    /// Returns `(priority, item, ckey)`; `ckey ≥ priority` always, with
    /// equality exactly when the item was uncorrupted. Across consecutive
    /// calls the reported ckeys are nondecreasing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use soft_heap::SoftHeap;
    ///
    /// let mut heap = SoftHeap::new(0.2).unwrap();
    /// heap.push(8, ());
    /// heap.push(2, ());
    /// let (priority, _, ckey) = heap.pop_with_ckey().unwrap();
    /// assert_eq!(priority, 2);
    /// assert!(ckey >= priority);
    /// ```
    pub fn pop_with_ckey(&mut self) -> Option<(P, T, P)> {
        let first = self.first?;
        unsafe {
            let tree = (*first.as_ptr()).sufmin;
            let tp = tree.as_ptr();
            let root = (*tp).root;
            let xp = root.as_ptr();

            let (priority, item) = extract_first(xp);
            let ckey = (*xp).ckey.clone();

            if (*xp).nelems <= (*xp).size / 2 {
                if !is_leaf(xp) {
                    sift(root);
                    update_suffix_min(tree);
                } else if (*xp).nelems == 0 {
                    // A drained leaf root ends its tree.
                    drop(Box::from_raw(xp));
                    self.remove_tree(tree);
                    if (*tp).next.is_none() {
                        self.rank = (*tp).prev.map(|prev| (*prev.as_ptr()).rank);
                    }
                    if let Some(prev) = (*tp).prev {
                        update_suffix_min(prev);
                    }
                    drop(Box::from_raw(tp));
                }
            }
            self.len -= 1;
            Some((priority, item, ckey))
        }
    }

    /// Splice `inserted` into the root list immediately before `successor`.
    unsafe fn insert_tree(
        &mut self,
        inserted: NonNull<Tree<T, P>>,
        successor: NonNull<Tree<T, P>>,
    ) {
        let ins = inserted.as_ptr();
        let succ = successor.as_ptr();
        (*ins).next = Some(successor);
        match (*succ).prev {
            None => self.first = Some(inserted),
            Some(prev) => (*prev.as_ptr()).next = Some(inserted),
        }
        (*ins).prev = (*succ).prev;
        (*succ).prev = Some(inserted);
    }

    /// Unlink `removed` from the root list. The removed tree keeps its own
    /// links; extraction still reads them afterwards.
    unsafe fn remove_tree(&mut self, removed: NonNull<Tree<T, P>>) {
        let rem = removed.as_ptr();
        match (*rem).prev {
            None => self.first = (*rem).next,
            Some(prev) => (*prev.as_ptr()).next = (*rem).next,
        }
        if let Some(next) = (*rem).next {
            (*next.as_ptr()).prev = (*rem).prev;
        }
    }

    /// Splice a rank-sorted chain of source trees into this heap's root
    /// list, preserving rank order. Requires `self.rank` to be at least the
    /// highest source rank, so the destination cursor never runs off the
    /// end.
    unsafe fn merge_into(&mut self, src_first: NonNull<Tree<T, P>>) {
        let mut curr_src = Some(src_first);
        let mut curr_dst = self.first.unwrap();
        while let Some(src) = curr_src {
            while (*curr_dst.as_ptr()).rank < (*src.as_ptr()).rank {
                curr_dst = (*curr_dst.as_ptr()).next.unwrap();
            }
            let next_src = (*src.as_ptr()).next;
            self.insert_tree(src, curr_dst);
            curr_src = next_src;
        }
    }

    /// Resolve equal-rank collisions left by [`merge_into`], like carry
    /// propagation in binary addition, then refresh the suffix minima of
    /// every affected tree.
    ///
    /// `smaller_rank` is the melded-in heap's rank: once the cursor passes
    /// it on a unique rank, no further collisions are possible.
    unsafe fn repeated_combine(&mut self, smaller_rank: Rank) {
        let mut curr = self.first.unwrap();
        while let Some(next) = (*curr.as_ptr()).next {
            let cp = curr.as_ptr();
            let np = next.as_ptr();
            let two = (*cp).rank == (*np).rank;
            let three =
                two && matches!((*np).next, Some(nn) if (*nn.as_ptr()).rank == (*cp).rank);

            if !two {
                if (*cp).rank > smaller_rank {
                    break;
                }
                curr = next;
            } else if !three {
                // Two trees of this rank become a carry. The cursor stays
                // put: the carry may collide with its new successor.
                (*cp).root = combine((*cp).root, (*np).root, self.r);
                (*cp).rank = (*(*cp).root.as_ptr()).rank;
                self.remove_tree(next);
                drop(Box::from_raw(np));
            } else {
                // Three trees of this rank: combining the first two would
                // put a carry in front of an equal-rank tree. Step over the
                // first so the second and third pair up instead.
                curr = next;
            }
        }
        if Some((*curr.as_ptr()).rank) > self.rank {
            self.rank = Some((*curr.as_ptr()).rank);
        }
        update_suffix_min(curr);
    }

    /// Structural self-check: walks the entire forest and verifies every
    /// invariant the heap relies on. Intended for tests and debugging;
    /// runs in time linear in the heap size.
    ///
    /// Checks, per tree: rank agreement between shell and root, strictly
    /// increasing ranks along the root list, doubly-linked-list
    /// consistency, and suffix-minimum correctness. Per node: ckey heap
    /// order, ckey dominance over every stored key, the rank-indexed size
    /// table, child rank = parent rank − 1, and population bounds. Finally,
    /// the cell count must match `len()`.
    pub fn verify_internal_structure(&self) -> bool {
        unsafe {
            if self.first.is_none() {
                return self.rank.is_none() && self.len == 0;
            }

            let mut total = 0usize;
            let mut prev: Option<NonNull<Tree<T, P>>> = None;
            let mut last_rank = None;
            let mut curr = self.first;
            while let Some(tree) = curr {
                let tp = tree.as_ptr();
                if (*tp).prev != prev {
                    return false;
                }
                if (*tp).rank != (*(*tp).root.as_ptr()).rank {
                    return false;
                }
                if let Some(p) = prev {
                    if (*p.as_ptr()).rank >= (*tp).rank {
                        return false;
                    }
                }

                // Recompute the suffix minimum and compare ckeys (ties may
                // legitimately cache either tree).
                let mut best = tree;
                let mut scan = (*tp).next;
                while let Some(s) = scan {
                    if (*(*s.as_ptr()).root.as_ptr()).ckey < (*(*best.as_ptr()).root.as_ptr()).ckey
                    {
                        best = s;
                    }
                    scan = (*s.as_ptr()).next;
                }
                let cached = (*tp).sufmin;
                if (*(*cached.as_ptr()).root.as_ptr()).ckey
                    != (*(*best.as_ptr()).root.as_ptr()).ckey
                {
                    return false;
                }

                if !verify_node((*tp).root, None, self.r, &mut total) {
                    return false;
                }

                last_rank = Some((*tp).rank);
                prev = curr;
                curr = (*tp).next;
            }

            last_rank == self.rank && total == self.len
        }
    }

    /// Number of items currently traveling under a working key strictly
    /// above their original priority. Bounded by ⌊ε·n⌋ for any sequence of
    /// operations containing n pushes.
    pub fn corrupted_count(&self) -> usize {
        let mut count = 0;
        unsafe {
            let mut curr = self.first;
            while let Some(tree) = curr {
                count_corrupted((*tree.as_ptr()).root, &mut count);
                curr = (*tree.as_ptr()).next;
            }
        }
        count
    }
}

impl<T, P: Ord + Clone> fmt::Debug for SoftHeap<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftHeap")
            .field("len", &self.len)
            .field("epsilon", &self.epsilon)
            .field("rank", &self.rank)
            .finish_non_exhaustive()
    }
}

impl<T, P: Ord + Clone> Drop for SoftHeap<T, P> {
    fn drop(&mut self) {
        unsafe {
            let mut curr = self.first.take();
            while let Some(tree) = curr {
                curr = (*tree.as_ptr()).next;
                free_tree(tree);
            }
        }
    }
}

unsafe fn verify_node<T, P: Ord + Clone>(
    x: NonNull<Node<T, P>>,
    parent_ckey: Option<&P>,
    r: u32,
    total: &mut usize,
) -> bool {
    let xp = x.as_ptr();

    if let Some(parent) = parent_ckey {
        if *parent > (*xp).ckey {
            return false;
        }
    }
    if (*xp).size != size_for_rank((*xp).rank, r) {
        return false;
    }
    // Every node at rest holds at least one item; non-leaves additionally
    // stay above half their target size (deficiency triggers a sift).
    if (*xp).nelems == 0 {
        return false;
    }
    if !is_leaf(xp) && (*xp).nelems <= (*xp).size / 2 {
        return false;
    }

    let mut count = 0usize;
    let mut prev: Option<NonNull<Cell<T, P>>> = None;
    let mut cell = (*xp).first;
    while let Some(c) = cell {
        if (*c.as_ptr()).prev != prev {
            return false;
        }
        if (*c.as_ptr()).key > (*xp).ckey {
            return false;
        }
        count += 1;
        prev = cell;
        cell = (*c.as_ptr()).next;
    }
    if (*xp).last != prev || count != (*xp).nelems {
        return false;
    }
    *total += count;

    for child in [(*xp).left, (*xp).right].into_iter().flatten() {
        if (*child.as_ptr()).rank + 1 != (*xp).rank {
            return false;
        }
        if !verify_node(child, Some(&(*xp).ckey), r, total) {
            return false;
        }
    }
    true
}

unsafe fn count_corrupted<T, P: Ord + Clone>(x: NonNull<Node<T, P>>, count: &mut usize) {
    let xp = x.as_ptr();
    let mut cell = (*xp).first;
    while let Some(c) = cell {
        if (*c.as_ptr()).key < (*xp).ckey {
            *count += 1;
        }
        cell = (*c.as_ptr()).next;
    }
    for child in [(*xp).left, (*xp).right].into_iter().flatten() {
        count_corrupted(child, count);
    }
}
