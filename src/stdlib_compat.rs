//! Standard library compatibility layer
//!
//! Provides a `std::collections::BinaryHeap`-flavored facade over
//! [`SoftHeap`] for item types that are their own priority.
//!
//! # Differences from BinaryHeap
//!
//! - **Min-heap vs Max-heap**: This is a min-heap, while `BinaryHeap` is a
//!   max-heap. Use `std::cmp::Reverse<T>` to get max-heap behavior.
//! - **Approximate pop order**: `pop` removes the item of minimum *working*
//!   key. Up to ⌊εn⌋ items may pop out of true order, in exchange for
//!   amortized O(log(1/ε)) operations regardless of heap size.
//! - **ε parameter**: construction takes the error rate and can fail, so
//!   there is no `Default`.
//!
//! # Example
//!
//! ```rust
//! use soft_heap::stdlib_compat::StdHeap;
//!
//! let mut heap: StdHeap<i32> = StdHeap::new(0.1).unwrap();
//! heap.push(5);
//! heap.push(3);
//! heap.push(7);
//! assert_eq!(heap.peek(), Some(&3)); // min-heap, unlike BinaryHeap's max-heap
//! assert_eq!(heap.pop(), Some(3));
//! ```

use std::fmt;

use crate::error::SoftHeapError;
use crate::heap::SoftHeap;

/// A `BinaryHeap`-like wrapper where the item itself serves as the priority
///
/// # Type Parameters
/// - `T`: The item type; must implement `Ord` and `Clone` (the working-key
///   machinery keeps copies of keys)
pub struct StdHeap<T: Ord + Clone> {
    heap: SoftHeap<T, T>,
}

impl<T: Ord + Clone> StdHeap<T> {
    /// Creates a new empty heap with error parameter `epsilon`.
    ///
    /// # Errors
    /// Returns [`SoftHeapError::EpsilonOutOfRange`] unless `0 < ε < 1`.
    pub fn new(epsilon: f64) -> Result<Self, SoftHeapError> {
        Ok(Self {
            heap: SoftHeap::new(epsilon)?,
        })
    }

    /// Returns true if the heap is empty
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the number of elements in the heap
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Pushes an item onto the heap
    ///
    /// The item itself serves as the priority.
    pub fn push(&mut self, item: T) {
        self.heap.push(item.clone(), item);
    }

    /// Returns a reference to the item `pop` would remove
    ///
    /// This is equivalent to `BinaryHeap::peek`, but returns the minimum
    /// (not maximum) — up to the soft heap's approximation.
    pub fn peek(&self) -> Option<&T> {
        self.heap.peek().map(|(_, item)| item)
    }

    /// Removes and returns the item of minimum working key
    ///
    /// This is equivalent to `BinaryHeap::pop`, but approximate: at most
    /// ⌊εn⌋ items can come out ahead of a smaller one.
    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|(_, item)| item)
    }

    /// Melds another heap into this one, consuming it
    ///
    /// Similar to `BinaryHeap::append`, but consumes the other heap.
    ///
    /// # Errors
    /// On ε mismatch, hands the other heap back untouched.
    pub fn meld(&mut self, other: Self) -> Result<(), (Self, SoftHeapError)> {
        self.heap
            .meld(other.heap)
            .map_err(|(heap, error)| (Self { heap }, error))
    }
}

impl<T: Ord + Clone> fmt::Debug for StdHeap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdHeap")
            .field("len", &self.len())
            .field("epsilon", &self.heap.epsilon())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_heap_like_usage() {
        let mut heap: StdHeap<i32> = StdHeap::new(0.2).unwrap();
        assert!(heap.is_empty());

        heap.push(9);
        heap.push(4);
        heap.push(6);
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.peek(), Some(&4));

        // Few enough elements that pop order is exact.
        assert_eq!(heap.pop(), Some(4));
        assert_eq!(heap.pop(), Some(6));
        assert_eq!(heap.pop(), Some(9));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn test_meld() {
        let mut a: StdHeap<i32> = StdHeap::new(0.2).unwrap();
        let mut b: StdHeap<i32> = StdHeap::new(0.2).unwrap();
        a.push(2);
        b.push(1);
        a.meld(b).unwrap();
        assert_eq!(a.pop(), Some(1));
        assert_eq!(a.pop(), Some(2));
    }

    #[test]
    fn test_meld_mismatch_returns_other() {
        let mut a: StdHeap<i32> = StdHeap::new(0.2).unwrap();
        let mut b: StdHeap<i32> = StdHeap::new(0.4).unwrap();
        b.push(1);
        let (mut b, _) = a.meld(b).unwrap_err();
        assert_eq!(b.pop(), Some(1));
    }
}
