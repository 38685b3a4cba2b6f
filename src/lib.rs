//! Soft Heap for Rust
//!
//! This crate implements the soft heap of Kaplan and Zwick (the binary-tree
//! reformulation of Chazelle's data structure): an *approximate*
//! min-priority queue that trades exactness of extract-min for amortized
//! constant-time bounds in the heap size.
//!
//! # Features
//!
//! - **Push**: O(log(1/ε)) amortized
//! - **Meld**: O(log(1/ε)) amortized; consumes the melded-in heap
//! - **Extract-min**: O(log(1/ε)) amortized; returns the item of minimum
//!   *working key*, optionally reporting that key
//! - **Corruption bound**: after any sequence of operations with n pushes,
//!   at most ⌊εn⌋ items travel under a working key above their own priority
//!
//! Choosing ε ≥ 1/n makes the bounds independent of n; choosing ε < 1/n
//! makes the heap exact and degenerates it into an ordinary mergeable heap.
//! There is no decrease-key and no delete-by-handle.
//!
//! # Example
//!
//! ```rust
//! use soft_heap::SoftHeap;
//!
//! let mut heap = SoftHeap::new(0.25).unwrap();
//! heap.push(3, "three");
//! heap.push(1, "one");
//! heap.push(2, "two");
//!
//! // With this few elements every node stays exact.
//! assert_eq!(heap.pop(), Some((1, "one")));
//! let (priority, item, ckey) = heap.pop_with_ckey().unwrap();
//! assert_eq!((priority, item), (2, "two"));
//! assert_eq!(ckey, 2); // uncorrupted: working key equals the priority
//! ```

pub mod error;
pub mod heap;
pub mod rank;
pub mod stdlib_compat;

mod node;
mod tree;

// Re-export the main types for convenience
pub use error::SoftHeapError;
pub use heap::SoftHeap;
