//! Rank type and the rank-indexed size table for soft heap nodes.
//!
//! # Why u8?
//!
//! A node's rank is zero for singletons and one plus the children's rank for
//! combined nodes, so it is bounded by `log₂(n)` where `n` is the number of
//! elements ever melded together. Since `u8` can represent values 0-255, it
//! supports heaps with up to 2²⁵⁵ elements—far more than could ever fit in
//! memory. Using `u8` instead of `usize` saves 7 bytes per node on 64-bit
//! systems and often eliminates padding on top of that.
//!
//! The *error rank* `r` is different: it is a threshold derived from the
//! heap's error parameter ε, and for very small ε it can exceed 255 (all
//! that means is that every node keeps target size 1). It is therefore
//! carried as a `u32` and compared against widened node ranks.

/// Type alias for node/tree rank.
///
/// Using `u8` saves 7 bytes per node compared to `usize` on 64-bit systems.
/// The maximum value (255) supports heaps with up to 2²⁵⁵ elements.
pub type Rank = u8;

/// Maximum valid rank value.
pub const MAX_RANK: Rank = u8::MAX;

/// Safely increment a rank value, panicking on overflow.
///
/// # Panics
///
/// Panics if `rank == MAX_RANK`. This should never happen in practice since
/// it would require a heap with more than 2²⁵⁵ elements.
///
/// # Example
///
/// ```rust
/// use soft_heap::rank::{checked_increment, Rank};
///
/// let rank: Rank = 5;
/// assert_eq!(checked_increment(rank), 6);
/// ```
#[inline]
pub fn checked_increment(rank: Rank) -> Rank {
    rank.checked_add(1).expect(
        "rank overflow: this should be impossible since max rank is log₂(n) \
         and u8::MAX (255) supports heaps with up to 2²⁵⁵ elements",
    )
}

/// Compute the error rank `r = max(5, ⌈log₂(1/ε)⌉ + 5)` for a given ε.
///
/// Nodes of rank at most `r` keep target size 1 and never corrupt their
/// items; only ranks above `r` grow their item lists. Shrinking ε therefore
/// raises `r` and pushes corruption further up the trees, which is what
/// bounds the corrupted fraction by ε.
///
/// The caller must have validated `0 < ε < 1`.
///
/// # Example
///
/// ```rust
/// use soft_heap::rank::error_rank;
///
/// assert_eq!(error_rank(0.5), 6);       // ⌈log₂ 2⌉ + 5
/// assert_eq!(error_rank(1.0 / 1024.0), 15);
/// ```
#[inline]
pub fn error_rank(epsilon: f64) -> u32 {
    debug_assert!(epsilon > 0.0 && epsilon < 1.0);
    let r = (1.0 / epsilon).log2().ceil() as u32 + 5;
    r.max(5)
}

/// Target item-list size for a node of rank `rank` under error rank `r`.
///
/// Size is 1 through rank `r`, then grows by the recurrence
/// `size(k) = (3·size(k-1) + 1) / 2` in integer arithmetic, i.e.
/// `⌈3/2 · size(k-1)⌉`. Geometric growth here is what makes sifting
/// amortize to a constant per extracted element.
pub fn size_for_rank(rank: Rank, r: u32) -> usize {
    let rank = u32::from(rank);
    if rank <= r {
        return 1;
    }
    let mut size = 1usize;
    for _ in r..rank {
        size = (3 * size + 1) / 2;
    }
    size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_increment() {
        assert_eq!(checked_increment(0), 1);
        assert_eq!(checked_increment(127), 128);
        assert_eq!(checked_increment(254), 255);
    }

    #[test]
    #[should_panic(expected = "rank overflow")]
    fn test_checked_increment_overflow() {
        checked_increment(255);
    }

    #[test]
    fn test_error_rank_grows_as_epsilon_shrinks() {
        assert_eq!(error_rank(0.9), 6);
        assert_eq!(error_rank(0.5), 6);
        assert_eq!(error_rank(0.1), 9); // ⌈log₂ 10⌉ = 4
        assert_eq!(error_rank(0.01), 12); // ⌈log₂ 100⌉ = 7
        assert_eq!(error_rank(1.0 / 1024.0), 15);
        assert_eq!(error_rank(1.0 / (1u64 << 20) as f64), 25);
    }

    #[test]
    fn test_error_rank_never_below_five() {
        // ε close to 1 still yields at least the floor of 5.
        assert!(error_rank(0.999_999) >= 5);
    }

    #[test]
    fn test_size_one_through_error_rank() {
        for rank in 0..=7 {
            assert_eq!(size_for_rank(rank, 7), 1);
        }
    }

    #[test]
    fn test_size_growth_sequence() {
        // With r = 0 the recurrence runs from rank 1: 1, 2, 3, 5, 8, 12, 18, 27.
        let expected = [1, 2, 3, 5, 8, 12, 18, 27];
        for (rank, &size) in expected.iter().enumerate() {
            assert_eq!(size_for_rank(rank as Rank, 0), size);
        }
    }

    #[test]
    fn test_size_is_ceil_three_halves() {
        let mut prev = 1usize;
        for rank in 1..=40u8 {
            let size = size_for_rank(rank, 0);
            assert_eq!(size, prev + prev.div_ceil(2)); // ⌈3s/2⌉ = s + ⌈s/2⌉
            prev = size;
        }
    }
}
