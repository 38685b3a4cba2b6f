//! Large deterministic workloads that push the soft heap to its limits
//!
//! These tests run the end-to-end scenarios the structure is meant to
//! survive: exact sorting at ε = 1/n, bounded corruption on adversarial and
//! pseudo-random key sequences, repeated build-and-drop cycles, and meld
//! rejection on mismatched ε.

use soft_heap::{SoftHeap, SoftHeapError};

/// Splitmix64, used to generate reproducible pseudo-random keys without an
/// RNG dependency.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Drain the heap, asserting nondecreasing ckeys and ckey ≥ element along
/// the way. Returns the extracted elements and the number of extractions
/// whose ckey exceeded the element.
fn drain_counting_corruption(heap: &mut SoftHeap<(), i64>) -> (Vec<i64>, usize) {
    let mut elements = Vec::with_capacity(heap.len());
    let mut corrupted = 0usize;
    let mut last_ckey = i64::MIN;
    while let Some((element, (), ckey)) = heap.pop_with_ckey() {
        assert!(ckey >= element, "ckey {} below element {}", ckey, element);
        assert!(
            ckey >= last_ckey,
            "ckey {} after larger ckey {}",
            ckey,
            last_ckey
        );
        last_ckey = ckey;
        if ckey > element {
            corrupted += 1;
        }
        elements.push(element);
    }
    (elements, corrupted)
}

/// At ε = 1/n no node ever grows past size 1, so the heap degenerates into
/// an exact mergeable heap: ascending inserts come back out in order with
/// ckey equal to the element.
#[test]
fn test_forward_sort_exact_at_tiny_epsilon() {
    const N: i64 = 1024;
    let mut heap = SoftHeap::new(1.0 / N as f64).unwrap();
    for i in 0..N {
        heap.push(i, ());
    }
    assert!(heap.verify_internal_structure());

    for i in 0..N {
        let (element, (), ckey) = heap.pop_with_ckey().unwrap();
        assert_eq!(element, i);
        assert_eq!(ckey, i);
    }
    assert!(heap.is_empty());
}

#[test]
fn test_reverse_sort_exact_at_tiny_epsilon() {
    const N: i64 = 1024;
    let mut heap = SoftHeap::new(1.0 / N as f64).unwrap();
    for i in (0..N).rev() {
        heap.push(i, ());
    }
    assert!(heap.verify_internal_structure());

    for i in 0..N {
        let (element, (), ckey) = heap.pop_with_ckey().unwrap();
        assert_eq!(element, i);
        assert_eq!(ckey, i);
    }
    assert!(heap.is_empty());
}

/// Coprime stride sequence: inserts (1399·i) mod 1093 for i = 0..2¹⁵ at
/// ε = 0.1; extraction must yield a permutation of the input with at most
/// ⌊0.1 · 2¹⁵⌋ corrupted extractions.
#[test]
fn test_coprime_sequence_bounds_corruption() {
    const N: usize = 1 << 15;
    let mut heap = SoftHeap::new(0.1).unwrap();
    let mut expected: Vec<i64> = Vec::with_capacity(N);
    for i in 0..N as i64 {
        let key = (1399 * i) % 1093;
        expected.push(key);
        heap.push(key, ());
    }
    assert!(heap.verify_internal_structure());

    let (mut elements, corrupted) = drain_counting_corruption(&mut heap);
    assert!(heap.is_empty());

    elements.sort_unstable();
    expected.sort_unstable();
    assert_eq!(elements, expected);

    let budget = N / 10;
    assert!(
        corrupted <= budget,
        "{} corrupted extractions exceeds ⌊0.1·{}⌋ = {}",
        corrupted,
        N,
        budget
    );
}

/// 2²⁰ pseudo-random keys at ε = 0.3: multiset preserved, ckeys
/// nondecreasing, corruption within ⌊0.3 · 2²⁰⌋.
#[test]
fn test_random_inputs_bound_corruption() {
    const N: usize = 1 << 20;
    let mut heap = SoftHeap::new(0.3).unwrap();
    let mut expected: Vec<i64> = Vec::with_capacity(N);
    let mut state = 0x5eed_u64;
    for _ in 0..N {
        let key = (splitmix64(&mut state) >> 32) as i64;
        expected.push(key);
        heap.push(key, ());
    }
    assert_eq!(heap.len(), N);
    assert!(heap.verify_internal_structure());
    assert!(heap.corrupted_count() <= (0.3 * N as f64).floor() as usize);

    let (mut elements, corrupted) = drain_counting_corruption(&mut heap);
    assert!(heap.is_empty());

    elements.sort_unstable();
    expected.sort_unstable();
    assert_eq!(elements, expected);

    let budget = (0.3 * N as f64).floor() as usize;
    assert!(
        corrupted <= budget,
        "{} corrupted extractions exceeds ⌊0.3·{}⌋ = {}",
        corrupted,
        N,
        budget
    );
}

/// Build heaps of growing size at a very small ε and drop them — fully
/// populated, partially drained, and fully drained. Every cell, node, and
/// tree shell must be reclaimed by `Drop` whatever shape the forest is in.
#[test]
fn test_cleanup_stress() {
    const EPSILON: f64 = 1.0 / (1 << 20) as f64;
    let mut state = 0xc1ea_0b5e_u64;
    for step in 1..=10u64 {
        let n = (step * (1 << 16)) / 10;

        // Drop fully populated.
        let mut heap = SoftHeap::new(EPSILON).unwrap();
        for _ in 0..n {
            heap.push(splitmix64(&mut state) as i64, ());
        }
        drop(heap);

        // Drop after draining half.
        let mut heap = SoftHeap::new(EPSILON).unwrap();
        for _ in 0..n {
            heap.push(splitmix64(&mut state) as i64, ());
        }
        for _ in 0..n / 2 {
            heap.pop();
        }
        drop(heap);

        // Drain to empty; dropping the empty shell must be equivalent to
        // dropping a never-used heap.
        let mut heap = SoftHeap::new(EPSILON).unwrap();
        for _ in 0..n {
            heap.push(splitmix64(&mut state) as i64, ());
        }
        while heap.pop().is_some() {}
        assert!(heap.is_empty());
        drop(heap);
    }
}

#[test]
fn test_mismatched_epsilon_rejected() {
    let mut p: SoftHeap<(), i64> = SoftHeap::new(0.2).unwrap();
    let q: SoftHeap<(), i64> = SoftHeap::new(0.5).unwrap();

    let (mut q, error) = p.meld(q).unwrap_err();
    assert!(matches!(error, SoftHeapError::EpsilonMismatch { .. }));

    // Both heaps survive the rejection and stay fully usable.
    for i in 0..64 {
        p.push(i, ());
        q.push(-i, ());
    }
    assert!(p.verify_internal_structure());
    assert!(q.verify_internal_structure());
    assert_eq!(p.len(), 64);
    assert_eq!(q.len(), 64);
    while p.pop().is_some() {}
    while q.pop().is_some() {}
}
