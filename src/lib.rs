// SPDX-License-Identifier: MIT

//! Bucket-based distribution sort for one-dimensional sequences of
//! totally-ordered numeric values.
//!
//! The engine projects each value into a bucket index through a logarithmic
//! linear transform, then recursively resolves each bucket with a small set
//! of fixed fast paths until every bucket is trivially orderable. On
//! well-distributed numeric input this runs in expected near-linear time.
//! [`top_k`] answers a partial-sort query — the `k` smallest elements, in
//! order — without materializing a full sort of the rest.
//!
//! ```
//! let mut values = [5, 2, 9, 1, 7, 3];
//! bbsort::sort(&mut values).unwrap();
//! assert_eq!(values, [1, 2, 3, 5, 7, 9]);
//!
//! let top3 = bbsort::top_k(&[5, 2, 9, 1, 7, 3], 3).unwrap();
//! assert_eq!(top3, [1, 2, 3]);
//! ```

mod bucket;
mod element;
mod engine;
mod error;
mod heap;
mod mid_vec;
mod pool;
mod pooled_vec;
mod projection;

pub use element::Element;
pub use error::Error;

/// Sort `seq` in place, ascending, using distinct-with-count mode.
///
/// Distinct mode is the default: it dedups the input into `(value, count)`
/// pairs before distributing into buckets, which amortizes the
/// heap-resolution cost across however many times each value repeats. This
/// is the better default when duplicates are common, which is the usual
/// case for bounded-range numeric data; callers who know their input has
/// few repeats and want to skip the hashing pass can use
/// [`sort_dictless`] instead.
///
/// An empty or single-element `seq` is a no-op, not an error.
pub fn sort<T: Element>(seq: &mut [T]) -> Result<(), Error> {
    if seq.len() <= 1 {
        return Ok(());
    }
    let input = seq.to_vec();
    engine::run_distinct(&input, seq)
}

/// Sort `seq` in place, ascending, keeping duplicates inline rather than
/// deduping them through a hash map first.
///
/// Prefer [`sort`] unless the input is known to have few repeated values:
/// dictless mode resolves duplicate-heavy buckets element by element.
pub fn sort_dictless<T: Element>(seq: &mut [T]) -> Result<(), Error> {
    if seq.len() <= 1 {
        return Ok(());
    }
    let input = seq.to_vec();
    engine::run_dictless(&input, seq)
}

/// Return the `min(seq.len(), k)` smallest elements of `seq`, ascending,
/// without fully sorting the rest. Uses distinct-with-count mode; see
/// [`top_k_dictless`] for the dictless variant.
pub fn top_k<T: Element>(seq: &[T], k: usize) -> Result<Vec<T>, Error> {
    let m = seq.len().min(k);
    if m == 0 {
        return Ok(Vec::new());
    }
    let mut output = vec![seq[0]; m];
    engine::run_distinct(seq, &mut output)?;
    Ok(output)
}

/// Dictless variant of [`top_k`].
pub fn top_k_dictless<T: Element>(seq: &[T], k: usize) -> Result<Vec<T>, Error> {
    let m = seq.len().min(k);
    if m == 0 {
        return Ok(Vec::new());
    }
    let mut output = vec![seq[0]; m];
    engine::run_dictless(seq, &mut output)?;
    Ok(output)
}
