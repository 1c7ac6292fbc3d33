// SPDX-License-Identifier: MIT
//! The recursive bucket-resolution pipeline: this is where distribution
//! happens. Both pipeline modes — distinct-with-count and dictless — share
//! one resolution loop, parametrized over [`BucketItem`], so the four
//! small-case handlers and the recursive case are written once.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

use crate::bucket::{BucketItem, HashKey, Key, SortItem};
use crate::element::Element;
use crate::error::Error;
use crate::heap::MinMaxHeap;
use crate::pool::ArrayPool;
use crate::projection::{get_log, linear_transform_params, project_index};

/// Upper bound on the number of buckets formed at any one level, at the top
/// level as well as every recursive level. Smaller means more recursion,
/// larger means more empty buckets; treated as tunable.
const MAX_BUCKETS: usize = 128;

fn top_bucket_count(working_set_len: usize) -> usize {
    working_set_len.clamp(1, MAX_BUCKETS)
}

fn recursive_bucket_count(size: usize) -> usize {
    (size / 2 + 1).min(MAX_BUCKETS)
}

/// Distribute `items` into at most `count` buckets by their logarithmic
/// projection, given the (already log-projected) extremes of the set.
///
/// The bucket array is built lazily: an index no item ever projects into
/// never gets a [`MinMaxHeap`] constructed for it at all. A plain
/// `Vec<Option<_>>` is the idiomatic Rust shape for this, rather than a
/// pool-backed lazy vector -- `MinMaxHeap` owns a rented buffer it must
/// release on `Drop`, so it can never be `Copy`, which a pool-backed
/// vector's storage requires.
fn distribute<T, I>(
    items: &[I],
    min_el: T,
    max_el: T,
    count: usize,
    pool: &Rc<RefCell<ArrayPool<I>>>,
) -> Result<Vec<Option<MinMaxHeap<I>>>, Error>
where
    T: Element,
    I: BucketItem<T>,
{
    let (a, b) = linear_transform_params(get_log(min_el), get_log(max_el), 0.0, (count - 1) as f32);

    let mut buckets: Vec<Option<MinMaxHeap<I>>> = (0..count).map(|_| None).collect();

    for &item in items {
        let idx = project_index(get_log(item.value()), a, b, count);
        buckets[idx]
            .get_or_insert_with(|| MinMaxHeap::new(Rc::clone(pool)))
            .push(item)?;
    }

    Ok(buckets)
}

/// Push non-empty buckets onto the resolution stack in reverse index order,
/// so the lowest index ends up on top and is the next one popped. Indices
/// that were never touched during distribution (`None`) simply contribute
/// nothing.
fn push_onto_stack<T, I>(stack: &mut Vec<MinMaxHeap<I>>, buckets: Vec<Option<MinMaxHeap<I>>>)
where
    T: Element,
    I: BucketItem<T>,
{
    for bucket in buckets.into_iter().rev().flatten() {
        if !bucket.is_empty() {
            stack.push(bucket);
        }
    }
}

fn build_stack<T, I>(
    items: &[I],
    min_el: T,
    max_el: T,
    pool: &Rc<RefCell<ArrayPool<I>>>,
) -> Result<Vec<MinMaxHeap<I>>, Error>
where
    T: Element,
    I: BucketItem<T>,
{
    let count = top_bucket_count(items.len());
    let buckets = distribute(items, min_el, max_el, count, pool)?;
    let mut stack = Vec::with_capacity(buckets.len());
    push_onto_stack(&mut stack, buckets);
    Ok(stack)
}

/// Write up to `count` copies of `value` starting at `output[write_index]`,
/// never writing past the end of `output`. Returns the number actually
/// written, which is how the caller advances `write_index`.
fn emit<T: Element>(output: &mut [T], write_index: usize, value: T, count: usize) -> usize {
    let remaining = output.len() - write_index;
    let n = count.min(remaining);
    output[write_index..write_index + n].fill(value);
    n
}

/// Resolve a bucket directly by sorting its (already deduplicated, or
/// dictless) items by value rather than projecting them into further
/// buckets. Used exactly when the projection can make no further progress
/// on a bucket: sorting a handful of residual items is always correct, and
/// since this only fires on a projection collision rather than the common
/// case, it doesn't affect the pipeline's expected-case complexity.
fn drain_sorted<T, I>(mut items: Vec<I>, output: &mut [T], write_index: usize) -> usize
where
    T: Element,
    I: BucketItem<T>,
{
    items.sort_unstable();
    let mut advanced = 0;
    for item in items {
        if write_index + advanced >= output.len() {
            break;
        }
        advanced += emit(output, write_index + advanced, item.value(), item.count());
    }
    advanced
}

/// Drain the resolution stack into `output`, stopping as soon as `output`
/// is full (the top-K truncation) or the stack empties (a full sort).
fn resolve<T, I>(
    mut stack: Vec<MinMaxHeap<I>>,
    output: &mut [T],
    pool: &Rc<RefCell<ArrayPool<I>>>,
) -> Result<(), Error>
where
    T: Element,
    I: BucketItem<T>,
{
    let target = output.len();
    let mut write_index = 0;

    while write_index < target {
        let Some(mut bucket) = stack.pop() else {
            break;
        };
        let size = bucket.len();

        match size.saturating_sub(1).min(3) {
            0 => {
                let item = bucket.find_max();
                write_index += emit(output, write_index, item.value(), item.count());
            }
            1 => {
                let min = bucket.find_min();
                let max = bucket.find_max();
                write_index += emit(output, write_index, min.value(), min.count());
                write_index += emit(output, write_index, max.value(), max.count());
            }
            2 => {
                let (max_i, mid_i, min_i) = bucket.get_max_mid_min();
                let min = bucket.at(min_i);
                let mid = bucket.at(mid_i);
                let max = bucket.at(max_i);
                write_index += emit(output, write_index, min.value(), min.count());
                write_index += emit(output, write_index, mid.value(), mid.count());
                write_index += emit(output, write_index, max.value(), max.count());
            }
            _ => {
                if bucket.all_duplicates() {
                    let value = bucket.find_min().value();
                    let total: usize = bucket.iter().map(|item| item.count()).sum();
                    write_index += emit(output, write_index, value, total);
                } else {
                    let min_el = bucket.find_min().value();
                    let max_el = bucket.find_max().value();
                    let items: Vec<I> = bucket.iter().collect();
                    let bucket_len = items.len();
                    drop(bucket);

                    let count = recursive_bucket_count(bucket_len);
                    let new_buckets = distribute(&items, min_el, max_el, count, pool)?;

                    if new_buckets.iter().flatten().any(|b| b.len() == bucket_len) {
                        // Every item landed back in a single bucket of the
                        // same size: the bucket's distinct elements share
                        // one logarithmic projection, so
                        // `linear_transform_params` degenerated to `(0, 0)`
                        // and redistributing again would recurse on an
                        // identical bucket forever. Unsplittable by
                        // projection: resolve it directly by value order
                        // instead.
                        write_index += drain_sorted(items, output, write_index);
                    } else {
                        push_onto_stack(&mut stack, new_buckets);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Scan `input`, returning its extremes under [`Element::cmp_total`].
fn extremes<T: Element>(input: &[T]) -> (T, T) {
    let mut min_el = input[0];
    let mut max_el = input[0];
    for &value in &input[1..] {
        if value.cmp_total(&min_el) == Ordering::Less {
            min_el = value;
        }
        if value.cmp_total(&max_el) == Ordering::Greater {
            max_el = value;
        }
    }
    (min_el, max_el)
}

/// Distinct-with-count mode: dedup `input` into `(value, count)` pairs via a
/// bit-pattern-keyed hash map before bucketing, so duplicate-heavy inputs
/// pay the heap-resolution cost once per distinct value rather than once
/// per element.
pub(crate) fn run_distinct<T: Element>(input: &[T], output: &mut [T]) -> Result<(), Error> {
    if input.is_empty() || output.is_empty() {
        return Ok(());
    }
    if input.len() == 1 {
        output[0] = input[0];
        return Ok(());
    }

    let (min_el, max_el) = extremes(input);
    if min_el.eq_bucket(&max_el) {
        output.fill(min_el);
        return Ok(());
    }

    let mut index_of: HashMap<HashKey<T>, usize> = HashMap::with_capacity(input.len());
    let mut items: Vec<SortItem<T>> = Vec::with_capacity(input.len());
    for &value in input {
        match index_of.entry(HashKey(value)) {
            Entry::Occupied(entry) => items[*entry.get()].count += 1,
            Entry::Vacant(entry) => {
                entry.insert(items.len());
                items.push(SortItem::from_value(value));
            }
        }
    }

    let pool = Rc::new(RefCell::new(ArrayPool::<SortItem<T>>::new()));
    let stack = build_stack(&items, min_el, max_el, &pool)?;
    resolve(stack, output, &pool)
}

/// Dictless mode: every element, including duplicates, is pushed into the
/// pipeline directly. Skips the hashing pass distinct mode pays, at the
/// cost of resolving duplicate-heavy buckets element-by-element.
pub(crate) fn run_dictless<T: Element>(input: &[T], output: &mut [T]) -> Result<(), Error> {
    if input.is_empty() || output.is_empty() {
        return Ok(());
    }
    if input.len() == 1 {
        output[0] = input[0];
        return Ok(());
    }

    let (min_el, max_el) = extremes(input);
    if min_el.eq_bucket(&max_el) {
        output.fill(min_el);
        return Ok(());
    }

    let items: Vec<Key<T>> = input.iter().map(|&value| Key::from_value(value)).collect();

    let pool = Rc::new(RefCell::new(ArrayPool::<Key<T>>::new()));
    let stack = build_stack(&items, min_el, max_el, &pool)?;
    resolve(stack, output, &pool)
}
