// SPDX-License-Identifier: MIT
//! A binary heap with the min-max property: even levels hold a value ≥ every
//! descendant, odd levels hold a value ≤ every descendant. The root sits on
//! a max level, so both extremes — and, for three or more elements, the
//! ordered triple (max, mid, min) — are available in O(1).

use std::cell::RefCell;
use std::rc::Rc;

use crate::pool::ArrayPool;
use crate::pooled_vec::PooledVec;

fn parent(index: usize) -> usize {
    (index - 1) / 2
}

fn left_child(index: usize) -> usize {
    2 * index + 1
}

/// `true` when `index` sits on a min level: the level of the root (index 0)
/// is level 0 (a max level), and levels alternate from there.
fn is_min_level(index: usize) -> bool {
    (index + 1).ilog2() % 2 == 1
}

pub(crate) struct MinMaxHeap<T: Ord + Copy> {
    storage: PooledVec<T>,
}

impl<T: Ord + Copy> MinMaxHeap<T> {
    pub(crate) fn new(pool: Rc<RefCell<ArrayPool<T>>>) -> Self {
        Self {
            storage: PooledVec::new(pool),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.storage.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub(crate) fn at(&self, index: usize) -> T {
        self.storage.get(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.storage.iter()
    }

    pub(crate) fn push(&mut self, value: T) -> Result<(), crate::error::Error> {
        self.storage.push(value)?;
        let last = self.storage.len() - 1;
        self.trickle_up(last);
        Ok(())
    }

    /// The element with the greatest value. Panics on an empty heap: popping
    /// or peeking an empty heap is a programming error, not a recoverable
    /// input condition.
    pub(crate) fn find_max(&self) -> T {
        assert!(!self.is_empty(), "find_max on an empty heap");
        self.storage.get(0)
    }

    pub(crate) fn find_min(&self) -> T {
        assert!(!self.is_empty(), "find_min on an empty heap");
        self.storage.get(self.find_min_index())
    }

    /// For a heap of at least 3 elements, the (max, mid, min) index triple,
    /// determined with a single comparison.
    pub(crate) fn get_max_mid_min(&self) -> (usize, usize, usize) {
        assert!(self.len() >= 3, "get_max_mid_min requires at least 3 elements");
        if self.storage.get(1) < self.storage.get(2) {
            (0, 2, 1)
        } else {
            (0, 1, 2)
        }
    }

    /// Strict duplicate check: the heap holds exactly one distinct value.
    /// Sufficient but not the only valid heuristic (see `bb_sort.h`'s
    /// `h[0] == h[1]`, a weaker but also-correct test) — this one costs
    /// nothing extra at the sizes this pipeline forms buckets at.
    pub(crate) fn all_duplicates(&self) -> bool {
        self.find_min() == self.find_max()
    }

    /// Remove and return the greatest element, repairing the heap via
    /// `trickle_down`. The resolution pipeline never calls this: it reads
    /// extremes with `find_min`/`find_max`/`get_max_mid_min` and otherwise
    /// drains a bucket wholesale through `iter`, so a bucket's heap is built
    /// once via `push` and then discarded rather than popped down one
    /// element at a time. Kept as a complete, independently-tested min-max
    /// heap operation for callers that do need single-element removal.
    pub(crate) fn pop_max(&mut self) -> T {
        assert!(!self.is_empty(), "pop_max on an empty heap");
        let value = self.storage.get(0);
        self.delete(0);
        value
    }

    pub(crate) fn pop_min(&mut self) -> T {
        assert!(!self.is_empty(), "pop_min on an empty heap");
        let index = self.find_min_index();
        let value = self.storage.get(index);
        self.delete(index);
        value
    }

    fn find_min_index(&self) -> usize {
        match self.storage.len() {
            0 => unreachable!("find_min_index on an empty heap"),
            1 => 0,
            2 => 1,
            _ => {
                if self.storage.get(1) < self.storage.get(2) {
                    1
                } else {
                    2
                }
            }
        }
    }

    fn delete(&mut self, index: usize) {
        let last = self.storage.len() - 1;
        if index == last {
            self.storage.pop();
            return;
        }
        self.storage.swap(index, last);
        self.storage.pop();
        self.trickle_down(index);
    }

    fn trickle_up(&mut self, index: usize) {
        if index == 0 {
            return;
        }
        let p = parent(index);
        if is_min_level(index) {
            if self.storage.get(p) < self.storage.get(index) {
                self.storage.swap(p, index);
                self.trickle_up_track(p, true);
            } else {
                self.trickle_up_track(index, false);
            }
        } else if self.storage.get(index) < self.storage.get(p) {
            self.storage.swap(p, index);
            self.trickle_up_track(p, false);
        } else {
            self.trickle_up_track(index, true);
        }
    }

    /// Trickle up along a single level track (all max-levels or all
    /// min-levels), comparing against grandparents rather than the parent.
    fn trickle_up_track(&mut self, index: usize, max_level: bool) {
        if index == 0 {
            return;
        }
        let p = parent(index);
        if p == 0 {
            return;
        }
        let grandparent = parent(p);
        let should_swap = if max_level {
            !(self.storage.get(index) < self.storage.get(grandparent))
        } else {
            self.storage.get(index) < self.storage.get(grandparent)
        };
        if should_swap {
            self.storage.swap(grandparent, index);
            self.trickle_up_track(grandparent, max_level);
        }
    }

    fn trickle_down(&mut self, index: usize) {
        if is_min_level(index) {
            self.trickle_down_track(index, false);
        } else {
            self.trickle_down_track(index, true);
        }
    }

    fn trickle_down_track(&mut self, index: usize, max_level: bool) {
        let len = self.storage.len();
        let mut smallest = index;
        let left = left_child(index);

        if left < len && (self.storage.get(left) < self.storage.get(smallest)) ^ max_level {
            smallest = left;
        }
        if left + 1 < len && (self.storage.get(left + 1) < self.storage.get(smallest)) ^ max_level
        {
            smallest = left + 1;
        }

        let left_grandchild = left_child(left);
        for i in 0..4 {
            let candidate = left_grandchild + i;
            if candidate < len
                && (self.storage.get(candidate) < self.storage.get(smallest)) ^ max_level
            {
                smallest = candidate;
            }
        }

        if index == smallest {
            return;
        }

        self.storage.swap(index, smallest);

        if smallest - left > 1 {
            let p = parent(smallest);
            if (self.storage.get(p) < self.storage.get(smallest)) ^ max_level {
                self.storage.swap(p, smallest);
            }
            self.trickle_down_track(smallest, max_level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap<T: Ord + Copy>() -> MinMaxHeap<T> {
        MinMaxHeap::new(Rc::new(RefCell::new(ArrayPool::new())))
    }

    #[test]
    fn extremes_after_pushes() {
        let mut h = heap::<i32>();
        for v in [7, 3, 9, 1, 5, 2, 8, 4, 6] {
            h.push(v).unwrap();
        }
        assert_eq!(h.find_max(), 9);
        assert_eq!(h.find_min(), 1);
    }

    #[test]
    fn pop_max_then_min_drains_in_order() {
        let mut h = heap::<i32>();
        for v in [5, 2, 9, 1, 7, 3] {
            h.push(v).unwrap();
        }
        assert_eq!(h.pop_max(), 9);
        assert_eq!(h.pop_min(), 1);
        assert_eq!(h.pop_max(), 7);
        assert_eq!(h.pop_min(), 2);
        assert_eq!(h.pop_max(), 5);
        assert_eq!(h.pop_min(), 3);
        assert!(h.is_empty());
    }

    #[test]
    fn get_max_mid_min_matches_sorted_triple() {
        let mut h = heap::<i32>();
        for v in [4, 9, 1] {
            h.push(v).unwrap();
        }
        let (max_i, mid_i, min_i) = h.get_max_mid_min();
        assert_eq!(h.at(max_i), 9);
        assert_eq!(h.at(mid_i), 4);
        assert_eq!(h.at(min_i), 1);
    }

    #[test]
    fn all_duplicates_detects_single_distinct_value() {
        let mut h = heap::<i32>();
        for _ in 0..5 {
            h.push(3).unwrap();
        }
        assert!(h.all_duplicates());
        h.push(4).unwrap();
        assert!(!h.all_duplicates());
    }

    #[test]
    fn heap_property_holds_under_random_insert_delete() {
        use rand::Rng;
        use rand::SeedableRng;
        let mut rng = rand_pcg::Pcg32::seed_from_u64(42);
        let mut h = heap::<i32>();
        let mut reference = Vec::new();
        for _ in 0..500 {
            let v: i32 = rng.gen_range(-1000..1000);
            h.push(v).unwrap();
            reference.push(v);
        }
        reference.sort_unstable();
        let mut drained = Vec::new();
        while !h.is_empty() {
            drained.push(h.pop_min());
        }
        assert_eq!(drained, reference);
    }
}
