// SPDX-License-Identifier: MIT
//! An append-only sequence that tracks {min, max, mid} incrementally,
//! without maintaining a full heap ordering — a cheaper alternative to
//! [`MinMaxHeap`](crate::heap::MinMaxHeap) when a caller only ever needs the
//! extremes (and, for the size-3 fast path, the middle element too).

use std::cell::RefCell;
use std::rc::Rc;

use crate::element::Element;
use crate::pool::ArrayPool;
use crate::pooled_vec::PooledVec;

/// Tracks `min`/`max` (and, for exactly 3 elements, `mid`) as values are
/// pushed. `mid` is only reliable while `len() == 3`; once a fourth element
/// arrives it stops being updated, matching the source this is grounded on.
pub(crate) struct MinMaxMidVec<T: Element> {
    storage: PooledVec<T>,
    min: Option<T>,
    max: Option<T>,
    mid: Option<T>,
}

impl<T: Element> MinMaxMidVec<T> {
    pub(crate) fn new(pool: Rc<RefCell<ArrayPool<T>>>) -> Self {
        Self {
            storage: PooledVec::new(pool),
            min: None,
            max: None,
            mid: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.storage.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub(crate) fn min(&self) -> Option<T> {
        self.min
    }

    pub(crate) fn max(&self) -> Option<T> {
        self.max
    }

    /// Valid only when `len() == 3`.
    pub(crate) fn mid(&self) -> Option<T> {
        self.mid
    }

    pub(crate) fn push(&mut self, value: T) -> Result<(), crate::error::Error> {
        match self.storage.len() {
            0 => {
                self.min = Some(value);
                self.max = Some(value);
            }
            2 => {
                let (min, max) = (
                    self.min.expect("min set by the first push"),
                    self.max.expect("max set by the first push"),
                );
                if value.cmp_total(&min) == std::cmp::Ordering::Less {
                    self.mid = Some(min);
                    self.min = Some(value);
                } else if value.cmp_total(&max) == std::cmp::Ordering::Greater {
                    self.mid = Some(max);
                    self.max = Some(value);
                } else {
                    self.mid = Some(value);
                }
            }
            _ => {
                let min = self.min.expect("min set by the first push");
                let max = self.max.expect("max set by the first push");
                if value.cmp_total(&min) == std::cmp::Ordering::Less {
                    self.min = Some(value);
                }
                if value.cmp_total(&max) == std::cmp::Ordering::Greater {
                    self.max = Some(value);
                }
            }
        }
        self.storage.push(value)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.storage.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_of<T: Element>() -> MinMaxMidVec<T> {
        MinMaxMidVec::new(Rc::new(RefCell::new(ArrayPool::new())))
    }

    #[test]
    fn tracks_extremes_across_pushes() {
        let mut v = vec_of::<i32>();
        for x in [5, -3, 10, 2, -7] {
            v.push(x).unwrap();
        }
        assert_eq!(v.min(), Some(-7));
        assert_eq!(v.max(), Some(10));
    }

    #[test]
    fn mid_is_reliable_at_exactly_three() {
        let mut v = vec_of::<i32>();
        v.push(5).unwrap();
        v.push(1).unwrap();
        v.push(3).unwrap();
        assert_eq!(v.min(), Some(1));
        assert_eq!(v.max(), Some(5));
        assert_eq!(v.mid(), Some(3));
    }
}
