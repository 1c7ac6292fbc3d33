// SPDX-License-Identifier: MIT
//! Contiguous sequences backed by [`ArrayPool`](crate::pool::ArrayPool) storage
//!
//! Two variants: [`PooledVec`], an eager push/pop vector, and [`LazyPooledVec`],
//! a fixed-size buffer that default-initializes a slot only on first touch.
//! Both rent and return whole buffers from a shared pool rather than going to
//! the global allocator on every grow.

use std::cell::RefCell;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::error::Error;
use crate::pool::ArrayPool;

/// The smallest buffer a [`PooledVec`] ever rents
const MIN_CAPACITY: usize = 16;

/// A `Vec`-like sequence whose backing storage comes from a shared [`ArrayPool`]
///
/// Elements are required to be `Copy`: every value this crate ever stores in
/// one (numeric elements and the small bucket-entry wrappers around them) is
/// trivially copyable, so the trivial/non-trivial split the pool-backed
/// vector this is modeled on performs collapses here to the always-trivial,
/// `memcpy`-equivalent path.
pub(crate) struct PooledVec<T: Copy> {
    pool: Rc<RefCell<ArrayPool<T>>>,
    ptr: Option<NonNull<T>>,
    len: usize,
    cap: usize,
}

impl<T: Copy> PooledVec<T> {
    pub(crate) fn new(pool: Rc<RefCell<ArrayPool<T>>>) -> Self {
        Self {
            pool,
            ptr: None,
            len: 0,
            cap: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn get(&self, index: usize) -> T {
        assert!(index < self.len, "index out of bounds");
        unsafe { *self.ptr.unwrap_unchecked().as_ptr().add(index) }
    }

    pub(crate) fn set(&mut self, index: usize, value: T) {
        assert!(index < self.len, "index out of bounds");
        unsafe { *self.ptr.unwrap_unchecked().as_ptr().add(index) = value };
    }

    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let va = self.get(a);
        let vb = self.get(b);
        self.set(a, vb);
        self.set(b, va);
    }

    pub(crate) fn push(&mut self, value: T) -> Result<(), Error> {
        if self.len == self.cap {
            let new_capacity = (2 * self.cap).max(MIN_CAPACITY);
            self.grow(new_capacity)?;
        }
        unsafe { *self.ptr.unwrap_unchecked().as_ptr().add(self.len) = value };
        self.len += 1;
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.get(self.len))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    /// Grow the logical length to `len` without writing anything into the
    /// newly exposed slots.
    ///
    /// # Safety
    ///
    /// The caller must not read a slot at or beyond the old length before
    /// writing to it first -- this is how [`LazyPooledVec`] gets a genuinely
    /// lazy backing store out of an otherwise eager vector.
    pub(crate) fn reserve_uninit(&mut self, len: usize) -> Result<(), Error> {
        if len > self.cap {
            self.grow(len)?;
        }
        self.len = len;
        Ok(())
    }

    fn grow(&mut self, min_capacity: usize) -> Result<(), Error> {
        let mut pool = self.pool.borrow_mut();
        let (new_ptr, new_cap) = pool.rent(min_capacity)?;
        if let Some(old_ptr) = self.ptr {
            unsafe {
                std::ptr::copy_nonoverlapping(old_ptr.as_ptr(), new_ptr.as_ptr(), self.len);
                pool.give_back(old_ptr, self.cap);
            }
        }
        self.ptr = Some(new_ptr);
        self.cap = new_cap;
        Ok(())
    }
}

impl<T: Copy> Drop for PooledVec<T> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            unsafe { self.pool.borrow_mut().give_back(ptr, self.cap) };
        }
    }
}

/// A fixed-size sequence that default-constructs each slot on first touch
///
/// Intended for sparse arrays sized to the upper bound of possible indices,
/// where most slots never get written: the bitmap lets a reader distinguish
/// "never touched" from "touched and holds the default value" without paying
/// to initialize every slot up front. `with_len` only reserves storage --
/// nothing is written until [`set`](Self::set) or
/// [`get_or_init`](Self::get_or_init) actually touches a slot, which is what
/// makes this genuinely lazy rather than an eagerly-filled vector wearing a
/// bitmap.
///
/// This is the right shape for a sparse array of plain `Copy` values (e.g. a
/// per-bucket-index tally or representative element); it cannot hold
/// [`MinMaxHeap`](crate::heap::MinMaxHeap)-style owning buckets, since those
/// manage a rented buffer on `Drop` and so can never be `Copy` -- the
/// recursive pipeline's own lazy bucket array is a plain
/// `Vec<Option<MinMaxHeap<I>>>` for exactly this reason (see `engine.rs`).
pub(crate) struct LazyPooledVec<T: Copy + Default> {
    storage: PooledVec<T>,
    initialized: Vec<bool>,
}

impl<T: Copy + Default> LazyPooledVec<T> {
    pub(crate) fn with_len(pool: Rc<RefCell<ArrayPool<T>>>, len: usize) -> Result<Self, Error> {
        let mut storage = PooledVec::new(pool);
        storage.reserve_uninit(len)?;
        Ok(Self {
            storage,
            initialized: vec![false; len],
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.storage.len()
    }

    pub(crate) fn has_value(&self, index: usize) -> bool {
        self.initialized[index]
    }

    /// Read a touched slot.
    ///
    /// Panics (in debug builds) if `index` was never written via
    /// [`set`](Self::set) or [`get_or_init`](Self::get_or_init) -- unlike
    /// the eager [`PooledVec`], a slot here holds no meaningful value until
    /// it has actually been touched once.
    pub(crate) fn get(&self, index: usize) -> T {
        debug_assert!(self.initialized[index], "read of an untouched lazy slot");
        self.storage.get(index)
    }

    pub(crate) fn set(&mut self, index: usize, value: T) {
        self.storage.set(index, value);
        self.initialized[index] = true;
    }

    /// Read a slot, default-constructing and marking it initialized if this
    /// is the first touch
    pub(crate) fn get_or_init(&mut self, index: usize) -> T {
        if !self.initialized[index] {
            self.storage.set(index, T::default());
            self.initialized[index] = true;
        }
        self.storage.get(index)
    }
}
