// SPDX-License-Identifier: MIT
//! Pool of raw backing buffers, bucketed by power-of-two size
//!
//! This is the allocator the recursive bucket pipeline rents its working
//! storage from: every bucket formed at every recursion depth asks the pool
//! for a buffer instead of going straight to the global allocator, so that
//! storage is recycled across the many small-to-medium allocations a single
//! sort's recursion produces rather than round-tripping through
//! `malloc`/`free` for each one. A pool is owned by one top-level call and
//! dropped with it; it is not a process-wide singleton.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::Error;

/// The pool's largest bucket, in elements
///
/// Requests above this fall through to direct allocation and are released
/// directly on return rather than recycled.
const MAX_BUCKET_CAPACITY: usize = 0x4000_0000;

/// de Bruijn sequence for 32-bit count-leading-zeros via a multiply-and-shift
const DEBRUIJN32: [u8; 32] = [
    0, 31, 9, 30, 3, 8, 13, 29, 2, 5, 7, 21, 12, 24, 28, 19, 1, 10, 4, 14, 6, 22, 25, 20, 11, 15,
    23, 26, 16, 27, 17, 18,
];

fn clz32(mut x: u32) -> u32 {
    x |= x >> 1;
    x |= x >> 2;
    x |= x >> 4;
    x |= x >> 8;
    x |= x >> 16;
    x = x.wrapping_add(1);
    DEBRUIJN32[((x.wrapping_mul(0x076b_e629)) >> 27) as usize] as u32
}

/// Select the bucket index a request of `size` elements falls into
fn select_bucket_index(size: usize) -> usize {
    if size <= 16 {
        return 0;
    }
    let bits = ((size - 1) >> 4) as u32;
    (32 - clz32(bits)) as usize
}

/// The capacity (in elements) of the buffers held by bucket `index`
fn bucket_capacity(index: usize) -> usize {
    16usize << index
}

/// A single free-list of same-capacity buffers
struct Bucket<T> {
    capacity: usize,
    free: Vec<NonNull<T>>,
}

/// Per-element-type pool of raw, uninitialized buffers
///
/// Buffers rented from this pool are *uninitialized* -- callers own the
/// responsibility of constructing and destructing the elements they place
/// into a rented buffer before returning it. This mirrors the reference's
/// `rentArray`/`returnArray` contract exactly (see
/// `array_pool.h`/`array_pool_bucket.h`).
pub(crate) struct ArrayPool<T> {
    buckets: Vec<Bucket<T>>,
    destroying: bool,
}

impl<T> ArrayPool<T> {
    /// Create an empty pool
    ///
    /// A pool is cheap to create and has no background state, so the engine
    /// creates one per top-level call and threads it through the whole
    /// recursive pipeline rather than reaching for a process-wide singleton:
    /// its lifetime is simply tied to the call that owns it, which sidesteps
    /// any static-destruction ordering hazard between the pool and buffers
    /// still held by live vectors at the point the pool itself would be torn
    /// down.
    pub(crate) fn new() -> Self {
        let max_index = select_bucket_index(MAX_BUCKET_CAPACITY);
        let buckets = (0..=max_index)
            .map(|i| Bucket {
                capacity: bucket_capacity(i),
                free: Vec::new(),
            })
            .collect();
        Self {
            buckets,
            destroying: false,
        }
    }

    /// Rent a buffer able to hold at least `size` elements
    ///
    /// Returns the buffer together with its actual capacity, which is
    /// always `>= size` and which the caller must adopt as its notion of
    /// the buffer's capacity (growth policies size buffers up to the next
    /// pool bucket, not exactly to `size`).
    pub(crate) fn rent(&mut self, size: usize) -> Result<(NonNull<T>, usize), Error> {
        let index = select_bucket_index(size);

        if let Some(bucket) = self.buckets.get_mut(index) {
            let capacity = bucket.capacity;
            if let Some(ptr) = bucket.free.pop() {
                return Ok((ptr, capacity));
            }
            let layout = Self::layout_for(capacity)?;
            let ptr = unsafe { alloc::alloc(layout) } as *mut T;
            return NonNull::new(ptr)
                .map(|p| (p, capacity))
                .ok_or(Error::PoolExhaustion(layout));
        }

        // Above the pool's largest bucket: allocate exactly `size`, to be
        // released directly (not pooled) on return.
        let layout = Self::layout_for(size)?;
        let ptr = unsafe { alloc::alloc(layout) } as *mut T;
        NonNull::new(ptr)
            .map(|p| (p, size))
            .ok_or(Error::PoolExhaustion(layout))
    }

    /// Return a buffer of the given `capacity` to the pool
    ///
    /// A no-op once the pool has begun tearing down: outstanding buffers are
    /// simply leaked to the allocator's teardown rather than pushed onto a
    /// free list that is about to be dropped anyway.
    ///
    /// # Safety
    ///
    /// `ptr` must have been rented from this pool with exactly `capacity`,
    /// and must not be used again afterwards.
    pub(crate) unsafe fn give_back(&mut self, ptr: NonNull<T>, capacity: usize) {
        if self.destroying {
            return;
        }

        let index = select_bucket_index(capacity);
        if let Some(bucket) = self.buckets.get_mut(index) {
            debug_assert_eq!(bucket.capacity, capacity);
            bucket.free.push(ptr);
        } else if let Ok(layout) = Self::layout_for(capacity) {
            alloc::dealloc(ptr.as_ptr() as *mut u8, layout);
        }
    }

    fn layout_for(capacity: usize) -> Result<Layout, Error> {
        Layout::array::<T>(capacity).map_err(|_| Error::PoolExhaustion(Layout::new::<T>()))
    }
}

impl<T> Drop for ArrayPool<T> {
    fn drop(&mut self) {
        self.destroying = true;
        for bucket in &mut self.buckets {
            let layout = match Self::layout_for(bucket.capacity) {
                Ok(layout) => layout,
                Err(_) => continue,
            };
            for ptr in bucket.free.drain(..) {
                unsafe { alloc::dealloc(ptr.as_ptr() as *mut u8, layout) };
            }
        }
    }
}
