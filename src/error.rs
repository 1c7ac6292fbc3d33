// SPDX-License-Identifier: MIT
//! Types and utilities related to error handling and reporting

use std::alloc::Layout;
use std::error::Error as StdError;
use std::fmt;


/// Errors that can surface from the allocation-dependent parts of the engine
///
/// Per the engine's error taxonomy, an empty or single-element input is a
/// successful no-op, not an error (see [`sort`](super::sort)), so there is
/// no "nothing to do" variant here. Every variant below is fatal and
/// unrecoverable; the engine otherwise prefers panics (`unreachable!`,
/// `assert!`) for programming-error conditions such as popping an empty
/// heap, since those indicate a broken invariant in the engine itself
/// rather than a recoverable input problem.
#[derive(Debug)]
pub enum Error {
    /// The array pool's direct-allocation fallback failed
    ///
    /// This surfaces only when a requested buffer exceeds the pool's
    /// largest bucket and the subsequent direct allocation via the global
    /// allocator also fails.
    PoolExhaustion(Layout),
}

impl StdError for Error {}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PoolExhaustion(layout) => write!(
                fmt,
                "failed to allocate {} bytes (align {})",
                layout.size(),
                layout.align(),
            ),
        }
    }
}
