//! Projection Memoization
//!
//! A `MemoLast` caches the most recent projection result, keyed by the
//! pointer identity of the snapshot it was computed from.
//!
//! # Why Depth One
//!
//! Snapshots are immutable and replaced wholesale on every write, so a
//! projection's output can only change when the snapshot pointer changes.
//! Remembering exactly one `(input, output)` pair is therefore enough to
//! absorb every repeated read between writes, and the cache can never grow.
//!
//! # Usage
//!
//! Subscribing reads keep one `MemoLast` per hook slot (repeated renders of
//! an unchanged atom reuse the cached projection), and each projected
//! subscriber keeps its own (change detection re-projects only on new
//! snapshots).

use std::fmt;
use std::rc::Rc;

/// Cache of the last projection call.
///
/// `S` is the snapshot type the projection reads, `R` its output. The
/// projection itself is passed to [`MemoLast::call`] so the cache stays a
/// plain value with no closure inside.
pub struct MemoLast<S, R> {
    cached: Option<(Rc<S>, R)>,
}

impl<S, R> MemoLast<S, R> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self { cached: None }
    }

    /// Drop the cached pair, forcing the next call to recompute.
    ///
    /// Used when the projection the cache was built for is replaced.
    pub fn clear(&mut self) {
        self.cached = None;
    }

    /// Check if the cache currently holds a value.
    pub fn has_value(&self) -> bool {
        self.cached.is_some()
    }
}

impl<S, R: Clone> MemoLast<S, R> {
    /// Apply `project` to `input`, reusing the cached output when `input` is
    /// pointer-identical to the previous call's input.
    pub fn call(&mut self, input: &Rc<S>, project: fn(&S) -> R) -> R {
        if let Some((cached_input, cached_output)) = &self.cached {
            if Rc::ptr_eq(cached_input, input) {
                return cached_output.clone();
            }
        }

        let output = project(input);
        self.cached = Some((Rc::clone(input), output.clone()));
        output
    }
}

impl<S, R> Default for MemoLast<S, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, R> fmt::Debug for MemoLast<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoLast")
            .field("has_value", &self.has_value())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
