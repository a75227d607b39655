//! Error Types
//!
//! Every fallible operation in the crate reports one of these variants
//! directly to the caller. Failures are never retried, downgraded to logs,
//! or deferred; a failed read or write leaves the store untouched.

use thiserror::Error;

use super::atom::AtomId;

/// Errors reported by store and hook operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AtomError {
    /// The handle was not created by this store.
    ///
    /// Ids are process-unique, so a handle constructed by one store never
    /// resolves against another. The operation fails before reading or
    /// mutating anything.
    #[error("atom {0} is not registered with this store")]
    UnknownAtom(AtomId),

    /// A hook ran with no rendering unit on the scope stack.
    ///
    /// Subscribing reads and the other hook functions only make sense while
    /// a unit is rendering; use [`AtomStore::read`](super::AtomStore::read)
    /// for plain reads.
    #[error("subscribing read called outside of a rendering unit")]
    OutsideRenderScope,

    /// The store already has a live host runtime bound to it.
    ///
    /// A store accepts at most one runtime at a time; drop the existing one
    /// before binding another.
    #[error("store already has an active host binding")]
    HostBindingActive,
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
