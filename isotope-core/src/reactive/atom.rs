//! Atom Handles
//!
//! An `Atom<S>` is a small copyable handle naming one piece of shared state
//! of type `S`. The handle carries no data and holds nothing alive; the value
//! it names lives in the [`AtomStore`](super::AtomStore) that constructed it.
//!
//! # Identity
//!
//! Ids are allocated from a process-wide counter, so no two atoms ever share
//! an id, even across stores. Presenting a handle to a store that did not
//! construct it is detected by the id lookup and reported as an error, never
//! as another atom's value.
//!
//! The `S` parameter ties the handle to its value type through a
//! `PhantomData<fn() -> S>`, which keeps `Atom<S>` `Copy`, `Send`-neutral,
//! and free of any bound on `S`.

use std::any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique atom IDs.
static ATOM_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique atom ID.
fn next_atom_id() -> u64 {
    ATOM_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Untyped identifier of an atom.
///
/// This is the key under which the store's tables file the atom's value and
/// subscribers. Host integrations that do not need the value type (such as
/// unsubscribe paths) work with `AtomId` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(u64);

impl AtomId {
    /// Allocate the next process-unique id.
    pub(crate) fn next() -> Self {
        Self(next_atom_id())
    }

    /// The raw numeric id.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed handle to one atom in a store.
///
/// Handles are plain values: copy them into closures, collect them, send
/// them through component trees. Reading or writing always goes through the
/// owning store, which is also what keeps the value alive.
///
/// # Example
///
/// ```rust,ignore
/// let store = AtomStore::new();
/// let count: Atom<i32> = store.atom(0);
///
/// store.set(&count, 5)?;
/// assert_eq!(*store.read(&count)?, 5);
/// ```
pub struct Atom<S> {
    id: AtomId,
    marker: PhantomData<fn() -> S>,
}

impl<S> Atom<S> {
    /// Create a handle for an id the store just allocated.
    pub(crate) fn new(id: AtomId) -> Self {
        Self {
            id,
            marker: PhantomData,
        }
    }

    /// The atom's untyped id.
    pub fn id(&self) -> AtomId {
        self.id
    }
}

// The derives would put bounds on `S`; handles are id-only, so implement by
// hand.

impl<S> Clone for Atom<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Atom<S> {}

impl<S> PartialEq for Atom<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S> Eq for Atom<S> {}

impl<S> Hash for Atom<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<S> fmt::Debug for Atom<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("id", &self.id)
            .field("type", &any::type_name::<S>())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
