//! Atom Store
//!
//! The store is the explicit context object that owns all shared state: the
//! snapshot table, the subscription registry, and the host-binding flag.
//! There are no process-wide tables; construct as many independent stores as
//! the program needs and pass handles around by value.
//!
//! # Snapshots
//!
//! Values live behind `Rc`. A read hands out the current snapshot without
//! copying; a write builds a replacement from the old snapshot and swaps it
//! in whole. Nothing is ever mutated in place, which is what makes pointer
//! identity a sound cache key everywhere else in the crate.
//!
//! # Writes and Notification
//!
//! `swap` runs in two phases. Under the store's borrow it replaces the
//! snapshot and asks the registry which subscribers observe a change; after
//! releasing the borrow it fires the collected triggers. Triggers only
//! enqueue re-renders, so no user render code runs inside a write.
//!
//! The update function runs *outside* any borrow and may read the store.
//! Subscriber projections, in contrast, run during the commit while the
//! store is internally borrowed; they must be pure functions of their input,
//! and one that reaches back into the store will panic the borrow.
//!
//! # Concurrency
//!
//! Single-threaded by design: one store, its host runtime, and every
//! operation on them belong to one thread. Operations run to completion, so
//! "concurrent" writes are just consecutive writes. The only atomicity in
//! the crate is the process-wide id counter behind atom construction.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::atom::{Atom, AtomId};
use super::error::AtomError;
use super::registry::SubscriptionRegistry;
use super::state::StateTable;
use super::subscriber::{Subscriber, SubscriberId};

/// Owner of atoms, their snapshots, and their subscribers.
///
/// Clones share the same underlying store, the way channel handles do; use
/// clones to hand the store to hook closures and host runtimes.
///
/// # Example
///
/// ```rust,ignore
/// let store = AtomStore::new();
/// let todos = store.atom(vec!["write", "review"]);
///
/// store.swap(&todos, |list| {
///     let mut next = list.clone();
///     next.push("ship");
///     next
/// })?;
///
/// assert_eq!(store.with(&todos, |list| list.len())?, 3);
/// ```
pub struct AtomStore {
    inner: Rc<RefCell<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    state: StateTable,
    registry: SubscriptionRegistry,
    host_bound: bool,
}

impl AtomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner::default())),
        }
    }

    /// Construct a new atom holding `initial` and return its handle.
    ///
    /// The atom lives as long as the store; handles stay valid forever.
    pub fn atom<S: 'static>(&self, initial: S) -> Atom<S> {
        let id = AtomId::next();
        {
            let mut inner = self.inner.borrow_mut();
            inner.state.insert(id, Rc::new(initial));
            inner.registry.register_atom(id);
        }
        tracing::trace!(atom = id.raw(), "atom constructed");
        Atom::new(id)
    }

    /// Current snapshot of `atom`, without subscribing.
    ///
    /// The returned `Rc` is the live snapshot, not a copy; it stays valid
    /// (and unchanged) however many writes follow.
    pub fn read<S: 'static>(&self, atom: &Atom<S>) -> Result<Rc<S>, AtomError> {
        self.snapshot(atom)
    }

    /// Apply a borrowing projection to the current snapshot, without
    /// subscribing.
    pub fn with<S: 'static, R>(
        &self,
        atom: &Atom<S>,
        read: impl FnOnce(&S) -> R,
    ) -> Result<R, AtomError> {
        let value = self.snapshot(atom)?;
        Ok(read(&value))
    }

    /// Replace the value of `atom` with `update(current)` and notify the
    /// subscribers that observe a change.
    ///
    /// The update function receives the current snapshot and returns the
    /// full successor value. It runs outside the store's borrow, so reading
    /// other atoms from inside it is fine; writing is not reentrant.
    pub fn swap<S: 'static>(
        &self,
        atom: &Atom<S>,
        update: impl FnOnce(&S) -> S,
    ) -> Result<(), AtomError> {
        let before = self.snapshot(atom)?;
        let after: Rc<S> = Rc::new(update(&before));

        let before: Rc<dyn Any> = before;
        let after: Rc<dyn Any> = after;

        // Phase one: commit the snapshot and collect who noticed, under the
        // borrow. Phase two: fire triggers after releasing it.
        let to_fire = {
            let mut inner = self.inner.borrow_mut();
            inner.state.replace(atom.id(), Rc::clone(&after));
            inner.registry.triggers_for_change(atom.id(), &before, &after)
        };
        tracing::trace!(
            atom = atom.id().raw(),
            notified = to_fire.len(),
            "swap committed"
        );
        for trigger in to_fire {
            trigger.fire();
        }
        Ok(())
    }

    /// Replace the value of `atom` with `value` outright.
    ///
    /// Equivalent to a `swap` that ignores the current value.
    pub fn set<S: 'static>(&self, atom: &Atom<S>, value: S) -> Result<(), AtomError> {
        self.swap(atom, move |_| value)
    }

    /// Register a subscriber on `atom`, returning its id.
    ///
    /// This is the host-integration entry point; render code uses
    /// [`use_atom`](crate::host::use_atom()) instead, which manages the
    /// pairing with [`unsubscribe`](Self::unsubscribe) itself.
    pub fn subscribe(&self, atom: AtomId, subscriber: Subscriber) -> Result<SubscriberId, AtomError> {
        self.inner
            .borrow_mut()
            .registry
            .subscribe(atom, subscriber)
            .ok_or(AtomError::UnknownAtom(atom))
    }

    /// Swap the subscriber stored under `id`, keeping the id and its
    /// position in the notification order.
    pub fn replace_subscriber(
        &self,
        atom: AtomId,
        id: SubscriberId,
        subscriber: Subscriber,
    ) -> Result<(), AtomError> {
        if self.inner.borrow_mut().registry.replace(atom, id, subscriber) {
            Ok(())
        } else {
            Err(AtomError::UnknownAtom(atom))
        }
    }

    /// Remove the subscriber registered under `id`.
    ///
    /// Removing an id that is already gone is a no-op; only an unknown atom
    /// is an error.
    pub fn unsubscribe(&self, atom: AtomId, id: SubscriberId) -> Result<(), AtomError> {
        self.inner
            .borrow_mut()
            .registry
            .unsubscribe(atom, id)
            .map(|_| ())
            .ok_or(AtomError::UnknownAtom(atom))
    }

    /// Number of atoms constructed in this store.
    pub fn atom_count(&self) -> usize {
        self.inner.borrow().state.len()
    }

    /// Number of live subscribers on `atom`.
    pub fn subscriber_count(&self, atom: AtomId) -> Result<usize, AtomError> {
        self.inner
            .borrow()
            .registry
            .subscriber_count(atom)
            .ok_or(AtomError::UnknownAtom(atom))
    }

    /// Live subscriber ids on `atom`, in notification order. Diagnostics.
    pub fn subscriber_ids(&self, atom: AtomId) -> Result<Vec<SubscriberId>, AtomError> {
        self.inner
            .borrow()
            .registry
            .subscriber_ids(atom)
            .ok_or(AtomError::UnknownAtom(atom))
    }

    /// Claim this store for a host runtime.
    pub(crate) fn bind_host(&self) -> Result<(), AtomError> {
        let mut inner = self.inner.borrow_mut();
        if inner.host_bound {
            return Err(AtomError::HostBindingActive);
        }
        inner.host_bound = true;
        tracing::debug!("host binding acquired");
        Ok(())
    }

    /// Release the host claim so another runtime may bind.
    pub(crate) fn release_host(&self) {
        self.inner.borrow_mut().host_bound = false;
        tracing::debug!("host binding released");
    }

    /// Resolve a typed handle to its current snapshot.
    fn snapshot<S: 'static>(&self, atom: &Atom<S>) -> Result<Rc<S>, AtomError> {
        let inner = self.inner.borrow();
        let value = inner
            .state
            .get(atom.id())
            .ok_or(AtomError::UnknownAtom(atom.id()))?;
        Rc::clone(value)
            .downcast::<S>()
            .map_err(|_| AtomError::UnknownAtom(atom.id()))
    }
}

impl Clone for AtomStore {
    /// Clones share the same underlying store.
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Default for AtomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AtomStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("AtomStore")
            .field("atoms", &inner.state.len())
            .field("host_bound", &inner.host_bound)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
