//! Subscribing Reads
//!
//! `use_atom` and `use_atom_select` are the bridge between the store and a
//! rendering unit: they return the current snapshot the way
//! [`AtomStore::read`](crate::reactive::AtomStore::read) does, and
//! additionally subscribe the unit, so later visible changes queue a
//! re-render.
//!
//! # Subscription Lifecycle
//!
//! The subscription is taken once, after the unit's first render commits,
//! and released when the unit unmounts. Re-renders reuse the existing
//! subscription; `use_atom_select` swaps in the new projection in place when
//! the call site passes a different function, keeping the subscriber's id
//! and notification position.
//!
//! # Change Visibility
//!
//! `use_atom` wakes the unit when the new snapshot is not shallow-equal to
//! the old one. `use_atom_select` projects both snapshots first and compares
//! the projections, so writes that the projection cannot see never wake the
//! unit.

use std::rc::Rc;

use super::scope::{current_scope, use_effect, use_hook, Cleanup};
use crate::reactive::{Atom, AtomError, MemoLast, ShallowEq, Subscriber, SubscriberId};

/// Hook slot backing [`use_atom`].
struct AtomSlot {
    subscriber: Option<SubscriberId>,
}

/// Hook slot backing [`use_atom_select`].
struct SelectSlot<S, R> {
    select: fn(&S) -> R,
    memo: MemoLast<S, R>,
    subscriber: Option<SubscriberId>,
}

/// Read an atom's snapshot and subscribe the current unit to it.
///
/// Returns [`AtomError::OutsideRenderScope`] when called off the render
/// stack and [`AtomError::UnknownAtom`] when `atom` belongs to a different
/// store; neither leaves a subscription behind.
pub fn use_atom<S>(atom: &Atom<S>) -> Result<Rc<S>, AtomError>
where
    S: ShallowEq + 'static,
{
    let scope = current_scope()?;
    let (store, trigger) = {
        let scope = scope.borrow();
        (scope.store(), scope.trigger())
    };

    // Read before touching any slot so a failed read is side-effect free.
    let value = store.read(atom)?;

    let slot = use_hook(|| AtomSlot { subscriber: None })?;

    let atom_id = atom.id();
    {
        let slot = Rc::clone(&slot);
        let store = store.clone();
        use_effect((), move || {
            let id = store
                .subscribe(atom_id, Subscriber::new::<S>(trigger))
                .expect("atom vanished from its store");
            slot.borrow_mut().subscriber = Some(id);

            let slot = Rc::clone(&slot);
            let cleanup: Cleanup = Box::new(move || {
                if let Some(id) = slot.borrow_mut().subscriber.take() {
                    let _ = store.unsubscribe(atom_id, id);
                }
            });
            Some(cleanup)
        })?;
    }

    Ok(value)
}

/// Read a projection of an atom and subscribe the current unit to it.
///
/// `select` must be a plain function (or non-capturing closure); it is the
/// unit of both memoization and change detection. The projection runs at
/// most once per distinct snapshot, and the unit re-renders only when the
/// projected value visibly changes.
pub fn use_atom_select<S, R>(atom: &Atom<S>, select: fn(&S) -> R) -> Result<R, AtomError>
where
    S: 'static,
    R: Clone + ShallowEq + 'static,
{
    let scope = current_scope()?;
    let (store, trigger) = {
        let scope = scope.borrow();
        (scope.store(), scope.trigger())
    };

    let value = store.read(atom)?;

    let slot = use_hook(|| SelectSlot {
        select,
        memo: MemoLast::new(),
        subscriber: None,
    })?;

    // A different projection at the same call position replaces the old
    // one; the stale cache entry goes with it.
    let selected = {
        let mut slot = slot.borrow_mut();
        if slot.select != select {
            slot.select = select;
            slot.memo.clear();
        }
        let project = slot.select;
        slot.memo.call(&value, project)
    };

    let atom_id = atom.id();
    {
        let slot = Rc::clone(&slot);
        let store = store.clone();
        use_effect(select, move || {
            let subscriber = Subscriber::new_select(trigger, select);
            let previous = slot.borrow().subscriber;
            let id = match previous {
                // Keep the id and notification position across projection
                // changes.
                Some(id) => {
                    store
                        .replace_subscriber(atom_id, id, subscriber)
                        .expect("atom vanished from its store");
                    id
                }
                None => store
                    .subscribe(atom_id, subscriber)
                    .expect("atom vanished from its store"),
            };
            slot.borrow_mut().subscriber = Some(id);

            let slot = Rc::clone(&slot);
            let cleanup: Cleanup = Box::new(move || {
                if let Some(id) = slot.borrow_mut().subscriber.take() {
                    let _ = store.unsubscribe(atom_id, id);
                }
            });
            Some(cleanup)
        })?;
    }

    Ok(selected)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
