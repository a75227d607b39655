//! Subscription Registry
//!
//! Bookkeeping for who observes what. Each atom owns an ordered table of
//! subscribers plus a monotonically increasing id counter.
//!
//! # Ordering
//!
//! Subscribers are enumerated in registration order on every notification
//! walk. Removal uses `shift_remove` so the survivors keep their relative
//! order, and replacement writes over the existing key in place, keeping
//! both the id and the position.
//!
//! # Id Reuse
//!
//! There is none. The per-atom counter only ever increments, so an id
//! observed after an unsubscribe always belongs to a strictly newer
//! registration. Stale unsubscribes (the id is already gone) are no-ops.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::atom::AtomId;
use super::subscriber::{Subscriber, SubscriberId, Trigger};

/// Triggers collected by one notification walk.
///
/// Four inline slots cover the common fan-out without allocating.
pub(crate) type TriggerSet = SmallVec<[Trigger; 4]>;

#[derive(Debug, Default)]
pub(crate) struct SubscriptionRegistry {
    atoms: HashMap<AtomId, AtomSubscribers>,
}

/// Per-atom subscriber table and id counter.
#[derive(Debug, Default)]
struct AtomSubscribers {
    next_id: u64,
    entries: IndexMap<SubscriberId, Subscriber>,
}

impl SubscriptionRegistry {
    /// Give a freshly constructed atom its empty table and zeroed counter.
    pub(crate) fn register_atom(&mut self, atom: AtomId) {
        self.atoms.entry(atom).or_default();
    }

    /// Add a subscriber, returning its new id. `None` if the atom id is not
    /// from this registry.
    pub(crate) fn subscribe(&mut self, atom: AtomId, subscriber: Subscriber) -> Option<SubscriberId> {
        let slot = self.atoms.get_mut(&atom)?;
        let id = SubscriberId::new(slot.next_id);
        slot.next_id += 1;
        slot.entries.insert(id, subscriber);
        tracing::trace!(atom = atom.raw(), subscriber = id.raw(), "subscriber added");
        Some(id)
    }

    /// Swap the subscriber stored under an existing id. Insert over a live
    /// key keeps its position, so enumeration order is unchanged. `false` if
    /// the atom id is not from this registry.
    pub(crate) fn replace(&mut self, atom: AtomId, id: SubscriberId, subscriber: Subscriber) -> bool {
        match self.atoms.get_mut(&atom) {
            Some(slot) => {
                slot.entries.insert(id, subscriber);
                tracing::trace!(atom = atom.raw(), subscriber = id.raw(), "subscriber replaced");
                true
            }
            None => false,
        }
    }

    /// Remove a subscriber. `Some(removed)` tells whether the id was still
    /// live; `None` means the atom id is not from this registry.
    pub(crate) fn unsubscribe(&mut self, atom: AtomId, id: SubscriberId) -> Option<bool> {
        let slot = self.atoms.get_mut(&atom)?;
        // shift_remove keeps the survivors in registration order.
        let removed = slot.entries.shift_remove(&id).is_some();
        if removed {
            tracing::trace!(atom = atom.raw(), subscriber = id.raw(), "subscriber removed");
        }
        Some(removed)
    }

    /// Number of live subscribers on `atom`.
    pub(crate) fn subscriber_count(&self, atom: AtomId) -> Option<usize> {
        self.atoms.get(&atom).map(|slot| slot.entries.len())
    }

    /// Live subscriber ids on `atom`, in registration order.
    pub(crate) fn subscriber_ids(&self, atom: AtomId) -> Option<Vec<SubscriberId>> {
        self.atoms
            .get(&atom)
            .map(|slot| slot.entries.keys().copied().collect())
    }

    /// Run every subscriber's change predicate against a committed write and
    /// collect the triggers that should fire, in registration order.
    ///
    /// The caller fires them after releasing its borrow of the store, so a
    /// trigger can safely reach back into the runtime.
    pub(crate) fn triggers_for_change(
        &mut self,
        atom: AtomId,
        old: &Rc<dyn Any>,
        new: &Rc<dyn Any>,
    ) -> TriggerSet {
        let mut to_fire = TriggerSet::new();
        if let Some(slot) = self.atoms.get_mut(&atom) {
            for (id, subscriber) in slot.entries.iter_mut() {
                if subscriber.should_notify(old, new) {
                    tracing::trace!(
                        atom = atom.raw(),
                        subscriber = id.raw(),
                        "subscriber marked for notify"
                    );
                    to_fire.push(subscriber.trigger().clone());
                }
            }
        }
        to_fire
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
