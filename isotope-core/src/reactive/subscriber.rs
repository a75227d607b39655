//! Subscribers and Triggers
//!
//! A `Subscriber` is one registered observer of one atom: a re-render
//! capability (the `Trigger`) paired with a change predicate built from the
//! projection the observer reads through.
//!
//! # Change Detection
//!
//! The predicate is constructed where the value types are still known
//! (`new` for whole-value observers, `new_select` for projected ones) and
//! captures the typed comparison in a boxed closure. The registry that
//! stores subscribers stays fully type-erased: it hands the predicate the
//! old and new snapshots as `Rc<dyn Any>` and gets back a plain bool.
//!
//! A projected subscriber carries its own [`MemoLast`], so deciding "did my
//! slice of the state change" re-runs the projection only for snapshots it
//! has not seen.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::memo::MemoLast;
use super::shallow::ShallowEq;

/// A unit's request-re-render capability.
///
/// Firing a trigger asks the host to re-render the owning unit; it never
/// renders synchronously and is safe to fire from any non-render code on
/// the owning thread. Clones share identity.
pub struct Trigger {
    notify: Rc<dyn Fn()>,
}

impl Trigger {
    /// Create a trigger from a notification callback.
    pub fn new(notify: impl Fn() + 'static) -> Self {
        Self {
            notify: Rc::new(notify),
        }
    }

    /// Ask the owning unit to re-render.
    pub fn fire(&self) {
        (self.notify)();
    }

    /// Check whether two triggers share the same callback.
    pub fn ptr_eq(a: &Trigger, b: &Trigger) -> bool {
        Rc::ptr_eq(&a.notify, &b.notify)
    }
}

impl Clone for Trigger {
    fn clone(&self) -> Self {
        Self {
            notify: Rc::clone(&self.notify),
        }
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger").finish_non_exhaustive()
    }
}

/// Identifier of one subscriber entry, scoped to its atom.
///
/// Ids count up from zero per atom and are never reused, so an id observed
/// after an unsubscribe always names a strictly newer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw per-atom sequence number.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Change predicate over type-erased snapshots.
type ChangePredicate = Box<dyn FnMut(&Rc<dyn Any>, &Rc<dyn Any>) -> bool>;

/// One registered observer of one atom.
pub struct Subscriber {
    trigger: Trigger,
    changed: ChangePredicate,
}

impl Subscriber {
    /// Observer of the whole value: notified unless old and new snapshots
    /// are shallow-equal.
    pub fn new<S>(trigger: Trigger) -> Self
    where
        S: ShallowEq + 'static,
    {
        let changed: ChangePredicate = Box::new(move |old, new| {
            match (old.downcast_ref::<S>(), new.downcast_ref::<S>()) {
                (Some(before), Some(after)) => !before.shallow_eq(after),
                // Snapshot type drift is unreachable through the typed API.
                _ => true,
            }
        });

        Self { trigger, changed }
    }

    /// Observer of a projection: notified unless the projected views of the
    /// old and new snapshots are shallow-equal.
    pub fn new_select<S, R>(trigger: Trigger, select: fn(&S) -> R) -> Self
    where
        S: 'static,
        R: Clone + ShallowEq + 'static,
    {
        let mut memo = MemoLast::new();
        let changed: ChangePredicate = Box::new(move |old, new| {
            let (Ok(before), Ok(after)) = (
                Rc::clone(old).downcast::<S>(),
                Rc::clone(new).downcast::<S>(),
            ) else {
                return true;
            };

            let projected_before = memo.call(&before, select);
            let projected_after = memo.call(&after, select);
            !projected_before.shallow_eq(&projected_after)
        });

        Self { trigger, changed }
    }

    /// The subscriber's re-render capability.
    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Evaluate the change predicate for a committed write.
    pub(crate) fn should_notify(&mut self, old: &Rc<dyn Any>, new: &Rc<dyn Any>) -> bool {
        (self.changed)(old, new)
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
