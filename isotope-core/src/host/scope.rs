//! Rendering Scopes
//!
//! A scope is the per-unit bookkeeping that makes the hook functions work:
//! positional state slots, keyed post-commit effects, and the unit's
//! re-render trigger.
//!
//! # Hook Discipline
//!
//! Slots are addressed by call position. Every render of a unit must call
//! the same hooks in the same order; a slot whose type changes between
//! renders is a programming error and panics with the offending position.
//!
//! # Effects
//!
//! `use_effect` queues its closure during render; the runtime runs the queue
//! after the render commits. An effect re-runs only when its key changes,
//! and its returned cleanup is stored, not chained: a re-run replaces the
//! previous cleanup without invoking it. Cleanups run exactly once, when the
//! unit unmounts.
//!
//! # The Scope Stack
//!
//! A thread-local stack names the unit currently rendering, which is what
//! gives the hook functions (and the subscribing reads built on them) their
//! implicit context. Off the stack, every hook reports
//! [`AtomError::OutsideRenderScope`].

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::reactive::{AtomError, AtomStore, Trigger};

/// The scope stack.
///
/// Each thread tracks its own rendering unit, so no synchronization is
/// involved; re-render requests from other places go through triggers
/// instead.
thread_local! {
    static SCOPE_STACK: RefCell<Vec<Rc<RefCell<ScopeState>>>> = RefCell::new(Vec::new());
}

/// Identifier for a mounted rendering unit, scoped to its runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw per-runtime sequence number.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Teardown closure returned by an effect.
pub type Cleanup = Box<dyn FnOnce()>;

/// Shared slot holding an effect's pending cleanup.
type CleanupCell = Rc<RefCell<Option<Cleanup>>>;

/// Mutable state of one mounted rendering unit.
pub(crate) struct ScopeState {
    id: ScopeId,
    store: AtomStore,
    trigger: Trigger,
    /// Hook slots in call order; each holds an `Rc<RefCell<T>>`.
    slots: Vec<Rc<dyn Any>>,
    /// Next slot to hand out during the current render.
    cursor: usize,
    /// Effects queued by the current render, awaiting commit.
    pending: Vec<PendingEffect>,
    /// Cleanup cells in slot-creation order, for unmount.
    cleanups: Vec<CleanupCell>,
}

/// An effect queued during render, committed by the runtime afterwards.
pub(crate) struct PendingEffect {
    run: Box<dyn FnOnce() -> Option<Cleanup>>,
    cell: CleanupCell,
}

impl PendingEffect {
    /// Run the effect and store its cleanup.
    ///
    /// Whatever cleanup the cell held before is dropped unrun; cleanups fire
    /// at unmount, not between runs.
    pub(crate) fn commit(self) {
        let cleanup = (self.run)();
        *self.cell.borrow_mut() = cleanup;
    }
}

/// Hook slot backing `use_effect`.
struct EffectSlot<K> {
    key: Option<K>,
    cell: CleanupCell,
}

impl ScopeState {
    pub(crate) fn new(id: ScopeId, store: AtomStore, trigger: Trigger) -> Self {
        Self {
            id,
            store,
            trigger,
            slots: Vec::new(),
            cursor: 0,
            pending: Vec::new(),
            cleanups: Vec::new(),
        }
    }

    pub(crate) fn id(&self) -> ScopeId {
        self.id
    }

    /// Handle to the store this unit renders against.
    pub(crate) fn store(&self) -> AtomStore {
        self.store.clone()
    }

    /// The unit's re-render capability.
    pub(crate) fn trigger(&self) -> Trigger {
        self.trigger.clone()
    }

    /// Reset the slot cursor for a fresh render pass.
    pub(crate) fn begin_render(&mut self) {
        debug_assert!(
            self.pending.is_empty(),
            "effects from a previous render were never committed"
        );
        self.cursor = 0;
    }

    /// Drain the effects queued by the render that just finished.
    pub(crate) fn take_pending(&mut self) -> Vec<PendingEffect> {
        std::mem::take(&mut self.pending)
    }

    /// Drain the cleanup cells for unmount, in slot-creation order.
    pub(crate) fn take_cleanups(&mut self) -> Vec<CleanupCell> {
        std::mem::take(&mut self.cleanups)
    }

    /// Fetch or create the hook slot at the current call position.
    fn hook_slot<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        let index = self.cursor;
        self.cursor += 1;

        if index == self.slots.len() {
            let slot = Rc::new(RefCell::new(init()));
            self.slots.push(Rc::clone(&slot) as Rc<dyn Any>);
            return slot;
        }

        Rc::clone(&self.slots[index])
            .downcast::<RefCell<T>>()
            .unwrap_or_else(|_| {
                panic!("hook {index} changed type between renders; hooks must run in a stable order")
            })
    }

    /// Fetch or create the effect slot at the current call position and
    /// queue its closure if the key changed.
    fn effect_slot<K>(&mut self, key: K, run: Box<dyn FnOnce() -> Option<Cleanup>>)
    where
        K: PartialEq + 'static,
    {
        let index = self.cursor;
        self.cursor += 1;

        let slot: Rc<RefCell<EffectSlot<K>>> = if index == self.slots.len() {
            let cell: CleanupCell = Rc::new(RefCell::new(None));
            self.cleanups.push(Rc::clone(&cell));
            let slot = Rc::new(RefCell::new(EffectSlot { key: None, cell }));
            self.slots.push(Rc::clone(&slot) as Rc<dyn Any>);
            slot
        } else {
            Rc::clone(&self.slots[index])
                .downcast::<RefCell<EffectSlot<K>>>()
                .unwrap_or_else(|_| {
                    panic!(
                        "hook {index} changed type between renders; hooks must run in a stable order"
                    )
                })
        };

        let mut slot = slot.borrow_mut();
        if slot.key.as_ref() != Some(&key) {
            slot.key = Some(key);
            self.pending.push(PendingEffect {
                run,
                cell: Rc::clone(&slot.cell),
            });
        }
    }
}

/// Guard that pops the scope stack when dropped.
///
/// Keeps the stack balanced even when a render panics.
pub(crate) struct ScopeGuard {
    id: ScopeId,
}

impl ScopeGuard {
    /// Push `scope` as the currently rendering unit.
    pub(crate) fn enter(scope: Rc<RefCell<ScopeState>>) -> Self {
        let id = scope.borrow().id;
        SCOPE_STACK.with(|stack| stack.borrow_mut().push(scope));
        Self { id }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPE_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            if let Some(scope) = popped {
                debug_assert_eq!(
                    scope.borrow().id,
                    self.id,
                    "scope stack out of balance on exit"
                );
            }
        });
    }
}

/// The unit currently rendering on this thread.
pub(crate) fn current_scope() -> Result<Rc<RefCell<ScopeState>>, AtomError> {
    SCOPE_STACK
        .with(|stack| stack.borrow().last().cloned())
        .ok_or(AtomError::OutsideRenderScope)
}

/// Returns the current unit's re-render capability.
///
/// The trigger is a plain value; store it, clone it, and fire it later from
/// event handlers or timers to queue a re-render of this unit.
pub fn current_trigger() -> Result<Trigger, AtomError> {
    let scope = current_scope()?;
    let trigger = scope.borrow().trigger();
    Ok(trigger)
}

/// Persistent per-unit state, addressed by hook call position.
///
/// The first render at this position runs `init` and stores the result;
/// later renders return the same cell. The initializer must not call other
/// hooks.
pub fn use_hook<T: 'static>(init: impl FnOnce() -> T) -> Result<Rc<RefCell<T>>, AtomError> {
    let scope = current_scope()?;
    let slot = scope.borrow_mut().hook_slot(init);
    Ok(slot)
}

/// Post-commit effect, re-run when `key` changes.
///
/// The effect closure runs after the current render commits and may return
/// a cleanup. The cleanup runs once, at unmount; a re-run caused by a new
/// key replaces the stored cleanup without invoking it.
pub fn use_effect<K>(
    key: K,
    effect: impl FnOnce() -> Option<Cleanup> + 'static,
) -> Result<(), AtomError>
where
    K: PartialEq + 'static,
{
    let scope = current_scope()?;
    scope.borrow_mut().effect_slot(key, Box::new(effect));
    Ok(())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn test_scope() -> Rc<RefCell<ScopeState>> {
        Rc::new(RefCell::new(ScopeState::new(
            ScopeId::new(0),
            AtomStore::new(),
            Trigger::new(|| {}),
        )))
    }

    fn commit(scope: &Rc<RefCell<ScopeState>>) {
        let pending = scope.borrow_mut().take_pending();
        for effect in pending {
            effect.commit();
        }
    }

    #[test]
    fn hooks_outside_a_scope_error() {
        assert_eq!(use_hook(|| 0_i32).unwrap_err(), AtomError::OutsideRenderScope);
        assert_eq!(
            use_effect((), || None).unwrap_err(),
            AtomError::OutsideRenderScope
        );
        assert_eq!(current_trigger().unwrap_err(), AtomError::OutsideRenderScope);
    }

    #[test]
    fn hook_slots_persist_across_renders() {
        let scope = test_scope();

        scope.borrow_mut().begin_render();
        let first = {
            let _guard = ScopeGuard::enter(Rc::clone(&scope));
            let slot = use_hook(|| 10_i32).unwrap();
            *slot.borrow_mut() += 1;
            slot
        };

        scope.borrow_mut().begin_render();
        let second = {
            let _guard = ScopeGuard::enter(Rc::clone(&scope));
            use_hook(|| 99_i32).unwrap()
        };

        // The initializer only ran on the first render.
        assert_eq!(*second.borrow(), 11);
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn call_order_assigns_distinct_slots() {
        let scope = test_scope();
        scope.borrow_mut().begin_render();
        let _guard = ScopeGuard::enter(Rc::clone(&scope));

        let a = use_hook(|| 1_i32).unwrap();
        let b = use_hook(|| 2_i32).unwrap();

        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(*a.borrow(), 1);
        assert_eq!(*b.borrow(), 2);
    }

    #[test]
    #[should_panic(expected = "changed type between renders")]
    fn hook_type_change_panics() {
        let scope = test_scope();

        scope.borrow_mut().begin_render();
        {
            let _guard = ScopeGuard::enter(Rc::clone(&scope));
            use_hook(|| 1_i32).unwrap();
        }

        scope.borrow_mut().begin_render();
        let _guard = ScopeGuard::enter(Rc::clone(&scope));
        let _ = use_hook(|| "text");
    }

    #[test]
    fn unchanged_key_does_not_requeue() {
        let scope = test_scope();
        let runs = Rc::new(Cell::new(0));

        for _ in 0..3 {
            scope.borrow_mut().begin_render();
            {
                let _guard = ScopeGuard::enter(Rc::clone(&scope));
                let runs = Rc::clone(&runs);
                use_effect((), move || {
                    runs.set(runs.get() + 1);
                    None
                })
                .unwrap();
            }
            commit(&scope);
        }

        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn changed_key_replaces_cleanup_without_running_it() {
        let scope = test_scope();
        let first_cleanup = Rc::new(Cell::new(0));
        let second_cleanup = Rc::new(Cell::new(0));

        scope.borrow_mut().begin_render();
        {
            let _guard = ScopeGuard::enter(Rc::clone(&scope));
            let ran = Rc::clone(&first_cleanup);
            use_effect(1, move || {
                let cleanup: Cleanup = Box::new(move || ran.set(ran.get() + 1));
                Some(cleanup)
            })
            .unwrap();
        }
        commit(&scope);

        // Re-keying re-runs the effect; the old cleanup is dropped unrun.
        scope.borrow_mut().begin_render();
        {
            let _guard = ScopeGuard::enter(Rc::clone(&scope));
            let ran = Rc::clone(&second_cleanup);
            use_effect(2, move || {
                let cleanup: Cleanup = Box::new(move || ran.set(ran.get() + 1));
                Some(cleanup)
            })
            .unwrap();
        }
        commit(&scope);
        assert_eq!(first_cleanup.get(), 0);

        // Unmount runs only the cleanup that is actually stored.
        for cell in scope.borrow_mut().take_cleanups() {
            if let Some(cleanup) = cell.borrow_mut().take() {
                cleanup();
            }
        }
        assert_eq!(first_cleanup.get(), 0);
        assert_eq!(second_cleanup.get(), 1);
    }

    #[test]
    fn nested_scopes_expose_the_innermost() {
        let outer = test_scope();
        let inner = test_scope();

        {
            let _outer = ScopeGuard::enter(Rc::clone(&outer));
            let outer_trigger = outer.borrow().trigger();
            assert!(Trigger::ptr_eq(&current_trigger().unwrap(), &outer_trigger));

            {
                let _inner = ScopeGuard::enter(Rc::clone(&inner));
                let inner_trigger = inner.borrow().trigger();
                assert!(Trigger::ptr_eq(&current_trigger().unwrap(), &inner_trigger));
            }

            // Back to the outer unit after the inner guard drops.
            assert!(Trigger::ptr_eq(&current_trigger().unwrap(), &outer_trigger));
        }

        assert!(current_trigger().is_err());
    }
}
