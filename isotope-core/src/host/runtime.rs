//! Host Runtime
//!
//! The runtime owns the mounted rendering units and drives their re-renders.
//! It is the host-integration half of the crate: the store knows nothing
//! about rendering, and the runtime teaches it by handing each unit a
//! [`Trigger`] that queues the unit for another render pass.
//!
//! # How It Works
//!
//! 1. [`HostRuntime::new`] binds to a store. At most one runtime can be
//!    bound to a store at a time.
//!
//! 2. [`HostRuntime::mount`] wraps a render closure in a scope, renders it
//!    once, and returns a [`Mounted`] handle exposing the committed output.
//!
//! 3. Firing a unit's trigger (from a store write, an event handler, or
//!    [`Mounted::invalidate`]) marks the unit dirty. Marks coalesce; a unit
//!    is queued at most once per flush.
//!
//! 4. [`HostRuntime::flush`] re-renders every dirty unit in queue order and
//!    commits the effects each render produced.
//!
//! # Update Flow
//!
//! Renders are synchronous and run one at a time on the calling thread.
//! A render may write to the store; the triggers that fire as a result only
//! mark units dirty, so the new work lands in the queue and is picked up
//! before `flush` returns.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use super::scope::{ScopeGuard, ScopeId, ScopeState};
use crate::reactive::{AtomError, AtomStore, Trigger};

/// Drives rendering units against one [`AtomStore`].
pub struct HostRuntime {
    store: AtomStore,
    inner: Rc<RefCell<RuntimeInner>>,
}

#[derive(Default)]
struct RuntimeInner {
    units: HashMap<ScopeId, Unit>,
    /// Dirty units in mark order.
    dirty: VecDeque<ScopeId>,
    next_scope: u64,
}

/// One mounted rendering unit.
struct Unit {
    scope: Rc<RefCell<ScopeState>>,
    /// Type-erased render closure; the typed output lives in the
    /// [`Mounted`] handle.
    render: Rc<RefCell<Box<dyn FnMut()>>>,
    /// Whether the unit is already queued in `dirty`.
    dirty: bool,
}

impl RuntimeInner {
    fn mark_dirty(&mut self, id: ScopeId) {
        let Some(unit) = self.units.get_mut(&id) else {
            // A trigger can outlive its unit; late fires are inert.
            return;
        };
        if !unit.dirty {
            unit.dirty = true;
            self.dirty.push_back(id);
        }
    }

    fn pop_dirty(&mut self) -> Option<ScopeId> {
        while let Some(id) = self.dirty.pop_front() {
            if let Some(unit) = self.units.get_mut(&id) {
                if unit.dirty {
                    unit.dirty = false;
                    return Some(id);
                }
            }
            // Queued entry went stale (unit unmounted); skip it.
        }
        None
    }
}

impl HostRuntime {
    /// Bind a runtime to `store`.
    ///
    /// Fails with [`AtomError::HostBindingActive`] if another runtime is
    /// already bound; drop that runtime first.
    pub fn new(store: AtomStore) -> Result<Self, AtomError> {
        store.bind_host()?;
        tracing::debug!("host runtime bound to store");
        Ok(Self {
            store,
            inner: Rc::new(RefCell::new(RuntimeInner::default())),
        })
    }

    /// The store this runtime renders against.
    pub fn store(&self) -> &AtomStore {
        &self.store
    }

    /// Mount `render` as a new unit and render it once.
    ///
    /// The closure re-runs on every flush in which the unit is dirty. Its
    /// latest return value is available through [`Mounted::value`].
    pub fn mount<V, F>(&self, render: F) -> Mounted<V>
    where
        V: 'static,
        F: FnMut() -> V + 'static,
    {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let raw = inner.next_scope;
            inner.next_scope += 1;
            ScopeId::new(raw)
        };

        // The trigger holds the runtime weakly so that stored triggers do
        // not keep a dropped runtime alive.
        let weak = Rc::downgrade(&self.inner);
        let trigger = Trigger::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().mark_dirty(id);
            }
        });

        let scope = Rc::new(RefCell::new(ScopeState::new(
            id,
            self.store.clone(),
            trigger,
        )));
        let output: Rc<RefCell<Option<Rc<V>>>> = Rc::new(RefCell::new(None));

        let erased: Box<dyn FnMut()> = {
            let output = Rc::clone(&output);
            let mut render = render;
            Box::new(move || {
                *output.borrow_mut() = Some(Rc::new(render()));
            })
        };

        self.inner.borrow_mut().units.insert(
            id,
            Unit {
                scope,
                render: Rc::new(RefCell::new(erased)),
                dirty: false,
            },
        );
        tracing::debug!(unit = id.raw(), "unit mounted");

        render_unit(&self.inner, id);

        Mounted {
            id,
            runtime: Rc::clone(&self.inner),
            output,
        }
    }

    /// Re-render every dirty unit, in the order they were marked.
    ///
    /// Units marked dirty during the flush (for example by a store write
    /// inside a render) are processed before this returns.
    pub fn flush(&self) {
        loop {
            let next = self.inner.borrow_mut().pop_dirty();
            let Some(id) = next else { break };
            render_unit(&self.inner, id);
        }
    }

    /// Number of currently mounted units.
    pub fn unit_count(&self) -> usize {
        self.inner.borrow().units.len()
    }
}

impl Drop for HostRuntime {
    fn drop(&mut self) {
        let units: Vec<Unit> = self
            .inner
            .borrow_mut()
            .units
            .drain()
            .map(|(_, unit)| unit)
            .collect();
        for unit in &units {
            run_cleanups(&unit.scope);
        }
        self.store.release_host();
        tracing::debug!("host runtime released store binding");
    }
}

impl fmt::Debug for HostRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRuntime")
            .field("units", &self.inner.borrow().units.len())
            .finish_non_exhaustive()
    }
}

/// Render one unit and commit the effects it queued.
///
/// The unit is looked up under a short borrow and the borrow released
/// before the render runs, because renders may re-enter the runtime by
/// writing to the store.
fn render_unit(runtime: &Rc<RefCell<RuntimeInner>>, id: ScopeId) {
    let unit = {
        let inner = runtime.borrow();
        inner
            .units
            .get(&id)
            .map(|unit| (Rc::clone(&unit.scope), Rc::clone(&unit.render)))
    };
    let Some((scope, render)) = unit else { return };

    scope.borrow_mut().begin_render();
    {
        let _guard = ScopeGuard::enter(Rc::clone(&scope));
        (&mut *render.borrow_mut())();
    }

    let pending = scope.borrow_mut().take_pending();
    for effect in pending {
        effect.commit();
    }
    tracing::trace!(unit = id.raw(), "unit rendered");
}

/// Run a scope's stored cleanups, in slot-creation order.
fn run_cleanups(scope: &Rc<RefCell<ScopeState>>) {
    let cells = scope.borrow_mut().take_cleanups();
    for cell in cells {
        let cleanup = cell.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }
}

/// Handle to a mounted rendering unit.
///
/// Holds the unit's typed output slot. Dropping the handle does not
/// unmount the unit; call [`Mounted::unmount`] to tear it down, or drop
/// the runtime to tear down everything.
pub struct Mounted<V> {
    id: ScopeId,
    runtime: Rc<RefCell<RuntimeInner>>,
    output: Rc<RefCell<Option<Rc<V>>>>,
}

impl<V> Mounted<V> {
    /// Identifier of this unit within its runtime.
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// The output committed by the unit's most recent render.
    pub fn value(&self) -> Rc<V> {
        self.output
            .borrow()
            .clone()
            .expect("mounted unit has no committed output")
    }

    /// Mark the unit dirty without going through the store.
    ///
    /// The next [`HostRuntime::flush`] re-renders it.
    pub fn invalidate(&self) {
        self.runtime.borrow_mut().mark_dirty(self.id);
    }

    /// Tear the unit down and run its effect cleanups.
    pub fn unmount(self) {
        let unit = self.runtime.borrow_mut().units.remove(&self.id);
        if let Some(unit) = unit {
            run_cleanups(&unit.scope);
            tracing::debug!(unit = self.id.raw(), "unit unmounted");
        }
    }
}

impl<V> fmt::Debug for Mounted<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mounted")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
