//! Integration Tests for the Store and Host Runtime
//!
//! These tests drive complete scenarios: units subscribe through the hook
//! functions, writes go through the store, and flushes turn visible changes
//! into re-renders.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use isotope_core::host::{use_atom, use_atom_select, HostRuntime};
use isotope_core::reactive::{AtomError, AtomStore};

/// Test a complete counter flow: events write, flush re-renders.
#[test]
fn counter_flow_end_to_end() {
    let store = AtomStore::new();
    let rt = HostRuntime::new(store.clone()).unwrap();
    let count = store.atom(0_i32);

    let mounted = rt.mount(move || format!("count: {}", use_atom(&count).unwrap()));
    assert_eq!(*mounted.value(), "count: 0");

    // An event handler writes through the store clone it captured.
    let bump = {
        let store = store.clone();
        move || store.swap(&count, |n| n + 1).unwrap()
    };

    bump();
    bump();
    rt.flush();

    // Two writes coalesced into one re-render of the final state.
    assert_eq!(*mounted.value(), "count: 2");
}

/// Test that several units track the same atom independently.
#[test]
fn fanout_reaches_every_subscribed_unit() {
    let store = AtomStore::new();
    let rt = HostRuntime::new(store.clone()).unwrap();
    let count = store.atom(0_i32);
    let label = store.atom("idle");

    let a_renders = Rc::new(Cell::new(0));
    let _a = {
        let a_renders = Rc::clone(&a_renders);
        rt.mount(move || {
            a_renders.set(a_renders.get() + 1);
            *use_atom(&count).unwrap()
        })
    };
    let b_renders = Rc::new(Cell::new(0));
    let b = {
        let b_renders = Rc::clone(&b_renders);
        rt.mount(move || {
            b_renders.set(b_renders.get() + 1);
            *use_atom(&count).unwrap()
        })
    };
    let c_renders = Rc::new(Cell::new(0));
    let _c = {
        let c_renders = Rc::clone(&c_renders);
        rt.mount(move || {
            c_renders.set(c_renders.get() + 1);
            *use_atom(&label).unwrap()
        })
    };
    assert_eq!(store.subscriber_count(count.id()).unwrap(), 2);

    // A count write reaches both count units and leaves the label unit
    // alone.
    store.swap(&count, |n| n + 1).unwrap();
    rt.flush();
    assert_eq!(a_renders.get(), 2);
    assert_eq!(b_renders.get(), 2);
    assert_eq!(c_renders.get(), 1);

    // Unmounting removes exactly that unit's subscription.
    b.unmount();
    assert_eq!(store.subscriber_count(count.id()).unwrap(), 1);

    store.swap(&count, |n| n + 1).unwrap();
    rt.flush();
    assert_eq!(a_renders.get(), 3);
    assert_eq!(b_renders.get(), 2);
    assert_eq!(c_renders.get(), 1);
}

/// Test that a length projection ignores content-only writes.
#[test]
fn length_projection_ignores_content_writes() {
    fn len_of(names: &Vec<String>) -> usize {
        names.len()
    }

    let store = AtomStore::new();
    let rt = HostRuntime::new(store.clone()).unwrap();
    let names = store.atom(vec!["ada".to_string(), "grace".to_string()]);
    let renders = Rc::new(Cell::new(0));

    let mounted = {
        let renders = Rc::clone(&renders);
        rt.mount(move || {
            renders.set(renders.get() + 1);
            use_atom_select(&names, len_of).unwrap()
        })
    };
    assert_eq!(*mounted.value(), 2);
    assert_eq!(renders.get(), 1);

    // Same length, different content: invisible to this unit.
    store
        .swap(&names, |names| {
            let mut next = names.clone();
            next[0] = "alan".to_string();
            next
        })
        .unwrap();
    rt.flush();
    assert_eq!(renders.get(), 1);

    // Appending changes the length and wakes the unit.
    store
        .swap(&names, |names| {
            let mut next = names.clone();
            next.push("edsger".to_string());
            next
        })
        .unwrap();
    rt.flush();
    assert_eq!(renders.get(), 2);
    assert_eq!(*mounted.value(), 3);
}

/// Test that a projection runs at most once per distinct snapshot.
#[test]
fn projection_reuses_the_last_result() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    fn measured_first(pair: &(i32, i32)) -> i32 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        pair.0
    }

    let store = AtomStore::new();
    let rt = HostRuntime::new(store.clone()).unwrap();
    let pair = store.atom((3_i32, 4_i32));

    let mounted = rt.mount(move || use_atom_select(&pair, measured_first).unwrap());
    assert_eq!(*mounted.value(), 3);
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);

    // An unrelated re-render sees the same snapshot and reuses the cached
    // projection.
    mounted.invalidate();
    rt.flush();
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);

    // A visible write projects the old and new snapshots once each for the
    // change check, then the re-render projects the new snapshot.
    store.set(&pair, (9, 4)).unwrap();
    rt.flush();
    assert_eq!(*mounted.value(), 9);
    assert_eq!(CALLS.load(Ordering::SeqCst), 4);

    // An invisible write only pays for projecting the new snapshot.
    store.set(&pair, (9, 77)).unwrap();
    rt.flush();
    assert_eq!(*mounted.value(), 9);
    assert_eq!(CALLS.load(Ordering::SeqCst), 5);
}

/// Test that writes to one atom never run another atom's projections.
#[test]
fn atoms_keep_projections_isolated() {
    static B_CALLS: AtomicUsize = AtomicUsize::new(0);
    fn measured(b: &i32) -> i32 {
        B_CALLS.fetch_add(1, Ordering::SeqCst);
        *b
    }

    let store = AtomStore::new();
    let rt = HostRuntime::new(store.clone()).unwrap();
    let a = store.atom(0_i32);
    let b = store.atom(100_i32);

    let shown = rt.mount(move || {
        let a = *use_atom(&a).unwrap();
        let b = use_atom_select(&b, measured).unwrap();
        (a, b)
    });
    assert_eq!(*shown.value(), (0, 100));
    assert_eq!(B_CALLS.load(Ordering::SeqCst), 1);

    // A write to `a` re-renders the unit, but `b`'s snapshot is unchanged,
    // so its projection is a cache hit everywhere.
    store.set(&a, 5).unwrap();
    rt.flush();
    assert_eq!(*shown.value(), (5, 100));
    assert_eq!(B_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(*store.read(&b).unwrap(), 100);
}

/// Test that changing the projection at a call site keeps the subscriber.
#[test]
fn projection_swap_keeps_the_subscription() {
    fn first(pair: &(i32, i32)) -> i32 {
        pair.0
    }
    fn second(pair: &(i32, i32)) -> i32 {
        pair.1
    }

    let store = AtomStore::new();
    let rt = HostRuntime::new(store.clone()).unwrap();
    let pair = store.atom((1_i32, 10_i32));

    let chosen: Rc<Cell<fn(&(i32, i32)) -> i32>> =
        Rc::new(Cell::new(first as fn(&(i32, i32)) -> i32));
    let renders = Rc::new(Cell::new(0));

    let mounted = {
        let chosen = Rc::clone(&chosen);
        let renders = Rc::clone(&renders);
        rt.mount(move || {
            renders.set(renders.get() + 1);
            use_atom_select(&pair, chosen.get()).unwrap()
        })
    };
    assert_eq!(*mounted.value(), 1);
    let ids = store.subscriber_ids(pair.id()).unwrap();

    // Swap in the other projection and re-render: same subscriber, new
    // view.
    chosen.set(second);
    mounted.invalidate();
    rt.flush();
    assert_eq!(*mounted.value(), 10);
    assert_eq!(renders.get(), 2);
    assert_eq!(store.subscriber_ids(pair.id()).unwrap(), ids);

    // Changes are now judged by the new projection.
    store.set(&pair, (5, 10)).unwrap();
    rt.flush();
    assert_eq!(renders.get(), 2);

    store.set(&pair, (5, 42)).unwrap();
    rt.flush();
    assert_eq!(renders.get(), 3);
    assert_eq!(*mounted.value(), 42);
}

/// Test that re-renders reuse the original subscription.
#[test]
fn rerenders_keep_subscriber_ids_stable() {
    let store = AtomStore::new();
    let rt = HostRuntime::new(store.clone()).unwrap();
    let count = store.atom(0_i32);

    let mounted = rt.mount(move || *use_atom(&count).unwrap());
    let ids = store.subscriber_ids(count.id()).unwrap();
    assert_eq!(ids.len(), 1);

    for n in 1..=3 {
        store.set(&count, n).unwrap();
        rt.flush();
    }
    assert_eq!(*mounted.value(), 3);
    assert_eq!(store.subscriber_ids(count.id()).unwrap(), ids);
}

/// Test that a remounted unit gets a fresh subscriber id.
#[test]
fn remount_allocates_a_fresh_subscriber_id() {
    let store = AtomStore::new();
    let rt = HostRuntime::new(store.clone()).unwrap();
    let count = store.atom(0_i32);

    let mounted = rt.mount(move || *use_atom(&count).unwrap());
    let old_id = store.subscriber_ids(count.id()).unwrap()[0];
    mounted.unmount();
    assert_eq!(store.subscriber_count(count.id()).unwrap(), 0);

    let _mounted = rt.mount(move || *use_atom(&count).unwrap());
    let new_id = store.subscriber_ids(count.id()).unwrap()[0];

    // Ids count up and are never reused, even after the slot frees up.
    assert!(new_id > old_id);
}

/// Test that dropping the runtime releases every subscription.
#[test]
fn dropping_the_runtime_releases_subscriptions() {
    let store = AtomStore::new();
    let count = store.atom(0_i32);

    {
        let rt = HostRuntime::new(store.clone()).unwrap();
        let _a = rt.mount(move || *use_atom(&count).unwrap());
        let _b = rt.mount(move || *use_atom(&count).unwrap());
        assert_eq!(store.subscriber_count(count.id()).unwrap(), 2);
    }

    assert_eq!(store.subscriber_count(count.id()).unwrap(), 0);

    // Writes keep working with nobody listening.
    store.swap(&count, |n| n + 1).unwrap();
    assert_eq!(*store.read(&count).unwrap(), 1);
}

/// Test that the error cases surface at the API boundary.
#[test]
fn error_taxonomy_is_observable() {
    let store = AtomStore::new();
    let other = AtomStore::new();
    let foreign = other.atom(1_i32);

    // Handles do not transfer between stores.
    assert_eq!(
        store.read(&foreign).unwrap_err(),
        AtomError::UnknownAtom(foreign.id())
    );
    assert_eq!(
        store.swap(&foreign, |n| n + 1).unwrap_err(),
        AtomError::UnknownAtom(foreign.id())
    );

    // Subscribing reads need a rendering unit.
    assert_eq!(use_atom(&foreign).unwrap_err(), AtomError::OutsideRenderScope);

    // One host binding at a time, freed again on drop.
    let rt = HostRuntime::new(store.clone()).unwrap();
    assert_eq!(
        HostRuntime::new(store.clone()).unwrap_err(),
        AtomError::HostBindingActive
    );
    drop(rt);
    let _rt = HostRuntime::new(store).unwrap();
}
