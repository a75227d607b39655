//! Isotope Core
//!
//! This crate provides the shared-state runtime for the Isotope UI toolkit.
//! It implements:
//!
//! - Atoms: typed handles to immutable state snapshots in a store
//! - Subscriptions with shallow-equality change suppression
//! - Memoized projections for subscribing to a slice of an atom
//! - A host runtime that turns visible changes into unit re-renders
//!
//! The store is host-agnostic: it never schedules work itself, it only fires
//! the triggers that subscribers hand it. The bundled host runtime is one
//! consumer of that contract.
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `reactive`: the store, atom handles, subscriber registry, and the
//!   shallow-equality and memoization primitives they are built from
//! - `host`: rendering units, hook state, and the subscribing reads
//!
//! # Example
//!
//! ```rust,ignore
//! use isotope_core::host::{use_atom, HostRuntime};
//! use isotope_core::reactive::AtomStore;
//!
//! let store = AtomStore::new();
//! let count = store.atom(0_i32);
//!
//! let rt = HostRuntime::new(store.clone())?;
//! let mounted = rt.mount(move || format!("count: {}", use_atom(&count).unwrap()));
//!
//! store.swap(&count, |n| n + 1)?;
//! rt.flush();
//! assert_eq!(*mounted.value(), "count: 1");
//! ```
//!
//! # Threading
//!
//! A store and its runtime live on one thread; snapshots are `Rc`-shared
//! and the interior state is not synchronized. Atom ids are allocated from
//! a process-wide counter, so handles from different stores never collide.

pub mod host;
pub mod reactive;

pub use host::{use_atom, use_atom_select, HostRuntime, Mounted};
pub use reactive::{Atom, AtomError, AtomStore};
