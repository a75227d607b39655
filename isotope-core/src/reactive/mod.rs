//! Reactive State Core
//!
//! This module implements the host-agnostic half of the crate: atoms, the
//! store that owns them, and the subscription machinery that decides who
//! gets re-rendered after a write.
//!
//! # Concepts
//!
//! ## Atoms
//!
//! An [`Atom<S>`] is a copyable handle naming one independently updatable
//! piece of state. Handles carry no data; the values live in the store.
//!
//! ## The Store
//!
//! An [`AtomStore`] owns snapshots and subscribers for the atoms it
//! constructed. Reads hand out `Rc` snapshots; writes replace snapshots
//! wholesale and notify exactly the subscribers whose observed view
//! changed.
//!
//! ## Subscribers
//!
//! A [`Subscriber`] pairs a [`Trigger`] (the host's re-render capability)
//! with a change predicate derived from the projection the observer reads
//! through. Registration, replacement, and removal are explicit calls, so
//! any host can drive them.
//!
//! ## Change Suppression
//!
//! [`ShallowEq`] defines the one-level comparison that separates "the value
//! was replaced" from "the observed view changed"; [`MemoLast`] keeps
//! projections from re-running against snapshots they have already seen.

mod atom;
mod error;
mod memo;
mod registry;
mod shallow;
mod state;
mod store;
mod subscriber;

pub use atom::{Atom, AtomId};
pub use error::AtomError;
pub use memo::MemoLast;
pub use shallow::ShallowEq;
pub use store::AtomStore;
pub use subscriber::{Subscriber, SubscriberId, Trigger};
