//! Host Integration
//!
//! The host layer turns store subscriptions into actual re-renders. It has
//! three pieces:
//!
//! - [`HostRuntime`]: owns the mounted rendering units, coalesces dirty
//!   marks, and re-renders on [`HostRuntime::flush`].
//!
//! - Scopes and hooks ([`use_hook`], [`use_effect`], [`current_trigger`]):
//!   positional per-unit state and post-commit effects, available inside a
//!   render.
//!
//! - Subscribing reads ([`use_atom`](use_atom()), [`use_atom_select`]):
//!   read an atom and keep the unit in sync with it.
//!
//! The store itself is host-agnostic; everything here is one possible host,
//! and embedders with their own scheduling can build an equivalent layer
//! out of [`Trigger`](crate::reactive::Trigger) and the store's subscribe
//! operations.

mod runtime;
mod scope;
mod use_atom;

pub use runtime::{HostRuntime, Mounted};
pub use scope::{current_trigger, use_effect, use_hook, Cleanup, ScopeId};
pub use use_atom::{use_atom, use_atom_select};
