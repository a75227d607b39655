//! State Table
//!
//! Maps atom ids to their current snapshots. Values are type-erased here;
//! the store re-types them at its API boundary, where the `Atom<S>` handle
//! supplies `S`.
//!
//! Entries are inserted once, at atom construction, and replaced wholesale
//! on every committed write. Nothing is ever removed: an id stays resolvable
//! for the life of its store.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::atom::AtomId;

#[derive(Default)]
pub(crate) struct StateTable {
    values: HashMap<AtomId, Rc<dyn Any>>,
}

impl StateTable {
    /// File the initial snapshot for a freshly allocated id.
    pub(crate) fn insert(&mut self, atom: AtomId, value: Rc<dyn Any>) {
        let previous = self.values.insert(atom, value);
        debug_assert!(previous.is_none(), "atom id {atom} inserted twice");
    }

    /// Current snapshot for `atom`, if this table knows the id.
    pub(crate) fn get(&self, atom: AtomId) -> Option<&Rc<dyn Any>> {
        self.values.get(&atom)
    }

    /// Replace the snapshot for `atom`, returning the one it displaced.
    pub(crate) fn replace(&mut self, atom: AtomId, value: Rc<dyn Any>) -> Option<Rc<dyn Any>> {
        self.values
            .get_mut(&atom)
            .map(|slot| std::mem::replace(slot, value))
    }

    /// Number of atoms this table holds.
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }
}

impl fmt::Debug for StateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTable")
            .field("len", &self.values.len())
            .finish()
    }
}
