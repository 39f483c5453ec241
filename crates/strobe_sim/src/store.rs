//! Per-simulator value storage.

use crate::wire_value::WireValue;
use std::collections::HashMap;
use strobe_netlist::{Select, WireRoot};

/// Owns one [`WireValue`] tree per wireable of the simulated module: the
/// interface plus every instance.
///
/// The store is populated once at simulator construction and its key set
/// never changes afterwards; resolution descends the value trees by select
/// path without allocating.
#[derive(Debug, Default)]
pub struct ValueStore {
    values: HashMap<WireRoot, WireValue>,
}

impl ValueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the value tree for a wireable.
    pub fn insert(&mut self, root: WireRoot, value: WireValue) {
        self.values.insert(root, value);
    }

    /// Returns a wireable's whole value tree.
    pub fn root(&self, root: WireRoot) -> Option<&WireValue> {
        self.values.get(&root)
    }

    /// Mutable counterpart of [`root`](ValueStore::root).
    pub fn root_mut(&mut self, root: WireRoot) -> Option<&mut WireValue> {
        self.values.get_mut(&root)
    }

    /// Resolves a select to the sub-value it names.
    pub fn resolve(&self, sel: &Select) -> Option<&WireValue> {
        let mut value = self.values.get(&sel.top_parent())?;
        for seg in sel.path() {
            value = value.child(seg)?;
        }
        Some(value)
    }

    /// Mutable counterpart of [`resolve`](ValueStore::resolve).
    pub fn resolve_mut(&mut self, sel: &Select) -> Option<&mut WireValue> {
        let mut value = self.values.get_mut(&sel.top_parent())?;
        for seg in sel.path() {
            value = value.child_mut(seg)?;
        }
        Some(value)
    }
}
