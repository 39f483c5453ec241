//! Interned identifiers for netlist names.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// An interned name: a field, instance, module, or argument key.
///
/// Idents are `u32` indices into an [`Interner`], giving O(1) equality and
/// copying. Record fields in wire values are matched by `Ident`, which is
/// what makes copy-by-field-name cheap during hierarchical value transfer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Creates an `Ident` from a raw index. Intended for tests and
    /// deserialization; normal construction goes through
    /// [`Interner::intern`].
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: the wrapped u32 always fits in usize on supported platforms, and
// try_from_usize rejects values that do not fit in u32.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// String interner backing every [`Ident`] in a design.
///
/// Interning is by shared reference, so a netlist that owns its interner can
/// still intern new names while borrowed.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns `s`, returning its `Ident`. Repeated calls with the same
    /// string return the same identifier.
    pub fn intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Looks up an already-interned string without inserting it.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an `Ident` back to its string.
    ///
    /// # Panics
    ///
    /// Panics if the ident did not come from this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
