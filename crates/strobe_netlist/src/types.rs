//! Port types: directed bits, arrays, records, and named wrappers, interned
//! in a central database.

use crate::ids::TypeId;
use crate::select::PathSeg;
use serde::{Deserialize, Serialize};
use strobe_common::Ident;

/// The direction of a wire as seen from outside its wireable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dir {
    /// The wireable receives this wire.
    In,
    /// The wireable drives this wire.
    Out,
}

impl Dir {
    /// Returns the opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            Dir::In => Dir::Out,
            Dir::Out => Dir::In,
        }
    }
}

/// The structural type of a wire or port tree.
///
/// Directions live on `Bit` leaves; a module's interface viewed from inside
/// its own body has every leaf direction flipped (its inputs drive internal
/// logic), which [`TypeDb::flip`] computes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    /// A single directed bit.
    Bit(Dir),
    /// A fixed-length array of a uniform element type.
    Array {
        /// Element type.
        elem: TypeId,
        /// Number of elements (at least 1).
        len: u32,
    },
    /// An ordered set of uniquely named fields.
    Record {
        /// Field names and types, in declaration order.
        fields: Vec<(Ident, TypeId)>,
    },
    /// A named wrapper over a raw type (clocks, reset lines). Only bit-like
    /// raw types are supported by the simulator.
    Named {
        /// The wrapper's name.
        name: Ident,
        /// The wrapped type.
        raw: TypeId,
    },
}

/// Interned type storage: structurally identical types share a [`TypeId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDb {
    types: Vec<Type>,
}

impl TypeDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a type, reusing an existing entry when one matches.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        for (i, existing) in self.types.iter().enumerate() {
            if existing == &ty {
                return TypeId::from_raw(i as u32);
            }
        }
        let id = TypeId::from_raw(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Returns the type with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.as_raw() as usize]
    }

    /// Interns a single input bit.
    pub fn bit_in(&mut self) -> TypeId {
        self.intern(Type::Bit(Dir::In))
    }

    /// Interns a single output bit.
    pub fn bit_out(&mut self) -> TypeId {
        self.intern(Type::Bit(Dir::Out))
    }

    /// Interns an array of `len` elements of `elem`.
    pub fn array(&mut self, elem: TypeId, len: u32) -> TypeId {
        self.intern(Type::Array { elem, len })
    }

    /// Interns a record with the given fields.
    pub fn record(&mut self, fields: Vec<(Ident, TypeId)>) -> TypeId {
        self.intern(Type::Record { fields })
    }

    /// Interns a named wrapper over `raw`.
    pub fn named(&mut self, name: Ident, raw: TypeId) -> TypeId {
        self.intern(Type::Named { name, raw })
    }

    /// Returns the type with every leaf direction reversed.
    pub fn flip(&mut self, id: TypeId) -> TypeId {
        let ty = self.get(id).clone();
        match ty {
            Type::Bit(d) => self.intern(Type::Bit(d.flipped())),
            Type::Array { elem, len } => {
                let elem = self.flip(elem);
                self.intern(Type::Array { elem, len })
            }
            Type::Record { fields } => {
                let mut flipped = Vec::with_capacity(fields.len());
                for (name, fty) in fields {
                    flipped.push((name, self.flip(fty)));
                }
                self.intern(Type::Record { fields: flipped })
            }
            Type::Named { name, raw } => {
                let raw = self.flip(raw);
                self.intern(Type::Named { name, raw })
            }
        }
    }

    /// Returns the uniform leaf direction of a type, or `None` when leaves
    /// disagree (a mixed-direction record).
    pub fn direction(&self, id: TypeId) -> Option<Dir> {
        match self.get(id) {
            Type::Bit(d) => Some(*d),
            Type::Array { elem, .. } => self.direction(*elem),
            Type::Named { raw, .. } => self.direction(*raw),
            Type::Record { fields } => {
                let mut dir = None;
                for (_, fty) in fields {
                    let d = self.direction(*fty)?;
                    match dir {
                        None => dir = Some(d),
                        Some(prev) if prev != d => return None,
                        Some(_) => {}
                    }
                }
                dir
            }
        }
    }

    /// Returns the total number of bit leaves beneath a type.
    pub fn bit_width(&self, id: TypeId) -> u32 {
        match self.get(id) {
            Type::Bit(_) => 1,
            Type::Array { elem, len } => self.bit_width(*elem) * len,
            Type::Named { raw, .. } => self.bit_width(*raw),
            Type::Record { fields } => fields.iter().map(|(_, f)| self.bit_width(*f)).sum(),
        }
    }

    /// Descends one path segment: a field of a record or an element of an
    /// array. Returns `None` for leaves (`Bit`, `Named`) and bad selectors.
    pub fn child(&self, id: TypeId, seg: &PathSeg) -> Option<TypeId> {
        match (self.get(id), seg) {
            (Type::Record { fields }, PathSeg::Field(name)) => fields
                .iter()
                .find(|(f, _)| f == name)
                .map(|(_, fty)| *fty),
            (Type::Array { elem, len }, PathSeg::Index(i)) => (*i < *len).then_some(*elem),
            _ => None,
        }
    }

    /// Compares two types structurally, ignoring directions and named
    /// wrappers. Record fields are matched by name, not position.
    pub fn same_shape(&self, a: TypeId, b: TypeId) -> bool {
        let (a, b) = (self.strip_named(a), self.strip_named(b));
        match (self.get(a), self.get(b)) {
            (Type::Bit(_), Type::Bit(_)) => true,
            (
                Type::Array { elem: ea, len: la },
                Type::Array { elem: eb, len: lb },
            ) => la == lb && self.same_shape(*ea, *eb),
            (Type::Record { fields: fa }, Type::Record { fields: fb }) => {
                fa.len() == fb.len()
                    && fa.iter().all(|(name, ta)| {
                        fb.iter()
                            .any(|(n, tb)| n == name && self.same_shape(*ta, *tb))
                    })
            }
            _ => false,
        }
    }

    /// Unwraps named wrappers down to the raw type.
    pub fn strip_named(&self, id: TypeId) -> TypeId {
        match self.get(id) {
            Type::Named { raw, .. } => self.strip_named(*raw),
            _ => id,
        }
    }
}
