//! The recursive wire-value tree.
//!
//! A [`WireValue`] mirrors the structural shape of its wireable's port type:
//! records hold named fields, arrays hold elements, named wrappers hold a
//! bit-like inner value, and every leaf is a single [`Quad`]. Values mutate
//! in place over the life of a simulator; their shape never changes after
//! construction.

use crate::error::SimError;
use strobe_common::{Quad, QuadVec};
use strobe_netlist::{PathSeg, Type, TypeDb, TypeId};

/// A value tree shaped like a port type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// A single four-state leaf.
    Bit(Quad),
    /// Fixed-length, uniformly shaped elements.
    Array(Vec<WireValue>),
    /// Named fields in declaration order; names are unique and stable.
    Record(Vec<(strobe_common::Ident, WireValue)>),
    /// A named type's inner value (a bit or a bit-array).
    Named(Box<WireValue>),
}

impl WireValue {
    /// Builds the default (all-`X`) value for a type.
    ///
    /// Named types must wrap a bit or a bit-array; anything else is a
    /// shape error.
    pub fn default_for(types: &TypeDb, ty: TypeId) -> Result<Self, SimError> {
        match types.get(ty) {
            Type::Bit(_) => Ok(WireValue::Bit(Quad::X)),
            Type::Array { elem, len } => {
                let mut elems = Vec::with_capacity(*len as usize);
                for _ in 0..*len {
                    elems.push(Self::default_for(types, *elem)?);
                }
                Ok(WireValue::Array(elems))
            }
            Type::Record { fields } => {
                let mut vals = Vec::with_capacity(fields.len());
                for (name, fty) in fields {
                    vals.push((*name, Self::default_for(types, *fty)?));
                }
                Ok(WireValue::Record(vals))
            }
            Type::Named { raw, .. } => {
                let stripped = types.strip_named(*raw);
                let bit_like = match types.get(stripped) {
                    Type::Bit(_) => true,
                    Type::Array { elem, .. } => {
                        matches!(types.get(types.strip_named(*elem)), Type::Bit(_))
                    }
                    _ => false,
                };
                if !bit_like {
                    return Err(SimError::ShapeMismatch {
                        reason: "named type does not wrap a bit or bit-array".into(),
                    });
                }
                Ok(WireValue::Named(Box::new(Self::default_for(
                    types, stripped,
                )?)))
            }
        }
    }

    /// Descends one path segment. Returns `None` for missing fields,
    /// out-of-range indices, and leaves (`Bit`, `Named`).
    pub fn child(&self, seg: &PathSeg) -> Option<&WireValue> {
        match (self, seg) {
            (WireValue::Record(fields), PathSeg::Field(name)) => fields
                .iter()
                .find(|(f, _)| f == name)
                .map(|(_, v)| v),
            (WireValue::Array(elems), PathSeg::Index(i)) => elems.get(*i as usize),
            _ => None,
        }
    }

    /// Mutable counterpart of [`child`](WireValue::child).
    pub fn child_mut(&mut self, seg: &PathSeg) -> Option<&mut WireValue> {
        match (self, seg) {
            (WireValue::Record(fields), PathSeg::Field(name)) => fields
                .iter_mut()
                .find(|(f, _)| f == name)
                .map(|(_, v)| v),
            (WireValue::Array(elems), PathSeg::Index(i)) => elems.get_mut(*i as usize),
            _ => None,
        }
    }

    /// Reads a single-bit leaf, descending through a named wrapper.
    pub fn as_quad(&self) -> Option<Quad> {
        match self {
            WireValue::Bit(q) => Some(*q),
            WireValue::Named(inner) => inner.as_quad(),
            _ => None,
        }
    }

    /// Writes a single-bit leaf, descending through a named wrapper.
    pub fn set_quad(&mut self, q: Quad) -> Result<(), SimError> {
        match self {
            WireValue::Bit(slot) => {
                *slot = q;
                Ok(())
            }
            WireValue::Named(inner) => inner.set_quad(q),
            _ => Err(SimError::NotBitShaped),
        }
    }

    /// Copies `src` into `self` leaf by leaf. Shapes must match; record
    /// fields are paired by name, so field order may differ between the
    /// two trees.
    pub fn copy_from(&mut self, src: &WireValue) -> Result<(), SimError> {
        match (self, src) {
            (WireValue::Bit(dst), WireValue::Bit(s)) => {
                *dst = *s;
                Ok(())
            }
            (WireValue::Named(dst), WireValue::Named(s)) => dst.copy_from(s),
            (WireValue::Array(dst), WireValue::Array(s)) => {
                if dst.len() != s.len() {
                    return Err(SimError::ShapeMismatch {
                        reason: format!("array lengths differ: {} vs {}", dst.len(), s.len()),
                    });
                }
                for (d, v) in dst.iter_mut().zip(s) {
                    d.copy_from(v)?;
                }
                Ok(())
            }
            (WireValue::Record(dst), WireValue::Record(s)) => {
                if dst.len() != s.len() {
                    return Err(SimError::ShapeMismatch {
                        reason: format!("record field counts differ: {} vs {}", dst.len(), s.len()),
                    });
                }
                for (name, d) in dst.iter_mut() {
                    let (_, v) = s.iter().find(|(n, _)| n == name).ok_or_else(|| {
                        SimError::ShapeMismatch {
                            reason: "record field missing in source".into(),
                        }
                    })?;
                    d.copy_from(v)?;
                }
                Ok(())
            }
            _ => Err(SimError::ShapeMismatch {
                reason: "value variants differ".into(),
            }),
        }
    }

    /// Writes a bit vector into a `Bit` (width 1) or bit-array value,
    /// element `i` receiving vector index `i`. Named wrappers are
    /// descended.
    pub fn write_bits(&mut self, bv: &QuadVec) -> Result<(), SimError> {
        match self {
            WireValue::Bit(slot) => {
                if bv.width() != 1 {
                    return Err(SimError::WidthMismatch {
                        expected: 1,
                        got: bv.width(),
                    });
                }
                *slot = bv.get(0);
                Ok(())
            }
            WireValue::Named(inner) => inner.write_bits(bv),
            WireValue::Array(elems) => {
                let len = elems.len() as u32;
                if bv.width() != len {
                    return Err(SimError::WidthMismatch {
                        expected: len,
                        got: bv.width(),
                    });
                }
                for (i, elem) in elems.iter_mut().enumerate() {
                    elem.set_quad(bv.get(i as u32))?;
                }
                Ok(())
            }
            WireValue::Record(_) => Err(SimError::NotBitShaped),
        }
    }

    /// Reads a `Bit` or bit-array value as a bit vector; inverse of
    /// [`write_bits`](WireValue::write_bits).
    pub fn read_bits(&self) -> Result<QuadVec, SimError> {
        match self {
            WireValue::Bit(q) => {
                let mut bv = QuadVec::zeros(1);
                bv.set(0, *q);
                Ok(bv)
            }
            WireValue::Named(inner) => inner.read_bits(),
            WireValue::Array(elems) => {
                let mut bv = QuadVec::zeros(elems.len() as u32);
                for (i, elem) in elems.iter().enumerate() {
                    bv.set(i as u32, elem.as_quad().ok_or(SimError::NotBitShaped)?);
                }
                Ok(bv)
            }
            WireValue::Record(_) => Err(SimError::NotBitShaped),
        }
    }
}
