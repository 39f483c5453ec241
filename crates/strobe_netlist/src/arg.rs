//! Module and generator argument values.

use serde::{Deserialize, Serialize};
use strobe_common::QuadVec;

/// A resolved argument attached to an instance or a primitive module.
///
/// Arguments configure cell behavior: a register's `clk_posedge`, a slice's
/// `lo`/`hi` bounds, a constant's `value`. They are fixed at netlist
/// construction and read-only thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgValue {
    /// An integer argument (widths, slice bounds, small constant values).
    Int(i64),
    /// A boolean argument (edge polarities).
    Bool(bool),
    /// A bit-pattern argument (constant values, register reset values).
    Bits(QuadVec),
    /// A string argument.
    Str(String),
}

impl ArgValue {
    /// Returns the integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the bit-pattern payload, if this is `Bits`.
    pub fn as_bits(&self) -> Option<&QuadVec> {
        match self {
            ArgValue::Bits(bv) => Some(bv),
            _ => None,
        }
    }

    /// Interprets the argument as a bit pattern of the given width:
    /// `Bits` must match the width exactly; `Int` and `Bool` are converted.
    pub fn to_bits(&self, width: u32) -> Option<QuadVec> {
        match self {
            ArgValue::Bits(bv) => (bv.width() == width).then(|| bv.clone()),
            ArgValue::Int(v) => Some(QuadVec::from_u64(*v as u64, width)),
            ArgValue::Bool(b) => {
                (width == 1).then(|| QuadVec::from_u64(u64::from(*b), 1))
            }
            ArgValue::Str(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variants() {
        assert_eq!(ArgValue::Int(5).as_int(), Some(5));
        assert_eq!(ArgValue::Int(5).as_bool(), None);
        assert_eq!(ArgValue::Bool(true).as_bool(), Some(true));
        let bits = ArgValue::Bits(QuadVec::from_u64(3, 4));
        assert_eq!(bits.as_bits().map(QuadVec::width), Some(4));
    }

    #[test]
    fn to_bits_conversions() {
        assert_eq!(
            ArgValue::Int(18).to_bits(16),
            Some(QuadVec::from_u64(18, 16))
        );
        assert_eq!(ArgValue::Bool(true).to_bits(1), Some(QuadVec::from_bool(true)));
        assert_eq!(ArgValue::Bool(true).to_bits(2), None);
        let bv = QuadVec::from_u64(7, 3);
        assert_eq!(ArgValue::Bits(bv.clone()).to_bits(3), Some(bv.clone()));
        assert_eq!(ArgValue::Bits(bv).to_bits(4), None);
        assert_eq!(ArgValue::Str("x".into()).to_bits(8), None);
    }

    #[test]
    fn serde_roundtrip() {
        let vals = [
            ArgValue::Int(-4),
            ArgValue::Bool(false),
            ArgValue::Bits(QuadVec::from_u64(9, 8)),
            ArgValue::Str("clk".into()),
        ];
        for v in vals {
            let json = serde_json::to_string(&v).unwrap();
            let back: ArgValue = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
    }
}
