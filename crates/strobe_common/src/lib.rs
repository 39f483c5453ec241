//! Shared value types for the Strobe circuit simulator.
//!
//! This crate provides the four-state wire value ([`Quad`]), the packed
//! arbitrary-width vector of such values ([`QuadVec`]) with the bitwise,
//! arithmetic, shift, and comparison operations the simulator's cell
//! evaluators consume, and interned identifiers ([`Ident`], [`Interner`])
//! used for every name in the netlist.

#![warn(missing_docs)]

pub mod ident;
pub mod quad;
pub mod quad_vec;

pub use ident::{Ident, Interner};
pub use quad::Quad;
pub use quad_vec::QuadVec;
