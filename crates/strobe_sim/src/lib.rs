//! Event-driven circuit simulator core.
//!
//! This crate evaluates a netlist from `strobe_netlist` bit-accurately over
//! simulated time with four-state (`0/1/X/Z`) values. Inputs are driven at
//! the top-level interface; value changes propagate through the netlist
//! until the network reaches a fixed point; any wire in the hierarchy can
//! be read back.
//!
//! # Architecture
//!
//! - [`WireValue`] — recursive value tree shaped like a port type, with
//!   bit-vector lift/lower at its bit and bit-array nodes.
//! - [`ValueStore`] — one value tree per wireable (interface + instances),
//!   resolved by select path.
//! - [`PrimOp`] — the closed set of interpreted cell operations.
//! - [`Simulator`] — the propagation engine: a deduplicating working set of
//!   fresh output selects drained by re-evaluating receiver cells, plus one
//!   child simulator per hierarchical instance, driven by value copy at the
//!   interface boundary.
//!
//! # Usage
//!
//! ```ignore
//! let mut sim = Simulator::new(&design, top)?;
//! sim.set_value("self.in", &QuadVec::from_u64(0x7ff, 11))?;
//! assert_eq!(sim.bit_vec("self.out")?.to_u64(), Some(1));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod prim;
pub mod simulator;
pub mod store;
pub mod wire_value;

pub use error::SimError;
pub use prim::PrimOp;
pub use simulator::Simulator;
pub use store::ValueStore;
pub use wire_value::WireValue;
