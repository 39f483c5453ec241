//! Circuit data model for the Strobe simulator.
//!
//! A [`Design`] holds a set of [`Module`]s. Each module is a typed interface
//! (a record of directed ports) plus an optional body: named [`Instance`]s of
//! other modules and bit-granularity [`Connection`]s between sub-wires named
//! by [`Select`] paths. Primitive modules carry a qualified operation name
//! (`coreir.add`, `corebit.reg`, ...) instead of a body.
//!
//! The simulator consumes this crate read-only; the builder methods on
//! [`Design`] produce the already-flattened form the simulator expects
//! (composite connections are expanded to per-bit driver/receiver pairs at
//! `connect` time).

#![warn(missing_docs)]

pub mod arena;
pub mod arg;
pub mod design;
pub mod error;
pub mod ids;
pub mod module;
pub mod select;
pub mod types;

pub use arena::{Arena, ArenaId};
pub use arg::ArgValue;
pub use design::Design;
pub use error::NetlistError;
pub use ids::{InstanceId, ModuleId, TypeId};
pub use module::{Connection, Instance, Module, ModuleDef};
pub use select::{PathSeg, Select, WireRoot};
pub use types::{Dir, Type, TypeDb};
