//! Opaque ID newtypes for netlist entities.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// ID of a module within a [`Design`](crate::Design).
    ModuleId
);

define_id!(
    /// ID of an instance within a module body.
    InstanceId
);

define_id!(
    /// ID of an interned type in the [`TypeDb`](crate::TypeDb).
    TypeId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn raw_roundtrip() {
        assert_eq!(ModuleId::from_raw(3).as_raw(), 3);
        assert_eq!(InstanceId::from_raw(0).as_raw(), 0);
        assert_eq!(TypeId::from_raw(9).as_raw(), 9);
    }

    #[test]
    fn ids_hash_and_compare() {
        let mut set = HashSet::new();
        set.insert(InstanceId::from_raw(1));
        set.insert(InstanceId::from_raw(1));
        set.insert(InstanceId::from_raw(2));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let id = TypeId::from_raw(7);
        let json = serde_json::to_string(&id).unwrap();
        let back: TypeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
