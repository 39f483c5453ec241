//! Modules, instances, and connections.

use crate::arena::Arena;
use crate::arg::ArgValue;
use crate::ids::{InstanceId, ModuleId, TypeId};
use crate::select::Select;
use serde::{Deserialize, Serialize};
use strobe_common::Ident;

/// A named occurrence of a module inside another module's body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// The instance name, unique within the enclosing body.
    pub name: Ident,
    /// The module this instance refers to.
    pub module: ModuleId,
    /// Per-instance argument values (e.g. a constant's `value`).
    pub mod_args: Vec<(Ident, ArgValue)>,
}

impl Instance {
    /// Looks up a per-instance argument by name.
    pub fn arg(&self, name: Ident) -> Option<&ArgValue> {
        self.mod_args
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}

/// A single driver→receiver wire at bit granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// The driving bit (an output leaf).
    pub driver: Select,
    /// The receiving bit (an input leaf).
    pub receiver: Select,
}

/// The body of a module: its instances and their wiring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleDef {
    /// Instances in declaration order.
    pub instances: Arena<InstanceId, Instance>,
    /// All connections, each at bit granularity.
    pub connections: Vec<Connection>,
}

impl ModuleDef {
    /// Finds an instance by name.
    pub fn instance(&self, name: Ident) -> Option<InstanceId> {
        self.instances
            .iter()
            .find(|(_, inst)| inst.name == name)
            .map(|(id, _)| id)
    }
}

/// A module: a typed interface plus either a body or a primitive operation.
///
/// Composite modules have `def: Some(..)` and no `op_name`; primitive
/// modules carry the qualified operation name used for evaluator dispatch
/// (`coreir.add`, `corebit.reg`, ...) and generator arguments such as
/// `width`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// The module name.
    pub name: Ident,
    /// Qualified operation name for primitives; `None` for composites.
    pub op_name: Option<String>,
    /// Generator arguments shared by every instance of this module.
    pub gen_args: Vec<(Ident, ArgValue)>,
    /// The interface type (a record of directed ports), as seen from
    /// outside an instance.
    pub ports: TypeId,
    /// The interface type with leaf directions flipped, which is how the
    /// module's own body sees `self`.
    pub ports_flipped: TypeId,
    /// The body, when this module has one.
    pub def: Option<ModuleDef>,
}

impl Module {
    /// Returns `true` if this module has a body.
    pub fn has_def(&self) -> bool {
        self.def.is_some()
    }

    /// Looks up a generator argument by name.
    pub fn gen_arg(&self, name: Ident) -> Option<&ArgValue> {
        self.gen_args
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_arg_lookup() {
        let inst = Instance {
            name: Ident::from_raw(1),
            module: ModuleId::from_raw(0),
            mod_args: vec![(Ident::from_raw(2), ArgValue::Bool(true))],
        };
        assert_eq!(inst.arg(Ident::from_raw(2)), Some(&ArgValue::Bool(true)));
        assert_eq!(inst.arg(Ident::from_raw(3)), None);
    }

    #[test]
    fn def_instance_lookup_by_name() {
        let mut def = ModuleDef::default();
        let id = def.instances.alloc(Instance {
            name: Ident::from_raw(5),
            module: ModuleId::from_raw(0),
            mod_args: Vec::new(),
        });
        assert_eq!(def.instance(Ident::from_raw(5)), Some(id));
        assert_eq!(def.instance(Ident::from_raw(6)), None);
    }

    #[test]
    fn primitive_vs_composite() {
        let prim = Module {
            name: Ident::from_raw(1),
            op_name: Some("coreir.add".into()),
            gen_args: vec![(Ident::from_raw(2), ArgValue::Int(16))],
            ports: TypeId::from_raw(0),
            ports_flipped: TypeId::from_raw(1),
            def: None,
        };
        assert!(!prim.has_def());
        assert_eq!(prim.gen_arg(Ident::from_raw(2)), Some(&ArgValue::Int(16)));

        let comp = Module {
            name: Ident::from_raw(3),
            op_name: None,
            gen_args: Vec::new(),
            ports: TypeId::from_raw(0),
            ports_flipped: TypeId::from_raw(1),
            def: Some(ModuleDef::default()),
        };
        assert!(comp.has_def());
        assert_eq!(comp.gen_arg(Ident::from_raw(2)), None);
    }
}
