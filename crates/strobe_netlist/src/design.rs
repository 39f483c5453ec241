//! The design container: module storage, the netlist builder, and the
//! read-only query API the simulator consumes.

use crate::arena::Arena;
use crate::arg::ArgValue;
use crate::error::NetlistError;
use crate::ids::{InstanceId, ModuleId, TypeId};
use crate::module::{Connection, Instance, Module, ModuleDef};
use crate::select::{PathSeg, Select, WireRoot};
use crate::types::{Dir, Type, TypeDb};
use strobe_common::{Ident, Interner};

/// A complete design: interned types, interned names, and a set of modules.
///
/// Builder methods (`add_module`, `add_primitive`, `add_instance`,
/// `connect`) produce the flattened form the simulator expects; query
/// methods are read-only and mirror the provider interface the simulator
/// was written against.
pub struct Design {
    /// All modules, primitives included.
    pub modules: Arena<ModuleId, Module>,
    /// Interned port types.
    pub types: TypeDb,
    interner: Interner,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self {
            modules: Arena::new(),
            types: TypeDb::new(),
            interner: Interner::new(),
        }
    }

    /// Interns a name.
    pub fn intern(&self, s: &str) -> Ident {
        self.interner.intern(s)
    }

    /// Resolves an interned name.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.interner.resolve(ident)
    }

    /// Returns the interner backing this design's names.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Adds a composite module with an empty body.
    pub fn add_module(&mut self, name: &str, ports: TypeId) -> ModuleId {
        let ports_flipped = self.types.flip(ports);
        self.modules.alloc(Module {
            name: self.interner.intern(name),
            op_name: None,
            gen_args: Vec::new(),
            ports,
            ports_flipped,
            def: Some(ModuleDef::default()),
        })
    }

    /// Adds a primitive module carrying a qualified operation name and
    /// generator arguments.
    pub fn add_primitive(
        &mut self,
        name: &str,
        op: &str,
        gen_args: Vec<(&str, ArgValue)>,
        ports: TypeId,
    ) -> ModuleId {
        let ports_flipped = self.types.flip(ports);
        let gen_args = gen_args
            .into_iter()
            .map(|(n, v)| (self.interner.intern(n), v))
            .collect();
        self.modules.alloc(Module {
            name: self.interner.intern(name),
            op_name: Some(op.to_string()),
            gen_args,
            ports,
            ports_flipped,
            def: None,
        })
    }

    /// Adds an instance of `of` to `parent`'s body.
    pub fn add_instance(
        &mut self,
        parent: ModuleId,
        name: &str,
        of: ModuleId,
        mod_args: Vec<(&str, ArgValue)>,
    ) -> Result<InstanceId, NetlistError> {
        let ident = self.interner.intern(name);
        let mod_args = mod_args
            .into_iter()
            .map(|(n, v)| (self.interner.intern(n), v))
            .collect();
        let parent_name = self.resolve(self.modules.get(parent).name).to_string();
        let def = self
            .modules
            .get_mut(parent)
            .def
            .as_mut()
            .ok_or(NetlistError::NoBody {
                module: parent_name,
            })?;
        if def.instance(ident).is_some() {
            return Err(NetlistError::DuplicateInstance {
                name: name.to_string(),
            });
        }
        Ok(def.instances.alloc(Instance {
            name: ident,
            module: of,
            mod_args,
        }))
    }

    /// Connects two wires of `module`'s body, expanding to bit granularity.
    ///
    /// Exactly one endpoint must be an output (the driver) and the other an
    /// input; the interface's leaf directions are flipped before the check,
    /// so `self.in` drives instance inputs. Endpoints must agree
    /// structurally (directions and named wrappers ignored).
    pub fn connect(&mut self, module: ModuleId, a: &str, b: &str) -> Result<(), NetlistError> {
        let sa = self.parse_select(module, a)?;
        let sb = self.parse_select(module, b)?;
        self.connect_selects(module, sa, sb)
    }

    /// [`connect`](Design::connect) for already-resolved selects.
    pub fn connect_selects(
        &mut self,
        module: ModuleId,
        a: Select,
        b: Select,
    ) -> Result<(), NetlistError> {
        let ta = self.wire_type(module, &a)?;
        let tb = self.wire_type(module, &b)?;
        let da = self
            .types
            .direction(ta)
            .ok_or_else(|| NetlistError::MixedDirection {
                select: self.select_string(module, &a),
            })?;
        let db = self
            .types
            .direction(tb)
            .ok_or_else(|| NetlistError::MixedDirection {
                select: self.select_string(module, &b),
            })?;
        if !self.types.same_shape(ta, tb) {
            return Err(NetlistError::ShapeMismatch {
                a: self.select_string(module, &a),
                b: self.select_string(module, &b),
            });
        }
        let (driver, dty, receiver, rty) = match (da, db) {
            (Dir::Out, Dir::In) => (a, ta, b, tb),
            (Dir::In, Dir::Out) => (b, tb, a, ta),
            _ => {
                return Err(NetlistError::DirectionConflict {
                    a: self.select_string(module, &a),
                    b: self.select_string(module, &b),
                })
            }
        };
        let mut pairs = Vec::new();
        self.expand_leaves(module, dty, rty, &driver, &receiver, &mut pairs)?;
        let module_name = self.resolve(self.modules.get(module).name).to_string();
        let def = self
            .modules
            .get_mut(module)
            .def
            .as_mut()
            .ok_or(NetlistError::NoBody {
                module: module_name,
            })?;
        def.connections.extend(pairs);
        Ok(())
    }

    /// Walks both endpoint types in lockstep, emitting one driver/receiver
    /// pair per bit leaf. Named wrappers are leaves and must wrap a single
    /// bit; selects never descend through them.
    fn expand_leaves(
        &self,
        module: ModuleId,
        dty: TypeId,
        rty: TypeId,
        driver: &Select,
        receiver: &Select,
        out: &mut Vec<Connection>,
    ) -> Result<(), NetlistError> {
        let ds = self.types.strip_named(dty);
        let rs = self.types.strip_named(rty);
        for (ty, stripped, sel) in [(dty, ds, driver), (rty, rs, receiver)] {
            if ty != stripped && !matches!(self.types.get(stripped), Type::Bit(_)) {
                return Err(NetlistError::NamedNotBit {
                    select: self.select_string(module, sel),
                });
            }
        }
        match (self.types.get(ds), self.types.get(rs)) {
            (Type::Bit(_), Type::Bit(_)) => {
                out.push(Connection {
                    driver: driver.clone(),
                    receiver: receiver.clone(),
                });
                Ok(())
            }
            (Type::Array { elem: de, len }, Type::Array { elem: re, .. }) => {
                let (de, re, len) = (*de, *re, *len);
                for i in 0..len {
                    self.expand_leaves(module, de, re, &driver.index(i), &receiver.index(i), out)?;
                }
                Ok(())
            }
            (Type::Record { fields: df }, Type::Record { fields: rf }) => {
                let pairs: Vec<(Ident, TypeId, TypeId)> = df
                    .iter()
                    .filter_map(|(name, dfty)| {
                        rf.iter()
                            .find(|(n, _)| n == name)
                            .map(|(_, rfty)| (*name, *dfty, *rfty))
                    })
                    .collect();
                if pairs.len() != df.len() {
                    return Err(NetlistError::ShapeMismatch {
                        a: self.select_string(module, driver),
                        b: self.select_string(module, receiver),
                    });
                }
                for (name, dfty, rfty) in pairs {
                    self.expand_leaves(
                        module,
                        dfty,
                        rfty,
                        &driver.field(name),
                        &receiver.field(name),
                        out,
                    )?;
                }
                Ok(())
            }
            _ => Err(NetlistError::ShapeMismatch {
                a: self.select_string(module, driver),
                b: self.select_string(module, receiver),
            }),
        }
    }

    /// Returns the type of a sub-wire. The interface root uses the flipped
    /// view (`self.in` is an output inside the body).
    pub fn wire_type(&self, module: ModuleId, sel: &Select) -> Result<TypeId, NetlistError> {
        let m = self.modules.get(module);
        let mut ty = match sel.top_parent() {
            WireRoot::Iface => m.ports_flipped,
            WireRoot::Inst(id) => {
                let def = m.def.as_ref().ok_or_else(|| NetlistError::NoBody {
                    module: self.resolve(m.name).to_string(),
                })?;
                self.modules.get(def.instances.get(id).module).ports
            }
        };
        for seg in sel.path() {
            ty = self
                .types
                .child(ty, seg)
                .ok_or_else(|| NetlistError::UnknownSelect {
                    path: self.select_string(module, sel),
                })?;
        }
        Ok(ty)
    }

    /// Returns the first-level selects of a wireable's port tree with their
    /// directions (interface directions flipped). Fields without a uniform
    /// direction are omitted.
    pub fn wire_selects(&self, module: ModuleId, root: WireRoot) -> Vec<(Select, Dir)> {
        let base = Select::of(root);
        let Ok(ty) = self.wire_type(module, &base) else {
            return Vec::new();
        };
        let Type::Record { fields } = self.types.get(ty) else {
            return Vec::new();
        };
        fields
            .iter()
            .filter_map(|(name, fty)| {
                self.types
                    .direction(*fty)
                    .map(|dir| (base.field(*name), dir))
            })
            .collect()
    }

    /// Returns the output selects of a wireable's port tree.
    pub fn output_selects(&self, module: ModuleId, root: WireRoot) -> Vec<Select> {
        self.wire_selects(module, root)
            .into_iter()
            .filter(|(_, dir)| *dir == Dir::Out)
            .map(|(sel, _)| sel)
            .collect()
    }

    /// Returns every receiver bit driven by `sel` or by a wire beneath it.
    pub fn receiver_selects(&self, module: ModuleId, sel: &Select) -> Vec<Select> {
        match self.modules.get(module).def.as_ref() {
            Some(def) => def
                .connections
                .iter()
                .filter(|c| sel.is_prefix_of(&c.driver))
                .map(|c| c.receiver.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Iterates the connections whose receiver is rooted at `root`: the
    /// wires to pull when updating that wireable's inputs.
    pub fn source_connections(
        &self,
        module: ModuleId,
        root: WireRoot,
    ) -> impl Iterator<Item = &Connection> {
        self.modules
            .get(module)
            .def
            .as_ref()
            .map(|def| def.connections.iter())
            .into_iter()
            .flatten()
            .filter(move |c| c.receiver.top_parent() == root)
    }

    /// Returns a primitive module's qualified operation name.
    pub fn qualified_op_name(&self, module: ModuleId) -> Option<&str> {
        self.modules.get(module).op_name.as_deref()
    }

    /// Parses a dot-separated path (`self.in`, `mux0.out.3`) into a select.
    ///
    /// The first segment is `self` or an instance name; later segments are
    /// record fields or decimal array indices. The path is validated
    /// against the port types as it is walked.
    pub fn parse_select(&self, module: ModuleId, path: &str) -> Result<Select, NetlistError> {
        let unknown = || NetlistError::UnknownSelect {
            path: path.to_string(),
        };
        let m = self.modules.get(module);
        let mut segments = path.split('.');
        let head = segments.next().filter(|s| !s.is_empty()).ok_or_else(unknown)?;

        let root = if head == "self" {
            WireRoot::Iface
        } else {
            let def = m.def.as_ref().ok_or_else(unknown)?;
            let name = self.interner.get(head).ok_or_else(unknown)?;
            WireRoot::Inst(def.instance(name).ok_or_else(unknown)?)
        };

        let mut sel = Select::of(root);
        let mut ty = self.wire_type(module, &sel).map_err(|_| unknown())?;
        for seg_str in segments {
            let seg = match seg_str.parse::<u32>() {
                Ok(i) => PathSeg::Index(i),
                Err(_) => {
                    PathSeg::Field(self.interner.get(seg_str).ok_or_else(unknown)?)
                }
            };
            ty = self.types.child(ty, &seg).ok_or_else(unknown)?;
            sel = sel.child(seg);
        }
        Ok(sel)
    }

    /// Returns `true` if `path` names a wire of `module`.
    pub fn can_sel(&self, module: ModuleId, path: &str) -> bool {
        self.parse_select(module, path).is_ok()
    }

    /// Renders a select in dot form for messages and logs.
    pub fn select_string(&self, module: ModuleId, sel: &Select) -> String {
        let mut out = match sel.top_parent() {
            WireRoot::Iface => "self".to_string(),
            WireRoot::Inst(id) => {
                match self.modules.get(module).def.as_ref() {
                    Some(def) => self.resolve(def.instances.get(id).name).to_string(),
                    None => format!("inst{}", id.as_raw()),
                }
            }
        };
        for seg in sel.path() {
            match seg {
                PathSeg::Field(name) => {
                    out.push('.');
                    out.push_str(self.resolve(*name));
                }
                PathSeg::Index(i) => {
                    out.push('.');
                    out.push_str(&i.to_string());
                }
            }
        }
        out
    }
}

impl Default for Design {
    fn default() -> Self {
        Self::new()
    }
}
