//! Paths naming sub-wires beneath a wireable.

use crate::ids::InstanceId;
use serde::{Deserialize, Serialize};

/// The root of a select path: the module's own interface or one of the
/// instances in its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireRoot {
    /// The module's `self` interface.
    Iface,
    /// A named instance in the module body.
    Inst(InstanceId),
}

/// One step of a select path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSeg {
    /// A record field, by name.
    Field(strobe_common::Ident),
    /// An array element, by index.
    Index(u32),
}

/// A sub-wire named by an ordered path of field/index steps rooted at a
/// wireable.
///
/// A select with an empty path names the wireable's whole port tree.
/// Connections always use fully descended selects (one per bit leaf);
/// coarser selects appear as working-set entries and driver-API arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Select {
    root: WireRoot,
    path: Vec<PathSeg>,
}

impl Select {
    /// Creates a select naming the whole port tree of `root`.
    pub fn of(root: WireRoot) -> Self {
        Self {
            root,
            path: Vec::new(),
        }
    }

    /// Returns the wireable at the root of the path.
    pub fn top_parent(&self) -> WireRoot {
        self.root
    }

    /// Returns the path segments, outermost first.
    pub fn path(&self) -> &[PathSeg] {
        &self.path
    }

    /// Extends the path by one segment.
    pub fn child(&self, seg: PathSeg) -> Self {
        let mut path = self.path.clone();
        path.push(seg);
        Self {
            root: self.root,
            path,
        }
    }

    /// Extends the path by a record field.
    pub fn field(&self, name: strobe_common::Ident) -> Self {
        self.child(PathSeg::Field(name))
    }

    /// Extends the path by an array index.
    pub fn index(&self, i: u32) -> Self {
        self.child(PathSeg::Index(i))
    }

    /// Returns the select one step up, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.path.is_empty() {
            return None;
        }
        Some(Self {
            root: self.root,
            path: self.path[..self.path.len() - 1].to_vec(),
        })
    }

    /// Returns `true` if `other` names this wire or a wire beneath it.
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.root == other.root
            && other.path.len() >= self.path.len()
            && self.path.iter().zip(&other.path).all(|(a, b)| a == b)
    }
}
