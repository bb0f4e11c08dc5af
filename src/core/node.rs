//! Node and identifier types for the PDD arena.

use std::fmt;

/// Saturating refcount value that pins a node permanently (spec §3 I6, §4.4).
pub const MAX_RC: u32 = u32::MAX;

/// Arena index of a node. `NodeId(0)` and `NodeId(1)` are reserved for the
/// constants zero and one (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// `NodeId` of the constant `0`.
pub const ZERO: NodeId = NodeId(0);
/// `NodeId` of the constant `1`.
pub const ONE: NodeId = NodeId(1);

/// A variable position. `Level(0)` is reserved for value nodes; real
/// variables live at levels `1..=num_vars`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Level(pub u32);

/// The level reserved for value (constant) nodes.
pub const VALUE_LEVEL: Level = Level(0);

/// The structural content of a node (spec §3 "PDD node").
///
/// A `Value` node denotes the constant `values[value_index]`. A `Decision`
/// node at `level > 0` denotes `x_level * hi + lo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Value(u32),
    Decision {
        level: Level,
        lo: NodeId,
        hi: NodeId,
    },
}

impl NodeKind {
    pub fn level(&self) -> Level {
        match self {
            NodeKind::Value(_) => VALUE_LEVEL,
            NodeKind::Decision { level, .. } => *level,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, NodeKind::Value(_))
    }
}

/// A node record in the arena (spec §3 "PDD node").
#[derive(Debug, Clone)]
pub struct PddNode {
    pub kind: NodeKind,
    /// Saturating reference count; `MAX_RC` pins the node permanently.
    pub refcount: u32,
    /// Self-id, for cross-checks (spec §3).
    pub index: NodeId,
    /// Set while the slot sits on the free list.
    pub internal: bool,
    /// Mark-epoch value, compared against the manager's `mark_level` (§4.5).
    pub mark: u32,
}

impl PddNode {
    pub fn level(&self) -> Level {
        self.kind.level()
    }

    pub fn is_value(&self) -> bool {
        self.kind.is_value()
    }

    pub fn lo(&self) -> NodeId {
        match self.kind {
            NodeKind::Value(_) => ZERO,
            NodeKind::Decision { lo, .. } => lo,
        }
    }

    pub fn hi(&self) -> NodeId {
        match self.kind {
            // I1: value nodes have hi == 0.
            NodeKind::Value(_) => ZERO,
            NodeKind::Decision { hi, .. } => hi,
        }
    }

    pub fn value_index(&self) -> Option<u32> {
        match self.kind {
            NodeKind::Value(idx) => Some(idx),
            NodeKind::Decision { .. } => None,
        }
    }
}
