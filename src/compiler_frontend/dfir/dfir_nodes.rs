//! ============================================================
//!                      DFIR Nodes
//! ============================================================
//! The dataflow intermediate representation handed to the inference engine.
//!  - Programs are graphs of nodes connected by wires
//!  - Nodes live in nested scopes (frames, loops, option matches)
//!  - Structures own their inner scopes, border nodes carry values across them
//!
//! This is the smallest surface the inference passes need from the host editor layer:
//! ports with directions, a declared signature per node, scope nesting and whether a
//! scope executes conditionally.

use crate::compiler_frontend::datatypes::DataType;
use crate::compiler_frontend::dfir::signatures::NodeSignature;
use std::fmt::{Display, Formatter, Result as FmtResult};

// ============================================================
// Stable IDs
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId(pub u32);

impl Display for ScopeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "scope{}", self.0)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "node{}", self.0)
    }
}

impl Display for PortId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "port{}", self.0)
    }
}

impl Display for WireId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "wire{}", self.0)
    }
}

// ============================================================
// Scopes
// ============================================================
#[derive(Debug, Clone)]
pub struct DfirScope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,

    /// The structure node whose body this scope is. None for the root scope.
    pub owner: Option<NodeId>,

    /// Frames with an unwrap-option tunnel, loop bodies and match arms may not run at all
    pub executes_conditionally: bool,

    /// Nodes placed directly in this scope (border nodes belong to the outer scope)
    pub nodes: Vec<NodeId>,
}

// ============================================================
// Nodes
// ============================================================
#[derive(Debug, Clone)]
pub struct DfirNode {
    pub id: NodeId,
    pub scope: ScopeId,
    pub kind: NodeKind,
    pub inputs: Vec<PortId>,
    pub outputs: Vec<PortId>,

    /// Set for borrow, termination and drop nodes added by borrow insertion
    pub inserted: bool,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Produces an owned value. `mutable` is the binding's mutability.
    Constant { value_type: DataType, mutable: bool },

    /// A primitive operation described entirely by its signature
    Functional(NodeSignature),

    ExplicitBorrow { mutable: bool, count: usize },
    /// Ends a borrow: takes the last references of a lifetime, hands back the borrowed values
    TerminateLifetime { inputs: usize, outputs: usize },
    Drop,

    Structure(StructureKind),
    Border {
        structure: NodeId,
        kind: BorderNodeKind,
    },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Constant { .. } => "Constant",
            NodeKind::Functional(signature) => signature.name,
            NodeKind::ExplicitBorrow { .. } => "ExplicitBorrow",
            NodeKind::TerminateLifetime { .. } => "TerminateLifetime",
            NodeKind::Drop => "Drop",
            NodeKind::Structure(kind) => kind.name(),
            NodeKind::Border { kind, .. } => kind.name(),
        }
    }

    pub fn is_structure(&self) -> bool {
        matches!(self, NodeKind::Structure(_))
    }

    pub fn border_kind(&self) -> Option<&BorderNodeKind> {
        match self {
            NodeKind::Border { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureKind {
    /// A sequence frame with one body scope
    Frame,
    /// A loop with one body scope
    Loop,
    /// A pattern match on an Option with a Some arm and a None arm
    OptionMatch,
}

impl StructureKind {
    pub fn name(self) -> &'static str {
        match self {
            StructureKind::Frame => "Frame",
            StructureKind::Loop => "Loop",
            StructureKind::OptionMatch => "OptionMatch",
        }
    }

    pub fn inner_scope_count(self) -> usize {
        match self {
            StructureKind::Frame | StructureKind::Loop => 1,
            StructureKind::OptionMatch => 2,
        }
    }

    /// Values leaving a merging structure come from exactly one of its arms
    pub fn merges_branches(self) -> bool {
        matches!(self, StructureKind::OptionMatch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderNodeKind {
    InputTunnel,
    OutputTunnel,
    BorrowTunnel { mutable: bool },
    TerminateLifetimeTunnel { borrow_tunnel: NodeId },
    UnwrapOptionTunnel,
    LoopCondition,
    IterateTunnel,
    /// Feeds the Some payload of the matched Option into the first arm
    OptionSelector,
}

impl BorderNodeKind {
    pub fn name(self) -> &'static str {
        match self {
            BorderNodeKind::InputTunnel => "InputTunnel",
            BorderNodeKind::OutputTunnel => "OutputTunnel",
            BorderNodeKind::BorrowTunnel { .. } => "BorrowTunnel",
            BorderNodeKind::TerminateLifetimeTunnel { .. } => "TerminateLifetimeTunnel",
            BorderNodeKind::UnwrapOptionTunnel => "UnwrapOptionTunnel",
            BorderNodeKind::LoopCondition => "LoopCondition",
            BorderNodeKind::IterateTunnel => "IterateTunnel",
            BorderNodeKind::OptionSelector => "OptionSelector",
        }
    }

    pub fn side(self) -> BorderSide {
        match self {
            BorderNodeKind::OutputTunnel | BorderNodeKind::TerminateLifetimeTunnel { .. } => {
                BorderSide::Output
            }
            _ => BorderSide::Input,
        }
    }
}

/// Input-side border nodes carry values into a structure, output-side ones carry them out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderSide {
    Input,
    Output,
}

// ============================================================
// Ports and wires
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone)]
pub struct DfirPort {
    pub id: PortId,
    pub node: NodeId,
    pub direction: Direction,
    pub index: usize,

    /// The scope this port faces. For border nodes this is either the outer scope
    /// or one of the structure's inner scopes.
    pub scope: ScopeId,

    pub wire: Option<WireId>,
}

#[derive(Debug, Clone)]
pub struct Wire {
    pub id: WireId,
    pub scope: ScopeId,
    pub source: PortId,

    /// Ordered sinks. More than one sink means the value fans out.
    pub sinks: Vec<PortId>,
}
