use petgraph::graph::NodeIndex;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LifetimeGraphId(pub u32);

/// A lifetime carved out of one scope's lifetime graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundedLifetime {
    pub graph: LifetimeGraphId,
    pub node: NodeIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Owned values. Outlasts every scope.
    Unbounded,
    Static,

    /// Outlasts nothing. Facades that were never resolved report this.
    Empty,

    Bounded(BoundedLifetime),
}

impl Lifetime {
    pub fn is_bounded(&self) -> bool {
        matches!(self, Lifetime::Bounded(_))
    }

    pub fn bounded(&self) -> Option<BoundedLifetime> {
        match self {
            Lifetime::Bounded(bounded) => Some(*bounded),
            _ => None,
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Unbounded => write!(f, "'unbounded"),
            Lifetime::Static => write!(f, "'static"),
            Lifetime::Empty => write!(f, "'empty"),
            Lifetime::Bounded(bounded) => {
                write!(f, "'g{}.{}", bounded.graph.0, bounded.node.index())
            }
        }
    }
}
