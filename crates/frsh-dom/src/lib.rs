//! frsh DOM - Document Object Model
//!
//! Arena-based DOM tree. Holds both the live page and parsed partial
//! responses; node identity is a plain index so markers can be tracked
//! across scans and swaps without reference counting.

mod node;
mod tree;
mod document;
mod operations;
mod attributes;

pub use node::{Node, NodeData, ElementData, TextData, Attribute};
pub use tree::{DomTree, Children};
pub use document::Document;
pub use operations::{DomError, DomResult};
pub use attributes::is_boolean_attribute;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check whether this id refers to a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn some(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
