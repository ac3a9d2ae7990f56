//! wire DOM - Document Object Model
//!
//! Arena-based DOM tree used by the template binding engine. Nodes are
//! addressed by [`NodeId`] and never freed; detached subtrees simply have no
//! path to the document root.

mod document;
mod error;
mod events;
mod interner;
mod node;
mod observer;
mod tree;

pub use document::Document;
pub use error::{DomError, DomResult};
pub use events::{Event, EventHandler, handler_slot};
pub use interner::{InternedString, QualName, StringInterner, HTML_NAMESPACE};
pub use node::{Attribute, ElementData, Node, NodeData, TextData};
pub use observer::{MutationObserverId, MutationObserverInit, MutationRecord, MutationType};
pub use tree::DomTree;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Document root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node" in the sibling/parent links
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this ID points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn option(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
