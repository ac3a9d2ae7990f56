//! DOM Observers
//!
//! MutationObserver registrations and the records queued for them. The tree
//! queues records synchronously; delivery is batched by the caller, which is
//! what lets an add followed by a remove collapse into "no change".

use crate::NodeId;

/// Handle to a registered mutation observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationObserverId(pub(crate) u32);

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    pub subtree: bool,
}

impl MutationObserverInit {
    /// Child-list changes anywhere under the target
    pub fn subtree_child_list() -> Self {
        Self {
            child_list: true,
            subtree: true,
            ..Default::default()
        }
    }

    fn wants(&self, kind: MutationType) -> bool {
        match kind {
            MutationType::ChildList => self.child_list,
            MutationType::Attributes => self.attributes,
            MutationType::CharacterData => self.character_data,
        }
    }
}

/// Mutation record
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            old_value: None,
        }
    }

    pub fn attribute(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            attribute_name: Some(name.to_string()),
            old_value,
            ..Self::child_list(target, Vec::new(), Vec::new())
        }
    }

    pub fn character_data(target: NodeId, old_value: String) -> Self {
        Self {
            mutation_type: MutationType::CharacterData,
            old_value: Some(old_value),
            ..Self::child_list(target, Vec::new(), Vec::new())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

/// One observer's registration on one target
#[derive(Debug)]
pub(crate) struct Registration {
    pub id: MutationObserverId,
    pub target: NodeId,
    pub options: MutationObserverInit,
    pub records: Vec<MutationRecord>,
}

impl Registration {
    pub fn wants(&self, kind: MutationType) -> bool {
        self.options.wants(kind)
    }
}
