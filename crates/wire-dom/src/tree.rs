//! DOM Tree (arena-based allocation)
//!
//! Core node manipulation: appendChild, insertBefore, removeChild,
//! replaceChild, attribute access and mutation record queueing.

use crate::observer::Registration;
use crate::{
    DomError, DomResult, EventHandler, InternedString, MutationObserverId, MutationObserverInit,
    MutationRecord, MutationType, Node, NodeData, NodeId, QualName, StringInterner,
    HTML_NAMESPACE,
};

/// Arena-based DOM tree
///
/// Index 0 is always the document node; everything reachable from it is
/// "connected". Nodes created afterwards start detached.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    interner: StringInterner,
    observers: Vec<Registration>,
    next_observer: u32,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            interner: StringInterner::new(),
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.nodes.get_mut(id.index()).ok_or(DomError::NotFound(id))
    }

    /// Number of nodes in the arena (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------

    /// Resolve an interned name
    #[inline]
    pub fn resolve(&self, s: InternedString) -> &str {
        self.interner.get(s)
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn interner_mut(&mut self) -> &mut StringInterner {
        &mut self.interner
    }

    fn html_name(&mut self, local: &str) -> QualName {
        let ns = self.interner.intern(HTML_NAMESPACE);
        QualName::new(ns, self.interner.intern(local))
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached HTML element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name = self.html_name(&tag.to_ascii_lowercase());
        self.push(Node::element(name))
    }

    /// Create a detached element in the given namespace, keeping the tag case
    pub fn create_element_ns(&mut self, ns: &str, tag: &str) -> NodeId {
        let name = QualName::new(self.interner.intern(ns), self.interner.intern(tag));
        self.push(Node::element(name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(Node::comment(content.to_string()))
    }

    /// Create a detached doctype node
    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        self.push(Node::doctype(
            name.to_string(),
            public_id.to_string(),
            system_id.to_string(),
        ))
    }

    /// Create a detached document container (holds a parsed document)
    pub fn create_document(&mut self) -> NodeId {
        self.push(Node::document())
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.option())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child.option())
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.last_child.option())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling.option())
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling.option())
    }

    /// Iterate over direct children as `(id, node)` pairs
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id),
        }
    }

    /// Direct children IDs
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).map(|(child, _)| child).collect()
    }

    /// Direct element children IDs
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .filter(|(_, node)| node.is_element())
            .map(|(child, _)| child)
            .collect()
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .find(|(_, node)| node.is_element())
            .map(|(child, _)| child)
    }

    /// All nodes of the subtree in document order, `root` first
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.get(root).is_none() {
            return out;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children = self.child_ids(id);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Inclusive containment: `node` is `ancestor` or below it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the node is part of the document
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.contains(NodeId::ROOT, id)
    }

    /// Target followed by its ancestors, for event bubbling
    pub fn event_path(&self, target: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.get(target).map(|_| target);
        while let Some(id) = current {
            path.push(id);
            current = self.parent(id);
        }
        path
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Append a child node, moving it if it is attached elsewhere
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or at the end when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        if !self.node(parent)?.is_container() {
            return Err(DomError::InvalidNodeType(parent));
        }
        if matches!(self.node(child)?.data, NodeData::Document) {
            return Err(DomError::InvalidNodeType(child));
        }
        if self.contains(child, parent) {
            tracing::trace!("rejected insert of {:?} into its own descendant {:?}", child, parent);
            return Err(DomError::HierarchyRequest { parent, child });
        }

        let mut reference = reference;
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild { parent, child: r });
            }
            if r == child {
                reference = self.next_sibling(child);
            }
        }

        self.detach(child);

        let prev = match reference {
            Some(r) => self.node(r)?.prev_sibling,
            None => self.node(parent)?.last_child,
        };
        let next = reference.unwrap_or(NodeId::NONE);

        {
            let node = self.node_mut(child)?;
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        if prev.is_valid() {
            self.node_mut(prev)?.next_sibling = child;
        } else {
            self.node_mut(parent)?.first_child = child;
        }
        if next.is_valid() {
            self.node_mut(next)?.prev_sibling = child;
        } else {
            self.node_mut(parent)?.last_child = child;
        }

        tracing::trace!("inserted {:?} under {:?}", child, parent);
        self.queue_record(MutationRecord {
            previous_sibling: prev.option(),
            next_sibling: next.option(),
            ..MutationRecord::child_list(parent, vec![child], Vec::new())
        });
        Ok(child)
    }

    /// Insert `child` directly after `after`, which must be attached
    pub fn insert_after(&mut self, child: NodeId, after: NodeId) -> DomResult<NodeId> {
        let parent = self.parent(after).ok_or(DomError::NotFound(after))?;
        let next = self.next_sibling(after);
        self.insert_before(parent, child, next)
    }

    /// Remove a child node from its parent
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.node(child)?.parent != parent {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(child)
    }

    /// Unlink a node from its parent, if it has one
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        if !parent.is_valid() {
            return;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;

        tracing::trace!("detached {:?} from {:?}", id, parent);
        self.queue_record(MutationRecord {
            previous_sibling: prev.option(),
            next_sibling: next.option(),
            ..MutationRecord::child_list(parent, Vec::new(), vec![id])
        });
    }

    /// Replace `old` (a child of `parent`) with `new`
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> DomResult<NodeId> {
        if self.node(old)?.parent != parent {
            return Err(DomError::NotAChild { parent, child: old });
        }
        if new == old {
            return Ok(old);
        }
        let reference = match self.next_sibling(old) {
            Some(next) if next == new => self.next_sibling(new),
            next => next,
        };
        self.detach(old);
        self.insert_before(parent, new, reference)?;
        Ok(old)
    }

    /// Replace a node in whatever parent currently holds it
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) -> DomResult<NodeId> {
        let parent = self.parent(old).ok_or(DomError::NotFound(old))?;
        self.replace_child(parent, new, old)
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element().map(|e| self.resolve(e.name.local))
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let name = self.interner.lookup(name)?;
        self.get(id)?.as_element()?.get_attr(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let qname = self.html_name(name);
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType(id))?;
        let old = elem.set_attr(qname, value.to_string());
        self.queue_record(MutationRecord::attribute(id, name, old));
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        let Some(local) = self.interner.lookup(name) else {
            return Ok(None);
        };
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType(id))?;
        let old = elem.remove_attr(local);
        if old.is_some() {
            self.queue_record(MutationRecord::attribute(id, name, old.clone()));
        }
        Ok(old)
    }

    /// Attribute `(name, value)` pairs in source order
    pub fn attributes(&self, id: NodeId) -> Vec<(&str, &str)> {
        self.get(id)
            .and_then(|n| n.as_element())
            .map(|e| {
                e.attrs
                    .iter()
                    .map(|a| (self.resolve(a.name.local), a.value.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Character data and properties
    // ------------------------------------------------------------------

    /// Character data of a text or comment node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.character_data()
    }

    /// Replace the character data of a text or comment node
    pub fn set_text(&mut self, id: NodeId, content: &str) -> DomResult<()> {
        let old = match &mut self.node_mut(id)?.data {
            NodeData::Text(t) => std::mem::replace(&mut t.content, content.to_string()),
            NodeData::Comment(c) => std::mem::replace(c, content.to_string()),
            _ => return Err(DomError::InvalidNodeType(id)),
        };
        self.queue_record(MutationRecord::character_data(id, old));
        Ok(())
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.get(n)?.as_text())
            .collect()
    }

    /// Live `value` property; falls back to the `value` attribute until written
    pub fn value(&self, id: NodeId) -> Option<&str> {
        let elem = self.get(id)?.as_element()?;
        match &elem.value {
            Some(v) => Some(v),
            None => self.get_attribute(id, "value"),
        }
    }

    /// Write the live `value` property (the attribute is left untouched)
    pub fn set_value(&mut self, id: NodeId, value: &str) -> DomResult<()> {
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType(id))?;
        elem.value = Some(value.to_string());
        Ok(())
    }

    /// Handler in an element's `on<event>` slot
    pub fn handler(&self, id: NodeId, slot: &str) -> Option<EventHandler> {
        self.get(id)?.as_element()?.handler(slot).cloned()
    }

    /// Assign a handler to an element's `on<event>` slot
    pub fn set_handler(&mut self, id: NodeId, slot: &str, handler: EventHandler) -> DomResult<()> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType(id))?
            .set_handler(&slot.to_ascii_lowercase(), handler);
        Ok(())
    }

    pub fn has_handler(&self, id: NodeId, slot: &str) -> bool {
        self.handler(id, slot).is_some()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// First element at or under `root` whose attribute `name` equals `value`
    pub fn find_by_attribute(&self, root: NodeId, name: &str, value: &str) -> Option<NodeId> {
        let name = self.interner.lookup(name)?;
        self.descendants(root).into_iter().find(|&id| {
            self.get(id)
                .and_then(|n| n.as_element())
                .and_then(|e| e.get_attr(name))
                == Some(value)
        })
    }

    /// Breadth-first search for an attribute whose value equals `value`,
    /// returning the owning element and the attribute name
    pub fn find_attribute_value(&self, root: NodeId, value: &str) -> Option<(NodeId, String)> {
        let mut queue = std::collections::VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if let Some(elem) = self.get(id).and_then(|n| n.as_element()) {
                if let Some(attr) = elem.attrs.iter().find(|a| a.value == value) {
                    return Some((id, self.resolve(attr.name.local).to_string()));
                }
            }
            queue.extend(self.element_children(id));
        }
        None
    }

    /// First comment at or under `root` whose trimmed data equals `data`
    pub fn find_comment(&self, root: NodeId, data: &str) -> Option<NodeId> {
        self.descendants(root).into_iter().find(|&id| {
            matches!(self.get(id).map(|n| &n.data), Some(NodeData::Comment(c)) if c.trim() == data)
        })
    }

    // ------------------------------------------------------------------
    // Mutation observers
    // ------------------------------------------------------------------

    /// Start observing `target`; records queue until [`take_records`](Self::take_records)
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) -> MutationObserverId {
        let id = MutationObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push(Registration {
            id,
            target,
            options,
            records: Vec::new(),
        });
        id
    }

    /// Drain the records queued for an observer
    pub fn take_records(&mut self, observer: MutationObserverId) -> Vec<MutationRecord> {
        self.observers
            .iter_mut()
            .filter(|r| r.id == observer)
            .flat_map(|r| std::mem::take(&mut r.records))
            .collect()
    }

    /// Whether any observer has undelivered records
    pub fn has_pending_records(&self) -> bool {
        self.observers.iter().any(|r| !r.records.is_empty())
    }

    pub fn disconnect(&mut self, observer: MutationObserverId) {
        self.observers.retain(|r| r.id != observer);
    }

    fn queue_record(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        let matching: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter(|(_, reg)| reg.wants(record.mutation_type))
            .filter(|(_, reg)| {
                reg.target == record.target
                    || (reg.options.subtree && self.contains(reg.target, record.target))
            })
            .map(|(i, _)| i)
            .collect();
        for i in matching {
            self.observers[i].records.push(record.clone());
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling.option();
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_list() -> (DomTree, NodeId, Vec<NodeId>) {
        let mut tree = DomTree::new();
        let ul = tree.create_element("ul");
        let items: Vec<NodeId> = (0..3).map(|_| tree.create_element("li")).collect();
        for &li in &items {
            tree.append_child(ul, li).unwrap();
        }
        (tree, ul, items)
    }

    #[test]
    fn test_append_links_siblings() {
        let (tree, ul, items) = tree_with_list();
        assert_eq!(tree.child_ids(ul), items);
        assert_eq!(tree.next_sibling(items[0]), Some(items[1]));
        assert_eq!(tree.prev_sibling(items[2]), Some(items[1]));
        assert_eq!(tree.last_child(ul), Some(items[2]));
    }

    #[test]
    fn test_insert_before_moves_node() {
        let (mut tree, ul, items) = tree_with_list();
        tree.insert_before(ul, items[2], Some(items[0])).unwrap();
        assert_eq!(tree.child_ids(ul), vec![items[2], items[0], items[1]]);
    }

    #[test]
    fn test_insert_before_self_is_noop_move() {
        let (mut tree, ul, items) = tree_with_list();
        tree.insert_before(ul, items[1], Some(items[1])).unwrap();
        assert_eq!(tree.child_ids(ul), items);
    }

    #[test]
    fn test_insert_ancestor_is_hierarchy_error() {
        let (mut tree, ul, items) = tree_with_list();
        assert!(matches!(
            tree.append_child(items[0], ul),
            Err(DomError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn test_remove_child() {
        let (mut tree, ul, items) = tree_with_list();
        tree.remove_child(ul, items[1]).unwrap();
        assert_eq!(tree.child_ids(ul), vec![items[0], items[2]]);
        assert_eq!(tree.parent(items[1]), None);
        assert!(tree.remove_child(ul, items[1]).is_err());
    }

    #[test]
    fn test_replace_child() {
        let (mut tree, ul, items) = tree_with_list();
        let text = tree.create_text("x");
        tree.replace_child(ul, text, items[1]).unwrap();
        assert_eq!(tree.child_ids(ul), vec![items[0], text, items[2]]);
    }

    #[test]
    fn test_replace_with_next_sibling() {
        let (mut tree, ul, items) = tree_with_list();
        tree.replace_node(items[0], items[1]).unwrap();
        assert_eq!(tree.child_ids(ul), vec![items[1], items[2]]);
    }

    #[test]
    fn test_connected() {
        let (mut tree, ul, items) = tree_with_list();
        assert!(!tree.is_connected(items[0]));
        tree.append_child(NodeId::ROOT, ul).unwrap();
        assert!(tree.is_connected(items[0]));
    }

    #[test]
    fn test_text_nodes_cannot_have_children() {
        let mut tree = DomTree::new();
        let text = tree.create_text("a");
        let span = tree.create_element("span");
        assert!(matches!(
            tree.append_child(text, span),
            Err(DomError::InvalidNodeType(_))
        ));
    }

    #[test]
    fn test_find_attribute_value() {
        let (mut tree, ul, items) = tree_with_list();
        tree.set_attribute(items[2], "title", "sentinel_1").unwrap();
        assert_eq!(
            tree.find_attribute_value(ul, "sentinel_1"),
            Some((items[2], "title".to_string()))
        );
        assert_eq!(tree.find_attribute_value(ul, "missing"), None);
    }

    #[test]
    fn test_find_comment_trims() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let comment = tree.create_comment(" marker ");
        tree.append_child(div, comment).unwrap();
        assert_eq!(tree.find_comment(div, "marker"), Some(comment));
    }

    #[test]
    fn test_value_property_shadows_attribute() {
        let mut tree = DomTree::new();
        let input = tree.create_element("input");
        tree.set_attribute(input, "value", "initial").unwrap();
        assert_eq!(tree.value(input), Some("initial"));
        tree.set_value(input, "typed").unwrap();
        assert_eq!(tree.value(input), Some("typed"));
        assert_eq!(tree.get_attribute(input, "value"), Some("initial"));
    }

    #[test]
    fn test_observer_subtree_records() {
        let (mut tree, ul, items) = tree_with_list();
        let observer = tree.observe(ul, MutationObserverInit::subtree_child_list());
        let span = tree.create_element("span");
        tree.append_child(items[0], span).unwrap();
        tree.set_attribute(items[0], "class", "x").unwrap();

        let records = tree.take_records(observer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, items[0]);
        assert_eq!(records[0].added_nodes, vec![span]);
        assert!(tree.take_records(observer).is_empty());
    }

    #[test]
    fn test_observer_ignores_detached_subtrees() {
        let mut tree = DomTree::new();
        let observer = tree.observe(NodeId::ROOT, MutationObserverInit::subtree_child_list());
        let div = tree.create_element("div");
        let span = tree.create_element("span");
        tree.append_child(div, span).unwrap();
        assert!(!tree.has_pending_records());
        tree.append_child(NodeId::ROOT, div).unwrap();
        assert_eq!(tree.take_records(observer).len(), 1);
    }
}
