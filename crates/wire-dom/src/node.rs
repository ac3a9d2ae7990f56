//! Arena nodes
//!
//! Nodes refer to each other by [`NodeId`], never by pointer, so moving a
//! subtree is a matter of relinking the five link fields of its root.

use crate::{EventHandler, InternedString, NodeId, QualName};

/// One slot of the arena
#[derive(Debug)]
pub struct Node {
    /// `NONE` while detached
    pub parent: NodeId,
    pub first_child: NodeId,
    /// Kept so appends never walk the sibling chain
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
    pub data: NodeData,
}

impl Node {
    /// Unlinked node carrying `data`
    pub fn new(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    pub fn element(name: QualName) -> Self {
        Self::new(NodeData::Element(ElementData::new(name)))
    }

    pub fn text(content: String) -> Self {
        Self::new(NodeData::Text(TextData { content }))
    }

    pub fn comment(content: String) -> Self {
        Self::new(NodeData::Comment(content))
    }

    pub fn document() -> Self {
        Self::new(NodeData::Document)
    }

    pub fn doctype(name: String, public_id: String, system_id: String) -> Self {
        Self::new(NodeData::Doctype { name, public_id, system_id })
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.as_element().is_some()
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.as_text().is_some()
    }

    #[inline]
    pub fn is_comment(&self) -> bool {
        matches!(self.data, NodeData::Comment(_))
    }

    /// Elements and documents accept children; character data and doctypes do not
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self.data, NodeData::Element(_) | NodeData::Document)
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        if let NodeData::Element(element) = &self.data {
            Some(element)
        } else {
            None
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        if let NodeData::Element(element) = &mut self.data {
            Some(element)
        } else {
            None
        }
    }

    /// Content of a text node; comments are not text
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        if let NodeData::Text(text) = &self.data {
            Some(&text.content)
        } else {
            None
        }
    }

    /// Content of a text or comment node
    #[inline]
    pub fn character_data(&self) -> Option<&str> {
        match &self.data {
            NodeData::Comment(data) => Some(data),
            _ => self.as_text(),
        }
    }
}

#[derive(Debug)]
pub enum NodeData {
    /// The arena root, or the container handed back by a document parse
    Document,
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Element(ElementData),
    Text(TextData),
    Comment(String),
}

/// Element state: markup attributes plus the property slots scripts write
pub struct ElementData {
    pub name: QualName,
    /// Source order is serialization order
    pub attrs: Vec<Attribute>,
    /// Form control `value` property; falls back to the attribute until written
    pub value: Option<String>,
    /// `on<event>` handler properties
    pub handlers: Vec<(String, EventHandler)>,
}

impl ElementData {
    pub fn new(name: QualName) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            value: None,
            handlers: Vec::new(),
        }
    }

    fn position(&self, local: InternedString) -> Option<usize> {
        self.attrs.iter().position(|attr| attr.name.local == local)
    }

    pub fn get_attr(&self, local: InternedString) -> Option<&str> {
        let index = self.position(local)?;
        Some(&self.attrs[index].value)
    }

    /// Write an attribute in place, or append it; returns the old value
    pub fn set_attr(&mut self, name: QualName, value: String) -> Option<String> {
        match self.position(name.local) {
            Some(index) => Some(std::mem::replace(&mut self.attrs[index].value, value)),
            None => {
                self.attrs.push(Attribute { name, value });
                None
            }
        }
    }

    pub fn remove_attr(&mut self, local: InternedString) -> Option<String> {
        let index = self.position(local)?;
        Some(self.attrs.remove(index).value)
    }

    pub fn handler(&self, slot: &str) -> Option<&EventHandler> {
        self.handlers
            .iter()
            .find_map(|(name, handler)| (name == slot).then_some(handler))
    }

    /// Assigning a slot replaces its handler, like an `onclick` property
    pub fn set_handler(&mut self, slot: &str, handler: EventHandler) {
        if let Some((_, existing)) = self.handlers.iter_mut().find(|(name, _)| name == slot) {
            *existing = handler;
        } else {
            self.handlers.push((slot.to_string(), handler));
        }
    }
}

impl std::fmt::Debug for ElementData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots: Vec<&str> = self.handlers.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("ElementData")
            .field("name", &self.name)
            .field("attrs", &self.attrs)
            .field("value", &self.value)
            .field("handlers", &slots)
            .finish()
    }
}

#[derive(Debug)]
pub struct TextData {
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn name(local: u32) -> QualName {
        QualName::new(InternedString(1), InternedString(local))
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut elem = ElementData::new(name(3));
        assert_eq!(elem.set_attr(name(10), "a".into()), None);
        assert_eq!(elem.set_attr(name(10), "b".into()), Some("a".into()));
        assert_eq!(elem.get_attr(InternedString(10)), Some("b"));
        assert_eq!(elem.attrs.len(), 1);
    }

    #[test]
    fn test_remove_attr() {
        let mut elem = ElementData::new(name(3));
        elem.set_attr(name(10), "a".into());
        assert_eq!(elem.remove_attr(InternedString(10)), Some("a".into()));
        assert_eq!(elem.remove_attr(InternedString(10)), None);
    }

    #[test]
    fn test_handler_slot_replaced() {
        let mut elem = ElementData::new(name(3));
        elem.set_handler("onclick", Rc::new(|_| {}));
        elem.set_handler("onclick", Rc::new(|_| {}));
        assert_eq!(elem.handlers.len(), 1);
        assert!(elem.handler("onclick").is_some());
        assert!(elem.handler("oninput").is_none());
    }

    #[test]
    fn test_node_kinds() {
        assert!(Node::text("x".into()).is_text());
        assert!(!Node::comment("x".into()).is_text());
        assert!(Node::document().is_container());
        assert_eq!(Node::comment("c".into()).character_data(), Some("c"));
    }
}
