//! The document a runtime renders into

use crate::{DomTree, NodeId};

/// Arena plus the skeleton every template ends up under.
///
/// Only nodes reachable from [`NodeId::ROOT`] are "in the document"; parsed
/// templates share the arena, detached, until something inserts them.
#[derive(Debug)]
pub struct Document {
    pub tree: DomTree,
    skeleton: Skeleton,
}

#[derive(Debug, Clone, Copy)]
struct Skeleton {
    html: NodeId,
    head: NodeId,
    body: NodeId,
}

impl Document {
    /// `<!DOCTYPE html><html><head></head><body></body></html>`
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let root = tree.root();
        let doctype = tree.create_doctype("html", "", "");
        let skeleton = Skeleton {
            html: tree.create_element("html"),
            head: tree.create_element("head"),
            body: tree.create_element("body"),
        };

        let links = [
            (root, doctype),
            (root, skeleton.html),
            (skeleton.html, skeleton.head),
            (skeleton.html, skeleton.body),
        ];
        for (parent, child) in links {
            if let Err(err) = tree.append_child(parent, child) {
                tracing::error!("document skeleton: {}", err);
            }
        }

        Self { tree, skeleton }
    }

    /// The `<html>` element
    pub fn document_element(&self) -> NodeId {
        self.skeleton.html
    }

    pub fn head(&self) -> NodeId {
        self.skeleton.head
    }

    pub fn body(&self) -> NodeId {
        self.skeleton.body
    }

    /// First connected element whose `id` attribute is `id`
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.find_by_attribute(self.tree.root(), "id", id)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.tree.is_connected(node)
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
