//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts the result into the shared arena.
//! Two modes:
//! - document mode for markup rooted at `<html>`, `<head>` or `<body>`
//!   (`parse_document`)
//! - inert template mode for everything else, including tags the tree
//!   builder would drop or relocate outside of their proper context
//!   (`parse_template`)

use crate::ParseError;
use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use wire_dom::{DomTree, NodeId};

/// Tags that only survive parsing inside an inert `<template>`
const CONTEXTUAL_TAGS: &[&str] = &[
    "base", "basefont", "bgsound", "caption", "col", "colgroup", "frame", "frameset", "link",
    "math", "meta", "noframes", "script", "style", "svg", "tbody", "td", "template", "tfoot",
    "th", "thead", "title", "tr",
];

/// Whether a root tag needs inert template parsing
pub fn is_contextual_tag(tag: &str) -> bool {
    CONTEXTUAL_TAGS.contains(&tag.to_ascii_lowercase().as_str())
}

/// Name of the first tag token (`<name` or `<!name`), lowercased
pub fn first_tag_name(markup: &str) -> Option<String> {
    let bytes = markup.as_bytes();
    let mut i = 0;
    while let Some(offset) = markup[i..].find('<') {
        let mut j = i + offset + 1;
        if bytes.get(j) == Some(&b'!') {
            j += 1;
        }
        let start = j;
        while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
            j += 1;
        }
        if j > start {
            return Some(markup[start..j].to_ascii_lowercase());
        }
        i = i + offset + 1;
    }
    None
}

/// Element handles of a document parse, converted into the arena
#[derive(Debug, Clone, Copy)]
pub struct ParsedDocument {
    /// Detached document node holding the doctype and `<html>`
    pub container: NodeId,
    pub doctype: Option<NodeId>,
    pub html: Option<NodeId>,
    pub head: Option<NodeId>,
    pub body: Option<NodeId>,
}

/// HTML5 parser
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse markup and select the element a template evaluates to.
    ///
    /// `doctype`/`html`, `head` and `body` roots need the document tree
    /// builder and select those elements of a full parse. Everything else is
    /// parsed as inert template content, so no document skeleton is left
    /// behind in the arena, and the first element is detached and returned.
    pub fn parse_root(&self, tree: &mut DomTree, markup: &str) -> Result<NodeId, ParseError> {
        let tag = first_tag_name(markup).ok_or(ParseError::NoElement)?;

        let root = match tag.as_str() {
            "doctype" | "html" | "head" | "body" => {
                let parsed = self.parse_document(tree, markup);
                match tag.as_str() {
                    "head" => parsed.head,
                    "body" => parsed.body,
                    _ => parsed.html,
                }
            }
            _ => {
                if is_contextual_tag(&tag) {
                    tracing::trace!("parsing contextual <{}> template", tag);
                }
                let fragment = self.parse_template(tree, markup);
                let first = tree.first_element_child(fragment);
                if let Some(first) = first {
                    tree.detach(first);
                }
                first
            }
        };
        root.ok_or(ParseError::NoElement)
    }

    /// Parse a full document into a detached container node
    pub fn parse_document(&self, tree: &mut DomTree, markup: &str) -> ParsedDocument {
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(markup);

        let container = tree.create_document();
        for child in dom.document.children.borrow().iter() {
            self.convert_node(child, tree, container);
        }

        let doctype = tree
            .children(container)
            .find(|(_, n)| matches!(n.data, wire_dom::NodeData::Doctype { .. }))
            .map(|(id, _)| id);
        let html = tree.first_element_child(container);
        let head = html.and_then(|h| find_child_tag(tree, h, "head"));
        let body = html.and_then(|h| find_child_tag(tree, h, "body"));

        tracing::trace!("parsed document into {} arena nodes", tree.len());
        ParsedDocument {
            container,
            doctype,
            html,
            head,
            body,
        }
    }

    /// Parse markup as the content of an inert `<template>`.
    ///
    /// Returns a detached fragment node whose children are the parsed
    /// top-level nodes.
    pub fn parse_template(&self, tree: &mut DomTree, markup: &str) -> NodeId {
        let wrapped = format!("<template>{}</template>", markup);
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(wrapped.as_str());

        let fragment = tree.create_document();
        if let Some(content) = find_template_content(&dom.document) {
            for child in content.children.borrow().iter() {
                self.convert_node(child, tree, fragment);
            }
        }
        fragment
    }

    /// Convert an RcDom node (and its subtree) into the arena under `parent`
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) {
        let id = match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent);
                }
                return;
            }
            RcNodeData::Doctype {
                name,
                public_id,
                system_id,
            } => tree.create_doctype(name, public_id, system_id),
            RcNodeData::Text { contents } => tree.create_text(&contents.borrow()),
            RcNodeData::Comment { contents } => tree.create_comment(contents),
            RcNodeData::Element {
                name,
                attrs,
                template_contents,
                ..
            } => {
                let id = tree.create_element_ns(&name.ns, &name.local);
                for attr in attrs.borrow().iter() {
                    let attr_name = match &attr.name.prefix {
                        Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                        None => attr.name.local.to_string(),
                    };
                    tree.set_attribute(id, &attr_name, &attr.value).ok();
                }

                // Template content is flattened into the element's children.
                if let Some(content) = template_contents.borrow().as_ref() {
                    for child in content.children.borrow().iter() {
                        self.convert_node(child, tree, id);
                    }
                }
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, id);
                }
                id
            }
            RcNodeData::ProcessingInstruction { .. } => return,
        };

        if let Err(err) = tree.append_child(parent, id) {
            tracing::debug!("dropping parsed node {}: {}", id, err);
        }
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn find_child_tag(tree: &DomTree, parent: NodeId, tag: &str) -> Option<NodeId> {
    tree.element_children(parent)
        .into_iter()
        .find(|&id| tree.tag_name(id) == Some(tag))
}

/// Depth-first search for the first `<template>` and its content fragment
fn find_template_content(handle: &Handle) -> Option<Handle> {
    if let RcNodeData::Element {
        name,
        template_contents,
        ..
    } = &handle.data
    {
        if &*name.local == "template" {
            return template_contents.borrow().clone();
        }
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(find_template_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tag_name() {
        assert_eq!(first_tag_name("<div>x</div>").as_deref(), Some("div"));
        assert_eq!(first_tag_name("  <TR><td>").as_deref(), Some("tr"));
        assert_eq!(first_tag_name("<!doctype html><html>").as_deref(), Some("doctype"));
        assert_eq!(first_tag_name("<!-- note --><p>").as_deref(), Some("p"));
        assert_eq!(first_tag_name("<my:element>").as_deref(), Some("my"));
        assert_eq!(first_tag_name("just text"), None);
    }

    #[test]
    fn test_contextual_tags() {
        assert!(is_contextual_tag("tr"));
        assert!(is_contextual_tag("STYLE"));
        assert!(!is_contextual_tag("div"));
        assert!(!is_contextual_tag("table"));
    }

    #[test]
    fn test_parse_root_simple() {
        let mut tree = DomTree::new();
        let root = HtmlParser::new()
            .parse_root(&mut tree, "<div><span>Text</span></div>")
            .unwrap();
        assert_eq!(tree.tag_name(root), Some("div"));
        assert!(!tree.is_connected(root));
        assert_eq!(tree.parent(root), None);
    }

    #[test]
    fn test_body_level_root_leaves_no_skeleton() {
        let mut tree = DomTree::new();
        let before = tree.len();
        let root = HtmlParser::new().parse_root(&mut tree, "<li>x</li>").unwrap();
        assert_eq!(tree.tag_name(root), Some("li"));
        // fragment container, <li> and its text
        assert_eq!(tree.len() - before, 3);
    }

    #[test]
    fn test_parse_root_table_row() {
        let mut tree = DomTree::new();
        let root = HtmlParser::new()
            .parse_root(&mut tree, "<tr><td>cell</td></tr>")
            .unwrap();
        assert_eq!(tree.tag_name(root), Some("tr"));
        assert_eq!(tree.text_content(root), "cell");
    }

    #[test]
    fn test_parse_root_without_element() {
        let mut tree = DomTree::new();
        assert_eq!(
            HtmlParser::new().parse_root(&mut tree, "plain text"),
            Err(ParseError::NoElement)
        );
    }

    #[test]
    fn test_whitespace_text_preserved() {
        let mut tree = DomTree::new();
        let root = HtmlParser::new()
            .parse_root(&mut tree, "<p>a <b>b</b> c</p>")
            .unwrap();
        assert_eq!(tree.text_content(root), "a b c");
    }
}
