//! innerHTML / outerHTML
//!
//! Follows the browser fragment serialization algorithm closely enough for
//! templates to round-trip: attribute values are always double-quoted,
//! void elements get no end tag and the contents of raw-text elements are
//! written as-is.

use std::fmt::{self, Write};
use wire_dom::{DomTree, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Which characters a piece of character data must escape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Text,
    Attribute,
}

/// Character data escaped for `context` on display
struct Escaped<'a>(&'a str, Context);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Escaped(raw, context) = *self;
        let mut rest = raw;
        while let Some(at) = rest.find(|c| needs_escape(c, context)) {
            f.write_str(&rest[..at])?;
            let c = rest[at..].chars().next().unwrap_or_default();
            f.write_str(entity(c))?;
            rest = &rest[at + c.len_utf8()..];
        }
        f.write_str(rest)
    }
}

fn needs_escape(c: char, context: Context) -> bool {
    match c {
        '&' | '\u{a0}' => true,
        '<' | '>' => context == Context::Text,
        '"' => context == Context::Attribute,
        _ => false,
    }
}

fn entity(c: char) -> &'static str {
    match c {
        '&' => "&amp;",
        '<' => "&lt;",
        '>' => "&gt;",
        '"' => "&quot;",
        _ => "&nbsp;",
    }
}

/// Serializer over one arena
#[derive(Debug, Clone, Default)]
pub struct HtmlSerializer;

impl HtmlSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Markup of the children of `node`
    pub fn serialize_inner(&self, tree: &DomTree, node: NodeId) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = write_children(tree, node, &mut out);
        out
    }

    /// Markup of `node` itself
    pub fn serialize_outer(&self, tree: &DomTree, node: NodeId) -> String {
        let mut out = String::new();
        let _ = write_node(tree, node, &mut out);
        out
    }
}

fn write_children(tree: &DomTree, parent: NodeId, out: &mut String) -> fmt::Result {
    let raw = tree
        .tag_name(parent)
        .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
    for (child, node) in tree.children(parent) {
        match &node.data {
            NodeData::Text(text) if raw => out.push_str(&text.content),
            _ => write_node(tree, child, out)?,
        }
    }
    Ok(())
}

fn write_node(tree: &DomTree, id: NodeId, out: &mut String) -> fmt::Result {
    let Some(node) = tree.get(id) else {
        return Ok(());
    };
    match &node.data {
        NodeData::Document => write_children(tree, id, out),
        NodeData::Doctype { name, .. } => write!(out, "<!DOCTYPE {}>", name),
        NodeData::Comment(data) => write!(out, "<!--{}-->", data),
        NodeData::Text(text) => write!(out, "{}", Escaped(&text.content, Context::Text)),
        NodeData::Element(element) => {
            let tag = tree.resolve(element.name.local);
            write!(out, "<{}", tag)?;
            for attr in &element.attrs {
                let name = tree.resolve(attr.name.local);
                write!(out, " {}=\"{}\"", name, Escaped(&attr.value, Context::Attribute))?;
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag) {
                return Ok(());
            }
            write_children(tree, id, out)?;
            write!(out, "</{}>", tag)
        }
    }
}

/// innerHTML of `node`
pub fn inner_html(tree: &DomTree, node: NodeId) -> String {
    HtmlSerializer::new().serialize_inner(tree, node)
}

/// outerHTML of `node`
pub fn outer_html(tree: &DomTree, node: NodeId) -> String {
    HtmlSerializer::new().serialize_outer(tree, node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_escaping() {
        let escaped = Escaped("a <b> & \"c\"\u{a0}", Context::Text).to_string();
        assert_eq!(escaped, "a &lt;b&gt; &amp; \"c\"&nbsp;");
    }

    #[test]
    fn test_attribute_escaping() {
        let escaped = Escaped("a <b> & \"c\"", Context::Attribute).to_string();
        assert_eq!(escaped, "a <b> &amp; &quot;c&quot;");
    }

    #[test]
    fn test_void_and_attributes() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.set_attribute(div, "class", "a&b").unwrap();
        let text = tree.create_text("1 < 2");
        let br = tree.create_element("br");
        tree.append_child(div, text).unwrap();
        tree.append_child(div, br).unwrap();

        assert_eq!(outer_html(&tree, div), "<div class=\"a&amp;b\">1 &lt; 2<br></div>");
        assert_eq!(inner_html(&tree, div), "1 &lt; 2<br>");
    }

    #[test]
    fn test_raw_text_contents() {
        let mut tree = DomTree::new();
        let style = tree.create_element("style");
        let css = tree.create_text("a > b { color: red }");
        tree.append_child(style, css).unwrap();
        assert_eq!(outer_html(&tree, style), "<style>a > b { color: red }</style>");
        assert_eq!(inner_html(&tree, style), "a > b { color: red }");
    }

    #[test]
    fn test_comments_kept() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        let comment = tree.create_comment("wire:1_0");
        tree.append_child(p, comment).unwrap();
        assert_eq!(outer_html(&tree, p), "<p><!--wire:1_0--></p>");
    }
}
