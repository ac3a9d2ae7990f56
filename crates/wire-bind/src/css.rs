//! Stylesheets

use crate::Runtime;
use wire_dom::NodeId;

/// A detached `<style>` element.
///
/// Interpolating it into a template appends it to the document head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stylesheet {
    node: NodeId,
}

impl Stylesheet {
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl From<Stylesheet> for NodeId {
    fn from(sheet: Stylesheet) -> Self {
        sheet.node
    }
}

impl Runtime {
    /// Create a style element holding `text`
    pub fn css(&self, text: impl AsRef<str>) -> Stylesheet {
        let node = self.with_dom_mut(|tree| {
            let style = tree.create_element("style");
            let content = tree.create_text(text.as_ref());
            // Freshly created nodes cannot violate the hierarchy.
            let _ = tree.append_child(style, content);
            style
        });
        Stylesheet { node }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Runtime, html};

    #[test]
    fn test_stylesheet_goes_to_head() {
        let rt = Runtime::default();
        let sheet = rt.css("p { color: red; }");
        let node = html!(rt, "<p>{}styled</p>", sheet).unwrap();

        assert_eq!(node.outer_html(), "<p>styled</p>");
        assert_eq!(rt.inner_html(rt.head()), "<style>p { color: red; }</style>");
    }
}
