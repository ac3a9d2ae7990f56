//! wire HTML
//!
//! Markup capability for the binding engine, built on html5ever:
//! "parse string -> element tree" into the shared arena, and
//! "serialize element -> string".

mod parser;
mod serializer;

pub use parser::{HtmlParser, ParsedDocument, first_tag_name, is_contextual_tag};
pub use serializer::{HtmlSerializer, inner_html, outer_html};

/// Parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("markup contains no element")]
    NoElement,
}

/// Parse markup and select its root element, see [`HtmlParser::parse_root`]
pub fn parse_root(tree: &mut wire_dom::DomTree, markup: &str) -> Result<wire_dom::NodeId, ParseError> {
    HtmlParser::new().parse_root(tree, markup)
}
