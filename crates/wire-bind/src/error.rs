//! Binding errors

use wire_dom::{DomError, NodeId};
use wire_html::ParseError;

/// Template instantiation failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("template markup is empty")]
    NoRootElement,
    #[error("template markup could not be parsed: {0}")]
    Parse(#[from] ParseError),
}

/// Accessor write failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindError {
    #[error("expected a node, got {0}")]
    NotANode(&'static str),
    #[error("expected a list, got {0}")]
    NotAList(&'static str),
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Dehydration / hydration failure
#[derive(Debug, thiserror::Error)]
pub enum HydrationError {
    #[error("number {0} has no JSON representation")]
    NonFinite(f64),
    #[error("data of node {0} contains itself")]
    Circular(NodeId),
    #[error("no element with id {0:?}")]
    NotFound(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
