//! Hook builders
//!
//! Each factory returns a builder that stringifies to placeholder markup
//! and, once the template is parsed, is blessed against the live tree to
//! produce an [`Accessor`](crate::Accessor). Initial value and mapping
//! function are set with `.value(..)` and `.map(..)`, in either order.

mod attribute;
mod handle;
mod id;
mod list;
mod node;
mod text;

pub use attribute::{AttributeHook, attribute};
pub use handle::{HandleHook, handle};
pub use id::{IdHook, id};
pub use list::{ListBinding, ListHook, list};
pub use node::{NodeHook, node};
pub use text::{TextHook, text};

use crate::template::{BlessContext, Interpolation};
use crate::{Accessor, Config, LiveNode, Runtime, TemplateError};
use std::rc::Rc;
use wire_dom::{DomTree, NodeId};

/// A hook before it is resolved against a parsed template
pub trait Builder {
    /// Name of the `data` property this hook binds, if any
    fn id(&self) -> Option<&str>;

    /// Markup standing in for the hook until the template is parsed
    fn placeholder(&self, config: &Config) -> String;

    /// Resolve the placeholder against the parsed tree.
    ///
    /// Returns `None` when the hook has no accessor or its placeholder
    /// could not be found.
    fn bless(self: Box<Self>, ctx: &BlessContext<'_>) -> Option<Rc<dyn Accessor>>;
}

/// Output of a node or list mapping function
#[derive(Debug, Clone)]
pub enum Rendered {
    Node(NodeId),
    Live(LiveNode),
    Text(String),
}

impl Rendered {
    /// Materialize into a DOM node; the live node, if any, is returned
    /// alongside so the caller can keep it alive
    pub(crate) fn into_node(self, rt: &Runtime) -> (NodeId, Option<LiveNode>) {
        match self {
            Rendered::Node(id) => (id, None),
            Rendered::Live(live) => (live.id(), Some(live)),
            Rendered::Text(text) => (rt.create_text(&text), None),
        }
    }
}

impl From<NodeId> for Rendered {
    fn from(id: NodeId) -> Self {
        Rendered::Node(id)
    }
}

impl From<LiveNode> for Rendered {
    fn from(live: LiveNode) -> Self {
        Rendered::Live(live)
    }
}

impl From<String> for Rendered {
    fn from(text: String) -> Self {
        Rendered::Text(text)
    }
}

impl From<&str> for Rendered {
    fn from(text: &str) -> Self {
        Rendered::Text(text.to_string())
    }
}

/// A failed template renders as nothing
impl From<Result<LiveNode, TemplateError>> for Rendered {
    fn from(result: Result<LiveNode, TemplateError>) -> Self {
        match result {
            Ok(live) => Rendered::Live(live),
            Err(err) => {
                tracing::warn!("mapping template failed: {}", err);
                Rendered::Text(String::new())
            }
        }
    }
}

/// Replace the comment marker for `token` under the template root with the
/// node built by `create`
pub(crate) fn replace_marker(
    ctx: &BlessContext<'_>,
    token: &str,
    create: impl FnOnce(&mut DomTree) -> NodeId,
) -> Option<NodeId> {
    let needle = format!("{}{}", ctx.runtime.config().placeholder_prefix, token);
    let root = ctx.container;
    let replaced = ctx.runtime.with_dom_mut(|tree| {
        let marker = tree.find_comment(root, &needle)?;
        let node = create(tree);
        tree.replace_node(marker, node).ok()?;
        Some(node)
    });
    if replaced.is_none() {
        tracing::debug!("placeholder {} not found in template", needle);
    }
    replaced
}

/// Find the comment marker for `token` under the template root
pub(crate) fn find_marker(ctx: &BlessContext<'_>, token: &str) -> Option<NodeId> {
    let needle = format!("{}{}", ctx.runtime.config().placeholder_prefix, token);
    let root = ctx.container;
    let marker = ctx.runtime.with_dom(|tree| tree.find_comment(root, &needle));
    if marker.is_none() {
        tracing::debug!("placeholder {} not found in template", needle);
    }
    marker
}

/// Mapping function producing nodes
pub(crate) type NodeMapper = Rc<dyn Fn(&crate::Value) -> Rendered>;

/// Mapping function producing a value
pub(crate) type ValueMapper = Rc<dyn Fn(&crate::Value) -> crate::Value>;

macro_rules! interpolate_hooks {
    ($($hook:ty),*) => {
        $(impl From<$hook> for Interpolation {
            fn from(hook: $hook) -> Self {
                Interpolation::Hook(Box::new(hook))
            }
        })*
    };
}

interpolate_hooks!(AttributeHook, HandleHook, IdHook, ListHook, NodeHook, TextHook);
