//! `node` hook: a single structural node bound to a data property

use super::{Builder, NodeMapper, Rendered, find_marker};
use crate::template::BlessContext;
use crate::util::{comment_placeholder, sentinel_token};
use crate::{Accessor, BindError, Config, LiveNode, Runtime, Value};
use std::cell::RefCell;
use std::rc::Rc;
use wire_dom::NodeId;

/// Builder returned by [`node`]
pub struct NodeHook {
    id: String,
    value: Value,
    map: Option<NodeMapper>,
    token: String,
}

/// Bind a node slot; the mapping function turns the logical value into the
/// node shown there
pub fn node(id: impl Into<String>) -> NodeHook {
    NodeHook {
        id: id.into(),
        value: Value::Null,
        map: None,
        token: sentinel_token(),
    }
}

impl NodeHook {
    /// Initial logical value
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Mapping from logical value to a node
    pub fn map<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> R + 'static,
        R: Into<Rendered>,
    {
        self.map = Some(Rc::new(move |v| f(v).into()));
        self
    }
}

/// Nodes pass through unchanged, anything else becomes a text node
fn render(map: &Option<NodeMapper>, value: &Value) -> Rendered {
    if let Some(map) = map {
        return map(value);
    }
    match value {
        Value::Node(id) => Rendered::Node(*id),
        Value::Live(live) => Rendered::Live(live.clone()),
        other => Rendered::Text(other.to_text()),
    }
}

struct NodeAccessor {
    runtime: Runtime,
    value: RefCell<Value>,
    current: RefCell<(NodeId, Option<LiveNode>)>,
    map: Option<NodeMapper>,
}

impl Accessor for NodeAccessor {
    fn get(&self) -> Value {
        self.value.borrow().clone()
    }

    fn set(&self, value: Value) -> Result<(), BindError> {
        let (next, live) = render(&self.map, &value).into_node(&self.runtime);
        let previous = self.current.borrow().0;
        self.runtime
            .with_dom_mut(|tree| tree.replace_node(previous, next))?;

        let (_, old_live) = self.current.replace((next, live));
        if let Some(old_live) = old_live {
            self.runtime.defer_release(old_live);
        }
        *self.value.borrow_mut() = value;
        Ok(())
    }
}

impl Builder for NodeHook {
    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn placeholder(&self, config: &Config) -> String {
        comment_placeholder(&config.placeholder_prefix, &self.token)
    }

    fn bless(self: Box<Self>, ctx: &BlessContext<'_>) -> Option<Rc<dyn Accessor>> {
        let marker = find_marker(ctx, &self.token)?;
        // The mapper may build templates of its own, so it runs before the
        // tree is borrowed.
        let (node, live) = render(&self.map, &self.value).into_node(ctx.runtime);
        if let Err(err) = ctx.runtime.with_dom_mut(|tree| tree.replace_node(marker, node)) {
            tracing::warn!("could not place node for {}: {}", self.id, err);
            return None;
        }
        Some(Rc::new(NodeAccessor {
            runtime: ctx.runtime.clone(),
            value: RefCell::new(self.value),
            current: RefCell::new((node, live)),
            map: self.map,
        }))
    }
}
