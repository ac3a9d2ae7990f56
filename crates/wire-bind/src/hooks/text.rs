//! `text` hook: a text node bound to a data property

use super::{Builder, ValueMapper, replace_marker};
use crate::template::BlessContext;
use crate::util::{comment_placeholder, sentinel_token};
use crate::{Accessor, BindError, Config, Runtime, Value};
use std::cell::RefCell;
use std::rc::Rc;
use wire_dom::NodeId;

/// Builder returned by [`text`]
pub struct TextHook {
    id: String,
    value: Value,
    map: Option<ValueMapper>,
    token: String,
}

/// Bind a text node; content is always literal text, never markup
pub fn text(id: impl Into<String>) -> TextHook {
    TextHook {
        id: id.into(),
        value: Value::Null,
        map: None,
        token: sentinel_token(),
    }
}

impl TextHook {
    /// Initial logical value
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Mapping from logical value to displayed text
    pub fn map<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> R + 'static,
        R: Into<Value>,
    {
        self.map = Some(Rc::new(move |v| f(v).into()));
        self
    }
}

struct TextAccessor {
    runtime: Runtime,
    node: NodeId,
    value: RefCell<Value>,
    map: Option<ValueMapper>,
}

fn render(map: &Option<ValueMapper>, value: &Value) -> String {
    match map {
        Some(map) => map(value).to_text(),
        None => value.to_text(),
    }
}

impl Accessor for TextAccessor {
    fn get(&self) -> Value {
        self.value.borrow().clone()
    }

    fn set(&self, value: Value) -> Result<(), BindError> {
        let content = render(&self.map, &value);
        *self.value.borrow_mut() = value;
        self.runtime
            .with_dom_mut(|tree| tree.set_text(self.node, &content))?;
        Ok(())
    }
}

impl Builder for TextHook {
    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn placeholder(&self, config: &Config) -> String {
        comment_placeholder(&config.placeholder_prefix, &self.token)
    }

    fn bless(self: Box<Self>, ctx: &BlessContext<'_>) -> Option<Rc<dyn Accessor>> {
        let content = render(&self.map, &self.value);
        let node = replace_marker(ctx, &self.token, |tree| tree.create_text(&content))?;
        Some(Rc::new(TextAccessor {
            runtime: ctx.runtime.clone(),
            node,
            value: RefCell::new(self.value),
            map: self.map,
        }))
    }
}
