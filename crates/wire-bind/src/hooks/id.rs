//! `id` hook: exposes a tagged element as a data property

use super::Builder;
use crate::template::BlessContext;
use crate::{Accessor, BindError, Config, Runtime, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Builder returned by [`id`]
pub struct IdHook {
    id: String,
}

/// Tag an element with `data-id="<id>"` and bind it as `data[id]`
pub fn id(id: impl Into<String>) -> IdHook {
    IdHook { id: id.into() }
}

struct IdAccessor {
    runtime: Runtime,
    current: RefCell<Value>,
}

impl Accessor for IdAccessor {
    fn get(&self) -> Value {
        self.current.borrow().clone()
    }

    /// Replace the current node in its parent; falsy values leave an empty
    /// text node behind
    fn set(&self, value: Value) -> Result<(), BindError> {
        let (replacement, live) = match value {
            Value::Node(node) => (node, None),
            Value::Live(live) => (live.id(), Some(live)),
            other if !other.is_truthy() => (self.runtime.create_text(""), None),
            other => return Err(BindError::NotANode(other.kind())),
        };

        let old = self.current.borrow().clone();
        if let Some(old_node) = old.as_node() {
            let has_parent = self.runtime.with_dom(|tree| tree.parent(old_node).is_some());
            if has_parent {
                self.runtime
                    .with_dom_mut(|tree| tree.replace_node(old_node, replacement))?;
            }
        }
        if let Value::Live(old_live) = old {
            self.runtime.defer_release(old_live);
        }

        *self.current.borrow_mut() = match live {
            Some(live) => Value::Live(live),
            None => Value::Node(replacement),
        };
        Ok(())
    }
}

impl Builder for IdHook {
    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn placeholder(&self, _config: &Config) -> String {
        format!("data-id=\"{}\"", self.id)
    }

    fn bless(self: Box<Self>, ctx: &BlessContext<'_>) -> Option<Rc<dyn Accessor>> {
        let root = ctx.container;
        let node = ctx
            .runtime
            .with_dom(|tree| tree.find_by_attribute(root, "data-id", &self.id));
        let Some(node) = node else {
            tracing::debug!("no element tagged data-id={:?} in template", self.id);
            return None;
        };
        Some(Rc::new(IdAccessor {
            runtime: ctx.runtime.clone(),
            current: RefCell::new(Value::Node(node)),
        }))
    }
}
