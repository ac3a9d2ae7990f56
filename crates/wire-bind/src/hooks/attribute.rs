//! `attribute` hook: an attribute value bound to a data property
//!
//! The placeholder is a bare sentinel used as the attribute's value. On
//! form controls, a `value` attribute binds the live value property and
//! user input flows back into `data` through the same mapping function.

use super::{Builder, ValueMapper};
use crate::template::BlessContext;
use crate::util::sentinel_token;
use crate::{Accessor, BindError, Config, Runtime, Value};
use std::cell::RefCell;
use std::rc::Rc;
use wire_dom::{DomTree, NodeId};

const FORM_CONTROLS: &[&str] = &["input", "textarea", "select"];

/// Builder returned by [`attribute`]
pub struct AttributeHook {
    id: String,
    value: Value,
    map: Option<ValueMapper>,
    sentinel: String,
}

/// Bind the attribute whose value is this hook's placeholder
pub fn attribute(id: impl Into<String>) -> AttributeHook {
    AttributeHook {
        id: id.into(),
        value: Value::Null,
        map: None,
        sentinel: sentinel_token(),
    }
}

impl AttributeHook {
    /// Initial logical value
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Mapping from logical value to attribute value
    pub fn map<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> R + 'static,
        R: Into<Value>,
    {
        self.map = Some(Rc::new(move |v| f(v).into()));
        self
    }
}

/// Where a mapped value is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Attribute,
    /// Live `value` property of a form control
    ValueProperty,
}

struct AttributeAccessor {
    runtime: Runtime,
    element: NodeId,
    name: String,
    target: Target,
    value: RefCell<Value>,
    map: Option<ValueMapper>,
}

fn apply_map(map: &Option<ValueMapper>, value: &Value) -> Value {
    match map {
        Some(map) => map(value),
        None => value.clone(),
    }
}

/// `Null`/`false` remove the attribute, `true` sets it empty
fn write_attribute(tree: &mut DomTree, element: NodeId, name: &str, mapped: &Value) -> Result<(), BindError> {
    match mapped {
        Value::Null | Value::Bool(false) => {
            tree.remove_attribute(element, name)?;
        }
        Value::Bool(true) => tree.set_attribute(element, name, "")?,
        other => tree.set_attribute(element, name, &other.to_text())?,
    }
    Ok(())
}

impl AttributeAccessor {
    fn write(&self, mapped: &Value) -> Result<(), BindError> {
        self.runtime.with_dom_mut(|tree| match self.target {
            Target::Attribute => write_attribute(tree, self.element, &self.name, mapped),
            Target::ValueProperty => Ok(tree.set_value(self.element, &mapped.to_text())?),
        })
    }
}

impl Accessor for AttributeAccessor {
    fn get(&self) -> Value {
        self.value.borrow().clone()
    }

    fn set(&self, value: Value) -> Result<(), BindError> {
        let mapped = apply_map(&self.map, &value);
        *self.value.borrow_mut() = value;
        self.write(&mapped)
    }
}

impl Builder for AttributeHook {
    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn placeholder(&self, _config: &Config) -> String {
        self.sentinel.clone()
    }

    fn bless(self: Box<Self>, ctx: &BlessContext<'_>) -> Option<Rc<dyn Accessor>> {
        let root = ctx.container;
        let Some((element, name)) = ctx
            .runtime
            .with_dom(|tree| tree.find_attribute_value(root, &self.sentinel))
        else {
            tracing::debug!("attribute sentinel {} not found in template", self.sentinel);
            return None;
        };

        let (target, needs_feedback) = ctx.runtime.with_dom(|tree| {
            let is_control = tree
                .tag_name(element)
                .is_some_and(|tag| FORM_CONTROLS.contains(&tag));
            if is_control && name == "value" {
                (Target::ValueProperty, !tree.has_handler(element, "oninput"))
            } else {
                (Target::Attribute, false)
            }
        });

        let mapped = apply_map(&self.map, &self.value);
        let accessor = Rc::new(AttributeAccessor {
            runtime: ctx.runtime.clone(),
            element,
            name,
            target,
            value: RefCell::new(self.value),
            map: self.map,
        });

        // The sentinel is replaced by the initial mapped value; form controls
        // keep it as their default value and also show it live.
        let written = ctx.runtime.with_dom_mut(|tree| {
            write_attribute(tree, element, &accessor.name, &mapped)?;
            if target == Target::ValueProperty {
                tree.set_value(element, &mapped.to_text())?;
            }
            Ok::<_, BindError>(())
        });
        if let Err(err) = written {
            tracing::warn!("could not write initial attribute {}: {}", accessor.name, err);
        }

        if needs_feedback {
            install_input_feedback(ctx, &self.id, element, accessor.map.clone());
        }

        Some(accessor)
    }
}

/// Typed input becomes `data[id] = map(typed)`
fn install_input_feedback(ctx: &BlessContext<'_>, id: &str, element: NodeId, map: Option<ValueMapper>) {
    let data = ctx.data.downgrade();
    let id = id.to_string();
    let handler = Rc::new(move |_: &wire_dom::Event| {
        let Some(data) = data.upgrade().map(crate::Data::from_inner) else {
            return;
        };
        let typed = data.runtime().value(element).unwrap_or_default();
        data.set(&id, apply_map(&map, &Value::String(typed)));
    });
    let installed = ctx
        .runtime
        .with_dom_mut(|tree| tree.set_handler(element, "oninput", handler));
    if let Err(err) = installed {
        tracing::warn!("could not install input handler on {}: {}", element, err);
    }
}
