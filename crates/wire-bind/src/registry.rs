//! Accessor aggregation registry
//!
//! Every live node owns one [`Data`] object. Each property of it is either
//! bound to an ordered list of accessors (one per hook blessed under that
//! name) or holds a plain value. Reads go to the first accessor; writes are
//! broadcast to all of them in registration order.

use crate::extend::{Extension, Namespace};
use crate::hooks::ListBinding;
use crate::live_node::LiveNodeInner;
use crate::{Assignment, BindError, LiveNode, Runtime, Value};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use wire_dom::NodeId;

/// Get/set pair connecting a logical value to its live DOM representation
pub trait Accessor {
    fn get(&self) -> Value;

    fn set(&self, value: Value) -> Result<(), BindError>;

    /// List bindings expose their verb set
    fn as_list(&self) -> Option<ListBinding> {
        None
    }
}

enum Property {
    Bound(Vec<Rc<dyn Accessor>>),
    Plain(Value),
}

/// The `data` object of a live node
#[derive(Clone)]
pub struct Data {
    pub(crate) inner: Rc<DataInner>,
}

pub(crate) struct DataInner {
    runtime: Runtime,
    properties: RefCell<IndexMap<String, Property>>,
    pub(crate) extensions: RefCell<Namespace>,
    owner: RefCell<Weak<LiveNodeInner>>,
}

impl Data {
    pub(crate) fn new(runtime: &Runtime) -> Self {
        Self {
            inner: Rc::new(DataInner {
                runtime: runtime.clone(),
                properties: RefCell::new(IndexMap::new()),
                extensions: RefCell::new(Namespace::new()),
                owner: RefCell::new(Weak::new()),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<DataInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn from_inner(inner: Rc<DataInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    pub(crate) fn set_owner(&self, owner: Weak<LiveNodeInner>) {
        *self.inner.owner.borrow_mut() = owner;
    }

    /// Live node this data belongs to
    pub fn owner(&self) -> Option<LiveNode> {
        self.inner.owner.borrow().upgrade().map(LiveNode::from_inner)
    }

    /// Register an accessor under `name`.
    ///
    /// `None` still declares the property, so it reads as `Null` until a
    /// later hook provides an accessor.
    pub fn append_accessor(&self, name: &str, accessor: Option<Rc<dyn Accessor>>) {
        let mut properties = self.inner.properties.borrow_mut();
        let entry = properties
            .entry(name.to_string())
            .or_insert_with(|| Property::Bound(Vec::new()));
        if let Property::Plain(_) = entry {
            *entry = Property::Bound(Vec::new());
        }
        if let (Property::Bound(accessors), Some(accessor)) = (entry, accessor) {
            accessors.push(accessor);
        }
    }

    /// Current value of a property; `Null` when absent
    pub fn get(&self, name: &str) -> Value {
        let first = match self.inner.properties.borrow().get(name) {
            Some(Property::Bound(accessors)) => accessors.first().cloned(),
            Some(Property::Plain(value)) => return value.clone(),
            None => return Value::Null,
        };
        first.map(|accessor| accessor.get()).unwrap_or_default()
    }

    /// Write a property.
    ///
    /// Immediate values are broadcast now; pending values are broadcast on
    /// the event-loop turn they resolve on, and reads keep returning the
    /// previously committed value until then.
    pub fn set(&self, name: &str, value: impl Into<Assignment>) {
        match value.into() {
            Assignment::Immediate(value) => self.broadcast(name, value),
            Assignment::Pending(pending) => {
                let data = self.clone();
                let name = name.to_string();
                let future = pending.into_future();
                self.inner
                    .runtime
                    .spawn(async move {
                        let value = future.await;
                        data.broadcast(&name, value);
                    })
                    .detach();
            }
        }
    }

    fn broadcast(&self, name: &str, value: Value) {
        let accessors = {
            let mut properties = self.inner.properties.borrow_mut();
            match properties.get_mut(name) {
                Some(Property::Bound(accessors)) => accessors.clone(),
                Some(Property::Plain(slot)) => {
                    *slot = value;
                    return;
                }
                None => {
                    properties.insert(name.to_string(), Property::Plain(value));
                    return;
                }
            }
        };

        for (index, accessor) in accessors.iter().enumerate() {
            if let Err(err) = accessor.set(value.clone()) {
                tracing::warn!(property = name, target = index, error = %err, "accessor rejected value");
            }
        }
    }

    /// List binding registered under `name`
    pub fn list(&self, name: &str) -> Option<ListBinding> {
        match self.inner.properties.borrow().get(name) {
            Some(Property::Bound(accessors)) => accessors.iter().find_map(|a| a.as_list()),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.properties.borrow().contains_key(name)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.properties.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.properties.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every property, in declaration order
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.keys()
            .into_iter()
            .map(|name| {
                let value = self.get(&name);
                (name, value)
            })
            .collect()
    }

    pub fn to_record(&self) -> IndexMap<String, Value> {
        self.entries().into_iter().collect()
    }

    /// Key-by-key wholesale assignment.
    ///
    /// When the current value is a node carrying its own `data` and the
    /// incoming value is a `{ "data": { .. } }` record, the record is
    /// assigned into the nested node instead of replacing it, so nested
    /// components keep their DOM identity. Plain elements without `data`
    /// keep their node and ignore the record.
    pub fn assign(&self, record: IndexMap<String, Value>) {
        for (name, incoming) in record {
            let current = self.get(&name);
            let nested = match (&incoming, &current) {
                (Value::Record(fields), Value::Node(_) | Value::Live(_)) => match fields.get("data") {
                    Some(Value::Record(inner)) => Some(inner.clone()),
                    _ => None,
                },
                _ => None,
            };

            match nested {
                Some(inner) => match self.inner.runtime.data_of_value(&current) {
                    Some(data) => data.assign(inner),
                    None => tracing::debug!(property = %name, "no data to hydrate on plain element"),
                },
                None => self.set(&name, incoming),
            }
        }
    }

    /// Extension registered under `path` in this data object's namespace
    pub fn extension(&self, path: &str) -> Option<Extension> {
        self.inner.extensions.borrow().lookup(path)
    }

    /// Call an extension method merged in under `data`
    pub fn invoke(&self, path: &str, args: &[Value]) -> Option<Value> {
        let owner = self.owner()?;
        match self.extension(path)? {
            Extension::Method(method) => Some(method(&owner, args)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

/// Association from a node to its `data`, held weakly
#[derive(Default)]
pub(crate) struct AccessorRegistry {
    entries: RefCell<HashMap<NodeId, Weak<DataInner>>>,
}

impl AccessorRegistry {
    pub(crate) fn register(&self, node: NodeId, data: &Data) {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|_, weak| weak.strong_count() > 0);
        entries.insert(node, data.downgrade());
    }

    pub(crate) fn lookup(&self, node: NodeId) -> Option<Data> {
        self.entries
            .borrow()
            .get(&node)
            .and_then(Weak::upgrade)
            .map(Data::from_inner)
    }
}

impl Runtime {
    /// `data` of a node produced by a template, if it is still alive
    pub fn data_of(&self, node: impl Into<NodeId>) -> Option<Data> {
        self.inner.registry.lookup(node.into())
    }

    pub(crate) fn data_of_value(&self, value: &Value) -> Option<Data> {
        match value {
            Value::Live(live) => Some(live.data()),
            Value::Node(id) => self.data_of(*id),
            _ => None,
        }
    }

    /// Register an accessor for `name` on the `data` of `node`, creating
    /// that `data` on first use
    pub fn append_accessor(&self, node: NodeId, name: &str, accessor: Option<Rc<dyn Accessor>>) -> Data {
        let data = self.data_of(node).unwrap_or_else(|| {
            let data = Data::new(self);
            self.inner.registry.register(node, &data);
            data
        });
        data.append_accessor(name, accessor);
        data
    }

    pub(crate) fn register_data(&self, node: NodeId, data: &Data) {
        self.inner.registry.register(node, data);
    }
}
