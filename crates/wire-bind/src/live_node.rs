//! Live nodes
//!
//! The value a template evaluates to: a DOM element of the runtime's
//! document plus its `data`, lifecycle hooks and extensions.

use crate::extend::{Extension, Namespace};
use crate::lifecycle::{LifecycleTarget, try_to_call};
use crate::{Data, Runtime, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use wire_dom::NodeId;

type Callback = Rc<dyn Fn(&LiveNode)>;

#[derive(Default)]
struct Watchers {
    on_add: Vec<Callback>,
    on_remove: Vec<Callback>,
}

/// Element produced by a template
#[derive(Clone)]
pub struct LiveNode {
    inner: Rc<LiveNodeInner>,
}

pub(crate) struct LiveNodeInner {
    runtime: Runtime,
    id: NodeId,
    data: Data,
    watchers: RefCell<Watchers>,
    extensions: RefCell<Namespace>,
    /// Live nodes interpolated into this one's markup
    retained: RefCell<Vec<LiveNode>>,
}

impl LiveNode {
    pub(crate) fn new(runtime: &Runtime, id: NodeId, data: Data) -> Self {
        let inner = Rc::new(LiveNodeInner {
            runtime: runtime.clone(),
            id,
            data,
            watchers: RefCell::new(Watchers::default()),
            extensions: RefCell::new(Namespace::new()),
            retained: RefCell::new(Vec::new()),
        });
        inner.data.set_owner(Rc::downgrade(&inner));
        runtime.register_data(id, &inner.data);
        runtime.register_node_dom_callbacks(&inner);
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Rc<LiveNodeInner>) -> Self {
        Self { inner }
    }

    /// DOM node of this live node
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    pub fn data(&self) -> Data {
        self.inner.data.clone()
    }

    /// Whether two handles are the same live node
    pub fn ptr_eq(&self, other: &LiveNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_connected(&self) -> bool {
        self.inner.runtime.is_connected(self.inner.id)
    }

    pub fn inner_html(&self) -> String {
        self.inner.runtime.inner_html(self.inner.id)
    }

    pub fn outer_html(&self) -> String {
        self.inner.runtime.outer_html(self.inner.id)
    }

    pub fn text_content(&self) -> String {
        self.inner.runtime.text_content(self.inner.id)
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.inner.runtime.get_attribute(self.inner.id, name)
    }

    pub(crate) fn retain(&self, child: LiveNode) {
        self.inner.retained.borrow_mut().push(child);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Call `f` with this node each time it enters the document
    pub fn on_add(&self, f: impl Fn(&LiveNode) + 'static) -> LiveNode {
        self.inner.watchers.borrow_mut().on_add.push(Rc::new(f));
        self.clone()
    }

    /// Call `f` with this node each time it leaves the document
    pub fn on_remove(&self, f: impl Fn(&LiveNode) + 'static) -> LiveNode {
        self.inner.watchers.borrow_mut().on_remove.push(Rc::new(f));
        self.clone()
    }

    // ------------------------------------------------------------------
    // Extensions
    // ------------------------------------------------------------------

    /// Merge the namespace built by `build` into this node.
    ///
    /// Entries under `"data"` go to the `data` object: plain values are
    /// written as data properties, methods and namespaces land in the data
    /// object's own extension namespace.
    pub fn extend(&self, build: impl FnOnce(&LiveNode) -> Namespace) -> LiveNode {
        let mut incoming = build(self);
        if let Some(data) = incoming.remove("data") {
            self.merge_into_data(data);
        }
        self.inner.extensions.borrow_mut().merge(incoming);
        self.clone()
    }

    fn merge_into_data(&self, extension: Extension) {
        let data = &self.inner.data;
        match extension {
            Extension::Namespace(ns) => {
                for (name, entry) in ns {
                    match entry {
                        Extension::Value(value) => data.set(&name, value),
                        other => {
                            let mut single = Namespace::new();
                            single.insert(&name, other);
                            data.inner.extensions.borrow_mut().merge(single);
                        }
                    }
                }
            }
            Extension::Value(Value::Record(record)) => data.assign(record),
            Extension::Value(_) | Extension::Method(_) => {
                tracing::debug!(node = %self.inner.id, "ignoring non-object `data` extension");
            }
        }
    }

    /// Extension registered under a dotted `path`
    pub fn extension(&self, path: &str) -> Option<Extension> {
        self.inner.extensions.borrow().lookup(path)
    }

    /// Call the extension method at `path`
    pub fn invoke(&self, path: &str, args: &[Value]) -> Option<Value> {
        match self.extension(path)? {
            Extension::Method(method) => Some(method(self, args)),
            _ => None,
        }
    }
}

impl LifecycleTarget for LiveNodeInner {
    fn node(&self) -> NodeId {
        self.id
    }

    fn added(self: Rc<Self>) {
        let callbacks = self.watchers.borrow().on_add.clone();
        let node = LiveNode::from_inner(self);
        for callback in callbacks {
            try_to_call(node.id(), "onadd", || callback(&node));
        }
    }

    fn removed(self: Rc<Self>) {
        let callbacks = self.watchers.borrow().on_remove.clone();
        let node = LiveNode::from_inner(self);
        for callback in callbacks {
            try_to_call(node.id(), "onremove", || callback(&node));
        }
    }
}

impl From<&LiveNode> for NodeId {
    fn from(live: &LiveNode) -> Self {
        live.id()
    }
}

impl From<LiveNode> for NodeId {
    fn from(live: LiveNode) -> Self {
        live.id()
    }
}

impl fmt::Debug for LiveNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveNode")
            .field("id", &self.inner.id)
            .field("data", &self.inner.data)
            .finish()
    }
}
