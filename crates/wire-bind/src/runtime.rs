//! Runtime capability
//!
//! One `Runtime` is the whole environment a template lives in: the
//! document, the event loop that resolves pending values, the lifecycle
//! observer and the accessor registry. It is cheap to clone and never
//! shared across threads.

use crate::lifecycle::LifecycleObserver;
use crate::registry::AccessorRegistry;
use crate::{BindError, Config, LiveNode};
use smol::LocalExecutor;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use wire_dom::{Document, DomTree, Event, NodeId, handler_slot};

/// Handle to the template runtime
#[derive(Clone)]
pub struct Runtime {
    pub(crate) inner: Rc<RuntimeInner>,
}

pub(crate) struct RuntimeInner {
    pub(crate) config: Config,
    pub(crate) document: RefCell<Document>,
    pub(crate) executor: LocalExecutor<'static>,
    pub(crate) lifecycle: RefCell<Option<LifecycleObserver>>,
    pub(crate) registry: AccessorRegistry,
    /// Live nodes detached by a binding, kept until the next mutation delivery
    pub(crate) released: RefCell<Vec<LiveNode>>,
}

impl Runtime {
    /// Create a runtime with an empty `<html><head></head><body></body></html>` document
    pub fn new(config: Config) -> Self {
        tracing::debug!("creating runtime");
        Self {
            inner: Rc::new(RuntimeInner {
                config,
                document: RefCell::new(Document::new()),
                executor: LocalExecutor::new(),
                lifecycle: RefCell::new(None),
                registry: AccessorRegistry::default(),
                released: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Whether two handles point at the same runtime
    pub fn same(&self, other: &Runtime) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Document access
    // ------------------------------------------------------------------

    /// Scoped shared borrow of the tree
    pub fn with_dom<R>(&self, f: impl FnOnce(&DomTree) -> R) -> R {
        f(&self.inner.document.borrow().tree)
    }

    /// Scoped exclusive borrow of the tree.
    ///
    /// Never call back into user code from inside `f`.
    pub fn with_dom_mut<R>(&self, f: impl FnOnce(&mut DomTree) -> R) -> R {
        f(&mut self.inner.document.borrow_mut().tree)
    }

    pub fn body(&self) -> NodeId {
        self.inner.document.borrow().body()
    }

    pub fn head(&self) -> NodeId {
        self.inner.document.borrow().head()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.inner.document.borrow().get_element_by_id(id)
    }

    pub fn is_connected(&self, node: impl Into<NodeId>) -> bool {
        let node = node.into();
        self.with_dom(|tree| tree.is_connected(node))
    }

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.with_dom_mut(|tree| tree.create_element(tag))
    }

    pub fn create_text(&self, content: &str) -> NodeId {
        self.with_dom_mut(|tree| tree.create_text(content))
    }

    pub fn append_child(
        &self,
        parent: impl Into<NodeId>,
        child: impl Into<NodeId>,
    ) -> Result<(), BindError> {
        let (parent, child) = (parent.into(), child.into());
        self.with_dom_mut(|tree| tree.append_child(parent, child))?;
        Ok(())
    }

    pub fn append_to_body(&self, child: impl Into<NodeId>) -> Result<(), BindError> {
        self.append_child(self.body(), child)
    }

    /// Detach a node from its parent
    pub fn remove(&self, node: impl Into<NodeId>) {
        let node = node.into();
        self.with_dom_mut(|tree| tree.detach(node));
    }

    pub fn inner_html(&self, node: impl Into<NodeId>) -> String {
        let node = node.into();
        self.with_dom(|tree| wire_html::inner_html(tree, node))
    }

    pub fn outer_html(&self, node: impl Into<NodeId>) -> String {
        let node = node.into();
        self.with_dom(|tree| wire_html::outer_html(tree, node))
    }

    pub fn text_content(&self, node: impl Into<NodeId>) -> String {
        let node = node.into();
        self.with_dom(|tree| tree.text_content(node))
    }

    pub fn get_attribute(&self, node: impl Into<NodeId>, name: &str) -> Option<String> {
        let node = node.into();
        self.with_dom(|tree| tree.get_attribute(node, name).map(str::to_string))
    }

    /// Live `value` of a form control
    pub fn value(&self, node: impl Into<NodeId>) -> Option<String> {
        let node = node.into();
        self.with_dom(|tree| tree.value(node).map(str::to_string))
    }

    /// Write the live `value` of a form control, as typing would
    pub fn set_value(&self, node: impl Into<NodeId>, value: &str) -> Result<(), BindError> {
        let node = node.into();
        self.with_dom_mut(|tree| tree.set_value(node, value))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Dispatch an event along the target's ancestor path.
    ///
    /// Returns `false` if a handler called `prevent_default`.
    pub fn dispatch_event(&self, event: &Event) -> bool {
        let slot = handler_slot(&event.event_type);
        let path = self.with_dom(|tree| tree.event_path(event.target));

        for node in path {
            // Handlers may mutate the tree, so each one is fetched right
            // before it runs and called with no borrow held.
            if let Some(handler) = self.with_dom(|tree| tree.handler(node, &slot)) {
                event.set_current_target(node);
                handler(event);
            }
            if event.is_propagation_stopped() || !event.bubbles {
                break;
            }
        }

        !event.is_default_prevented()
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    /// Spawn a task on the runtime's event loop
    pub fn spawn<T: 'static>(&self, future: impl Future<Output = T> + 'static) -> smol::Task<T> {
        self.inner.executor.spawn(future)
    }

    /// Drive the event loop until `future` completes, then drain it
    pub fn block_on<T>(&self, future: impl Future<Output = T>) -> T {
        let output = smol::block_on(self.inner.executor.run(future));
        self.run_until_idle();
        output
    }

    /// Run ready tasks and deliver DOM mutation records until neither
    /// makes progress, then let go of live nodes that ended detached
    pub fn run_until_idle(&self) {
        loop {
            let mut progressed = false;
            while self.inner.executor.try_tick() {
                progressed = true;
            }
            if self.deliver_mutations() {
                progressed = true;
            }
            if !progressed {
                break;
            }
        }

        self.settle_lifecycle();
        let released = std::mem::take(&mut *self.inner.released.borrow_mut());
        drop(released);
    }

    /// Keep a detached live node alive until pending lifecycle callbacks ran
    pub(crate) fn defer_release(&self, live: LiveNode) {
        self.inner.released.borrow_mut().push(live);
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
