//! DOM Events
//!
//! Events dispatched to element handler slots (`onclick`, `oninput`, ...).
//! Dispatch itself lives with whoever owns the tree borrow, since handlers
//! are free to mutate the tree they were fired from.

use crate::NodeId;
use std::cell::Cell;
use std::rc::Rc;

/// Handler stored in an element's `on<event>` slot
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Slot name for an event type: `"click"` -> `"onclick"`
pub fn handler_slot(event_type: &str) -> String {
    format!("on{}", event_type.to_ascii_lowercase())
}

/// DOM event
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: String,
    pub target: NodeId,
    pub bubbles: bool,
    pub cancelable: bool,
    current_target: Cell<NodeId>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl Event {
    /// Create an event of the given type
    pub fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            bubbles: true,
            cancelable: true,
            current_target: Cell::new(target),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    /// User typed into a form control
    pub fn input(target: NodeId) -> Self {
        Self {
            cancelable: false,
            ..Self::new("input", target)
        }
    }

    /// Pointer activation
    pub fn click(target: NodeId) -> Self {
        Self::new("click", target)
    }

    /// Node whose handler is currently running
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    pub fn set_current_target(&self, node: NodeId) {
        self.current_target.set(node);
    }

    /// Prevent default action
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Stop propagation to ancestors
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}
