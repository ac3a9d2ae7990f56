//! DOM lifecycle observer
//!
//! A single observer per runtime watches the body subtree for child-list
//! changes. On every delivered batch it compares each monitored node's
//! document membership against the last known state and fires `added` or
//! `removed` on transitions only, so a node added and removed within one
//! batch fires nothing.
//!
//! Being in the document counts as a reference: a monitored target is held
//! strongly from registration until the first settled turn of the event
//! loop that finds it detached, and again whenever it is connected.

use crate::Runtime;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};
use wire_dom::{MutationObserverId, MutationObserverInit, NodeId};

/// Something that wants to hear about its node entering or leaving the document
pub trait LifecycleTarget {
    fn node(&self) -> NodeId;

    fn added(self: Rc<Self>);

    fn removed(self: Rc<Self>);
}

struct Monitored {
    node: NodeId,
    target: Weak<dyn LifecycleTarget>,
    /// Strong while connected or not yet settled
    held: Option<Rc<dyn LifecycleTarget>>,
    connected: bool,
}

/// Monitored nodes plus the body observation
pub struct LifecycleObserver {
    observer: MutationObserverId,
    monitored: Vec<Monitored>,
}

impl LifecycleObserver {
    /// Number of registrations still alive
    pub fn len(&self) -> usize {
        self.monitored
            .iter()
            .filter(|m| m.target.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Runtime {
    /// Monitor `target`'s node for document membership changes.
    ///
    /// The target stays alive while its node is in the document; once it is
    /// detached and settled only the caller's handles keep it. Registering
    /// the same node again replaces the previous target.
    pub fn register_node_dom_callbacks<T>(&self, target: &Rc<T>)
    where
        T: LifecycleTarget + 'static,
    {
        self.ensure_lifecycle_observer();

        let node = target.node();
        let connected = self.is_connected(node);
        let held: Rc<dyn LifecycleTarget> = target.clone();
        let target = Rc::downgrade(&held);

        let replaced = {
            let mut lifecycle = self.inner.lifecycle.borrow_mut();
            let Some(observer) = lifecycle.as_mut() else {
                return;
            };
            let (replaced, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut observer.monitored)
                .into_iter()
                .partition(|m| m.node == node);
            observer.monitored = kept;
            observer.monitored.push(Monitored {
                node,
                target,
                held: Some(held),
                connected,
            });
            replaced
        };
        drop(replaced);
    }

    /// Drop the hold on every target that ended the turn detached
    pub(crate) fn settle_lifecycle(&self) {
        let released: Vec<Rc<dyn LifecycleTarget>> = {
            let mut lifecycle = self.inner.lifecycle.borrow_mut();
            let Some(observer) = lifecycle.as_mut() else {
                return;
            };
            observer
                .monitored
                .iter_mut()
                .filter(|m| !m.connected)
                .filter_map(|m| m.held.take())
                .collect()
        };
        if !released.is_empty() {
            tracing::trace!("releasing {} detached live nodes", released.len());
        }
        drop(released);

        if let Some(observer) = self.inner.lifecycle.borrow_mut().as_mut() {
            observer.monitored.retain(|m| m.target.strong_count() > 0);
        }
    }

    fn ensure_lifecycle_observer(&self) {
        if self.inner.lifecycle.borrow().is_some() {
            return;
        }
        let body = self.body();
        let observer =
            self.with_dom_mut(|tree| tree.observe(body, MutationObserverInit::subtree_child_list()));
        tracing::debug!("starting lifecycle observer on body {}", body);
        *self.inner.lifecycle.borrow_mut() = Some(LifecycleObserver {
            observer,
            monitored: Vec::new(),
        });
    }

    /// Deliver queued mutation records; returns whether any were pending
    pub(crate) fn deliver_mutations(&self) -> bool {
        let Some(observer) = self.inner.lifecycle.borrow().as_ref().map(|o| o.observer) else {
            return false;
        };
        let records = self.with_dom_mut(|tree| tree.take_records(observer));
        if records.is_empty() {
            return false;
        }
        tracing::trace!("delivering {} mutation records", records.len());

        let mut transitions = Vec::new();
        {
            let document = self.inner.document.borrow();
            let mut lifecycle = self.inner.lifecycle.borrow_mut();
            let Some(lifecycle) = lifecycle.as_mut() else {
                return true;
            };
            lifecycle.monitored.retain_mut(|monitored| {
                let Some(target) = monitored.target.upgrade() else {
                    return false;
                };
                let connected = document.tree.is_connected(monitored.node);
                if connected && monitored.held.is_none() {
                    monitored.held = Some(target.clone());
                }
                if connected != monitored.connected {
                    transitions.push((target, connected));
                }
                monitored.connected = connected;
                true
            });
        }

        // Detached targets stay held through `removed`; the hold is
        // dropped when the turn settles.
        for (target, connected) in transitions {
            if connected {
                target.added();
            } else {
                target.removed();
            }
        }
        true
    }
}

/// Run one lifecycle callback, logging instead of propagating a panic
pub(crate) fn try_to_call(node: NodeId, hook: &str, f: impl FnOnce()) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(f)) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic".to_string());
        tracing::error!(node = %node, hook, "lifecycle callback panicked: {}", message);
    }
}
