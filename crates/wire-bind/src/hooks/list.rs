//! `list` hook: an ordered collection rendered between two marker nodes
//!
//! The binding keeps the logical items and their rendered nodes in
//! lockstep. Every verb touches only the region between the start and end
//! markers; wholesale replacement clears the list and pushes every new
//! item, with no reconciliation against the previous contents.

use super::{Builder, NodeMapper, Rendered, find_marker};
use crate::template::BlessContext;
use crate::util::{comment_placeholder, sentinel_token};
use crate::{Accessor, BindError, Config, Interpolation, LiveNode, Runtime, Value};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;
use wire_dom::{DomError, DomResult, DomTree, NodeId};

/// Builder returned by [`list`]
pub struct ListHook {
    id: String,
    items: Vec<Value>,
    map: Option<NodeMapper>,
    token: String,
}

/// Bind an ordered collection; each item is rendered by the mapping
/// function, `<div>{item}</div>` by default
pub fn list(id: impl Into<String>) -> ListHook {
    ListHook {
        id: id.into(),
        items: Vec::new(),
        map: None,
        token: sentinel_token(),
    }
}

impl ListHook {
    /// Initial items
    pub fn value<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    /// Mapping from item to rendered node
    pub fn map<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> R + 'static,
        R: Into<Rendered>,
    {
        self.map = Some(Rc::new(move |v| f(v).into()));
        self
    }
}

/// One rendered item
struct Slot {
    node: NodeId,
    live: Option<LiveNode>,
}

struct ListState {
    runtime: Runtime,
    items: RefCell<Vec<Value>>,
    slots: RefCell<Vec<Slot>>,
    start: NodeId,
    end: NodeId,
    map: Option<NodeMapper>,
}

/// Handle on a bound list, reachable with [`Data::list`](crate::Data::list)
#[derive(Clone)]
pub struct ListBinding {
    state: Rc<ListState>,
}

/// Numbers compare numerically, anything else by its text
fn natural_order(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_text().cmp(&b.to_text()),
    }
}

fn insert_before_marker(tree: &mut DomTree, node: NodeId, marker: NodeId) -> DomResult<NodeId> {
    let parent = tree.parent(marker).ok_or(DomError::NotFound(marker))?;
    tree.insert_before(parent, node, Some(marker))
}

impl ListBinding {
    fn render(&self, item: &Value) -> Slot {
        let state = &self.state;
        let rendered = match &state.map {
            Some(map) => map(item),
            None => state
                .runtime
                .html(&["<div>", "</div>"], vec![Interpolation::from(item.clone())])
                .into(),
        };
        let (node, live) = rendered.into_node(&state.runtime);
        Slot { node, live }
    }

    /// Let go of a slot that left the list.
    ///
    /// A mapper may hand back a node it rendered before, so a node still
    /// held by a current slot stays where it is.
    fn release(&self, slot: Slot) {
        let reused = self.state.slots.borrow().iter().any(|s| s.node == slot.node);
        if !reused {
            self.state.runtime.with_dom_mut(|tree| tree.detach(slot.node));
        }
        if let Some(live) = slot.live {
            self.state.runtime.defer_release(live);
        }
    }

    /// Re-lay the region between the markers to match the slot order
    fn refresh(&self) {
        let nodes: Vec<NodeId> = self.state.slots.borrow().iter().map(|s| s.node).collect();
        let (start, end) = (self.state.start, self.state.end);
        let result = self.state.runtime.with_dom_mut(|tree| {
            while let Some(next) = tree.next_sibling(start) {
                if next == end {
                    break;
                }
                tree.detach(next);
            }
            for node in nodes {
                insert_before_marker(tree, node, end)?;
            }
            Ok::<_, DomError>(())
        });
        if let Err(err) = result {
            tracing::warn!("could not lay out list region: {}", err);
        }
    }

    /// Append items; returns the new length
    pub fn push<I, T>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        for item in items {
            let item = item.into();
            let slot = self.render(&item);
            let end = self.state.end;
            if let Err(err) = self
                .state
                .runtime
                .with_dom_mut(|tree| insert_before_marker(tree, slot.node, end))
            {
                tracing::warn!("could not insert list item: {}", err);
            }
            self.state.items.borrow_mut().push(item);
            self.state.slots.borrow_mut().push(slot);
        }
        self.len()
    }

    /// Remove and return the last item
    pub fn pop(&self) -> Option<Value> {
        let item = self.state.items.borrow_mut().pop()?;
        let slot = self.state.slots.borrow_mut().pop();
        if let Some(slot) = slot {
            self.release(slot);
        }
        Some(item)
    }

    /// Remove and return the first item
    pub fn shift(&self) -> Option<Value> {
        if self.is_empty() {
            return None;
        }
        let item = self.state.items.borrow_mut().remove(0);
        let slot = self.state.slots.borrow_mut().remove(0);
        self.release(slot);
        Some(item)
    }

    /// Prepend items, keeping their argument order; returns the new length
    pub fn unshift<I, T>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        let mut slots = Vec::with_capacity(items.len());
        for item in items.iter().rev() {
            let slot = self.render(item);
            let start = self.state.start;
            if let Err(err) = self
                .state
                .runtime
                .with_dom_mut(|tree| tree.insert_after(slot.node, start))
            {
                tracing::warn!("could not insert list item: {}", err);
            }
            slots.push(slot);
        }
        slots.reverse();

        self.state.items.borrow_mut().splice(0..0, items);
        self.state.slots.borrow_mut().splice(0..0, slots);
        self.len()
    }

    /// Remove `delete_count` items at `start` (the rest of the list when
    /// `None`) and insert `items` in their place; returns the removed items
    pub fn splice<I, T>(&self, start: usize, delete_count: Option<usize>, items: I) -> Vec<Value>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        let slots: Vec<Slot> = items.iter().map(|item| self.render(item)).collect();

        let len = self.len();
        let start = start.min(len);
        let count = delete_count.unwrap_or(len - start).min(len - start);
        let range = start..start + count;

        let removed: Vec<Value> = self.state.items.borrow_mut().splice(range.clone(), items).collect();
        let dropped: Vec<Slot> = self.state.slots.borrow_mut().splice(range, slots).collect();
        self.refresh();
        for slot in dropped {
            self.release(slot);
        }
        removed
    }

    /// Sort with `comparer`, or in natural order; every item is mapped again
    pub fn sort(&self, comparer: Option<&dyn Fn(&Value, &Value) -> Ordering>) -> ListBinding {
        let mut items = std::mem::take(&mut *self.state.items.borrow_mut());
        match comparer {
            Some(comparer) => items.sort_by(|a, b| comparer(a, b)),
            None => items.sort_by(natural_order),
        }
        let slots: Vec<Slot> = items.iter().map(|item| self.render(item)).collect();
        *self.state.items.borrow_mut() = items;

        let old = self.state.slots.replace(slots);
        self.refresh();
        for slot in old {
            self.release(slot);
        }
        self.clone()
    }

    pub fn sort_by(&self, comparer: impl Fn(&Value, &Value) -> Ordering) -> ListBinding {
        self.sort(Some(&comparer))
    }

    /// Reverse in place, reusing the rendered nodes
    pub fn reverse(&self) -> ListBinding {
        self.state.slots.borrow_mut().reverse();
        self.refresh();
        self.state.items.borrow_mut().reverse();
        self.clone()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.state.items.borrow().get(index).cloned()
    }

    /// Replace the item at `index`; past the end this appends
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Option<Value> {
        self.splice(index, Some(1), [value.into()]).into_iter().next()
    }

    pub fn remove(&self, index: usize) -> Option<Value> {
        self.splice(index, Some(1), Vec::<Value>::new()).into_iter().next()
    }

    pub fn len(&self) -> usize {
        self.state.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn items(&self) -> Vec<Value> {
        self.state.items.borrow().clone()
    }

    /// Rendered nodes, in item order
    pub fn rendered(&self) -> Vec<NodeId> {
        self.state.slots.borrow().iter().map(|s| s.node).collect()
    }

    /// Discard every rendered node and render `items` from scratch
    pub fn replace_all<I, T>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.splice(0, None, Vec::<Value>::new());
        self.push(items)
    }
}

impl std::fmt::Debug for ListBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.state.items.borrow().iter()).finish()
    }
}

struct ListAccessor {
    binding: ListBinding,
}

impl Accessor for ListAccessor {
    fn get(&self) -> Value {
        Value::List(self.binding.items())
    }

    fn set(&self, value: Value) -> Result<(), BindError> {
        match value {
            Value::List(items) => {
                self.binding.replace_all(items);
                Ok(())
            }
            other => Err(BindError::NotAList(other.kind())),
        }
    }

    fn as_list(&self) -> Option<ListBinding> {
        Some(self.binding.clone())
    }
}

impl Builder for ListHook {
    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn placeholder(&self, config: &Config) -> String {
        comment_placeholder(&config.placeholder_prefix, &self.token)
    }

    fn bless(self: Box<Self>, ctx: &BlessContext<'_>) -> Option<Rc<dyn Accessor>> {
        let marker = find_marker(ctx, &self.token)?;
        let markers = ctx.runtime.with_dom_mut(|tree| {
            let start = tree.create_text("");
            let end = tree.create_text("");
            insert_before_marker(tree, start, marker)?;
            insert_before_marker(tree, end, marker)?;
            tree.detach(marker);
            Ok::<_, DomError>((start, end))
        });
        let (start, end) = match markers {
            Ok(markers) => markers,
            Err(err) => {
                tracing::warn!("could not place list markers for {}: {}", self.id, err);
                return None;
            }
        };

        let ListHook { items, map, .. } = *self;
        let binding = ListBinding {
            state: Rc::new(ListState {
                runtime: ctx.runtime.clone(),
                items: RefCell::new(Vec::new()),
                slots: RefCell::new(Vec::new()),
                start,
                end,
                map,
            }),
        };
        binding.push(items);
        Some(Rc::new(ListAccessor { binding }))
    }
}
