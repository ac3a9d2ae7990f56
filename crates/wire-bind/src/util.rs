//! Placeholder sentinels and lookup helpers

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use wire_dom::{DomTree, EventHandler, NodeId};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(0);

/// Unique token made of digits and one underscore, safe as a bare
/// attribute value.
pub(crate) fn sentinel_token() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let seq = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}", millis, seq)
}

/// Comment markup for a structural placeholder
pub(crate) fn comment_placeholder(prefix: &str, token: &str) -> String {
    format!("<!--{}{}-->", prefix, token)
}

/// Move the attribute whose value is `sentinel` into a handler slot of
/// the same name on its element
pub(crate) fn assign_handler_under(
    tree: &mut DomTree,
    root: NodeId,
    sentinel: &str,
    handler: EventHandler,
) -> Option<NodeId> {
    let (element, name) = tree.find_attribute_value(root, sentinel)?;
    tree.remove_attribute(element, &name).ok()?;
    tree.set_handler(element, &name, handler).ok()?;
    Some(element)
}
