//! `handle` hook: an event handler without a data property

use super::Builder;
use crate::template::BlessContext;
use crate::util::{assign_handler_under, sentinel_token};
use crate::{Accessor, Config};
use std::rc::Rc;
use wire_dom::{Event, EventHandler};

/// Builder returned by [`handle`]
pub struct HandleHook {
    handler: EventHandler,
    sentinel: String,
}

/// Install `f` as the handler named by the attribute holding this hook,
/// e.g. `onclick={}`
pub fn handle(f: impl Fn(&Event) + 'static) -> HandleHook {
    HandleHook {
        handler: Rc::new(f),
        sentinel: sentinel_token(),
    }
}

impl Builder for HandleHook {
    fn id(&self) -> Option<&str> {
        None
    }

    fn placeholder(&self, _config: &Config) -> String {
        self.sentinel.clone()
    }

    fn bless(self: Box<Self>, ctx: &BlessContext<'_>) -> Option<Rc<dyn Accessor>> {
        let HandleHook { handler, sentinel } = *self;
        let root = ctx.container;
        let owner = ctx
            .runtime
            .with_dom_mut(|tree| assign_handler_under(tree, root, &sentinel, handler));
        if owner.is_none() {
            tracing::debug!("handler sentinel {} not found in template", sentinel);
        }
        None
    }
}
