//! Template engine
//!
//! `html` turns literal segments plus interpolations into a live node in
//! two passes: first every interpolation contributes placeholder text to
//! one markup string, which is parsed; then each interpolation is resolved
//! against the parsed tree in its original order.

use crate::hooks::Builder;
use crate::util::{assign_handler_under, comment_placeholder, sentinel_token};
use crate::{Data, LiveNode, Runtime, Stylesheet, TemplateError, Value};
use std::rc::Rc;
use wire_dom::{Event, EventHandler, NodeId};

/// Context handed to a builder when it is blessed
pub struct BlessContext<'a> {
    pub runtime: &'a Runtime,
    /// Root element of the template instance
    pub container: NodeId,
    /// `data` of the template instance being built
    pub data: &'a Data,
}

/// One interpolated value of a template
pub enum Interpolation {
    /// Hook builder (`text`, `attribute`, `list`, ...)
    Hook(Box<dyn Builder>),
    /// Event handler placed as an attribute value, e.g. `onclick={}`
    Handler(EventHandler),
    /// Nodes and text spliced in at a structural position
    Nodes(Vec<Value>),
    /// A single node spliced in at a structural position
    Node(Value),
    /// Appended to the document head; contributes no markup
    Stylesheet(Stylesheet),
    /// Markup inserted verbatim
    Raw(String),
}

impl Interpolation {
    pub fn hook(builder: impl Builder + 'static) -> Self {
        Interpolation::Hook(Box::new(builder))
    }

    pub fn handler(f: impl Fn(&Event) + 'static) -> Self {
        Interpolation::Handler(Rc::new(f))
    }
}

impl From<LiveNode> for Interpolation {
    fn from(live: LiveNode) -> Self {
        Interpolation::Node(Value::Live(live))
    }
}

impl From<&LiveNode> for Interpolation {
    fn from(live: &LiveNode) -> Self {
        Interpolation::Node(Value::Live(live.clone()))
    }
}

impl From<NodeId> for Interpolation {
    fn from(id: NodeId) -> Self {
        Interpolation::Node(Value::Node(id))
    }
}

impl From<Stylesheet> for Interpolation {
    fn from(sheet: Stylesheet) -> Self {
        Interpolation::Stylesheet(sheet)
    }
}

impl From<&Stylesheet> for Interpolation {
    fn from(sheet: &Stylesheet) -> Self {
        Interpolation::Stylesheet(sheet.clone())
    }
}

impl From<&str> for Interpolation {
    fn from(s: &str) -> Self {
        Interpolation::Raw(s.to_string())
    }
}

impl From<String> for Interpolation {
    fn from(s: String) -> Self {
        Interpolation::Raw(s)
    }
}

impl From<&String> for Interpolation {
    fn from(s: &String) -> Self {
        Interpolation::Raw(s.clone())
    }
}

macro_rules! raw_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Interpolation {
            fn from(v: $ty) -> Self {
                Interpolation::Raw(Value::from(v).to_text())
            }
        })*
    };
}

raw_from!(bool, f64, i32, i64, u32, u64, usize);

impl<T: Into<Value>> From<Vec<T>> for Interpolation {
    fn from(items: Vec<T>) -> Self {
        Interpolation::Nodes(items.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for Interpolation {
    fn from(value: Value) -> Self {
        match value {
            Value::Node(_) | Value::Live(_) => Interpolation::Node(value),
            Value::List(items) => Interpolation::Nodes(items),
            other => Interpolation::Raw(other.to_text()),
        }
    }
}

/// Interpolation after its markup has been emitted
enum Prepared {
    Hook(Box<dyn Builder>),
    Handler { sentinel: String, handler: EventHandler },
    Fragment { needle: String, children: Vec<Value> },
    Done,
}

/// Split a `{}`-holed template into literal segments; `{{` and `}}` are
/// literal braces
pub fn segments(template: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('}')) => {
                chars.next();
                out.push(std::mem::take(&mut current));
            }
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                current.push(c);
            }
            _ => current.push(c),
        }
    }
    out.push(current);
    out
}

impl Runtime {
    /// Instantiate a template.
    ///
    /// `segments` are the literal parts surrounding each interpolation, so
    /// there is one more segment than interpolations.
    pub fn html<S: AsRef<str>>(
        &self,
        segments: &[S],
        interpolations: Vec<Interpolation>,
    ) -> Result<LiveNode, TemplateError> {
        let mut markup = String::new();
        let mut prepared = Vec::with_capacity(interpolations.len());
        let mut interpolations = interpolations.into_iter();

        for (i, segment) in segments.iter().enumerate() {
            markup.push_str(segment.as_ref());
            if i + 1 == segments.len() {
                break;
            }
            if let Some(interpolation) = interpolations.next() {
                let (text, item) = self.prepare(interpolation);
                markup.push_str(&text);
                prepared.push(item);
            }
        }
        let unused = interpolations.count();
        if unused > 0 {
            tracing::warn!("{} interpolations have no segment to follow and were ignored", unused);
        }

        let markup = markup.trim();
        if markup.is_empty() {
            return Err(TemplateError::NoRootElement);
        }
        let root = self.with_dom_mut(|tree| wire_html::parse_root(tree, markup))?;

        let data = Data::new(self);
        let live = LiveNode::new(self, root, data.clone());

        for item in prepared {
            match item {
                Prepared::Handler { sentinel, handler } => {
                    let owner =
                        self.with_dom_mut(|tree| assign_handler_under(tree, root, &sentinel, handler));
                    if owner.is_none() {
                        tracing::debug!("handler sentinel {} not found in template", sentinel);
                    }
                }
                Prepared::Fragment { needle, children } => {
                    self.splice_fragment(&live, &needle, children);
                }
                Prepared::Hook(builder) => {
                    let id = builder.id().map(str::to_string);
                    let ctx = BlessContext {
                        runtime: self,
                        container: root,
                        data: &data,
                    };
                    let accessor = builder.bless(&ctx);
                    if let Some(name) = id {
                        data.append_accessor(&name, accessor);
                    }
                }
                Prepared::Done => {}
            }
        }

        Ok(live)
    }

    fn prepare(&self, interpolation: Interpolation) -> (String, Prepared) {
        let prefix = &self.inner.config.placeholder_prefix;
        match interpolation {
            Interpolation::Hook(builder) => (builder.placeholder(&self.inner.config), Prepared::Hook(builder)),
            Interpolation::Handler(handler) => {
                let sentinel = sentinel_token();
                (sentinel.clone(), Prepared::Handler { sentinel, handler })
            }
            Interpolation::Nodes(children) => {
                let token = sentinel_token();
                let needle = format!("{}{}", prefix, token);
                (comment_placeholder(prefix, &token), Prepared::Fragment { needle, children })
            }
            Interpolation::Node(child) => {
                let token = sentinel_token();
                let needle = format!("{}{}", prefix, token);
                let children = vec![child];
                (comment_placeholder(prefix, &token), Prepared::Fragment { needle, children })
            }
            Interpolation::Stylesheet(sheet) => {
                if self.inner.config.log_stylesheets {
                    tracing::debug!("adding style element {}", sheet.node());
                }
                let head = self.head();
                if let Err(err) = self.append_child(head, sheet.node()) {
                    tracing::warn!("could not add style element: {}", err);
                }
                (String::new(), Prepared::Done)
            }
            Interpolation::Raw(text) => (text, Prepared::Done),
        }
    }

    /// Replace the comment marker `needle` with `children`
    fn splice_fragment(&self, live: &LiveNode, needle: &str, children: Vec<Value>) {
        let mut nodes = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Value::Node(id) => nodes.push(id),
                Value::Live(child) => {
                    nodes.push(child.id());
                    live.retain(child);
                }
                other => nodes.push(self.create_text(&other.to_text())),
            }
        }

        let root = live.id();
        let spliced = self.with_dom_mut(|tree| {
            let marker = tree.find_comment(root, needle)?;
            let parent = tree.parent(marker)?;
            for node in nodes {
                if let Err(err) = tree.insert_before(parent, node, Some(marker)) {
                    tracing::warn!("could not splice {} into template: {}", node, err);
                }
            }
            tree.detach(marker);
            Some(())
        });
        if spliced.is_none() {
            tracing::debug!("fragment placeholder {} not found in template", needle);
        }
    }
}

/// Instantiate a template on a runtime.
///
/// `{}` marks an interpolation; `{{` and `}}` are literal braces.
///
/// ```ignore
/// let node = html!(rt, "<p class={}>{}</p>", attribute("class").value("note"), text("body"))?;
/// ```
#[macro_export]
macro_rules! html {
    ($rt:expr, $template:expr $(, $arg:expr)* $(,)?) => {
        $rt.html(
            &$crate::template::segments($template),
            vec![$($crate::Interpolation::from($arg)),*],
        )
    };
}
