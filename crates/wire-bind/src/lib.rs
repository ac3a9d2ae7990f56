//! wire bind - template-to-live-node data binding
//!
//! Parses template markup into live nodes of a [`Runtime`]'s document and
//! exposes named holes in that markup as a [`Data`] object whose reads and
//! writes stay in sync with the DOM.
//!
//! ```ignore
//! use wire_bind::{Runtime, html, hooks::text};
//!
//! let rt = Runtime::default();
//! let greeting = html!(rt, "<div>Hello, {}!</div>", text("name").value("person"))?;
//! greeting.data().set("name", "World");
//! assert_eq!(rt.inner_html(greeting.id()), "Hello, World!");
//! ```

mod config;
mod css;
mod error;
mod extend;
pub mod hooks;
pub mod hydration;
mod lifecycle;
mod live_node;
mod registry;
mod runtime;
pub mod signals;
pub mod template;
mod util;
mod value;

pub use config::Config;
pub use css::Stylesheet;
pub use error::{BindError, HydrationError, TemplateError};
pub use extend::{Extension, Method, Namespace};
pub use hooks::{Builder, ListBinding, Rendered};
pub use lifecycle::{LifecycleObserver, LifecycleTarget};
pub use live_node::LiveNode;
pub use registry::{Accessor, Data};
pub use runtime::Runtime;
pub use template::{BlessContext, Interpolation};
pub use value::{Assignment, Pending, Value};

pub use wire_dom::{Event, NodeId};
