//! Extension merger
//!
//! Callers attach extra capabilities to a live node as a typed
//! [`Namespace`]: methods, nested namespaces and plain values. Merging
//! recurses where both sides hold a namespace and overwrites otherwise.

use crate::{LiveNode, Value};
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Extension method; receives the live node it was attached to
pub type Method = Rc<dyn Fn(&LiveNode, &[Value]) -> Value>;

/// One entry of a namespace
#[derive(Clone)]
pub enum Extension {
    Method(Method),
    Namespace(Namespace),
    Value(Value),
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extension::Method(_) => f.write_str("Method"),
            Extension::Namespace(ns) => ns.fmt(f),
            Extension::Value(v) => v.fmt(f),
        }
    }
}

/// Ordered set of named extensions
#[derive(Clone, Default)]
pub struct Namespace {
    entries: IndexMap<String, Extension>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a method
    pub fn method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&LiveNode, &[Value]) -> Value + 'static,
    {
        self.entries.insert(name.to_string(), Extension::Method(Rc::new(f)));
        self
    }

    /// Add a nested namespace
    pub fn namespace(mut self, name: &str, ns: Namespace) -> Self {
        self.entries.insert(name.to_string(), Extension::Namespace(ns));
        self
    }

    /// Add a plain value
    pub fn value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.entries.insert(name.to_string(), Extension::Value(value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Extension> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Extension)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn insert(&mut self, name: &str, extension: Extension) {
        self.entries.insert(name.to_string(), extension);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Extension> {
        self.entries.shift_remove(name)
    }

    /// Resolve a dotted path (`"a.b.c"`)
    pub fn lookup(&self, path: &str) -> Option<Extension> {
        let mut segments = path.split('.');
        let mut current = self.entries.get(segments.next()?)?;
        for segment in segments {
            match current {
                Extension::Namespace(ns) => current = ns.entries.get(segment)?,
                _ => return None,
            }
        }
        Some(current.clone())
    }

    /// Merge `incoming` into `self`
    pub fn merge(&mut self, incoming: Namespace) {
        for (name, extension) in incoming.entries {
            let extension = match (self.entries.get_mut(&name), extension) {
                (Some(Extension::Namespace(existing)), Extension::Namespace(nested)) => {
                    existing.merge(nested);
                    continue;
                }
                (_, extension) => extension,
            };
            self.entries.insert(name, extension);
        }
    }
}

impl IntoIterator for Namespace {
    type Item = (String, Extension);
    type IntoIter = indexmap::map::IntoIter<String, Extension>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}
