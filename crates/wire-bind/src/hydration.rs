//! Hydration boundary
//!
//! A rendered tree carries its `data` as JSON in the configured hydration
//! attribute. A fresh live node built elsewhere picks that record up and
//! takes the rendered node's place in the document.

use crate::{Data, HydrationError, LiveNode, Runtime, Value};
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};
use std::future::Future;
use std::pin::Pin;
use wire_dom::NodeId;

/// Largest magnitude below which every integer is exact in an `f64`
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

type Record = IndexMap<String, Value>;
type BoxedBuild = Box<dyn FnOnce(Record) -> LiveNode>;
type BoxedAsyncBuild = Box<dyn FnOnce(Record) -> Pin<Box<dyn Future<Output = LiveNode>>>>;

/// Serialize the `data` tree of `node`.
///
/// Nested live nodes and plain elements become `{"data": {..}}`; `Null`
/// properties are left out.
pub fn dehydrated(node: &LiveNode) -> Result<Json, HydrationError> {
    let mut visiting = Vec::new();
    data_to_json(node.runtime(), &node.data(), node.id(), &mut visiting)
}

/// Write the serialized `data` tree into the hydration attribute of `node`.
///
/// Data that cannot be serialized is logged and the attribute is left off.
pub fn dehydrate(node: &LiveNode) {
    let rt = node.runtime();
    let serialized = dehydrated(node).and_then(|json| Ok(serde_json::to_string(&json)?));
    let json = match serialized {
        Ok(json) => json,
        Err(err) => {
            tracing::error!("data for node {} could not be serialized: {}", node.id(), err);
            return;
        }
    };

    let attribute = &rt.config().hydration_attribute;
    let id = node.id();
    if let Err(err) = rt.with_dom_mut(|tree| tree.set_attribute(id, attribute, &json)) {
        tracing::error!("could not write {} on node {}: {}", attribute, id, err);
    }
}

fn data_to_json(
    rt: &Runtime,
    data: &Data,
    owner: NodeId,
    visiting: &mut Vec<NodeId>,
) -> Result<Json, HydrationError> {
    if visiting.contains(&owner) {
        return Err(HydrationError::Circular(owner));
    }
    visiting.push(owner);
    let mut object = Map::new();
    for (name, value) in data.entries() {
        if let Some(json) = value_to_json(rt, &value, visiting)? {
            object.insert(name, json);
        }
    }
    visiting.pop();
    Ok(Json::Object(object))
}

fn nested_to_json(
    rt: &Runtime,
    data: Option<Data>,
    node: NodeId,
    visiting: &mut Vec<NodeId>,
) -> Result<Json, HydrationError> {
    let inner = match data {
        Some(data) => data_to_json(rt, &data, node, visiting)?,
        None => Json::Object(Map::new()),
    };
    let mut object = Map::new();
    object.insert("data".to_string(), inner);
    Ok(Json::Object(object))
}

fn number_to_json(n: f64) -> Result<Json, HydrationError> {
    if !n.is_finite() {
        return Err(HydrationError::NonFinite(n));
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Ok(Json::from(n as i64));
    }
    serde_json::Number::from_f64(n)
        .map(Json::Number)
        .ok_or(HydrationError::NonFinite(n))
}

/// `None` for values JSON leaves out
fn value_to_json(rt: &Runtime, value: &Value, visiting: &mut Vec<NodeId>) -> Result<Option<Json>, HydrationError> {
    let json = match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => number_to_json(*n)?,
        Value::String(s) => Json::String(s.clone()),
        Value::Node(id) => nested_to_json(rt, rt.data_of(*id), *id, visiting)?,
        Value::Live(live) => nested_to_json(rt, Some(live.data()), live.id(), visiting)?,
        Value::List(items) => {
            let mut array = Vec::with_capacity(items.len());
            for item in items {
                array.push(value_to_json(rt, item, visiting)?.unwrap_or(Json::Null));
            }
            Json::Array(array)
        }
        Value::Record(fields) => {
            let mut object = Map::new();
            for (name, field) in fields {
                if let Some(json) = value_to_json(rt, field, visiting)? {
                    object.insert(name.clone(), json);
                }
            }
            Json::Object(object)
        }
    };
    Ok(Some(json))
}

pub fn json_to_value(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => n.as_f64().map(Value::Number).unwrap_or_default(),
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::List(items.into_iter().map(json_to_value).collect()),
        Json::Object(fields) => Value::Record(
            fields
                .into_iter()
                .map(|(name, field)| (name, json_to_value(field)))
                .collect(),
        ),
    }
}

/// Record serialized on `node`; empty when the attribute is missing or
/// does not hold a JSON object
pub fn data_from(rt: &Runtime, node: impl Into<NodeId>) -> Record {
    let node = node.into();
    let Some(raw) = rt.get_attribute(node, &rt.config().hydration_attribute) else {
        return Record::new();
    };
    match serde_json::from_str::<Json>(&raw) {
        Ok(Json::Object(fields)) => fields
            .into_iter()
            .map(|(name, field)| (name, json_to_value(field)))
            .collect(),
        Ok(other) => {
            tracing::warn!("hydration data on {} is not an object: {}", node, other);
            Record::new()
        }
        Err(err) => {
            tracing::warn!("hydration data on {} could not be parsed: {}", node, err);
            Record::new()
        }
    }
}

/// Rendered node to hydrate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationTarget {
    Node(NodeId),
    /// Looked up with `getElementById` semantics
    ElementId(String),
}

impl From<NodeId> for HydrationTarget {
    fn from(node: NodeId) -> Self {
        HydrationTarget::Node(node)
    }
}

impl From<&LiveNode> for HydrationTarget {
    fn from(node: &LiveNode) -> Self {
        HydrationTarget::Node(node.id())
    }
}

impl From<&str> for HydrationTarget {
    fn from(id: &str) -> Self {
        HydrationTarget::ElementId(id.to_string())
    }
}

impl From<String> for HydrationTarget {
    fn from(id: String) -> Self {
        HydrationTarget::ElementId(id)
    }
}

/// Live node taking the rendered node's place
pub enum Replacement {
    Live(LiveNode),
    /// Built from the hydration record
    Build(BoxedBuild),
    /// Built asynchronously from the hydration record
    Async(BoxedAsyncBuild),
}

impl Replacement {
    pub fn build(f: impl FnOnce(Record) -> LiveNode + 'static) -> Self {
        Replacement::Build(Box::new(f))
    }

    pub fn build_async<F, Fut>(f: F) -> Self
    where
        F: FnOnce(Record) -> Fut + 'static,
        Fut: Future<Output = LiveNode> + 'static,
    {
        Replacement::Async(Box::new(move |record| Box::pin(f(record))))
    }
}

impl From<LiveNode> for Replacement {
    fn from(node: LiveNode) -> Self {
        Replacement::Live(node)
    }
}

impl From<&LiveNode> for Replacement {
    fn from(node: &LiveNode) -> Self {
        Replacement::Live(node.clone())
    }
}

/// Outcome of [`hydrate`]
pub enum Hydration {
    Ready(LiveNode),
    /// Completes on a later turn of the event loop; dropping the task
    /// cancels the hydration
    Pending(smol::Task<LiveNode>),
}

impl Hydration {
    /// Live node, once an asynchronous replacement has been built
    pub async fn finish(self) -> LiveNode {
        match self {
            Hydration::Ready(node) => node,
            Hydration::Pending(task) => task.await,
        }
    }
}

/// Give `replacement` the data serialized on the rendered node and put it
/// in that node's place
pub fn hydrate(
    rt: &Runtime,
    target: impl Into<HydrationTarget>,
    replacement: impl Into<Replacement>,
) -> Result<Hydration, HydrationError> {
    let rendered = match target.into() {
        HydrationTarget::Node(node) => node,
        HydrationTarget::ElementId(id) => rt
            .get_element_by_id(&id)
            .ok_or(HydrationError::NotFound(id))?,
    };
    let record = data_from(rt, rendered);

    match replacement.into() {
        Replacement::Live(node) => {
            swap_in(rt, rendered, &node, record);
            Ok(Hydration::Ready(node))
        }
        Replacement::Build(build) => {
            let node = build(record.clone());
            swap_in(rt, rendered, &node, record);
            Ok(Hydration::Ready(node))
        }
        Replacement::Async(build) => {
            let future = build(record.clone());
            let runtime = rt.clone();
            let task = rt.spawn(async move {
                let node = future.await;
                swap_in(&runtime, rendered, &node, record);
                node
            });
            Ok(Hydration::Pending(task))
        }
    }
}

fn swap_in(rt: &Runtime, rendered: NodeId, node: &LiveNode, record: Record) {
    node.data().assign(record);
    let id = node.id();
    let swapped = rt.with_dom_mut(|tree| match tree.parent(rendered) {
        Some(_) => tree.replace_node(rendered, id).map(|_| ()),
        None => Ok(()),
    });
    if let Err(err) = swapped {
        tracing::warn!("could not replace rendered node {}: {}", rendered, err);
    }
}
