//! JSON documents: a serializable description of a node library.
//!
//! ```json
//! {
//!   "name": "example",
//!   "frame": 1.0,
//!   "root": {
//!     "rendered": "copy1",
//!     "nodes": [
//!       {"name": "rect1", "type": "rect", "values": {"width": 100.0}},
//!       {"name": "copy1", "type": "copy",
//!        "values": {"copies": 5, "ty": 100.0},
//!        "connections": {"shape": ["rect1"]}}
//!     ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use crate::eval::RenderOpts;
use crate::expression::FunctionRepository;
use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::foundation::names::child_path;
use crate::node::library::NodeLibrary;
use crate::node::network::Network;
use crate::node::parameter::Binding;
use crate::node::repository::NodeRepository;
use crate::node::value::Value;

fn default_frame() -> f64 {
    RenderOpts::default().frame
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_frame")]
    pub frame: f64,
    /// Context variables as plain JSON scalars.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, serde_json::Value>,
    pub root: NetworkDoc,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct NetworkDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeDoc>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct NodeDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expressions: BTreeMap<String, String>,
    /// Upstream node names per parameter, in connection order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub connections: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkDoc>,
}

impl Document {
    pub fn from_json_str(s: &str) -> NodeBoxResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_string_pretty(&self) -> NodeBoxResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn scalar(name: &str, json: &serde_json::Value) -> NodeBoxResult<Value> {
    use serde_json::Value as J;
    Ok(match json {
        J::Null => Value::Null,
        J::Bool(b) => Value::Boolean(*b),
        J::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        J::String(s) => Value::String(s.clone()),
        J::Array(_) | J::Object(_) => {
            return Err(NodeBoxError::document(format!(
                "variable '{name}' must be a number, string or boolean"
            )));
        }
    })
}

/// Plain JSON for a literal value: colors become hex strings, points `[x, y]`.
fn to_json(v: &Value) -> NodeBoxResult<serde_json::Value> {
    use serde_json::Value as J;
    Ok(match v {
        Value::Null => J::Null,
        Value::Boolean(b) => J::Bool(*b),
        Value::Int(i) => J::from(*i),
        Value::Float(f) => J::from(*f),
        Value::String(s) => J::String(s.clone()),
        Value::Color(c) => J::String(c.to_hex()),
        Value::Point(p) => serde_json::json!([p.x, p.y]),
        Value::Grob(g) => serde_json::to_value(g)?,
        Value::List(items) => J::Array(items.iter().map(to_json).collect::<NodeBoxResult<_>>()?),
    })
}

fn in_node(path: &str, what: &str, e: NodeBoxError) -> NodeBoxError {
    NodeBoxError::document(format!("{path}: {what}: {e}"))
}

fn load_network(lib: &mut NodeLibrary, path: &str, doc: &NetworkDoc) -> NodeBoxResult<()> {
    for n in &doc.nodes {
        lib.add_node(path, &n.name, &n.type_id)
            .map_err(|e| in_node(&child_path(path, &n.name), "cannot create node", e))?;
        if let Some(sub) = &n.network {
            load_network(lib, &child_path(path, &n.name), sub)?;
        }
    }
    for n in &doc.nodes {
        let node_path = child_path(path, &n.name);
        for (param, json) in &n.values {
            let ty = lib
                .node(&node_path)?
                .parameter(param)
                .map(|p| p.parameter_type().value_type)
                .ok_or_else(|| {
                    NodeBoxError::document(format!("{node_path}: no parameter '{param}'"))
                })?;
            Value::from_json(json, ty)
                .and_then(|v| lib.set_value(&node_path, param, v))
                .map_err(|e| in_node(&node_path, param, e))?;
        }
    }
    for n in &doc.nodes {
        let node_path = child_path(path, &n.name);
        for (param, source) in &n.expressions {
            lib.set_expression(&node_path, param, source)
                .map_err(|e| in_node(&node_path, param, e))?;
        }
    }
    for n in &doc.nodes {
        for (param, upstreams) in &n.connections {
            for upstream in upstreams {
                lib.connect(path, upstream, &n.name, param)
                    .map_err(|e| in_node(&child_path(path, &n.name), param, e))?;
            }
        }
    }
    lib.set_rendered(path, doc.rendered.as_deref())
        .map_err(|e| in_node(path, "rendered", e))
}

fn save_network(net: &Network) -> NodeBoxResult<NetworkDoc> {
    let mut nodes = Vec::with_capacity(net.len());
    for node in net.nodes() {
        let mut doc = NodeDoc {
            name: node.name().to_owned(),
            type_id: node.node_type().id.clone(),
            values: BTreeMap::new(),
            expressions: BTreeMap::new(),
            connections: BTreeMap::new(),
            network: node.children().map(save_network).transpose()?,
        };
        for p in node.parameters() {
            let name = p.name().to_owned();
            match p.binding() {
                Binding::Value(v) if *v != p.parameter_type().default => {
                    doc.values.insert(name, to_json(v)?);
                }
                Binding::Value(_) => {}
                Binding::Expression(e) => {
                    doc.expressions.insert(name, e.source().to_owned());
                }
                Binding::Connections(list) => {
                    doc.connections.insert(name, list.clone());
                }
            }
        }
        nodes.push(doc);
    }
    Ok(NetworkDoc {
        rendered: net.rendered().map(str::to_owned),
        nodes,
    })
}

impl NodeLibrary {
    /// Build a library with the built-in repositories from `doc`.
    pub fn from_document(doc: &Document) -> NodeBoxResult<Self> {
        Self::from_document_with(
            doc,
            NodeRepository::with_builtins(),
            FunctionRepository::with_builtins(),
        )
    }

    /// Values are applied first, then expressions, connections and rendered children.
    #[tracing::instrument(skip_all, fields(name = %doc.name))]
    pub fn from_document_with(
        doc: &Document,
        nodes: NodeRepository,
        functions: FunctionRepository,
    ) -> NodeBoxResult<Self> {
        let mut lib = NodeLibrary::new(doc.name.clone(), nodes, functions);
        let variables = doc
            .variables
            .iter()
            .map(|(k, v)| Ok((k.clone(), scalar(k, v)?)))
            .collect::<NodeBoxResult<_>>()?;
        lib.set_render_opts(RenderOpts {
            frame: doc.frame,
            variables,
        });
        load_network(&mut lib, "/", &doc.root)?;
        lib.drain_events();
        Ok(lib)
    }

    pub fn to_document(&self) -> NodeBoxResult<Document> {
        let root = match self.root().children() {
            Some(net) => save_network(net)?,
            None => NetworkDoc::default(),
        };
        let variables = self
            .render_opts()
            .variables
            .iter()
            .map(|(k, v)| Ok((k.clone(), to_json(v)?)))
            .collect::<NodeBoxResult<_>>()?;
        Ok(Document {
            name: self.name().to_owned(),
            frame: self.frame(),
            variables,
            root,
        })
    }
}
