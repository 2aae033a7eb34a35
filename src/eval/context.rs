use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::eval::env::NetworkEnv;
use crate::eval::event::NodeEvent;
use crate::eval::input::NodeInput;
use crate::eval::scope::UpstreamScope;
use crate::expression::{ExprEnv, FRAME_VAR, FunctionRepository};
use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::foundation::names::child_path;
use crate::node::network::Network;
use crate::node::node::{Node, NodeState};
use crate::node::node_type::Processor;
use crate::node::parameter::{Binding, Cardinality, ParameterType};
use crate::node::value::{Value, ValueType};

/// Options for a render pass.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderOpts {
    pub frame: f64,
    /// Extra context variables visible to every expression.
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            frame: 1.0,
            variables: BTreeMap::new(),
        }
    }
}

/// Context variables for one render pass (`FRAME` plus user and copy variables).
#[derive(Clone, Debug, Default)]
pub struct ProcessingContext {
    frame: f64,
    variables: BTreeMap<String, Value>,
}

impl ProcessingContext {
    pub fn new(opts: &RenderOpts) -> Self {
        Self {
            frame: opts.frame,
            variables: opts.variables.clone(),
        }
    }

    pub fn frame(&self) -> f64 {
        self.frame
    }

    pub fn variable(&self, name: &str) -> Option<Value> {
        if name == FRAME_VAR {
            return Some(Value::Float(self.frame));
        }
        self.variables.get(name).cloned()
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }
}

impl ExprEnv for ProcessingContext {
    fn variable(&self, name: &str) -> Option<Value> {
        ProcessingContext::variable(self, name)
    }
}

/// Pull-based evaluator for the nodes of one network.
///
/// `update` brings a node and its dependencies up to date; clean nodes are never reprocessed
/// and failed nodes keep returning their recorded error until something marks them dirty.
pub struct NodeContext<'a> {
    functions: &'a FunctionRepository,
    ctx: &'a ProcessingContext,
    /// Absolute path of the network being evaluated.
    prefix: String,
    events: Vec<NodeEvent>,
    record_events: bool,
}

impl<'a> NodeContext<'a> {
    pub fn new(functions: &'a FunctionRepository, ctx: &'a ProcessingContext) -> Self {
        Self {
            functions,
            ctx,
            prefix: "/".to_owned(),
            events: Vec::new(),
            record_events: true,
        }
    }

    /// Evaluate the nodes of the network at `prefix` instead of the root network.
    pub fn at(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Context for throwaway network copies; emits no events.
    pub(crate) fn scratch(
        functions: &'a FunctionRepository,
        ctx: &'a ProcessingContext,
        prefix: &str,
    ) -> Self {
        Self {
            record_events: false,
            ..Self::new(functions, ctx).at(prefix)
        }
    }

    pub fn take_events(&mut self) -> Vec<NodeEvent> {
        std::mem::take(&mut self.events)
    }

    fn path(&self, name: &str) -> String {
        child_path(&self.prefix, name)
    }

    fn emit(&mut self, event: NodeEvent) {
        if self.record_events {
            self.events.push(event);
        }
    }

    /// Update `name` and return a clone of its output (`Null` when it produced nothing).
    #[tracing::instrument(level = "debug", skip(self, net))]
    pub fn render_child(&mut self, net: &mut Network, name: &str) -> NodeBoxResult<Value> {
        self.update(net, name)?;
        Ok(net.node(name).and_then(Node::output).cloned().unwrap_or_default())
    }

    pub fn update(&mut self, net: &mut Network, name: &str) -> NodeBoxResult<()> {
        let node = net.node_mut(name)?;
        match node.state {
            NodeState::Clean => return Ok(()),
            NodeState::Error => {
                return Err(node
                    .recorded_error()
                    .unwrap_or_else(|| NodeBoxError::processing(name, "unknown error")));
            }
            NodeState::Processing => {
                return Err(NodeBoxError::cycle(format!(
                    "node '{}' depends on itself",
                    self.path(name)
                )));
            }
            NodeState::Dirty => node.state = NodeState::Processing,
        }

        // Every dependency is attempted so independent branches still settle.
        let mut failed = None;
        for dep in net.upstream_of(name) {
            if let Err(e) = self.update(net, &dep)
                && failed.is_none()
            {
                failed = Some((dep, e));
            }
        }

        let result = match failed {
            Some((_, e @ NodeBoxError::Cycle(_))) => Err(e),
            Some((dep, _)) => Err(NodeBoxError::processing(
                name,
                format!("depends on node '{dep}' which has an error"),
            )),
            None => self.process(net, name),
        };
        match result {
            Ok(output) => {
                self.finish(net, name, output);
                Ok(())
            }
            Err(e) => Err(self.fail(net, name, e)),
        }
    }

    fn process(&mut self, net: &mut Network, name: &str) -> NodeBoxResult<Value> {
        let input = self.resolve_inputs(net, name)?;
        let node_type = net.node_mut(name)?.node_type().clone();
        let output = match &node_type.processor {
            Processor::Pure(p) => p.process(&input, self.ctx)?,
            Processor::Stateful(p) => {
                let mut scope = UpstreamScope::new(net, name, &self.prefix, self.ctx, self.functions);
                p.process(&input, &mut scope)?
            }
            Processor::Network => return self.render_subnetwork(net, name),
        };
        coerce_output(output, node_type.output_type)
    }

    fn resolve_inputs(&self, net: &mut Network, name: &str) -> NodeBoxResult<NodeInput> {
        let node = net
            .node(name)
            .ok_or_else(|| NodeBoxError::not_found(format!("no node named '{name}'")))?;
        let env = NetworkEnv::new(net, self.ctx);
        let mut input = NodeInput::new(name);
        let mut resolved = Vec::with_capacity(node.parameters().len());
        for p in node.parameters() {
            let ty = p.type_arc();
            let value = match p.binding() {
                Binding::Value(v) => v.clone(),
                Binding::Expression(e) => ty.validate(e.evaluate(&env, self.functions)?)?,
                Binding::Connections(upstreams) => connected_value(net, ty, upstreams)?,
            };
            if value.is_null() && !ty.nullable {
                return Err(NodeBoxError::type_error(format!(
                    "parameter '{}' requires a value",
                    ty.name
                )));
            }
            resolved.push(value.clone());
            input.push(ty.clone(), value, p.is_connected());
        }
        let node = net.node_mut(name)?;
        for (p, v) in node.parameters_mut().iter_mut().zip(resolved) {
            p.set_resolved(v);
        }
        Ok(input)
    }

    fn render_subnetwork(&mut self, net: &mut Network, name: &str) -> NodeBoxResult<Value> {
        let Some(mut children) = net.node_mut(name)?.children.take() else {
            return Err(NodeBoxError::processing(name, "node has no child network"));
        };
        let inner = self.path(name);
        let outer = std::mem::replace(&mut self.prefix, inner);
        let result = match children.rendered().map(str::to_owned) {
            Some(child) => self.render_child(&mut children, &child),
            None => Err(NodeBoxError::processing(
                name,
                "network has no rendered child",
            )),
        };
        self.prefix = outer;
        if let Ok(node) = net.node_mut(name) {
            node.children = Some(children);
        }
        result
    }

    fn finish(&mut self, net: &mut Network, name: &str, output: Value) {
        let path = self.path(name);
        if let Ok(node) = net.node_mut(name) {
            node.state = NodeState::Clean;
            node.output = Some(output);
            node.messages.clear();
        }
        debug!(node = %path, "processed");
        self.emit(NodeEvent::OutputChanged { path });
    }

    /// Record `err` on the node and return the error callers should see.
    fn fail(&mut self, net: &mut Network, name: &str, err: NodeBoxError) -> NodeBoxError {
        let path = self.path(name);
        let message = match &err {
            NodeBoxError::Processing { node, message } if node == name => message.clone(),
            other => other.to_string(),
        };
        warn!(node = %path, error = %message, "processing failed");
        self.emit(NodeEvent::NodeError {
            path,
            message: message.clone(),
        });
        let Ok(node) = net.node_mut(name) else {
            return err;
        };
        node.state = NodeState::Error;
        node.messages = vec![message];
        match err {
            NodeBoxError::Cycle(_) => err,
            _ => node.recorded_error().unwrap_or(err),
        }
    }
}

fn connected_value(net: &Network, ty: &ParameterType, upstreams: &[String]) -> NodeBoxResult<Value> {
    let output = |u: &String| {
        net.node(u)
            .and_then(Node::output)
            .cloned()
            .unwrap_or_default()
    };
    // Connected values obey the same type and hard bounds as literals.
    let validate = |v: Value| if v.is_null() { Ok(v) } else { ty.validate(v) };
    match ty.cardinality {
        Cardinality::Single => validate(upstreams.first().map(output).unwrap_or_default()),
        Cardinality::Multiple => {
            let mut items = Vec::new();
            for u in upstreams {
                for item in output(u).into_items() {
                    items.push(validate(item)?);
                }
            }
            Ok(Value::List(items))
        }
    }
}

/// Lists are coerced element-wise so multi-valued outputs stay lists.
fn coerce_output(v: Value, ty: ValueType) -> NodeBoxResult<Value> {
    match v {
        Value::List(items) => items
            .into_iter()
            .map(|item| item.coerce(ty))
            .collect::<NodeBoxResult<Vec<_>>>()
            .map(Value::List),
        other => other.coerce(ty),
    }
}
