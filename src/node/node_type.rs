use std::fmt;
use std::sync::Arc;

use crate::eval::context::ProcessingContext;
use crate::eval::input::NodeInput;
use crate::eval::scope::UpstreamScope;
use crate::foundation::error::NodeBoxResult;
use crate::node::parameter::ParameterType;
use crate::node::value::{Value, ValueType};

/// Computes a node output from its resolved inputs.
///
/// Inputs are owned clones; a processor cannot reach into upstream nodes.
pub trait NodeProcessor: Send + Sync {
    fn process(&self, input: &NodeInput, ctx: &ProcessingContext) -> NodeBoxResult<Value>;
}

impl<F> NodeProcessor for F
where
    F: Fn(&NodeInput, &ProcessingContext) -> NodeBoxResult<Value> + Send + Sync,
{
    fn process(&self, input: &NodeInput, ctx: &ProcessingContext) -> NodeBoxResult<Value> {
        self(input, ctx)
    }
}

/// Processor that re-renders its upstream under modified parameters, e.g. copy-with-expression.
///
/// It only ever sees scratch copies of the network through [`UpstreamScope`].
pub trait StatefulProcessor: Send + Sync {
    fn process(&self, input: &NodeInput, scope: &mut UpstreamScope<'_>) -> NodeBoxResult<Value>;
}

#[derive(Clone)]
pub enum Processor {
    Pure(Arc<dyn NodeProcessor>),
    Stateful(Arc<dyn StatefulProcessor>),
    /// Output is the rendered child of the node's own network.
    Network,
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Processor::Pure(_) => f.write_str("Pure"),
            Processor::Stateful(_) => f.write_str("Stateful"),
            Processor::Network => f.write_str("Network"),
        }
    }
}

/// Immutable node schema shared by every instance of the type.
#[derive(Clone, Debug)]
pub struct NodeType {
    pub id: String,
    pub description: String,
    pub parameters: Vec<Arc<ParameterType>>,
    pub output_type: ValueType,
    pub processor: Processor,
}

impl NodeType {
    pub fn new(id: impl Into<String>, output_type: ValueType, processor: Processor) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            parameters: Vec::new(),
            output_type,
            processor,
        }
    }

    pub fn pure(
        id: impl Into<String>,
        output_type: ValueType,
        f: impl Fn(&NodeInput, &ProcessingContext) -> NodeBoxResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::new(id, output_type, Processor::Pure(Arc::new(f)))
    }

    pub fn stateful(
        id: impl Into<String>,
        output_type: ValueType,
        p: impl StatefulProcessor + 'static,
    ) -> Self {
        Self::new(id, output_type, Processor::Stateful(Arc::new(p)))
    }

    /// Type of subnetwork nodes. Its output type is `Grob`; rendered values are passed through.
    pub fn network() -> Self {
        Self::new("network", ValueType::Grob, Processor::Network)
            .describe("Container whose output is its rendered child")
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn param(mut self, p: ParameterType) -> Self {
        self.parameters.push(Arc::new(p));
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterType> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.as_ref())
    }

    pub fn is_network(&self) -> bool {
        matches!(self.processor, Processor::Network)
    }
}
