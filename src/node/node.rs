use std::sync::Arc;

use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::foundation::names::validate_node_name;
use crate::node::network::Network;
use crate::node::node_type::NodeType;
use crate::node::parameter::Parameter;
use crate::node::value::Value;

/// Evaluation state of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    #[default]
    Dirty,
    Processing,
    Clean,
    Error,
}

/// Instance of a [`NodeType`] inside a network.
///
/// `clone()` is a deep copy, including the child network of subnetwork nodes.
#[derive(Clone, Debug)]
pub struct Node {
    name: String,
    node_type: Arc<NodeType>,
    parameters: Vec<Parameter>,
    pub(crate) output: Option<Value>,
    pub(crate) state: NodeState,
    pub(crate) messages: Vec<String>,
    pub(crate) children: Option<Network>,
}

impl Node {
    pub fn new(name: impl Into<String>, node_type: Arc<NodeType>) -> NodeBoxResult<Self> {
        let name = name.into();
        validate_node_name(&name)?;
        Ok(Self::new_unchecked(name, node_type))
    }

    /// Root nodes are not subject to sibling naming rules.
    pub(crate) fn new_unchecked(name: String, node_type: Arc<NodeType>) -> Self {
        let parameters = node_type
            .parameters
            .iter()
            .map(|p| Parameter::new(p.clone()))
            .collect();
        let children = node_type.is_network().then(Network::new);
        Self {
            name,
            node_type,
            parameters,
            output: None,
            state: NodeState::Dirty,
            messages: Vec::new(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> &Arc<NodeType> {
        &self.node_type
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    pub(crate) fn parameter_mut(&mut self, name: &str) -> NodeBoxResult<&mut Parameter> {
        let node = &self.name;
        self.parameters
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| {
                NodeBoxError::not_found(format!("node '{node}' has no parameter '{name}'"))
            })
    }

    pub(crate) fn parameters_mut(&mut self) -> &mut [Parameter] {
        &mut self.parameters
    }

    pub fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == NodeState::Dirty
    }

    pub fn has_error(&self) -> bool {
        self.state == NodeState::Error
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_network(&self) -> bool {
        self.children.is_some()
    }

    pub fn children(&self) -> Option<&Network> {
        self.children.as_ref()
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Network> {
        self.children.as_mut()
    }

    /// Whether any parameter expression reads `name`.
    pub fn has_expression_mentioning(&self, name: &str) -> bool {
        self.parameters
            .iter()
            .filter_map(Parameter::expression)
            .any(|e| e.mentions(name))
    }

    /// The error recorded by the last failed processing, if the node is in error.
    pub(crate) fn recorded_error(&self) -> Option<NodeBoxError> {
        (self.state == NodeState::Error).then(|| {
            let message = if self.messages.is_empty() {
                "unknown error".to_owned()
            } else {
                self.messages.join("; ")
            };
            NodeBoxError::processing(self.name.clone(), message)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::parameter::ParameterType;
    use crate::node::value::ValueType;

    fn number_type() -> Arc<NodeType> {
        Arc::new(
            NodeType::pure("number", ValueType::Float, |input, _| {
                Ok(Value::Float(input.float("value")?))
            })
            .param(ParameterType::new("value", ValueType::Float, 0.0)),
        )
    }

    #[test]
    fn new_nodes_start_dirty_with_defaults() {
        let n = Node::new("number1", number_type()).unwrap();
        assert!(n.is_dirty());
        assert!(n.output().is_none());
        assert_eq!(
            n.parameter("value").and_then(|p| p.value()),
            Some(&Value::Float(0.0))
        );
        assert!(!n.is_network());
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert!(matches!(
            Node::new("Number", number_type()),
            Err(NodeBoxError::InvalidName(_))
        ));
    }

    #[test]
    fn clone_is_independent() {
        let mut a = Node::new("number1", number_type()).unwrap();
        let b = a.clone();
        a.parameter_mut("value")
            .unwrap()
            .set_value(Value::Float(5.0))
            .unwrap();
        assert_eq!(
            b.parameter("value").and_then(|p| p.value()),
            Some(&Value::Float(0.0))
        );
    }

    #[test]
    fn network_nodes_own_a_child_network() {
        let n = Node::new("net1", Arc::new(NodeType::network())).unwrap();
        assert!(n.is_network());
        assert!(n.children().is_some_and(|c| c.is_empty()));
    }
}
