use std::collections::BTreeSet;
use std::sync::Arc;

use crate::expression::Expression;
use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::foundation::names::{name_prefix, validate_node_name};
use crate::node::node::{Node, NodeState};
use crate::node::node_type::NodeType;
use crate::node::parameter::Binding;
use crate::node::value::Value;

/// Ordered set of sibling nodes plus the rendered-child pointer.
///
/// Connections live on the downstream parameter and name upstream siblings, so the graph is
/// owned entirely by this struct. Every mutator that adds an edge checks for cycles first and
/// leaves the network untouched when it would create one.
#[derive(Clone, Debug, Default)]
pub struct Network {
    nodes: Vec<Node>,
    rendered: Option<String>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    pub(crate) fn node_mut(&mut self, name: &str) -> NodeBoxResult<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|n| n.name() == name)
            .ok_or_else(|| NodeBoxError::not_found(format!("no node named '{name}'")))
    }

    fn require(&self, name: &str) -> NodeBoxResult<&Node> {
        self.node(name)
            .ok_or_else(|| NodeBoxError::not_found(format!("no node named '{name}'")))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(Node::name)
    }

    pub fn rendered(&self) -> Option<&str> {
        self.rendered.as_deref()
    }

    //// Structure ////

    /// First free name of the form `prefix1`, `prefix2`, ...
    pub fn unique_name(&self, prefix: &str) -> String {
        (1..)
            .map(|i| format!("{prefix}{i}"))
            .find(|n| !self.contains(n))
            .unwrap_or_else(|| prefix.to_owned())
    }

    /// Add a node; its name must be valid and unused.
    pub fn add(&mut self, node: Node) -> NodeBoxResult<&mut Node> {
        validate_node_name(node.name())?;
        if self.contains(node.name()) {
            return Err(NodeBoxError::invalid_name(format!(
                "a node named '{}' already exists",
                node.name()
            )));
        }
        self.nodes.push(node);
        let last = self.nodes.len() - 1;
        Ok(&mut self.nodes[last])
    }

    /// Create an instance of `node_type` under a fresh name and return that name.
    pub fn create_node(&mut self, node_type: &Arc<NodeType>) -> NodeBoxResult<String> {
        let name = self.unique_name(&name_prefix(&node_type.id));
        self.add(Node::new(name.clone(), node_type.clone())?)?;
        Ok(name)
    }

    /// Remove a node, its incident connections and the rendered pointer if it was rendered.
    ///
    /// Returns the removed node and the names that became dirty.
    pub fn remove(&mut self, name: &str) -> NodeBoxResult<(Node, Vec<String>)> {
        self.require(name)?;
        let dirtied = self.mark_downstream_dirty(name);
        for n in &mut self.nodes {
            for p in n.parameters_mut() {
                p.disconnect(name);
            }
        }
        if self.rendered.as_deref() == Some(name) {
            self.rendered = None;
        }
        let idx = self
            .nodes
            .iter()
            .position(|n| n.name() == name)
            .ok_or_else(|| NodeBoxError::not_found(format!("no node named '{name}'")))?;
        let node = self.nodes.remove(idx);
        let dirtied = dirtied.into_iter().filter(|n| n != name).collect();
        Ok((node, dirtied))
    }

    pub fn set_rendered(&mut self, name: Option<&str>) -> NodeBoxResult<()> {
        if let Some(n) = name {
            self.require(n)?;
        }
        self.rendered = name.map(str::to_owned);
        Ok(())
    }

    //// Dependencies ////

    /// Direct dependencies: connected upstreams and siblings referenced by expressions.
    pub fn upstream_of(&self, name: &str) -> Vec<String> {
        let Some(node) = self.node(name) else {
            return Vec::new();
        };
        let mut out: Vec<String> = Vec::new();
        for p in node.parameters() {
            match p.binding() {
                Binding::Connections(list) => {
                    for u in list {
                        if !out.contains(u) {
                            out.push(u.clone());
                        }
                    }
                }
                Binding::Expression(e) => {
                    for r in e.references() {
                        if r != name && self.contains(r) && !out.contains(r) {
                            out.push(r.clone());
                        }
                    }
                }
                Binding::Value(_) => {}
            }
        }
        out
    }

    /// Direct dependents, in network order.
    pub fn downstream_of(&self, name: &str) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.name() != name && self.upstream_of(n.name()).iter().any(|u| u == name))
            .map(|n| n.name().to_owned())
            .collect()
    }

    /// Whether `from` transitively depends on `target` (or is `target`).
    pub fn depends_on(&self, from: &str, target: &str) -> bool {
        let mut seen = BTreeSet::new();
        let mut stack = vec![from.to_owned()];
        while let Some(n) = stack.pop() {
            if n == target {
                return true;
            }
            if seen.insert(n.clone()) {
                stack.extend(self.upstream_of(&n));
            }
        }
        false
    }

    /// Mark `name` and its downstream closure dirty; returns the nodes whose state changed.
    pub fn mark_dirty(&mut self, name: &str) -> Vec<String> {
        self.mark_downstream_dirty(name)
    }

    fn mark_downstream_dirty(&mut self, name: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut changed = Vec::new();
        let mut stack = vec![name.to_owned()];
        while let Some(n) = stack.pop() {
            if !seen.insert(n.clone()) {
                continue;
            }
            if let Ok(node) = self.node_mut(&n)
                && node.state != NodeState::Dirty
            {
                node.state = NodeState::Dirty;
                changed.push(n.clone());
            }
            let mut next = self.downstream_of(&n);
            next.reverse();
            stack.extend(next);
        }
        changed
    }

    //// Parameters ////

    /// Set a literal value; dirties the node and everything downstream.
    pub fn set_value(&mut self, node: &str, param: &str, value: Value) -> NodeBoxResult<Vec<String>> {
        self.node_mut(node)?.parameter_mut(param)?.set_value(value)?;
        Ok(self.mark_dirty(node))
    }

    /// Set a literal value without dirtying anything (live preview while dragging a handle).
    pub fn silent_set(&mut self, node: &str, param: &str, value: Value) -> NodeBoxResult<()> {
        self.node_mut(node)?.parameter_mut(param)?.set_value(value)
    }

    /// Bind an expression. An empty source reverts the parameter to its default value.
    pub fn set_expression(
        &mut self,
        node: &str,
        param: &str,
        source: &str,
    ) -> NodeBoxResult<Vec<String>> {
        if source.trim().is_empty() {
            return self.clear_expression(node, param);
        }
        self.require(node)?;
        let expr = Expression::parse(source)?;
        for r in expr.references() {
            if self.contains(r) && (r == node || self.depends_on(r, node)) {
                return Err(NodeBoxError::expression(format!(
                    "'{source}' on {node}.{param}: this expression causes a cyclic dependency"
                )));
            }
        }
        self.node_mut(node)?.parameter_mut(param)?.set_expression(expr);
        Ok(self.mark_dirty(node))
    }

    pub fn clear_expression(&mut self, node: &str, param: &str) -> NodeBoxResult<Vec<String>> {
        let p = self.node_mut(node)?.parameter_mut(param)?;
        if p.expression().is_some() {
            p.reset();
        }
        Ok(self.mark_dirty(node))
    }

    /// Connect the output of `upstream` to `downstream.param`.
    ///
    /// Single inputs replace their previous connection; multiple inputs append.
    pub fn connect(
        &mut self,
        upstream: &str,
        downstream: &str,
        param: &str,
    ) -> NodeBoxResult<Vec<String>> {
        let up = self
            .node(upstream)
            .ok_or_else(|| NodeBoxError::connection(format!("no upstream node '{upstream}'")))?;
        let down = self.node(downstream).ok_or_else(|| {
            NodeBoxError::connection(format!("no downstream node '{downstream}'"))
        })?;
        if upstream == downstream {
            return Err(NodeBoxError::connection(format!(
                "cannot connect '{upstream}' to itself"
            )));
        }
        let Some(input) = down.parameter(param) else {
            return Err(NodeBoxError::connection(format!(
                "node '{downstream}' has no parameter '{param}'"
            )));
        };
        let out_ty = up.node_type().output_type;
        let in_ty = input.parameter_type().value_type;
        if !up.is_network() && !out_ty.can_feed(in_ty) {
            return Err(NodeBoxError::connection(format!(
                "cannot connect {out_ty} output of '{upstream}' to {in_ty} parameter {downstream}.{param}"
            )));
        }
        if self.depends_on(upstream, downstream) {
            return Err(NodeBoxError::connection(format!(
                "connecting '{upstream}' to '{downstream}' would create a cycle"
            )));
        }
        self.node_mut(downstream)?
            .parameter_mut(param)?
            .connect(upstream);
        Ok(self.mark_dirty(downstream))
    }

    /// Remove the connection from `upstream` into `downstream.param`.
    pub fn disconnect(
        &mut self,
        upstream: &str,
        downstream: &str,
        param: &str,
    ) -> NodeBoxResult<Vec<String>> {
        let removed = self
            .node_mut(downstream)?
            .parameter_mut(param)?
            .disconnect(upstream);
        if !removed {
            return Err(NodeBoxError::connection(format!(
                "'{upstream}' is not connected to {downstream}.{param}"
            )));
        }
        Ok(self.mark_dirty(downstream))
    }

    /// Remove every connection into or out of `name`.
    pub fn disconnect_node(&mut self, name: &str) -> NodeBoxResult<Vec<String>> {
        self.require(name)?;
        let dirtied = self.mark_dirty(name);
        for n in &mut self.nodes {
            for p in n.parameters_mut() {
                p.disconnect(name);
            }
        }
        for p in self.node_mut(name)?.parameters_mut() {
            if p.is_connected() {
                p.reset();
            }
        }
        Ok(dirtied)
    }
}
