use crate::eval::context::ProcessingContext;
use crate::expression::ExprEnv;
use crate::node::network::Network;
use crate::node::value::Value;

/// Resolves expression names against a network's sibling nodes and the processing context.
pub(crate) struct NetworkEnv<'a> {
    net: &'a Network,
    ctx: &'a ProcessingContext,
}

impl<'a> NetworkEnv<'a> {
    pub(crate) fn new(net: &'a Network, ctx: &'a ProcessingContext) -> Self {
        Self { net, ctx }
    }
}

impl ExprEnv for NetworkEnv<'_> {
    fn variable(&self, name: &str) -> Option<Value> {
        self.ctx.variable(name)
    }

    fn node_output(&self, node: &str) -> Option<Value> {
        self.net.node(node)?.output().cloned()
    }

    fn node_param(&self, node: &str, param: &str) -> Option<Value> {
        Some(self.net.node(node)?.parameter(param)?.effective_value())
    }
}
