use crate::eval::context::{NodeContext, ProcessingContext};
use crate::eval::env::NetworkEnv;
use crate::expression::{AssignmentProgram, FunctionRepository};
use crate::foundation::error::NodeBoxResult;
use crate::node::network::Network;
use crate::node::value::Value;

/// Read-only view of the network around a stateful node.
///
/// Variants are rendered in scratch copies; the live network is never touched.
pub struct UpstreamScope<'a> {
    network: &'a Network,
    node: &'a str,
    prefix: &'a str,
    ctx: &'a ProcessingContext,
    functions: &'a FunctionRepository,
}

impl<'a> UpstreamScope<'a> {
    pub(crate) fn new(
        network: &'a Network,
        node: &'a str,
        prefix: &'a str,
        ctx: &'a ProcessingContext,
        functions: &'a FunctionRepository,
    ) -> Self {
        Self {
            network,
            node,
            prefix,
            ctx,
            functions,
        }
    }

    pub fn node_name(&self) -> &str {
        self.node
    }

    pub fn context(&self) -> &ProcessingContext {
        self.ctx
    }

    /// Name of the first node connected to `param`.
    pub fn upstream(&self, param: &str) -> Option<&str> {
        self.network
            .node(self.node)?
            .parameter(param)?
            .connections()
            .first()
            .map(String::as_str)
    }

    /// Render the node connected to `param` after running `program` on a scratch copy of the
    /// network, with `vars` added to the context. `None` when `param` is not connected.
    pub fn render_variant(
        &self,
        param: &str,
        program: &AssignmentProgram,
        vars: &[(&str, Value)],
    ) -> NodeBoxResult<Option<Value>> {
        let Some(upstream) = self.upstream(param) else {
            return Ok(None);
        };
        let mut ctx = self.ctx.clone();
        for (name, value) in vars {
            ctx.set_variable(*name, value.clone());
        }
        let mut scratch = self.network.clone();
        for a in program.assignments() {
            let value = a
                .value
                .evaluate(&NetworkEnv::new(&scratch, &ctx), self.functions)?;
            scratch.set_value(&a.node, &a.param, value)?;
        }
        let mut cx = NodeContext::scratch(self.functions, &ctx, self.prefix);
        cx.render_child(&mut scratch, upstream).map(Some)
    }
}
