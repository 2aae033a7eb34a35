use std::sync::Arc;

use tracing::warn;

use crate::eval::{NodeContext, NodeEvent, ProcessingContext, RenderOpts};
use crate::expression::{FRAME_VAR, FunctionRepository};
use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::foundation::names::{child_path, split_path};
use crate::node::network::Network;
use crate::node::node::{Node, NodeState};
use crate::node::node_type::{NodeType, Processor};
use crate::node::repository::NodeRepository;
use crate::node::value::Value;

/// A document: the root network node plus the repositories and render options it is
/// evaluated with.
///
/// Nodes are addressed by absolute paths: `/` is the root, `/rect1` a child of the root and
/// `/net1/rect1` a node inside the subnetwork `net1`. Every mutation marks the affected nodes
/// dirty, bubbles up through enclosing network nodes and queues [`NodeEvent`]s.
#[derive(Debug)]
pub struct NodeLibrary {
    name: String,
    root: Node,
    node_repository: NodeRepository,
    function_repository: FunctionRepository,
    opts: RenderOpts,
    events: Vec<NodeEvent>,
}

fn segments(path: &str) -> NodeBoxResult<Vec<String>> {
    Ok(split_path(path)?.into_iter().map(str::to_owned).collect())
}

fn join(segs: &[String]) -> String {
    format!("/{}", segs.join("/"))
}

/// Split a node path into its parent network segments and the node name.
fn split_node(path: &str) -> NodeBoxResult<(Vec<String>, String)> {
    let mut segs = segments(path)?;
    let Some(name) = segs.pop() else {
        return Err(NodeBoxError::not_found(format!(
            "path '{path}' does not name a child node"
        )));
    };
    Ok((segs, name))
}

fn network_at<'a>(root: &'a Node, segs: &[String]) -> NodeBoxResult<&'a Network> {
    let not_network = |p: &str| NodeBoxError::not_found(format!("'{p}' is not a network"));
    let mut net = root.children().ok_or_else(|| not_network("/"))?;
    for seg in segs {
        net = net
            .node(seg)
            .ok_or_else(|| NodeBoxError::not_found(format!("no node named '{seg}'")))?
            .children()
            .ok_or_else(|| not_network(seg))?;
    }
    Ok(net)
}

fn network_at_mut<'a>(root: &'a mut Node, segs: &[String]) -> NodeBoxResult<&'a mut Network> {
    let not_network = |p: &str| NodeBoxError::not_found(format!("'{p}' is not a network"));
    let mut net = root.children_mut().ok_or_else(|| not_network("/"))?;
    for seg in segs {
        net = net
            .node_mut(seg)?
            .children_mut()
            .ok_or_else(|| not_network(seg))?;
    }
    Ok(net)
}

/// Networks (as segment paths) and names of the nodes matching `hit`, depth first.
fn collect_nodes(
    net: &Network,
    segs: &mut Vec<String>,
    hit: &impl Fn(&Node) -> bool,
    out: &mut Vec<(Vec<String>, String)>,
) {
    for node in net.nodes() {
        if hit(node) {
            out.push((segs.clone(), node.name().to_owned()));
        }
        if let Some(children) = node.children() {
            segs.push(node.name().to_owned());
            collect_nodes(children, segs, hit, out);
            segs.pop();
        }
    }
}

/// Stateful processors run their own programs against the context, so any context change
/// reaches them.
fn is_stateful(node: &Node) -> bool {
    matches!(node.node_type().processor, Processor::Stateful(_))
}

impl NodeLibrary {
    pub fn new(
        name: impl Into<String>,
        node_repository: NodeRepository,
        function_repository: FunctionRepository,
    ) -> Self {
        Self {
            name: name.into(),
            root: Node::new_unchecked("root".to_owned(), Arc::new(NodeType::network())),
            node_repository,
            function_repository,
            opts: RenderOpts::default(),
            events: Vec::new(),
        }
    }

    /// Library with the built-in node types and expression functions.
    pub fn with_builtins(name: impl Into<String>) -> Self {
        Self::new(
            name,
            NodeRepository::with_builtins(),
            FunctionRepository::with_builtins(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn node_repository(&self) -> &NodeRepository {
        &self.node_repository
    }

    pub fn function_repository(&self) -> &FunctionRepository {
        &self.function_repository
    }

    pub fn function_repository_mut(&mut self) -> &mut FunctionRepository {
        &mut self.function_repository
    }

    pub fn render_opts(&self) -> &RenderOpts {
        &self.opts
    }

    pub fn frame(&self) -> f64 {
        self.opts.frame
    }

    /// Events queued since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<NodeEvent> {
        std::mem::take(&mut self.events)
    }

    //// Lookup ////

    pub fn node(&self, path: &str) -> NodeBoxResult<&Node> {
        let segs = segments(path)?;
        let Some((name, parent)) = segs.split_last() else {
            return Ok(&self.root);
        };
        network_at(&self.root, parent)?
            .node(name)
            .ok_or_else(|| NodeBoxError::not_found(format!("no node at '{path}'")))
    }

    /// Child network of the network node at `path`.
    pub fn network(&self, path: &str) -> NodeBoxResult<&Network> {
        network_at(&self.root, &segments(path)?)
    }

    //// Mutation ////

    /// Apply `f` to the network at `segs` and propagate the nodes it reports as dirtied.
    fn edit<T>(
        &mut self,
        segs: &[String],
        f: impl FnOnce(&mut Network) -> NodeBoxResult<(T, Vec<String>)>,
    ) -> NodeBoxResult<T> {
        let net = network_at_mut(&mut self.root, segs)?;
        let (out, dirtied) = f(net)?;
        self.propagate(segs, dirtied);
        Ok(out)
    }

    /// Queue dirty events for `dirtied` and mark every enclosing network node dirty.
    fn propagate(&mut self, segs: &[String], dirtied: Vec<String>) {
        let prefix = join(segs);
        for name in dirtied {
            self.events.push(NodeEvent::NodeDirty {
                path: child_path(&prefix, &name),
            });
        }
        for depth in (0..segs.len()).rev() {
            let parent = &segs[..depth];
            let Ok(net) = network_at_mut(&mut self.root, parent) else {
                continue;
            };
            let changed = net.mark_dirty(&segs[depth]);
            let prefix = join(parent);
            for name in changed {
                self.events.push(NodeEvent::NodeDirty {
                    path: child_path(&prefix, &name),
                });
            }
        }
        self.root.state = NodeState::Dirty;
    }

    /// Create a node of type `type_id` inside the network at `network`; returns its name.
    pub fn create_node(&mut self, network: &str, type_id: &str) -> NodeBoxResult<String> {
        let ty = self.node_repository.get(type_id)?;
        self.edit(&segments(network)?, |net| {
            Ok((net.create_node(&ty)?, Vec::new()))
        })
    }

    /// Add a node with an explicit name.
    pub fn add_node(&mut self, network: &str, name: &str, type_id: &str) -> NodeBoxResult<()> {
        let ty = self.node_repository.get(type_id)?;
        let node = Node::new(name, ty)?;
        self.edit(&segments(network)?, |net| {
            net.add(node)?;
            Ok(((), Vec::new()))
        })
    }

    pub fn remove_node(&mut self, path: &str) -> NodeBoxResult<Node> {
        let (segs, name) = split_node(path)?;
        self.edit(&segs, |net| net.remove(&name))
    }

    pub fn set_rendered(&mut self, network: &str, child: Option<&str>) -> NodeBoxResult<()> {
        self.edit(&segments(network)?, |net| {
            net.set_rendered(child)?;
            Ok(((), Vec::new()))
        })
    }

    pub fn set_value(&mut self, path: &str, param: &str, value: Value) -> NodeBoxResult<()> {
        let (segs, name) = split_node(path)?;
        self.edit(&segs, |net| Ok(((), net.set_value(&name, param, value)?)))
    }

    /// Change a value without dirtying anything; used for live previews while dragging.
    pub fn silent_set(&mut self, path: &str, param: &str, value: Value) -> NodeBoxResult<()> {
        let (segs, name) = split_node(path)?;
        network_at_mut(&mut self.root, &segs)?.silent_set(&name, param, value)
    }

    pub fn set_expression(&mut self, path: &str, param: &str, source: &str) -> NodeBoxResult<()> {
        let (segs, name) = split_node(path)?;
        self.edit(&segs, |net| {
            Ok(((), net.set_expression(&name, param, source)?))
        })
    }

    pub fn clear_expression(&mut self, path: &str, param: &str) -> NodeBoxResult<()> {
        let (segs, name) = split_node(path)?;
        self.edit(&segs, |net| Ok(((), net.clear_expression(&name, param)?)))
    }

    /// Connect `upstream` to `downstream.param`, both children of the network at `network`.
    pub fn connect(
        &mut self,
        network: &str,
        upstream: &str,
        downstream: &str,
        param: &str,
    ) -> NodeBoxResult<()> {
        self.edit(&segments(network)?, |net| {
            Ok(((), net.connect(upstream, downstream, param)?))
        })
    }

    pub fn disconnect(
        &mut self,
        network: &str,
        upstream: &str,
        downstream: &str,
        param: &str,
    ) -> NodeBoxResult<()> {
        self.edit(&segments(network)?, |net| {
            Ok(((), net.disconnect(upstream, downstream, param)?))
        })
    }

    pub fn disconnect_node(&mut self, path: &str) -> NodeBoxResult<()> {
        let (segs, name) = split_node(path)?;
        self.edit(&segs, |net| Ok(((), net.disconnect_node(&name)?)))
    }

    //// Time and variables ////

    /// Move to `frame`; only nodes whose expressions read `FRAME` (and their dependents) are
    /// dirtied.
    pub fn set_frame(&mut self, frame: f64) {
        if self.opts.frame == frame {
            return;
        }
        self.opts.frame = frame;
        self.dirty_where(|n| n.has_expression_mentioning(FRAME_VAR) || is_stateful(n));
    }

    /// Replace the render options.
    ///
    /// A frame change behaves like [`NodeLibrary::set_frame`]. Variables can also be read
    /// dynamically through `stamp`, so changing one dirties every node with an expression.
    pub fn set_render_opts(&mut self, opts: RenderOpts) {
        let frame_changed = opts.frame != self.opts.frame;
        let vars_changed = opts.variables != self.opts.variables;
        self.opts = opts;
        if vars_changed {
            self.dirty_where(|n| {
                n.parameters().iter().any(|p| p.expression().is_some()) || is_stateful(n)
            });
        } else if frame_changed {
            self.dirty_where(|n| n.has_expression_mentioning(FRAME_VAR) || is_stateful(n));
        }
    }

    fn dirty_where(&mut self, hit: impl Fn(&Node) -> bool) {
        let mut hits = Vec::new();
        if let Some(net) = self.root.children() {
            collect_nodes(net, &mut Vec::new(), &hit, &mut hits);
        }
        for (segs, name) in hits {
            if let Err(e) = self.edit(&segs, |net| Ok(((), net.mark_dirty(&name)))) {
                warn!(node = %name, error = %e, "could not mark node dirty");
            }
        }
    }

    //// Rendering ////

    /// Render the node at `path`. A list output is flattened into the returned values.
    #[tracing::instrument(skip(self), fields(frame = self.opts.frame))]
    pub fn render_node(&mut self, path: &str) -> NodeBoxResult<Vec<Value>> {
        let segs = segments(path)?;
        let Some((name, parent)) = segs.split_last() else {
            return self.render();
        };
        let ctx = ProcessingContext::new(&self.opts);
        let net = network_at_mut(&mut self.root, parent)?;
        let mut cx = NodeContext::new(&self.function_repository, &ctx).at(join(parent));
        let result = cx.render_child(net, name);
        self.events.extend(cx.take_events());
        Ok(match result? {
            Value::List(items) => items,
            other => vec![other],
        })
    }

    /// Render the rendered child of the root network.
    pub fn render(&mut self) -> NodeBoxResult<Vec<Value>> {
        let rendered = network_at(&self.root, &[])?
            .rendered()
            .map(str::to_owned)
            .ok_or_else(|| NodeBoxError::processing("root", "no node to render"))?;
        self.render_node(&child_path("/", &rendered))
    }
}
