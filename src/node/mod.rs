//! Node graph: typed parameters, nodes, networks and the library that owns them.

pub mod library;
pub mod network;
#[allow(clippy::module_inception)]
pub mod node;
pub mod node_type;
pub mod parameter;
pub mod repository;
pub mod value;

pub use library::NodeLibrary;
pub use network::Network;
pub use node::{Node, NodeState};
pub use node_type::{NodeProcessor, NodeType, Processor, StatefulProcessor};
pub use parameter::{Binding, BoundingMethod, Cardinality, Parameter, ParameterType};
pub use repository::NodeRepository;
pub use value::{Value, ValueType};
