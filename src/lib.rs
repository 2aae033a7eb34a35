#![forbid(unsafe_code)]

pub mod document;
pub mod eval;
pub mod expression;
pub mod foundation;
pub mod graphics;
pub mod node;
pub mod nodes;

pub use document::{Document, NetworkDoc, NodeDoc};
pub use eval::{NodeContext, NodeEvent, NodeInput, ProcessingContext, RenderOpts, UpstreamScope};
pub use expression::{AssignmentProgram, ExprEnv, Expression, Function, FunctionRepository, VarEnv};
pub use foundation::error::{NodeBoxError, NodeBoxResult};
pub use graphics::{Color, Contour, Grob, Group, Path, Point, PointKind, Rect, Transform};
pub use node::{
    Binding, BoundingMethod, Cardinality, Network, Node, NodeLibrary, NodeRepository, NodeState,
    NodeType, Parameter, ParameterType, Processor, Value, ValueType,
};
