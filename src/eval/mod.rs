//! Pull-based evaluation of node networks.

pub mod context;
mod env;
pub mod event;
pub mod input;
pub mod scope;

pub use context::{NodeContext, ProcessingContext, RenderOpts};
pub use event::NodeEvent;
pub use input::NodeInput;
pub use scope::UpstreamScope;
