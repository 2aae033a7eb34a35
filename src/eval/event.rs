/// Change notification, addressed by absolute node path (`/net1/rect1`).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NodeEvent {
    NodeDirty { path: String },
    OutputChanged { path: String },
    NodeError { path: String, message: String },
}

impl NodeEvent {
    pub fn path(&self) -> &str {
        match self {
            NodeEvent::NodeDirty { path }
            | NodeEvent::OutputChanged { path }
            | NodeEvent::NodeError { path, .. } => path,
        }
    }
}
