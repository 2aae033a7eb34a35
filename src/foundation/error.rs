pub type NodeBoxResult<T> = Result<T, NodeBoxError>;

#[derive(thiserror::Error, Debug)]
pub enum NodeBoxError {
    #[error("type error: {0}")]
    Type(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("processing error in node '{node}': {message}")]
    Processing { node: String, message: String },

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("cycle error: {0}")]
    Cycle(String),

    #[error("expression error: {0}")]
    Expression(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("document error: {0}")]
    Document(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NodeBoxError {
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn processing(node: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Processing {
            node: node.into(),
            message: msg.into(),
        }
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    pub fn cycle(msg: impl Into<String>) -> Self {
        Self::Cycle(msg.into())
    }

    pub fn expression(msg: impl Into<String>) -> Self {
        Self::Expression(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Self::InvalidName(msg.into())
    }

    pub fn document(msg: impl Into<String>) -> Self {
        Self::Document(msg.into())
    }

    /// Human-readable message without the variant prefix, used for node messages.
    pub fn message(&self) -> String {
        match self {
            Self::Type(m)
            | Self::Connection(m)
            | Self::Geometry(m)
            | Self::Cycle(m)
            | Self::Expression(m)
            | Self::NotFound(m)
            | Self::InvalidName(m)
            | Self::Document(m) => m.clone(),
            Self::Processing { message, .. } => message.clone(),
            Self::Other(e) => e.to_string(),
        }
    }
}

impl From<serde_json::Error> for NodeBoxError {
    fn from(e: serde_json::Error) -> Self {
        Self::Document(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            NodeBoxError::type_error("x")
                .to_string()
                .contains("type error:")
        );
        assert!(
            NodeBoxError::connection("x")
                .to_string()
                .contains("connection error:")
        );
        assert!(
            NodeBoxError::geometry("x")
                .to_string()
                .contains("geometry error:")
        );
        assert!(NodeBoxError::cycle("x").to_string().contains("cycle error:"));
        assert!(
            NodeBoxError::expression("x")
                .to_string()
                .contains("expression error:")
        );
    }

    #[test]
    fn processing_names_the_node() {
        let err = NodeBoxError::processing("rect1", "boom");
        assert_eq!(err.to_string(), "processing error in node 'rect1': boom");
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = NodeBoxError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
