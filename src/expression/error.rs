use std::fmt;

use crate::foundation::error::NodeBoxError;

/// Parse/lex failure with the byte offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExprError {
    pub(crate) offset: usize,
    pub(crate) message: String,
}

impl ExprError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expr error at byte {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ExprError {}

impl From<ExprError> for NodeBoxError {
    fn from(e: ExprError) -> Self {
        NodeBoxError::expression(e.to_string())
    }
}

/// Runtime failure while executing a compiled expression.
#[derive(Debug, Clone)]
pub(crate) struct VmError {
    pub(crate) message: String,
}

impl VmError {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vm error: {}", self.message)
    }
}

impl std::error::Error for VmError {}

impl From<VmError> for NodeBoxError {
    fn from(e: VmError) -> Self {
        NodeBoxError::expression(e.message)
    }
}

impl From<NodeBoxError> for VmError {
    fn from(e: NodeBoxError) -> Self {
        VmError::new(e.message())
    }
}
