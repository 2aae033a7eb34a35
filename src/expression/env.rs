use std::collections::BTreeMap;

use crate::node::value::Value;

/// Name resolution for expressions.
///
/// Lookup order is fixed by the evaluator: context variables, then sibling node outputs
/// (`rect1`), then sibling parameters (`rect1.width`).
pub trait ExprEnv {
    fn variable(&self, name: &str) -> Option<Value>;

    fn node_output(&self, _node: &str) -> Option<Value> {
        None
    }

    fn node_param(&self, _node: &str, _param: &str) -> Option<Value> {
        None
    }
}

/// Environment with context variables only.
#[derive(Clone, Debug, Default)]
pub struct VarEnv {
    vars: BTreeMap<String, Value>,
}

impl VarEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.vars.insert(name.into(), value);
        self
    }
}

impl ExprEnv for VarEnv {
    fn variable(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }
}
