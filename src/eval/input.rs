use std::sync::Arc;

use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::graphics::{Color, Grob, Point};
use crate::node::parameter::ParameterType;
use crate::node::value::Value;

#[derive(Clone, Debug)]
struct Slot {
    ty: Arc<ParameterType>,
    value: Value,
    connected: bool,
}

/// Resolved parameter values handed to a processor.
///
/// Values are owned clones, already coerced to their declared types.
#[derive(Clone, Debug)]
pub struct NodeInput {
    node: String,
    slots: Vec<Slot>,
}

impl NodeInput {
    pub(crate) fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            slots: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, ty: Arc<ParameterType>, value: Value, connected: bool) {
        self.slots.push(Slot {
            ty,
            value,
            connected,
        });
    }

    /// Name of the node being processed.
    pub fn node(&self) -> &str {
        &self.node
    }

    fn slot(&self, name: &str) -> NodeBoxResult<&Slot> {
        self.slots.iter().find(|s| s.ty.name == name).ok_or_else(|| {
            NodeBoxError::not_found(format!(
                "node '{}' has no parameter '{name}'",
                self.node
            ))
        })
    }

    fn mismatch(&self, name: &str, want: &str, got: &Value) -> NodeBoxError {
        NodeBoxError::type_error(format!(
            "{}.{name}: expected {want}, got {}",
            self.node,
            got.type_name()
        ))
    }

    pub fn value(&self, name: &str) -> NodeBoxResult<&Value> {
        Ok(&self.slot(name)?.value)
    }

    pub fn is_connected(&self, name: &str) -> bool {
        self.slot(name).is_ok_and(|s| s.connected)
    }

    pub fn float(&self, name: &str) -> NodeBoxResult<f64> {
        let v = self.value(name)?;
        v.as_f64().ok_or_else(|| self.mismatch(name, "a number", v))
    }

    pub fn int(&self, name: &str) -> NodeBoxResult<i64> {
        match self.value(name)? {
            Value::Int(i) => Ok(*i),
            Value::Boolean(b) => Ok(i64::from(*b)),
            other => Err(self.mismatch(name, "an int", other)),
        }
    }

    pub fn boolean(&self, name: &str) -> NodeBoxResult<bool> {
        match self.value(name)? {
            Value::Boolean(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            other => Err(self.mismatch(name, "a boolean", other)),
        }
    }

    pub fn string(&self, name: &str) -> NodeBoxResult<&str> {
        match self.value(name)? {
            Value::String(s) => Ok(s),
            other => Err(self.mismatch(name, "a string", other)),
        }
    }

    /// `None` when a nullable color parameter is null.
    pub fn color(&self, name: &str) -> NodeBoxResult<Option<Color>> {
        match self.value(name)? {
            Value::Color(c) => Ok(Some(*c)),
            Value::Null => Ok(None),
            other => Err(self.mismatch(name, "a color", other)),
        }
    }

    pub fn point(&self, name: &str) -> NodeBoxResult<Point> {
        match self.value(name)? {
            Value::Point(p) => Ok(*p),
            other => Err(self.mismatch(name, "a point", other)),
        }
    }

    pub fn grob_opt(&self, name: &str) -> NodeBoxResult<Option<&Grob>> {
        match self.value(name)? {
            Value::Grob(g) => Ok(Some(g)),
            Value::Null => Ok(None),
            other => Err(self.mismatch(name, "a shape", other)),
        }
    }

    pub fn grob(&self, name: &str) -> NodeBoxResult<&Grob> {
        self.grob_opt(name)?.ok_or_else(|| {
            NodeBoxError::type_error(format!("{}.{name}: no shape", self.node))
        })
    }

    /// All shapes of a parameter; lists from multiple-cardinality inputs are flattened.
    pub fn grobs(&self, name: &str) -> NodeBoxResult<Vec<&Grob>> {
        let v = self.value(name)?;
        let items: Vec<&Value> = match v {
            Value::List(items) => items.iter().collect(),
            Value::Null => Vec::new(),
            other => vec![other],
        };
        items
            .into_iter()
            .filter(|v| !v.is_null())
            .map(|v| v.as_grob().ok_or_else(|| self.mismatch(name, "a shape", v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Path;
    use crate::node::value::ValueType;

    fn input() -> NodeInput {
        let mut input = NodeInput::new("copy1");
        input.push(
            Arc::new(ParameterType::new("copies", ValueType::Int, 1_i64)),
            Value::Int(3),
            false,
        );
        input.push(
            Arc::new(ParameterType::new("shapes", ValueType::Grob, Value::Null).multiple()),
            Value::List(vec![Value::from(Path::new()), Value::Null, Value::from(Path::new())]),
            true,
        );
        input
    }

    #[test]
    fn typed_accessors() {
        let input = input();
        assert_eq!(input.int("copies").unwrap(), 3);
        assert_eq!(input.float("copies").unwrap(), 3.0);
        assert!(input.string("copies").is_err());
        assert!(matches!(input.float("nope"), Err(NodeBoxError::NotFound(_))));
    }

    #[test]
    fn grobs_flatten_lists_and_skip_nulls() {
        let input = input();
        assert_eq!(input.grobs("shapes").unwrap().len(), 2);
        assert!(input.is_connected("shapes"));
        assert!(!input.is_connected("copies"));
    }
}
