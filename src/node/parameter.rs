use std::sync::Arc;

use crate::expression::Expression;
use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::node::value::{Value, ValueType};

/// How many upstream connections an input accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[default]
    Single,
    Multiple,
}

/// What happens when a value falls outside `[min, max]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundingMethod {
    /// Bounds are informational only.
    #[default]
    None,
    /// Bounds are a UI hint; out-of-range values are accepted.
    Soft,
    /// Out-of-range values are rejected.
    Hard,
}

/// Immutable schema of one parameter slot.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ParameterType {
    pub name: String,
    pub label: String,
    pub value_type: ValueType,
    pub default: Value,
    pub cardinality: Cardinality,
    pub nullable: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub bounding: BoundingMethod,
}

fn label_for(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, word) in name.split('_').filter(|w| !w.is_empty()).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

impl ParameterType {
    pub fn new(name: impl Into<String>, value_type: ValueType, default: impl Into<Value>) -> Self {
        let name = name.into();
        Self {
            label: label_for(&name),
            name,
            value_type,
            default: default.into(),
            cardinality: Cardinality::Single,
            nullable: false,
            min: None,
            max: None,
            bounding: BoundingMethod::None,
        }
    }

    pub fn multiple(mut self) -> Self {
        self.cardinality = Cardinality::Multiple;
        self.nullable = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn bounded(mut self, min: Option<f64>, max: Option<f64>, method: BoundingMethod) -> Self {
        self.min = min;
        self.max = max;
        self.bounding = method;
        self
    }

    /// Coerce `value` to the declared type and enforce nullability and hard bounds.
    pub fn validate(&self, value: Value) -> NodeBoxResult<Value> {
        let v = value.coerce(self.value_type).map_err(|e| {
            NodeBoxError::type_error(format!("parameter '{}': {}", self.name, e.message()))
        })?;
        if v.is_null() && !self.nullable {
            return Err(NodeBoxError::type_error(format!(
                "parameter '{}' does not accept null",
                self.name
            )));
        }
        if self.bounding == BoundingMethod::Hard
            && let Some(x) = v.as_f64()
        {
            if let Some(min) = self.min
                && x < min
            {
                return Err(NodeBoxError::type_error(format!(
                    "parameter '{}': {x} is below the minimum {min}",
                    self.name
                )));
            }
            if let Some(max) = self.max
                && x > max
            {
                return Err(NodeBoxError::type_error(format!(
                    "parameter '{}': {x} is above the maximum {max}",
                    self.name
                )));
            }
        }
        Ok(v)
    }
}

/// The single source a parameter draws its value from.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    Value(Value),
    Expression(Expression),
    /// Upstream sibling node names, in connection order.
    Connections(Vec<String>),
}

/// Parameter instance owned by a node.
#[derive(Clone, Debug)]
pub struct Parameter {
    ty: Arc<ParameterType>,
    binding: Binding,
    /// Value seen by the last successful resolution.
    resolved: Option<Value>,
}

impl Parameter {
    pub(crate) fn new(ty: Arc<ParameterType>) -> Self {
        let binding = Binding::Value(ty.default.clone());
        Self {
            ty,
            binding,
            resolved: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.ty.name
    }

    pub fn parameter_type(&self) -> &ParameterType {
        &self.ty
    }

    pub(crate) fn type_arc(&self) -> &Arc<ParameterType> {
        &self.ty
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.binding {
            Binding::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn expression(&self) -> Option<&Expression> {
        match &self.binding {
            Binding::Expression(e) => Some(e),
            _ => None,
        }
    }

    pub fn connections(&self) -> &[String] {
        match &self.binding {
            Binding::Connections(c) => c,
            _ => &[],
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.connections().is_empty()
    }

    /// Last resolved value, falling back to the literal or the default.
    pub fn effective_value(&self) -> Value {
        if let Some(v) = &self.resolved {
            return v.clone();
        }
        match &self.binding {
            Binding::Value(v) => v.clone(),
            _ => self.ty.default.clone(),
        }
    }

    pub(crate) fn set_value(&mut self, value: Value) -> NodeBoxResult<()> {
        let v = self.ty.validate(value)?;
        self.resolved = Some(v.clone());
        self.binding = Binding::Value(v);
        Ok(())
    }

    pub(crate) fn set_expression(&mut self, expr: Expression) {
        self.resolved = None;
        self.binding = Binding::Expression(expr);
    }

    pub(crate) fn reset(&mut self) {
        self.resolved = None;
        self.binding = Binding::Value(self.ty.default.clone());
    }

    /// Add an upstream; `Single` replaces, `Multiple` appends unless already present.
    pub(crate) fn connect(&mut self, upstream: &str) {
        let mut list = match std::mem::replace(&mut self.binding, Binding::Connections(Vec::new()))
        {
            Binding::Connections(list) if self.ty.cardinality == Cardinality::Multiple => list,
            _ => Vec::new(),
        };
        if !list.iter().any(|u| u == upstream) {
            list.push(upstream.to_owned());
        }
        self.resolved = None;
        self.binding = Binding::Connections(list);
    }

    /// Remove an upstream; returns whether it was connected. An empty list reverts to the default.
    pub(crate) fn disconnect(&mut self, upstream: &str) -> bool {
        let Binding::Connections(list) = &mut self.binding else {
            return false;
        };
        let before = list.len();
        list.retain(|u| u != upstream);
        let removed = list.len() != before;
        if list.is_empty() {
            self.reset();
        }
        removed
    }

    pub(crate) fn set_resolved(&mut self, v: Value) {
        self.resolved = Some(v);
    }
}
