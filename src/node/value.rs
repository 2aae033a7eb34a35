use std::fmt;

use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::graphics::{Color, Grob, Group, Path, Point};

/// Declared type of a parameter or node output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Float,
    Boolean,
    String,
    Color,
    Point,
    Grob,
    GrobPath,
    GrobGroup,
}

impl ValueType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Int | ValueType::Float)
    }

    pub fn is_grob(self) -> bool {
        matches!(
            self,
            ValueType::Grob | ValueType::GrobPath | ValueType::GrobGroup
        )
    }

    /// Whether an output of type `self` may feed an input of type `input`.
    pub fn can_feed(self, input: ValueType) -> bool {
        use ValueType::*;
        match (self, input) {
            (a, b) if a == b => true,
            (Int, Float) | (Float, Int) => true,
            (Int | Float | Boolean, String) => true,
            (Boolean, Int) => true,
            (GrobPath | GrobGroup, Grob) => true,
            (GrobPath, GrobGroup) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
            ValueType::String => "string",
            ValueType::Color => "color",
            ValueType::Point => "point",
            ValueType::Grob => "grob",
            ValueType::GrobPath => "path",
            ValueType::GrobGroup => "group",
        };
        f.write_str(s)
    }
}

/// Runtime value flowing between parameters and node outputs.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    Color(Color),
    Point(Point),
    Grob(Grob),
    List(Vec<Value>),
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Color> for Value {
    fn from(v: Color) -> Self {
        Value::Color(v)
    }
}

impl From<Point> for Value {
    fn from(v: Point) -> Self {
        Value::Point(v)
    }
}

impl From<Grob> for Value {
    fn from(v: Grob) -> Self {
        Value::Grob(v)
    }
}

impl From<Path> for Value {
    fn from(v: Path) -> Self {
        Value::Grob(Grob::Path(v))
    }
}

impl From<Group> for Value {
    fn from(v: Group) -> Self {
        Value::Grob(Grob::Group(v))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Color(c) => f.write_str(&c.to_hex()),
            Value::Point(p) => write!(f, "{},{}", p.x, p.y),
            Value::Grob(g) => write!(f, "<{}>", g.kind_name()),
            Value::List(items) => write!(f, "[{} values]", items.len()),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Color(_) => "color",
            Value::Point(_) => "point",
            Value::Grob(g) => g.kind_name(),
            Value::List(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_grob(&self) -> Option<&Grob> {
        match self {
            Value::Grob(g) => Some(g),
            _ => None,
        }
    }

    /// Flatten one level of lists: `List([a, b])` yields `a, b`; anything else yields itself.
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Value::List(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        }
    }

    fn mismatch(&self, ty: ValueType) -> NodeBoxError {
        NodeBoxError::type_error(format!(
            "cannot convert {} value '{self}' to {ty}",
            self.type_name()
        ))
    }

    /// Convert to `ty`. `Null` passes through; nullability is checked by the caller.
    ///
    /// Floats only become ints when they are integral.
    pub fn coerce(self, ty: ValueType) -> NodeBoxResult<Value> {
        use ValueType as T;
        let v = match (self, ty) {
            (Value::Null, _) => Value::Null,

            (Value::Int(v), T::Int) => Value::Int(v),
            (Value::Float(v), T::Int) => {
                if v.fract() == 0.0 && v.is_finite() && v.abs() < i64::MAX as f64 {
                    Value::Int(v as i64)
                } else {
                    return Err(NodeBoxError::type_error(format!(
                        "{v} is not an integer"
                    )));
                }
            }
            (Value::Boolean(v), T::Int) => Value::Int(i64::from(v)),

            (Value::Float(v), T::Float) => Value::Float(v),
            (Value::Int(v), T::Float) => Value::Float(v as f64),

            (Value::Boolean(v), T::Boolean) => Value::Boolean(v),
            (Value::Int(v), T::Boolean) => Value::Boolean(v != 0),

            (Value::String(s), T::String) => Value::String(s),
            (v @ (Value::Int(_) | Value::Float(_) | Value::Boolean(_)), T::String) => {
                Value::String(v.to_string())
            }

            (Value::Color(c), T::Color) => Value::Color(c),
            (Value::String(s), T::Color) => Value::Color(Color::from_hex(&s)?),
            (Value::Float(v), T::Color) => Value::Color(Color::gray(v, 1.0)),

            (Value::Point(p), T::Point) => Value::Point(p),

            (Value::Grob(g), T::Grob) => Value::Grob(g),
            (Value::Grob(g @ Grob::Path(_)), T::GrobPath) => Value::Grob(g),
            (Value::Grob(g), T::GrobGroup) => Value::Grob(Grob::Group(g.into_group())),
            (Value::List(items), T::Grob | T::GrobGroup) => {
                let mut group = Group::new();
                for item in items {
                    match item.coerce(T::Grob)? {
                        Value::Grob(g) => group.add(g),
                        Value::Null => {}
                        other => return Err(other.mismatch(ty)),
                    }
                }
                Value::Grob(Grob::Group(group))
            }

            (other, ty) => return Err(other.mismatch(ty)),
        };
        Ok(v)
    }

    /// Build a value from plain JSON guided by the declared type.
    pub fn from_json(json: &serde_json::Value, ty: ValueType) -> NodeBoxResult<Value> {
        use serde_json::Value as J;
        let raw = match json {
            J::Null => Value::Null,
            J::Bool(b) => Value::Boolean(*b),
            J::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            J::String(s) => Value::String(s.clone()),
            J::Array(items) if ty == ValueType::Point => {
                let coord = |i: usize| items.get(i).and_then(J::as_f64);
                match (items.len(), coord(0), coord(1)) {
                    (2, Some(x), Some(y)) => Value::Point(Point::new(x, y)),
                    _ => {
                        return Err(NodeBoxError::type_error(format!(
                            "point must be [x, y], got {json}"
                        )));
                    }
                }
            }
            J::Array(_) | J::Object(_) if ty.is_grob() => {
                Value::Grob(serde_json::from_value::<Grob>(json.clone())?)
            }
            J::Array(_) | J::Object(_) => serde_json::from_value::<Value>(json.clone())?,
        };
        raw.coerce(ty)
    }
}
