use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::expression::env::ExprEnv;
use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::foundation::rng::Rng64;
use crate::graphics::{Color, Point};
use crate::node::value::Value;

type FunctionImpl = dyn Fn(&[Value], &dyn ExprEnv) -> NodeBoxResult<Value> + Send + Sync;

/// A named function callable from expressions.
#[derive(Clone)]
pub struct Function {
    name: String,
    min_args: usize,
    max_args: usize,
    imp: Arc<FunctionImpl>,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish_non_exhaustive()
    }
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        min_args: usize,
        max_args: usize,
        imp: impl Fn(&[Value], &dyn ExprEnv) -> NodeBoxResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            min_args,
            max_args,
            imp: Arc::new(imp),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value], env: &dyn ExprEnv) -> NodeBoxResult<Value> {
        if args.len() < self.min_args || args.len() > self.max_args {
            let expected = if self.min_args == self.max_args {
                format!("{}", self.min_args)
            } else if self.max_args == usize::MAX {
                format!("at least {}", self.min_args)
            } else {
                format!("{} to {}", self.min_args, self.max_args)
            };
            return Err(NodeBoxError::expression(format!(
                "{} expects {expected} args, got {}",
                self.name,
                args.len()
            )));
        }
        (self.imp)(args, env)
    }
}

/// Functions available to expressions, keyed by name.
///
/// Constructed explicitly and owned by the library; there is no global registry.
#[derive(Clone, Debug, Default)]
pub struct FunctionRepository {
    functions: BTreeMap<String, Function>,
}

impl FunctionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, f: Function) {
        self.functions.insert(f.name.clone(), f);
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn with_builtins() -> Self {
        let mut r = Self::new();
        r.register_unary_f64("sin", f64::sin);
        r.register_unary_f64("cos", f64::cos);
        r.register_unary_f64("tan", f64::tan);
        r.register_unary_f64("sqrt", f64::sqrt);
        r.register_unary_f64("radians", f64::to_radians);
        r.register_unary_f64("degrees", f64::to_degrees);
        r.register_rounding("floor", f64::floor);
        r.register_rounding("ceil", f64::ceil);
        r.register_rounding("round", f64::round);

        r.register(Function::new("abs", 1, 1, |args, _| match &args[0] {
            Value::Int(i) => Ok(Value::Int(i.saturating_abs())),
            other => Ok(Value::Float(num(other, "abs")?.abs())),
        }));
        r.register(Function::new("min", 1, usize::MAX, |args, _| {
            fold_extreme(args, "min", |a, b| a < b)
        }));
        r.register(Function::new("max", 1, usize::MAX, |args, _| {
            fold_extreme(args, "max", |a, b| a > b)
        }));
        r.register(Function::new("clamp", 3, 3, |args, _| {
            let (x, lo, hi) = (
                num(&args[0], "clamp")?,
                num(&args[1], "clamp")?,
                num(&args[2], "clamp")?,
            );
            Ok(Value::Float(x.max(lo).min(hi)))
        }));
        r.register(Function::new("lerp", 3, 3, |args, _| {
            let (a, b, t) = (
                num(&args[0], "lerp")?,
                num(&args[1], "lerp")?,
                num(&args[2], "lerp")?,
            );
            Ok(Value::Float(a + (b - a) * t))
        }));
        r.register(Function::new("atan2", 2, 2, |args, _| {
            Ok(Value::Float(
                num(&args[0], "atan2")?.atan2(num(&args[1], "atan2")?),
            ))
        }));
        r.register(Function::new("pow", 2, 2, |args, _| {
            Ok(Value::Float(num(&args[0], "pow")?.powf(num(&args[1], "pow")?)))
        }));

        r.register(Function::new("int", 1, 1, |args, _| to_int(&args[0])));
        r.register(Function::new("float", 1, 1, |args, _| to_float(&args[0])));

        r.register(Function::new("random", 1, 3, |args, _| {
            let mut rng = Rng64::from_f64_seed(num(&args[0], "random")?);
            let (lo, hi) = match args.len() {
                1 => (0.0, 1.0),
                2 => (0.0, num(&args[1], "random")?),
                _ => (num(&args[1], "random")?, num(&args[2], "random")?),
            };
            Ok(Value::Float(rng.next_range(lo, hi)))
        }));
        r.register(Function::new("randint", 3, 3, |args, _| {
            let mut rng = Rng64::from_f64_seed(num(&args[0], "randint")?);
            let lo = num(&args[1], "randint")?.round() as i64;
            let hi = num(&args[2], "randint")?.round() as i64;
            Ok(Value::Int(rng.next_int_inclusive(lo, hi)))
        }));

        r.register(Function::new("color", 0, 4, |args, _| {
            let c = args
                .iter()
                .map(|a| num(a, "color"))
                .collect::<NodeBoxResult<Vec<_>>>()?;
            let color = match c.as_slice() {
                [] => Color::BLACK,
                [v] => Color::gray(*v, 1.0),
                [v, a] => Color::gray(*v, *a),
                [r, g, b] => Color::rgb(*r, *g, *b),
                [r, g, b, a, ..] => Color::rgba(*r, *g, *b, *a),
            };
            Ok(Value::Color(color))
        }));
        r.register(Function::new("point", 2, 2, |args, _| {
            Ok(Value::Point(Point::new(
                num(&args[0], "point")?,
                num(&args[1], "point")?,
            )))
        }));
        r.register(Function::new("stamp", 2, 2, |args, env| {
            let Value::String(key) = &args[0] else {
                return Err(NodeBoxError::expression("stamp expects a string key"));
            };
            Ok(env.variable(key).unwrap_or_else(|| args[1].clone()))
        }));
        r
    }

    fn register_unary_f64(&mut self, name: &'static str, f: fn(f64) -> f64) {
        self.register(Function::new(name, 1, 1, move |args, _| {
            Ok(Value::Float(f(num(&args[0], name)?)))
        }));
    }

    fn register_rounding(&mut self, name: &'static str, f: fn(f64) -> f64) {
        self.register(Function::new(name, 1, 1, move |args, _| {
            let v = f(num(&args[0], name)?);
            if v.is_finite() && v.abs() < i64::MAX as f64 {
                Ok(Value::Int(v as i64))
            } else {
                Ok(Value::Float(v))
            }
        }));
    }
}

fn num(v: &Value, func: &str) -> NodeBoxResult<f64> {
    v.as_f64().ok_or_else(|| {
        NodeBoxError::expression(format!(
            "{func} expects numeric args, got {} '{v}'",
            v.type_name()
        ))
    })
}

/// Keeps ints integral when every argument is an int.
fn fold_extreme(args: &[Value], func: &str, better: fn(f64, f64) -> bool) -> NodeBoxResult<Value> {
    let mut best = &args[0];
    let mut best_v = num(best, func)?;
    for a in &args[1..] {
        let v = num(a, func)?;
        if better(v, best_v) {
            best = a;
            best_v = v;
        }
    }
    if args.iter().all(|a| matches!(a, Value::Int(_))) {
        Ok(best.clone())
    } else {
        Ok(Value::Float(best_v))
    }
}

fn to_int(v: &Value) -> NodeBoxResult<Value> {
    match v {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
        Value::Boolean(b) => Ok(Value::Int(i64::from(*b))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .or_else(|_| s.trim().parse::<f64>().map(|f| Value::Int(f.trunc() as i64)))
            .map_err(|_| NodeBoxError::expression(format!("int: cannot parse '{s}'"))),
        other => Err(NodeBoxError::expression(format!(
            "int: cannot convert {}",
            other.type_name()
        ))),
    }
}

fn to_float(v: &Value) -> NodeBoxResult<Value> {
    match v {
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Boolean(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| NodeBoxError::expression(format!("float: cannot parse '{s}'"))),
        other => Err(NodeBoxError::expression(format!(
            "float: cannot convert {}",
            other.type_name()
        ))),
    }
}
