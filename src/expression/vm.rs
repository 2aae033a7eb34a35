use crate::expression::bytecode::{BytecodeProgram, Op};
use crate::expression::env::ExprEnv;
use crate::expression::error::VmError;
use crate::expression::functions::FunctionRepository;
use crate::node::value::Value;

pub(crate) fn eval_program(
    p: &BytecodeProgram,
    env: &dyn ExprEnv,
    functions: &FunctionRepository,
) -> Result<Value, VmError> {
    let mut stack: Vec<Value> = Vec::with_capacity(16);
    eval_program_with_stack(p, &mut stack, env, functions)
}

pub(crate) fn eval_program_with_stack(
    p: &BytecodeProgram,
    stack: &mut Vec<Value>,
    env: &dyn ExprEnv,
    functions: &FunctionRepository,
) -> Result<Value, VmError> {
    stack.clear();

    for &op in &p.ops {
        match op {
            Op::PushConst(idx) => {
                let c = p
                    .consts
                    .get(idx.0 as usize)
                    .ok_or_else(|| VmError::new("const idx out of range"))?;
                stack.push(c.clone());
            }
            Op::Load(idx) => {
                let path = p
                    .paths
                    .get(idx.0 as usize)
                    .ok_or_else(|| VmError::new("path idx out of range"))?;
                stack.push(load_path(path, env)?);
            }

            Op::Neg => {
                let v = pop(stack)?;
                stack.push(match v {
                    Value::Int(i) => Value::Int(
                        i.checked_neg()
                            .ok_or_else(|| VmError::new("integer overflow"))?,
                    ),
                    Value::Float(f) => Value::Float(-f),
                    other => return Err(expected("numeric", &other)),
                });
            }
            Op::Not => {
                let v = pop_bool(stack)?;
                stack.push(Value::Boolean(!v));
            }
            Op::Add => {
                let b = pop(stack)?;
                let a = pop(stack)?;
                if matches!(a, Value::String(_)) || matches!(b, Value::String(_)) {
                    stack.push(Value::String(format!("{a}{b}")));
                } else {
                    stack.push(arith(a, b, i64::checked_add, |x, y| x + y)?);
                }
            }
            Op::Sub => bin_arith(stack, i64::checked_sub, |x, y| x - y)?,
            Op::Mul => bin_arith(stack, i64::checked_mul, |x, y| x * y)?,
            Op::Div => {
                let b = pop(stack)?;
                let a = pop(stack)?;
                if matches!((&a, &b), (Value::Int(_), Value::Int(0))) {
                    return Err(VmError::new("division by zero"));
                }
                let (x, y) = (num(&a)?, num(&b)?);
                stack.push(Value::Float(x / y));
            }
            Op::Mod => {
                let b = pop(stack)?;
                let a = pop(stack)?;
                if matches!((&a, &b), (Value::Int(_), Value::Int(0))) {
                    return Err(VmError::new("modulo by zero"));
                }
                stack.push(arith(a, b, i64::checked_rem, |x, y| x % y)?);
            }

            Op::Eq => {
                let b = pop(stack)?;
                let a = pop(stack)?;
                stack.push(Value::Boolean(values_equal(&a, &b)));
            }
            Op::Ne => {
                let b = pop(stack)?;
                let a = pop(stack)?;
                stack.push(Value::Boolean(!values_equal(&a, &b)));
            }
            Op::Lt => bin_cmp(stack, |o| o.is_lt())?,
            Op::Le => bin_cmp(stack, |o| o.is_le())?,
            Op::Gt => bin_cmp(stack, |o| o.is_gt())?,
            Op::Ge => bin_cmp(stack, |o| o.is_ge())?,

            Op::And => {
                let b = pop_bool(stack)?;
                let a = pop_bool(stack)?;
                stack.push(Value::Boolean(a && b));
            }
            Op::Or => {
                let b = pop_bool(stack)?;
                let a = pop_bool(stack)?;
                stack.push(Value::Boolean(a || b));
            }
            Op::Select => {
                let otherwise = pop(stack)?;
                let then = pop(stack)?;
                let cond = pop_bool(stack)?;
                stack.push(if cond { then } else { otherwise });
            }

            Op::Call { func, argc } => {
                let name = p
                    .funcs
                    .get(func.0 as usize)
                    .ok_or_else(|| VmError::new("func idx out of range"))?;
                let argc = argc as usize;
                if stack.len() < argc {
                    return Err(VmError::new("stack underflow in function call"));
                }
                let args = stack.split_off(stack.len() - argc);
                let f = functions
                    .get(name)
                    .ok_or_else(|| VmError::new(format!("unknown function '{name}'")))?;
                stack.push(f.call(&args, env)?);
            }
        }
    }

    if stack.len() != 1 {
        return Err(VmError::new(format!(
            "stack has {} values at end of program",
            stack.len()
        )));
    }
    pop(stack)
}

/// Resolve a dotted name: context variable first, then sibling node output or parameter.
fn load_path(path: &[String], env: &dyn ExprEnv) -> Result<Value, VmError> {
    let Some((head, rest)) = path.split_first() else {
        return Err(VmError::new("empty name"));
    };
    if let Some(v) = env.variable(head) {
        return member(v, rest, path);
    }
    match rest {
        [] => env
            .node_output(head)
            .ok_or_else(|| VmError::new(format!("unknown name '{head}'"))),
        [param, fields @ ..] => {
            let v = env.node_param(head, param).ok_or_else(|| {
                VmError::new(format!("cannot resolve '{}'", path.join(".")))
            })?;
            member(v, fields, path)
        }
    }
}

fn member(v: Value, fields: &[String], path: &[String]) -> Result<Value, VmError> {
    let mut v = v;
    for field in fields {
        v = match (&v, field.as_str()) {
            (Value::Point(p), "x") => Value::Float(p.x),
            (Value::Point(p), "y") => Value::Float(p.y),
            (Value::Color(c), "r") => Value::Float(c.r),
            (Value::Color(c), "g") => Value::Float(c.g),
            (Value::Color(c), "b") => Value::Float(c.b),
            (Value::Color(c), "a") => Value::Float(c.a),
            _ => {
                return Err(VmError::new(format!(
                    "'{}': {} has no field '{field}'",
                    path.join("."),
                    v.type_name()
                )));
            }
        };
    }
    Ok(v)
}

fn expected(what: &str, got: &Value) -> VmError {
    VmError::new(format!("expected {what}, got {} '{got}'", got.type_name()))
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, VmError> {
    stack.pop().ok_or_else(|| VmError::new("stack underflow"))
}

fn pop_bool(stack: &mut Vec<Value>) -> Result<bool, VmError> {
    match pop(stack)? {
        Value::Boolean(v) => Ok(v),
        other => Err(expected("bool", &other)),
    }
}

fn num(v: &Value) -> Result<f64, VmError> {
    v.as_f64().ok_or_else(|| expected("numeric", v))
}

/// Int op Int stays Int; any float operand promotes to Float.
fn arith(
    a: Value,
    b: Value,
    int_op: impl FnOnce(i64, i64) -> Option<i64>,
    float_op: impl FnOnce(f64, f64) -> f64,
) -> Result<Value, VmError> {
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => int_op(*x, *y)
            .map(Value::Int)
            .ok_or_else(|| VmError::new("integer overflow")),
        _ => Ok(Value::Float(float_op(num(&a)?, num(&b)?))),
    }
}

fn bin_arith(
    stack: &mut Vec<Value>,
    int_op: impl FnOnce(i64, i64) -> Option<i64>,
    float_op: impl FnOnce(f64, f64) -> f64,
) -> Result<(), VmError> {
    let b = pop(stack)?;
    let a = pop(stack)?;
    stack.push(arith(a, b, int_op, float_op)?);
    Ok(())
}

fn bin_cmp(
    stack: &mut Vec<Value>,
    f: impl FnOnce(std::cmp::Ordering) -> bool,
) -> Result<(), VmError> {
    let b = pop(stack)?;
    let a = pop(stack)?;
    let ord = match (&a, &b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => num(&a)?
            .partial_cmp(&num(&b)?)
            .ok_or_else(|| VmError::new("cannot compare NaN"))?,
    };
    stack.push(Value::Boolean(f(ord)));
    Ok(())
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
