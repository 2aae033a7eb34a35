use crate::expression::ast::{BinaryOp, Expr, Lit, UnaryOp};
use crate::expression::bytecode::{BytecodeProgram, Op};
use crate::expression::error::ExprError;
use crate::node::value::Value;

pub(crate) fn compile_expr(e: &Expr) -> Result<BytecodeProgram, ExprError> {
    let mut p = BytecodeProgram::new();
    lower(e, &mut p)?;
    Ok(p)
}

fn lower(e: &Expr, p: &mut BytecodeProgram) -> Result<(), ExprError> {
    match e {
        Expr::Lit(lit) => {
            let v = match lit {
                Lit::Int(v) => Value::Int(*v),
                Lit::F64(v) => Value::Float(*v),
                Lit::Bool(v) => Value::Boolean(*v),
                Lit::Str(s) => Value::String(s.clone()),
            };
            let idx = p.push_const(v);
            p.ops.push(Op::PushConst(idx));
        }
        Expr::Path(path) => {
            let idx = p.intern_path(path);
            p.ops.push(Op::Load(idx));
        }
        Expr::Unary { op, expr } => {
            lower(expr, p)?;
            p.ops.push(match op {
                UnaryOp::Neg => Op::Neg,
                UnaryOp::Not => Op::Not,
            });
        }
        Expr::Binary { op, left, right } => {
            lower(left, p)?;
            lower(right, p)?;
            p.ops.push(match op {
                BinaryOp::Add => Op::Add,
                BinaryOp::Sub => Op::Sub,
                BinaryOp::Mul => Op::Mul,
                BinaryOp::Div => Op::Div,
                BinaryOp::Mod => Op::Mod,
                BinaryOp::Eq => Op::Eq,
                BinaryOp::Ne => Op::Ne,
                BinaryOp::Lt => Op::Lt,
                BinaryOp::Le => Op::Le,
                BinaryOp::Gt => Op::Gt,
                BinaryOp::Ge => Op::Ge,
                BinaryOp::And => Op::And,
                BinaryOp::Or => Op::Or,
            });
        }
        Expr::Conditional {
            cond,
            then,
            otherwise,
        } => {
            lower(cond, p)?;
            lower(then, p)?;
            lower(otherwise, p)?;
            p.ops.push(Op::Select);
        }
        Expr::Call { func, args } => {
            let argc = u8::try_from(args.len())
                .map_err(|_| ExprError::new(0, format!("too many arguments to '{func}'")))?;
            for a in args {
                lower(a, p)?;
            }
            let func = p.intern_func(func);
            p.ops.push(Op::Call { func, argc });
        }
    }
    Ok(())
}
