//! Parameter expressions: lexer, parser, bytecode compiler and a small stack VM.

mod ast;
mod bytecode;
mod compile;
mod env;
mod error;
mod functions;
mod lexer;
mod parser;
mod vm;

use std::fmt;
use std::sync::Arc;

use crate::foundation::error::{NodeBoxError, NodeBoxResult};
use crate::node::value::Value;

pub use env::{ExprEnv, VarEnv};
pub use functions::{Function, FunctionRepository};

/// Context variable holding the current frame.
pub const FRAME_VAR: &str = "FRAME";
/// Context variable holding the copy index inside stateful copy programs.
pub const COPY_VAR: &str = "COPY";

/// A parsed and compiled expression, cheap to clone.
#[derive(Clone)]
pub struct Expression {
    source: Arc<str>,
    program: Arc<bytecode::BytecodeProgram>,
    /// Distinct first path segments, in order of appearance.
    references: Arc<[String]>,
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expression").field(&self.source).finish()
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

fn first_segments(e: &ast::Expr, out: &mut Vec<String>) {
    e.visit_paths(&mut |path| {
        if let Some(head) = path.first()
            && !out.contains(head)
        {
            out.push(head.clone());
        }
    });
}

impl Expression {
    pub fn parse(source: &str) -> NodeBoxResult<Self> {
        let ast = parser::parse_expr(source)?;
        let program = compile::compile_expr(&ast)?;
        let mut refs = Vec::new();
        first_segments(&ast, &mut refs);
        Ok(Self {
            source: Arc::from(source.trim()),
            program: Arc::new(program),
            references: refs.into(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names this expression reads; sibling node names among them are dependencies.
    pub fn references(&self) -> &[String] {
        &self.references
    }

    pub fn mentions(&self, name: &str) -> bool {
        self.references.iter().any(|r| r == name)
    }

    pub fn evaluate(&self, env: &dyn ExprEnv, functions: &FunctionRepository) -> NodeBoxResult<Value> {
        vm::eval_program(&self.program, env, functions).map_err(|e| {
            NodeBoxError::expression(format!("'{}': {}", self.source, e.message))
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// One `node.param = expr` statement.
#[derive(Clone, Debug)]
pub struct Assignment {
    pub node: String,
    pub param: String,
    pub value: Expression,
}

/// Statement list run against a scratch copy of a network, e.g. `rect1.width = COPY * 10`.
#[derive(Clone, Debug, Default)]
pub struct AssignmentProgram {
    assignments: Vec<Assignment>,
}

impl AssignmentProgram {
    pub fn parse(source: &str) -> NodeBoxResult<Self> {
        let statements = parser::parse_statements(source)?;
        let mut assignments = Vec::with_capacity(statements.len());
        for st in statements {
            let [node, param] = st.target.as_slice() else {
                return Err(NodeBoxError::expression(format!(
                    "expr error at byte {}: assignment target must be node.param, got '{}'",
                    st.offset,
                    st.target.join(".")
                )));
            };
            let program = compile::compile_expr(&st.value)?;
            let mut refs = Vec::new();
            first_segments(&st.value, &mut refs);
            assignments.push(Assignment {
                node: node.clone(),
                param: param.clone(),
                value: Expression {
                    source: Arc::from(format!("{node}.{param} = ...")),
                    program: Arc::new(program),
                    references: refs.into(),
                },
            });
        }
        Ok(Self { assignments })
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_are_first_segments_in_order() {
        let e = Expression::parse("rect1.width + FRAME * rect1.height + min(a, 2)").unwrap();
        assert_eq!(e.references(), ["rect1", "FRAME", "a"]);
        assert!(e.mentions("FRAME"));
        assert!(!e.mentions("min"));
    }

    #[test]
    fn parse_errors_are_expression_errors() {
        assert!(matches!(
            Expression::parse("1 +"),
            Err(NodeBoxError::Expression(_))
        ));
    }

    #[test]
    fn evaluates_against_variables() {
        let e = Expression::parse("FRAME * 2").unwrap();
        let env = VarEnv::new().with(FRAME_VAR, Value::Int(4));
        let v = e.evaluate(&env, &FunctionRepository::with_builtins()).unwrap();
        assert_eq!(v, Value::Int(8));
    }

    #[test]
    fn assignment_programs() {
        let p = AssignmentProgram::parse("rect1.width = COPY * 10; rect1.x = 1").unwrap();
        assert_eq!(p.assignments().len(), 2);
        assert_eq!(p.assignments()[0].node, "rect1");
        assert_eq!(p.assignments()[0].param, "width");
        assert!(p.assignments()[0].value.mentions(COPY_VAR));
        assert!(AssignmentProgram::parse("width = 3").is_err());
        assert!(AssignmentProgram::parse("").unwrap().is_empty());
    }
}
