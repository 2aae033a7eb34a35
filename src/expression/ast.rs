#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Lit(Lit),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call {
        func: String,
        args: Vec<Expr>,
    },
    /// A dotted identifier path: `FRAME`, `rect1`, `rect1.width`.
    Path(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lit {
    Int(i64),
    F64(f64),
    Bool(bool),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// `target = value` where target is a dotted path.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
    pub(crate) target: Vec<String>,
    pub(crate) offset: usize,
    pub(crate) value: Expr,
}

impl Expr {
    /// Visit every identifier path in evaluation order.
    pub(crate) fn visit_paths<'a>(&'a self, f: &mut impl FnMut(&'a [String])) {
        match self {
            Expr::Lit(_) => {}
            Expr::Unary { expr, .. } => expr.visit_paths(f),
            Expr::Binary { left, right, .. } => {
                left.visit_paths(f);
                right.visit_paths(f);
            }
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                cond.visit_paths(f);
                then.visit_paths(f);
                otherwise.visit_paths(f);
            }
            Expr::Call { args, .. } => {
                for a in args {
                    a.visit_paths(f);
                }
            }
            Expr::Path(p) => f(p),
        }
    }
}
