use crate::node::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConstIdx(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PathIdx(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FuncIdx(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    PushConst(ConstIdx),
    /// Resolved at run time against context variables and sibling nodes.
    Load(PathIdx),

    Neg,
    Not,
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
    /// Pops `otherwise`, `then`, `cond`; pushes the selected branch.
    Select,

    Call { func: FuncIdx, argc: u8 },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct BytecodeProgram {
    pub(crate) ops: Vec<Op>,
    pub(crate) consts: Vec<Value>,
    pub(crate) paths: Vec<Vec<String>>,
    pub(crate) funcs: Vec<String>,
}

impl BytecodeProgram {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_const(&mut self, c: Value) -> ConstIdx {
        let idx = ConstIdx(self.consts.len() as u32);
        self.consts.push(c);
        idx
    }

    pub(crate) fn intern_path(&mut self, path: &[String]) -> PathIdx {
        if let Some(i) = self.paths.iter().position(|p| p == path) {
            return PathIdx(i as u32);
        }
        self.paths.push(path.to_vec());
        PathIdx((self.paths.len() - 1) as u32)
    }

    pub(crate) fn intern_func(&mut self, name: &str) -> FuncIdx {
        if let Some(i) = self.funcs.iter().position(|f| f == name) {
            return FuncIdx(i as u32);
        }
        self.funcs.push(name.to_owned());
        FuncIdx((self.funcs.len() - 1) as u32)
    }
}
