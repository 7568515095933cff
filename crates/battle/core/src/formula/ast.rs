/// Battler bound in a formula: `a` is the action's subject, `b` the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    Subject,
    Target,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    /// `a.atk`
    Property { operand: Operand, name: String },
    /// `a.isStateAffected(4)`
    Method {
        operand: Operand,
        name: String,
        args: Vec<Expr>,
    },
    /// `Math.max(x, y)`
    Math { name: String, args: Vec<Expr> },
    /// `v[3]`
    Variable(Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    /// `x; y` evaluates both and yields the last.
    Sequence(Vec<Expr>),
}
