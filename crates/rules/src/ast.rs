//! Untyped syntax tree produced by the parser

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Literal {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::In => "in",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Literal),
    Ident(String),
    List(Vec<Expr>),
    Member {
        target: Box<Expr>,
        field: String,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    /// `f(args)`, or `target.f(args)` in receiver style
    Call {
        function: String,
        receiver: Option<Box<Expr>>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

impl Expr {
    /// Height of the tree; a leaf is 1
    pub(crate) fn depth(&self) -> usize {
        let children = match self {
            Expr::Literal(_) | Expr::Ident(_) => 0,
            Expr::List(items) => items.iter().map(Expr::depth).max().unwrap_or(0),
            Expr::Member { target, .. } => target.depth(),
            Expr::Index { target, index } => target.depth().max(index.depth()),
            Expr::Call { receiver, args, .. } => {
                let args = args.iter().map(Expr::depth).max().unwrap_or(0);
                receiver.as_ref().map_or(args, |r| args.max(r.depth()))
            }
            Expr::Unary { operand, .. } => operand.depth(),
            Expr::Binary { lhs, rhs, .. } => lhs.depth().max(rhs.depth()),
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => condition.depth().max(then.depth()).max(otherwise.depth()),
        };
        children + 1
    }
}
