pub mod printer;

use serde::Serialize;

use crate::scanner::token::Span;

/// Top-level program: a list of statements.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Stmt {
    Assign(AssignStmt),
    Print(PrintStmt),
    Heist(HeistStmt),
    Execute(ExecuteStmt),
    If(IfStmt),
    While(WhileStmt),
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignStmt {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintStmt {
    pub expression: Expr,
    pub span: Span,
}

/// A named block definition. The body is stored, not run, until an
/// `execute` statement invokes it.
#[derive(Debug, Clone, Serialize)]
pub struct HeistStmt {
    pub name: String,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteStmt {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_body: Vec<Stmt>,
    pub else_body: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Expr {
    Binary(BinaryExpr),
    Comparison(ComparisonExpr),
    Literal(LiteralExpr),
    Grouping(GroupingExpr),
    Variable(VariableExpr),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Self::Binary(e) => e.span,
            Self::Comparison(e) => e.span,
            Self::Literal(e) => e.span,
            Self::Grouping(e) => e.span,
            Self::Variable(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: BinOp,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum BinOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
}

/// A single relational test. The grammar allows at most one per
/// condition, so comparisons never chain.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonExpr {
    pub left: Box<Expr>,
    pub operator: CmpOp,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum CmpOp {
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEqual,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEqual,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiteralExpr {
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupingExpr {
    pub expression: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariableExpr {
    pub name: String,
    pub span: Span,
}
