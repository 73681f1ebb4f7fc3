use serde::{Deserialize, Serialize};

pub mod source_map;
pub use source_map::SourceMap;

// ---- Span infrastructure ----

/// Byte range within source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const UNKNOWN: Span = Span { start: 0, end: 0 };

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

// ---- Core AST types ----

/// `def name(a, b) { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    #[serde(skip)]
    pub span: Span,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `var a, b;`
    Declare { names: Vec<String> },

    /// `a = expr;`
    Assign { name: String, value: Expr },

    /// `a <- expr;`, re-evaluated whenever something `expr` reads changes
    Derive { name: String, value: Expr },

    /// `f(args);`
    Call { function: String, args: Vec<Expr> },

    /// `return expr;`
    Return(Expr),
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Integer(i64),

    /// String literal with its quotes already stripped
    Str(String),

    /// Variable reference
    Ref(String),

    /// `(expr)`
    Paren(Box<Expr>),

    /// `-expr`
    Negate(Box<Expr>),

    /// Infix arithmetic: `a + b`, `a * b`
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `[a, b, c]`
    Array(Vec<Expr>),

    /// `{k: v}`: accepted by the parser, rejected at evaluation
    Hash(Vec<(Expr, Expr)>),

    /// `arr[i]`
    Index { object: Box<Expr>, index: Box<Expr> },

    /// `f(a, b)`
    Call { function: String, args: Vec<Expr> },

    /// `$file('path')`
    Signal { kind: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
        }
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A complete program: hoisted function definitions plus top-level statements
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
    pub statements: Vec<Stmt>,
    #[serde(skip)]
    pub source: Option<String>,
}
