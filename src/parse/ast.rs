use std::{
    fmt,
    ops::Deref,
    rc::Rc,
};
use crate::util::{Ident, Line};

/// A syntax tree item tagged with the source line it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Node<T> {
    inner: Box<T>,
    line: Line,
}

impl<T> Node<T> {
    pub fn new(inner: T, line: Line) -> Self {
        Self {
            inner: Box::new(inner),
            line,
        }
    }

    pub fn line(&self) -> Line {
        self.line
    }
}

impl<T> Deref for Node<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,

    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Unary(Node<UnaryOp>, Node<Expr>),
    Binary(Node<BinaryOp>, Node<Expr>, Node<Expr>),
    Grouping(Node<Expr>),
    Var(Ident),
    Assign(Ident, Node<Expr>),
    Logical(Node<LogicalOp>, Node<Expr>, Node<Expr>),
    Call(Node<Expr>, Vec<Node<Expr>>),
}

/// A declared function. Shared between the syntax tree and every closure made from it.
#[derive(Debug, PartialEq)]
pub struct FuncDecl {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Vec<Stmt>,
}

impl FuncDecl {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expr(Node<Expr>),
    Print(Node<Expr>),
    Var(Ident, Option<Node<Expr>>),
    Block(Vec<Stmt>),
    If(Node<Expr>, Box<Stmt>, Option<Box<Stmt>>),
    While(Node<Expr>, Box<Stmt>),
    Func(Rc<FuncDecl>),
    Return(Option<Node<Expr>>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Nil => write!(f, "nil"),
            Literal::Bool(x) => write!(f, "{}", x),
            Literal::Number(x) => write!(f, "{}", x),
            Literal::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
        })
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        })
    }
}

// Prefix form: `-123 * (45.67)` prints as `(* (- 123) (group 45.67))`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Literal(l) => write!(f, "{}", l),
            Expr::Unary(op, a) => write!(f, "({} {})", **op, **a),
            Expr::Binary(op, a, b) => write!(f, "({} {} {})", **op, **a, **b),
            Expr::Grouping(a) => write!(f, "(group {})", **a),
            Expr::Var(name) => write!(f, "{}", name.as_str()),
            Expr::Assign(name, value) => write!(f, "(= {} {})", name.as_str(), **value),
            Expr::Logical(op, a, b) => write!(f, "({} {} {})", **op, **a, **b),
            Expr::Call(callee, args) => {
                write!(f, "(call {}", **callee)?;
                for arg in args {
                    write!(f, " {}", **arg)?;
                }
                write!(f, ")")
            },
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::Expr(e) => write!(f, "(expr {})", **e),
            Stmt::Print(e) => write!(f, "(print {})", **e),
            Stmt::Var(name, None) => write!(f, "(var {})", name.as_str()),
            Stmt::Var(name, Some(init)) => write!(f, "(var {} {})", name.as_str(), **init),
            Stmt::Block(stmts) => {
                write!(f, "(block")?;
                for stmt in stmts {
                    write!(f, " {}", stmt)?;
                }
                write!(f, ")")
            },
            Stmt::If(cond, then, None) => write!(f, "(if {} {})", **cond, then),
            Stmt::If(cond, then, Some(otherwise)) => write!(f, "(if {} {} {})", **cond, then, otherwise),
            Stmt::While(cond, body) => write!(f, "(while {} {})", **cond, body),
            Stmt::Func(decl) => {
                let params = decl.params
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(f, "(func {} ({})", decl.name.as_str(), params)?;
                for stmt in &decl.body {
                    write!(f, " {}", stmt)?;
                }
                write!(f, ")")
            },
            Stmt::Return(None) => write!(f, "(return)"),
            Stmt::Return(Some(e)) => write!(f, "(return {})", **e),
        }
    }
}

pub fn print_debug(program: &[Stmt]) {
    println!("--- Syntax Tree ---");
    for stmt in program {
        println!("{}", stmt);
    }
}
