use std::fmt;
use thiserror::Error;
use crate::util::Line;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ScanErrorKind {
    #[error("unterminated string")]
    UnterminatedString,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
}

#[derive(Clone, Debug, PartialEq, Error)]
#[error("[line {line}] scan error: {kind}")]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub line: Line,
}

impl ScanError {
    pub fn unterminated_string() -> ScanErrorKind {
        ScanErrorKind::UnterminatedString
    }

    pub fn invalid_number(text: impl Into<String>) -> ScanErrorKind {
        ScanErrorKind::InvalidNumber(text.into())
    }

    pub fn unexpected_char(c: char) -> ScanErrorKind {
        ScanErrorKind::UnexpectedChar(c)
    }
}

impl ScanErrorKind {
    pub fn at(self, line: Line) -> ScanError {
        ScanError { kind: self, line }
    }
}

/// Where in the token stream a parse failed.
#[derive(Clone, Debug, PartialEq)]
pub enum Where {
    AtEnd,
    At(String),
}

impl fmt::Display for Where {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Where::AtEnd => write!(f, "at end"),
            Where::At(lexeme) => write!(f, "at '{}'", lexeme),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
#[error("[line {line}] parse error {location}: {message}")]
pub struct ParseError {
    pub location: Where,
    pub line: Line,
    pub message: String,
}

/// A runtime failure that has not yet been tied to a source line.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ExecError {
    #[error("operand must be a number")]
    NumberOperand,
    #[error("operands must be numbers")]
    NumberOperands,
    #[error("operands must be two numbers or two strings")]
    AddOperands,
    #[error("divide by zero")]
    DivideByZero,
    #[error("undefined variable '{0}'")]
    UndefinedVar(String),
    #[error("can only call functions and classes")]
    NotCallable,
    #[error("expected {expected} arguments but got {found}")]
    WrongNumberOfArgs { expected: usize, found: usize },
    #[error("{0}")]
    Native(String),
    #[error("cannot write output: {0}")]
    Output(String),
}

impl ExecError {
    pub fn at(self, line: Line) -> RuntimeError {
        RuntimeError { kind: self, line }
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
#[error("[line {line}] runtime error: {kind}")]
pub struct RuntimeError {
    pub kind: ExecError,
    pub line: Line,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub fn line(&self) -> Line {
        match self {
            Error::Scan(e) => e.line,
            Error::Parse(e) => e.line,
            Error::Runtime(e) => e.line,
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse(_))
    }
}
