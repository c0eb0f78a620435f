use std::{fmt, rc::Rc};
use crate::{
    callable::Callable,
    error::ExecError,
    parse::Literal,
};

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Callable(Rc<dyn Callable>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::String(x) => write!(f, "\"{}\"", x),
            Value::Number(x) => write!(f, "{}", x),
            Value::Bool(x) => write!(f, "{}", x),
            Value::Nil => write!(f, "nil"),
            Value::Callable(c) => write!(f, "{}", c),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::String(x) => write!(f, "{}", x),
            other => write!(f, "{:?}", other),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) =>
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const (),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(x)
    }
}

impl From<bool> for Value {
    fn from(x: bool) -> Self {
        Value::Bool(x)
    }
}

impl From<&str> for Value {
    fn from(x: &str) -> Self {
        Value::String(x.to_owned())
    }
}

impl From<String> for Value {
    fn from(x: String) -> Self {
        Value::String(x)
    }
}

impl Value {
    pub fn from_literal(l: &Literal) -> Self {
        match l {
            Literal::Nil => Value::Nil,
            Literal::Bool(x) => Value::Bool(*x),
            Literal::Number(x) => Value::Number(*x),
            Literal::String(s) => Value::String(s.clone()),
        }
    }

    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn truth(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn apply_not(self) -> Result<Self, ExecError> {
        Ok(Value::Bool(!self.truth()))
    }

    pub fn apply_neg(self) -> Result<Self, ExecError> {
        match self {
            Value::Number(a) => Ok(Value::Number(-a)),
            _ => Err(ExecError::NumberOperand),
        }
    }

    pub fn apply_add(self, rhs: Self) -> Result<Self, ExecError> {
        match (self, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(mut a), Value::String(b)) => {
                a += &b;
                Ok(Value::String(a))
            },
            _ => Err(ExecError::AddOperands),
        }
    }

    fn numbers(self, rhs: Self) -> Result<(f64, f64), ExecError> {
        match (self, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok((a, b)),
            _ => Err(ExecError::NumberOperands),
        }
    }

    pub fn apply_sub(self, rhs: Self) -> Result<Self, ExecError> {
        let (a, b) = self.numbers(rhs)?;
        Ok(Value::Number(a - b))
    }

    pub fn apply_mul(self, rhs: Self) -> Result<Self, ExecError> {
        let (a, b) = self.numbers(rhs)?;
        Ok(Value::Number(a * b))
    }

    pub fn apply_div(self, rhs: Self) -> Result<Self, ExecError> {
        match self.numbers(rhs)? {
            (_, b) if b == 0.0 => Err(ExecError::DivideByZero),
            (a, b) => Ok(Value::Number(a / b)),
        }
    }

    pub fn apply_less(self, rhs: Self) -> Result<Self, ExecError> {
        let (a, b) = self.numbers(rhs)?;
        Ok(Value::Bool(a < b))
    }

    pub fn apply_less_eq(self, rhs: Self) -> Result<Self, ExecError> {
        let (a, b) = self.numbers(rhs)?;
        Ok(Value::Bool(a <= b))
    }

    pub fn apply_greater(self, rhs: Self) -> Result<Self, ExecError> {
        let (a, b) = self.numbers(rhs)?;
        Ok(Value::Bool(a > b))
    }

    pub fn apply_greater_eq(self, rhs: Self) -> Result<Self, ExecError> {
        let (a, b) = self.numbers(rhs)?;
        Ok(Value::Bool(a >= b))
    }

    pub fn apply_eq(self, rhs: Self) -> Result<Self, ExecError> {
        Ok(Value::Bool(self == rhs))
    }

    pub fn apply_not_eq(self, rhs: Self) -> Result<Self, ExecError> {
        Ok(Value::Bool(self != rhs))
    }

    pub fn as_callable(&self) -> Option<&Rc<dyn Callable>> {
        match self {
            Value::Callable(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.truth());
        assert!(!Value::Bool(false).truth());
        assert!(Value::Bool(true).truth());
        assert!(Value::Number(0.0).truth());
        assert!(Value::from("").truth());
    }

    #[test]
    fn add_numbers_or_strings_only() {
        assert_eq!(Value::from(1.0).apply_add(Value::from(2.0)), Ok(Value::from(3.0)));
        assert_eq!(Value::from("a").apply_add(Value::from("b")), Ok(Value::from("ab")));
        assert_eq!(Value::from(1.0).apply_add(Value::from("a")), Err(ExecError::AddOperands));
    }

    #[test]
    fn divide_by_zero_is_an_error() {
        assert_eq!(Value::from(1.0).apply_div(Value::from(0.0)), Err(ExecError::DivideByZero));
        assert_eq!(Value::from(1.0).apply_div(Value::from(-0.0)), Err(ExecError::DivideByZero));
        assert_eq!(Value::from(1.0).apply_div(Value::from(4.0)), Ok(Value::from(0.25)));
    }

    #[test]
    fn comparison_needs_numbers() {
        assert_eq!(Value::from(1.0).apply_less(Value::from(2.0)), Ok(Value::Bool(true)));
        assert_eq!(Value::from("a").apply_greater(Value::from("b")), Err(ExecError::NumberOperands));
        assert_eq!(Value::Nil.apply_neg(), Err(ExecError::NumberOperand));
    }

    #[test]
    fn equality_never_coerces() {
        assert_eq!(Value::Nil.apply_eq(Value::Nil), Ok(Value::Bool(true)));
        assert_eq!(Value::from(1.0).apply_eq(Value::from("1")), Ok(Value::Bool(false)));
        assert_eq!(Value::Nil.apply_eq(Value::Bool(false)), Ok(Value::Bool(false)));
        assert_eq!(Value::from("x").apply_not_eq(Value::from("x")), Ok(Value::Bool(false)));
    }

    #[test]
    fn display() {
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::from(8.0).to_string(), "8");
        assert_eq!(Value::from(3.5).to_string(), "3.5");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(format!("{:?}", Value::from("hi")), "\"hi\"");
    }
}
