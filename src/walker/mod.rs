mod env;
mod value;

pub use self::{
    env::Env,
    value::Value,
};

use std::{io::Write, rc::Rc};
use crate::{
    callable::Function,
    error::{ExecError, RuntimeError},
    parse::{
        BinaryOp,
        Expr,
        LogicalOp,
        Node,
        Stmt,
        UnaryOp,
    },
    util::ensure_sufficient_stack,
};

/// How a statement finished.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Normal,
    /// A `return` is unwinding to the nearest enclosing call.
    Return(Value),
}

/// Walks syntax trees, evaluating them against a chain of scopes.
pub struct AbstractMachine {
    globals: Env,
    out: Box<dyn Write>,
}

impl AbstractMachine {
    pub fn new(out: Box<dyn Write>) -> Self {
        Self {
            globals: Env::global(),
            out,
        }
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    pub fn set_output(&mut self, out: Box<dyn Write>) {
        self.out = out;
    }

    /// Runs a top-level program. A `return` outside any function stops the program quietly.
    pub fn run(&mut self, program: &[Stmt], env: &Env) -> Result<(), RuntimeError> {
        for stmt in program {
            if let Flow::Return(_) = self.exec(stmt, env)? {
                tracing::debug!("top-level return ends the program");
                break;
            }
        }
        Ok(())
    }

    /// Runs `stmts` in `env` and reports whether a `return` cut them short.
    pub fn exec_block(&mut self, stmts: &[Stmt], env: &Env) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            if let flow @ Flow::Return(_) = self.exec(stmt, env)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Env) -> Result<Flow, RuntimeError> {
        ensure_sufficient_stack(|| self.exec_stmt(stmt, env))
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Env) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr, env)?;
            },
            Stmt::Print(expr) => {
                let value = self.eval(expr, env)?;
                writeln!(self.out, "{}", value)
                    .map_err(|err| ExecError::Output(err.to_string()).at(expr.line()))?;
            },
            Stmt::Var(name, init) => {
                let value = match init {
                    Some(init) => self.eval(init, env)?,
                    None => Value::Nil,
                };
                env.define(*name, value);
            },
            Stmt::Block(stmts) => return self.exec_block(stmts, &Env::child(env)),
            Stmt::If(cond, then, otherwise) => {
                if self.eval(cond, env)?.truth() {
                    return self.exec(then, env);
                } else if let Some(otherwise) = otherwise {
                    return self.exec(otherwise, env);
                }
            },
            Stmt::While(cond, body) => {
                while self.eval(cond, env)?.truth() {
                    if let flow @ Flow::Return(_) = self.exec(body, env)? {
                        return Ok(flow);
                    }
                }
            },
            Stmt::Func(decl) => {
                tracing::trace!(name = decl.name.as_str(), "declaring function");
                let func = Function::new(Rc::clone(decl), env.clone());
                env.define(decl.name, Value::Callable(Rc::new(func)));
            },
            Stmt::Return(value) => {
                let value = match value {
                    Some(value) => self.eval(value, env)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(value));
            },
        }
        Ok(Flow::Normal)
    }

    pub fn eval(&mut self, expr: &Node<Expr>, env: &Env) -> Result<Value, RuntimeError> {
        ensure_sufficient_stack(|| self.eval_expr(expr, env))
    }

    fn eval_expr(&mut self, expr: &Node<Expr>, env: &Env) -> Result<Value, RuntimeError> {
        match &**expr {
            Expr::Literal(l) => Ok(Value::from_literal(l)),
            Expr::Grouping(inner) => self.eval(inner, env),
            Expr::Var(name) => env
                .get(*name)
                .ok_or_else(|| ExecError::UndefinedVar(name.as_str().to_owned()).at(expr.line())),
            Expr::Assign(name, rhs) => {
                let value = self.eval(rhs, env)?;
                if env.assign(*name, value.clone()) {
                    Ok(value)
                } else {
                    Err(ExecError::UndefinedVar(name.as_str().to_owned()).at(expr.line()))
                }
            },
            Expr::Unary(op, a) => {
                let a = self.eval(a, env)?;
                let result = match &**op {
                    UnaryOp::Not => a.apply_not(),
                    UnaryOp::Neg => a.apply_neg(),
                };
                result.map_err(|kind| kind.at(op.line()))
            },
            Expr::Binary(op, a, b) => {
                let a = self.eval(a, env)?;
                let b = self.eval(b, env)?;
                let result = match &**op {
                    BinaryOp::Add => a.apply_add(b),
                    BinaryOp::Sub => a.apply_sub(b),
                    BinaryOp::Mul => a.apply_mul(b),
                    BinaryOp::Div => a.apply_div(b),
                    BinaryOp::Eq => a.apply_eq(b),
                    BinaryOp::NotEq => a.apply_not_eq(b),
                    BinaryOp::Less => a.apply_less(b),
                    BinaryOp::LessEq => a.apply_less_eq(b),
                    BinaryOp::Greater => a.apply_greater(b),
                    BinaryOp::GreaterEq => a.apply_greater_eq(b),
                };
                result.map_err(|kind| kind.at(op.line()))
            },
            Expr::Logical(op, a, b) => {
                let a = self.eval(a, env)?;
                match (&**op, a.truth()) {
                    (LogicalOp::Or, true) | (LogicalOp::And, false) => Ok(a),
                    _ => self.eval(b, env),
                }
            },
            Expr::Call(callee, args) => {
                let callee = self.eval(callee, env)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, env))
                    .collect::<Result<Vec<_>, _>>()?;

                let func = callee
                    .as_callable()
                    .ok_or_else(|| ExecError::NotCallable.at(expr.line()))?;
                if func.arity() != args.len() {
                    return Err(ExecError::WrongNumberOfArgs {
                        expected: func.arity(),
                        found: args.len(),
                    }.at(expr.line()));
                }

                tracing::trace!(name = func.name(), args = args.len(), "calling");
                func.call(self, args, expr.line())
            },
        }
    }
}
