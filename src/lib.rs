pub mod callable;
pub mod error;
pub mod lex;
pub mod parse;
pub mod util;
pub mod walker;

use std::{io, io::Write, rc::Rc};

pub use self::{
    callable::{Callable, NativeFn},
    error::{Error, ExecError, ParseError, RuntimeError, ScanError},
    walker::{Env, Value},
};

use self::{
    walker::AbstractMachine,
    util::ident,
};

/// One interpreter session. Definitions made by one call to `evaluate_source` stay visible to
/// the next; separate engines share nothing.
pub struct Engine {
    machine: AbstractMachine,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// A session that prints to stdout and has the built-in `clock` function.
    pub fn new() -> Self {
        let mut engine = Self::bare();
        engine.define("clock", Value::Callable(Rc::new(callable::clock())));
        engine
    }

    /// A session with an empty global scope.
    pub fn bare() -> Self {
        Self {
            machine: AbstractMachine::new(Box::new(io::stdout())),
        }
    }

    /// Sends `print` output to `out` instead of stdout.
    pub fn with_output(mut self, out: impl Write + 'static) -> Self {
        self.machine.set_output(Box::new(out));
        self
    }

    pub fn globals(&self) -> &Env {
        self.machine.globals()
    }

    pub fn define(&mut self, name: &str, value: Value) {
        tracing::trace!(name, "defining global");
        self.machine.globals().define(ident(name), value);
    }

    pub fn define_native(
        &mut self,
        name: &str,
        arity: usize,
        func: impl Fn(&[Value]) -> Result<Value, ExecError> + 'static,
    ) {
        self.define(name, Value::Callable(Rc::new(NativeFn::new(name, arity, func))));
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.machine.globals().get(ident(name))
    }

    /// Scans, parses and runs `code` against this session's global scope.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate_source(&mut self, code: &str) -> Result<(), Error> {
        let tokens = lex::scan(code)?;
        let program = parse::parse(&tokens)?;
        tracing::debug!(tokens = tokens.len(), statements = program.len(), "running program");

        let globals = self.machine.globals().clone();
        self.machine.run(&program, &globals)?;
        Ok(())
    }

    /// Evaluates `code` as a single expression in the global scope.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate_expr(&mut self, code: &str) -> Result<Value, Error> {
        let tokens = lex::scan(code)?;
        let expr = parse::parse_expr(&tokens)?;

        let globals = self.machine.globals().clone();
        Ok(self.machine.eval(&expr, &globals)?)
    }
}
