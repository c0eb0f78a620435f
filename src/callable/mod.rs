use std::{
    fmt,
    rc::Rc,
    time::{SystemTime, UNIX_EPOCH},
};
use crate::{
    error::{ExecError, RuntimeError},
    parse::FuncDecl,
    util::Line,
    walker::{AbstractMachine, Env, Flow, Value},
};

/// Anything that can appear on the left of a call expression.
pub trait Callable: fmt::Debug + fmt::Display {
    fn name(&self) -> &str;

    fn arity(&self) -> usize;

    /// Invokes the callable. `args.len()` has already been checked against `arity()`, and
    /// `line` is the line of the call site.
    fn call(&self, machine: &mut AbstractMachine, args: Vec<Value>, line: Line) -> Result<Value, RuntimeError>;
}

pub type NativeImpl = dyn Fn(&[Value]) -> Result<Value, ExecError>;

/// A function supplied by the host.
pub struct NativeFn {
    name: String,
    arity: usize,
    func: Box<NativeImpl>,
}

impl NativeFn {
    pub fn new(
        name: impl Into<String>,
        arity: usize,
        func: impl Fn(&[Value]) -> Result<Value, ExecError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            func: Box::new(func),
        }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl fmt::Display for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl Callable for NativeFn {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _machine: &mut AbstractMachine, args: Vec<Value>, line: Line) -> Result<Value, RuntimeError> {
        (self.func)(&args).map_err(|kind| kind.at(line))
    }
}

/// A function declared in source, closed over the scope it was declared in.
///
/// The function is bound in that same scope, so the two keep each other alive through `Rc` and
/// are never freed, even after the `Engine` is dropped. Each call that declares an inner function
/// leaks one such scope.
pub struct Function {
    decl: Rc<FuncDecl>,
    closure: Env,
}

impl Function {
    pub fn new(decl: Rc<FuncDecl>, closure: Env) -> Self {
        Self { decl, closure }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // The closure usually contains this function, so it is left out.
        f.debug_struct("Function")
            .field("name", &self.decl.name.as_str())
            .field("params", &self.decl.params)
            .finish()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<fn {}>", self.decl.name.as_str())
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        self.decl.name.as_str()
    }

    fn arity(&self) -> usize {
        self.decl.arity()
    }

    fn call(&self, machine: &mut AbstractMachine, args: Vec<Value>, _line: Line) -> Result<Value, RuntimeError> {
        let env = Env::child(&self.closure);
        for (param, arg) in self.decl.params.iter().zip(args) {
            env.define(*param, arg);
        }

        match machine.exec_block(&self.decl.body, &env)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

/// `clock()`: seconds since the Unix epoch.
pub fn clock() -> NativeFn {
    NativeFn::new("clock", 0, |_| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| Value::Number(elapsed.as_secs_f64()))
            .map_err(|err| ExecError::Native(format!("clock error: {}", err)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_a_zero_arity_native() {
        let clock = clock();
        assert_eq!(clock.arity(), 0);
        assert_eq!(clock.name(), "clock");
        assert_eq!(clock.to_string(), "<native fn clock>");

        let mut machine = AbstractMachine::new(Box::new(std::io::sink()));
        match clock.call(&mut machine, Vec::new(), Line::start()) {
            Ok(Value::Number(secs)) => assert!(secs > 0.0),
            other => panic!("unexpected clock result: {:?}", other),
        }
    }

    #[test]
    fn native_errors_get_the_call_line() {
        let fail = NativeFn::new("fail", 1, |_| Err(ExecError::Native("nope".into())));
        let mut machine = AbstractMachine::new(Box::new(std::io::sink()));
        let err = fail.call(&mut machine, vec![Value::Nil], Line::from(4)).unwrap_err();
        assert_eq!(err.to_string(), "[line 4] runtime error: nope");
    }
}
