//! User-defined function objects and the native functions pre-defined in the
//! global scope.
//!
//! A [`LoxFunction`] pairs a declaration with the scope captured at its
//! definition site (the closure) and a flag marking `init` methods.  Binding
//! a function to an instance never mutates the original: it produces a new
//! function whose closure is a fresh child frame defining `this`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::stmt::FunctionDecl;
use crate::value::Value;

#[derive(Debug)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Produce a copy of this function bound to `instance`: the new closure
    /// is a child frame of the original with `this` defined in slot zero.
    pub fn bind(&self, instance: Rc<LoxInstance>) -> LoxFunction {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    /// Invoke the function.  The call site has already checked arity, so
    /// parameters and arguments zip exactly.
    ///
    /// An initializer always yields the bound instance — whether the body
    /// runs to completion or unwinds through a bare `return;`.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: &[Value]) -> Result<Value> {
        debug!(
            "Calling <fn {}> with {} argument(s)",
            self.name(),
            arguments.len()
        );

        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument.clone());
        }

        let flow = interpreter.execute_block(
            &self.declaration.body,
            Rc::new(RefCell::new(environment)),
        )?;

        if self.is_initializer {
            return self.this_binding();
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }

    /// The `this` bound in an initializer's closure.  Binding always defines
    /// it at distance zero; a miss means the method was built without `bind`.
    fn this_binding(&self) -> Result<Value> {
        Environment::get_at(&self.closure, 0, "this").ok_or_else(|| {
            LoxError::runtime(
                self.declaration.name.line,
                self.declaration.name.col,
                "Undefined variable 'this'.",
            )
        })
    }
}

/// `clock()` — current time in seconds since the Unix epoch, as a number.
pub fn native_clock(_args: &[Value]) -> std::result::Result<Value, String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}

/// `exit(code)` — terminate the process with the given status code.
/// Never returns.
pub fn native_exit(args: &[Value]) -> std::result::Result<Value, String> {
    match args.first() {
        Some(Value::Number(code)) => std::process::exit(*code as i32),
        _ => Err("exit() takes a numeric status code.".to_string()),
    }
}
