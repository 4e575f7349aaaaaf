//! The tree-walking evaluator.
//!
//! Executes statements and expressions against a live chain of scopes,
//! consulting the resolver's distance table for every variable-like access.
//! `return` is modelled as an explicit [`Flow`] result propagated by every
//! statement-executing routine, not as an error or unwinding mechanism.
//!
//! One interpreter instance owns one global scope, constructed fresh per
//! program run, so independent runs (and tests) never interfere.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::class::LoxClass;
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::expr::{Expr, LiteralValue, NodeId};
use crate::function::{native_clock, native_exit, LoxFunction};
use crate::resolver::Locals;
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished: fell through normally, or hit a `return` whose
/// value must unwind exactly one function activation.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    /// The current-scope cursor.  Saved and restored around every nested
    /// execution (block, call, class-method build) on every exit path.
    environment: Rc<RefCell<Environment>>,
    /// The resolver's distance table, read-only during evaluation.
    locals: Locals,
    /// Where `print` writes.  Stdout by default; tests inject a buffer.
    out: Box<dyn Write>,
}

impl Interpreter {
    /// Create an interpreter printing to stdout, with the native functions
    /// `clock` and `exit` pre-defined in a fresh global scope.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Create an interpreter with an injected output sink.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: native_clock,
            },
        );
        globals.borrow_mut().define(
            "exit",
            Value::NativeFunction {
                name: "exit".to_string(),
                arity: 1,
                func: native_exit,
            },
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            out,
        }
    }

    /// Execute a resolved program.  A runtime error aborts the remaining
    /// top-level statements, not just the failing one.
    pub fn interpret(&mut self, statements: &[Stmt], locals: Locals) -> Result<()> {
        debug!(
            "Interpreting {} statement(s), {} resolved local(s)",
            statements.len(),
            locals.len()
        );

        self.locals = locals;

        for stmt in statements {
            if let Flow::Return(_) = self.execute(stmt)? {
                // The resolver rejects top-level `return`.
                break;
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(
                    Rc::clone(&self.environment),
                )));
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);
                // Capture the scope active at the definition site.
                let function =
                    LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Execute `statements` with `environment` as the current scope,
    /// restoring the prior scope on every exit path — normal completion,
    /// `return` propagation, or error unwinding alike.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Flow> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let result = self.run_sequence(statements);

        self.environment = previous;
        result
    }

    fn run_sequence(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    /// Class declaration:
    /// 1. evaluate the superclass expression (must be a class),
    /// 2. define the class name as nil so the resolver's forward-declare has
    ///    a runtime counterpart,
    /// 3. open a scope binding `super` while methods are built (subclasses
    ///    only), so every method closes over its superclass,
    /// 4. assign the finished class over the nil placeholder.
    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<crate::stmt::FunctionDecl>],
    ) -> Result<Flow> {
        debug!("Declaring class '{}'", name.lexeme);

        let superclass_value = match superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Value::Class(class) => Some(class),
                    _ => {
                        let token = superclass_token(expr).unwrap_or(name);
                        return Err(LoxError::runtime(
                            token.line,
                            token.col,
                            "Superclass must be a class.",
                        ));
                    }
                }
            }
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let previous = Rc::clone(&self.environment);

        if let Some(class) = &superclass_value {
            let mut environment = Environment::with_enclosing(Rc::clone(&self.environment));
            environment.define("super", Value::Class(Rc::clone(class)));
            self.environment = Rc::new(RefCell::new(environment));
        }

        let mut method_map = HashMap::new();
        for method in methods {
            let is_initializer = method.name.lexeme == "init";
            let function = LoxFunction::new(
                Rc::clone(method),
                Rc::clone(&self.environment),
                is_initializer,
            );
            method_map.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        // Close the temporary `super` scope (no-op when none was opened).
        self.environment = previous;

        let class = LoxClass::new(name.lexeme.clone(), superclass_value, method_map);
        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))?;

        Ok(Flow::Normal)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                // Short-circuit: the value returned is whichever operand
                // decided the result, never a coerced boolean.
                let left_value = self.evaluate(left)?;
                match operator.token_type {
                    TokenType::OR if left_value.is_truthy() => Ok(left_value),
                    TokenType::AND if !left_value.is_truthy() => Ok(left_value),
                    _ => self.evaluate(right),
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        if !Environment::assign_at(
                            &self.environment,
                            distance,
                            &name.lexeme,
                            value.clone(),
                        ) {
                            return Err(undefined_variable(name));
                        }
                    }
                    None => {
                        self.globals.borrow_mut().assign(name, value.clone())?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_value = self.evaluate(callee)?;

                let mut argument_values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    argument_values.push(self.evaluate(argument)?);
                }

                self.call_value(callee_value, paren, &argument_values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),
                _ => Err(LoxError::runtime(
                    name.line,
                    name.col,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value = self.evaluate(value)?;
                    instance.set(name, value.clone());
                    Ok(value)
                }
                _ => Err(LoxError::runtime(
                    name.line,
                    name.col,
                    "Only instances have fields.",
                )),
            },

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right_value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_value {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(
                    operator.line,
                    operator.col,
                    "Operand must be a number.",
                )),
            },
            TokenType::BANG => Ok(Value::Bool(!right_value.is_truthy())),
            _ => Err(LoxError::runtime(
                operator.line,
                operator.col,
                format!("Invalid unary operator '{}'.", operator.lexeme),
            )),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left_value = self.evaluate(left)?;
        let right_value = self.evaluate(right)?;

        match operator.token_type {
            // `+` is the one overloaded operator: numeric sum or string
            // concatenation, never a mix.
            TokenType::PLUS => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    operator.line,
                    operator.col,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(operator, left_value, right_value)?;
                Ok(Value::Number(a - b))
            }
            TokenType::STAR => {
                let (a, b) = number_operands(operator, left_value, right_value)?;
                Ok(Value::Number(a * b))
            }
            // Division by zero follows IEEE-754 (yields inf/nan).
            TokenType::SLASH => {
                let (a, b) = number_operands(operator, left_value, right_value)?;
                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(operator, left_value, right_value)?;
                Ok(Value::Bool(a > b))
            }
            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(operator, left_value, right_value)?;
                Ok(Value::Bool(a >= b))
            }
            TokenType::LESS => {
                let (a, b) = number_operands(operator, left_value, right_value)?;
                Ok(Value::Bool(a < b))
            }
            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(operator, left_value, right_value)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_value == right_value)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left_value != right_value)),

            _ => Err(LoxError::runtime(
                operator.line,
                operator.col,
                format!("Invalid binary operator '{}'.", operator.lexeme),
            )),
        }
    }

    /// `super.method`: fetch the superclass recorded at the resolved
    /// distance and the instance bound one scope closer, then look the
    /// method up on the superclass chain — never on the instance's own
    /// class, which is what makes explicit base-method dispatch work.
    fn evaluate_super(&mut self, id: NodeId, keyword: &Token, method: &Token) -> Result<Value> {
        let distance = *self
            .locals
            .get(&id)
            .ok_or_else(|| undefined_variable(keyword))?;

        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Some(Value::Class(class)) => class,
            _ => return Err(undefined_variable(keyword)),
        };

        // `this` lives one scope closer than `super`.
        let instance = match distance
            .checked_sub(1)
            .and_then(|d| Environment::get_at(&self.environment, d, "this"))
        {
            Some(Value::Instance(instance)) => instance,
            _ => return Err(undefined_variable(keyword)),
        };

        match superclass.find_method(&method.lexeme) {
            Some(function) => Ok(Value::Function(Rc::new(function.bind(instance)))),
            None => Err(LoxError::runtime(
                method.line,
                method.col,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    /// Invoke a callable value: native function, user function, or class
    /// (constructor).  Arity must match exactly.
    fn call_value(&mut self, callee: Value, paren: &Token, arguments: &[Value]) -> Result<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);
                check_arity(arity, arguments.len(), paren)?;
                func(arguments).map_err(|msg| LoxError::runtime(paren.line, paren.col, msg))
            }

            Value::Function(function) => {
                check_arity(function.arity(), arguments.len(), paren)?;
                function.call(self, arguments)
            }

            Value::Class(class) => {
                check_arity(class.arity(), arguments.len(), paren)?;
                class.instantiate(self, arguments)
            }

            _ => Err(LoxError::runtime(
                paren.line,
                paren.col,
                "Can only call functions and classes.",
            )),
        }
    }

    /// Resolved references jump straight to their frame; everything else is
    /// a global looked up by name (which is how forward references to
    /// top-level functions and classes work).
    fn look_up_variable(&self, name: &Token, id: NodeId) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme)
                .ok_or_else(|| undefined_variable(name)),
            None => self.globals.borrow().get(name),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn undefined_variable(name: &Token) -> LoxError {
    LoxError::runtime(
        name.line,
        name.col,
        format!("Undefined variable '{}'.", name.lexeme),
    )
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(LoxError::runtime(
            paren.line,
            paren.col,
            format!("Expected {} arguments but got {}.", expected, got),
        ))
    }
}

fn number_operands(operator: &Token, left: Value, right: Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((a, b)),
        _ => Err(LoxError::runtime(
            operator.line,
            operator.col,
            "Operands must be numbers.",
        )),
    }
}

/// The name token of a superclass clause, for error positioning.
fn superclass_token(expr: &Expr) -> Option<&Token> {
    match expr {
        Expr::Variable { name, .. } => Some(name),
        _ => None,
    }
}
