//! The scope chain: a linked stack of name→value frames.
//!
//! One frame per block, per function call, and per class body (to host
//! `super`).  Frames are shared through `Rc<RefCell<_>>` because closures
//! capture their defining frame and keep it alive for as long as the closure
//! itself is reachable.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    pub enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// The outermost (global) frame.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// A child frame whose lookups fall through to `enclosing`.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Introduce or overwrite a binding in *this* frame.  Shadowing an outer
    /// binding is legal and intentional.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this frame, then outward through the enclosing
    /// chain.  Unresolved at the outermost frame is a runtime error.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined_variable(name))
        }
    }

    /// Assign to an *existing* binding, searching outward like [`Self::get`].
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined_variable(name))
        }
    }

    /// The frame exactly `distance` enclosing links out from `env`.
    ///
    /// Callers (the interpreter, via the resolver's distance table) guarantee
    /// the distance never exceeds the actual chain depth; a `None` here means
    /// resolver and evaluator scope nesting fell out of lockstep.
    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut frame = Rc::clone(env);

        for _ in 0..distance {
            let enclosing = frame.borrow().enclosing.clone()?;
            frame = enclosing;
        }

        Some(frame)
    }

    /// Read `name` directly from the frame `distance` links out.  No name
    /// fallback: used exclusively for resolved (non-global) accesses.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
    ) -> Option<Value> {
        Self::ancestor(env, distance)?.borrow().values.get(name).cloned()
    }

    /// Write `name` directly into the frame `distance` links out.  Returns
    /// false if no frame exists at that distance (a resolution bug, surfaced
    /// by the caller as an undefined-variable error).
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> bool {
        match Self::ancestor(env, distance) {
            Some(frame) => {
                frame.borrow_mut().values.insert(name.to_string(), value);
                true
            }
            None => false,
        }
    }
}

impl Default for Environment {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1, 1)
    }

    #[test]
    fn define_then_get() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));

        assert_eq!(env.get(&ident("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn get_walks_enclosing_chain() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::Number(1.0));

        let child = Environment::with_enclosing(Rc::clone(&global));

        assert_eq!(child.get(&ident("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn undefined_variable_is_an_error_even_at_global() {
        let env = Environment::new();

        assert!(matches!(
            env.get(&ident("missing")),
            Err(LoxError::Runtime { .. })
        ));
    }

    #[test]
    fn assign_mutates_the_defining_frame() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::Number(1.0));

        let child = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &global,
        ))));
        child
            .borrow_mut()
            .assign(&ident("a"), Value::Number(2.0))
            .unwrap();

        assert_eq!(
            global.borrow().get(&ident("a")).unwrap(),
            Value::Number(2.0)
        );
    }

    #[test]
    fn shadowing_hides_the_outer_binding() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::String("outer".into()));

        let mut child = Environment::with_enclosing(Rc::clone(&global));
        child.define("a", Value::String("inner".into()));

        assert_eq!(
            child.get(&ident("a")).unwrap(),
            Value::String("inner".into())
        );
    }

    #[test]
    fn get_at_jumps_exactly_distance_frames() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::Number(0.0));

        let middle = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &global,
        ))));
        middle.borrow_mut().define("a", Value::Number(1.0));

        let inner = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &middle,
        ))));

        assert_eq!(
            Environment::get_at(&inner, 1, "a"),
            Some(Value::Number(1.0))
        );
        assert_eq!(
            Environment::get_at(&inner, 2, "a"),
            Some(Value::Number(0.0))
        );
        // No name fallback at the target frame.
        assert_eq!(Environment::get_at(&inner, 0, "a"), None);
    }

    #[test]
    fn assign_at_writes_the_target_frame_only() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::Number(0.0));

        let inner = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &global,
        ))));

        assert!(Environment::assign_at(&inner, 1, "a", Value::Number(9.0)));
        assert_eq!(
            global.borrow().get(&ident("a")).unwrap(),
            Value::Number(9.0)
        );
    }
}
