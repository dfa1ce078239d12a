// ABOUTME: Nested lexical environments mapping names to values

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One scope in the cons-cell chain. The chain is rooted at the global
/// scope; closures hold a strong reference to their capture environment,
/// pinning the chain up to the root.
#[derive(Debug)]
pub struct Environment {
    values: RefCell<HashMap<String, Value>>,
    enclosing: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates the global environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            values: RefCell::new(HashMap::new()),
            enclosing: None,
        })
    }

    /// Creates a child environment enclosed by `parent`.
    pub fn with_enclosing(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            values: RefCell::new(HashMap::new()),
            enclosing: Some(parent),
        })
    }

    /// The scope this one is nested in, if any.
    pub fn enclosing(&self) -> Option<Rc<Environment>> {
        self.enclosing.clone()
    }

    /// Unconditionally installs a binding in THIS scope.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.values.borrow_mut().insert(name.into(), value);
    }

    /// Looks a name up, walking outward through enclosing scopes.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }
        if let Some(ref parent) = self.enclosing {
            return parent.get(name);
        }
        Err(RuntimeError::new(
            name,
            format!("Undefined variable '{}'.", name.lexeme),
        ))
    }

    /// Writes to the first enclosing scope that defines `name`.
    pub fn assign(&self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if self.values.borrow().contains_key(&name.lexeme) {
            self.values.borrow_mut().insert(name.lexeme.clone(), value);
            return Ok(());
        }
        if let Some(ref parent) = self.enclosing {
            return parent.assign(name, value);
        }
        Err(RuntimeError::new(
            name,
            format!("Undefined variable '{}'.", name.lexeme),
        ))
    }

    /// Reads `name` in the scope exactly `distance` enclosures out.
    /// Reachable only through a correctly-populated resolver table.
    pub fn get_at(&self, distance: usize, name: &str) -> Value {
        self.ancestor(distance)
            .values
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or(Value::Nil)
    }

    /// Writes `name` in the scope exactly `distance` enclosures out.
    pub fn assign_at(&self, distance: usize, name: &Token, value: Value) {
        self.ancestor(distance)
            .values
            .borrow_mut()
            .insert(name.lexeme.clone(), value);
    }

    /// Walks `distance` enclosures outward. A short chain clamps at the
    /// root; the resolver contract keeps that path unreachable.
    fn ancestor(&self, distance: usize) -> &Environment {
        let mut environment = self;
        for _ in 0..distance {
            match environment.enclosing {
                Some(ref parent) => environment = parent.as_ref(),
                None => break,
            }
        }
        environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Literal, TokenKind};

    fn name_token(name: &str) -> Token {
        Token::new(TokenKind::Identifier, name, Literal::None, 1)
    }

    #[test]
    fn test_define_and_get() {
        let env = Environment::new();
        env.define("x", Value::Integer(42));

        match env.get(&name_token("x")) {
            Ok(Value::Integer(n)) => assert_eq!(n, 42),
            other => panic!("Expected Integer(42), got {:?}", other),
        }
    }

    #[test]
    fn test_get_undefined_errors() {
        let env = Environment::new();
        let result = env.get(&name_token("missing"));
        match result {
            Err(e) => assert!(e.message.contains("Undefined variable")),
            Ok(_) => panic!("Expected undefined-variable error"),
        }
    }

    #[test]
    fn test_shadowing() {
        let parent = Environment::new();
        parent.define("x", Value::Integer(1));

        let child = Environment::with_enclosing(parent);
        child.define("x", Value::Integer(2));

        match child.get(&name_token("x")) {
            Ok(Value::Integer(n)) => assert_eq!(n, 2),
            other => panic!("Expected Integer(2), got {:?}", other),
        }
    }

    #[test]
    fn test_assign_walks_outward() {
        let parent = Environment::new();
        parent.define("x", Value::Integer(1));

        let child = Environment::with_enclosing(Rc::clone(&parent));
        child
            .assign(&name_token("x"), Value::Integer(9))
            .expect("assign should find x in parent");

        match parent.get(&name_token("x")) {
            Ok(Value::Integer(n)) => assert_eq!(n, 9),
            other => panic!("Expected Integer(9), got {:?}", other),
        }
    }

    #[test]
    fn test_assign_undefined_errors() {
        let env = Environment::new();
        assert!(env.assign(&name_token("x"), Value::Nil).is_err());
    }

    #[test]
    fn test_get_at_skips_scopes() {
        let global = Environment::new();
        global.define("x", Value::Integer(0));

        let middle = Environment::with_enclosing(Rc::clone(&global));
        middle.define("x", Value::Integer(1));

        let inner = Environment::with_enclosing(Rc::clone(&middle));
        inner.define("x", Value::Integer(2));

        match inner.get_at(0, "x") {
            Value::Integer(n) => assert_eq!(n, 2),
            other => panic!("Expected Integer(2), got {:?}", other),
        }
        match inner.get_at(1, "x") {
            Value::Integer(n) => assert_eq!(n, 1),
            other => panic!("Expected Integer(1), got {:?}", other),
        }
        match inner.get_at(2, "x") {
            Value::Integer(n) => assert_eq!(n, 0),
            other => panic!("Expected Integer(0), got {:?}", other),
        }
    }

    #[test]
    fn test_assign_at_writes_exact_scope() {
        let global = Environment::new();
        global.define("x", Value::Integer(0));

        let inner = Environment::with_enclosing(Rc::clone(&global));
        inner.define("x", Value::Integer(1));

        inner.assign_at(1, &name_token("x"), Value::Integer(7));
        match global.get_at(0, "x") {
            Value::Integer(n) => assert_eq!(n, 7),
            other => panic!("Expected Integer(7), got {:?}", other),
        }
        // The inner binding is untouched.
        match inner.get_at(0, "x") {
            Value::Integer(n) => assert_eq!(n, 1),
            other => panic!("Expected Integer(1), got {:?}", other),
        }
    }
}
