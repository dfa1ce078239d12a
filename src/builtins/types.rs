//! Value tag inspection: type
//!
//! `type(v)` returns a string naming the value's variant: "nil", "bool",
//! "number", "integer", "string", "list", "function", "class" or
//! "instance".

use crate::callable::{Callable, NativeFn};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::token::{Token, TokenKind};
use crate::value::Value;
use std::rc::Rc;

/// The tag name of the single argument.
pub fn native_type(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        let token = Token::synthetic(TokenKind::Identifier, "type", 0);
        return Err(RuntimeError::new(
            &token,
            "Runtime Error. type takes exactly one argument.",
        ));
    }
    Ok(Value::Str(args[0].type_name().to_string()))
}

/// Register type built-ins in the environment.
pub fn register(env: &Rc<Environment>) {
    env.define(
        "type",
        Value::Callable(Callable::Native(NativeFn {
            name: "type",
            arity: None,
            func: native_type,
        })),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_of(value: Value) -> String {
        let mut interpreter = Interpreter::with_output(Box::new(Vec::new()));
        match native_type(&mut interpreter, &[value]).unwrap() {
            Value::Str(s) => s,
            other => panic!("Expected Str, got {:?}", other),
        }
    }

    #[test]
    fn test_type_names() {
        assert_eq!(type_of(Value::Nil), "nil");
        assert_eq!(type_of(Value::Bool(true)), "bool");
        assert_eq!(type_of(Value::Integer(1)), "integer");
        assert_eq!(type_of(Value::Number(1.5)), "number");
        assert_eq!(type_of(Value::Str("x".to_string())), "string");
        assert_eq!(type_of(Value::list(vec![])), "list");
    }

    #[test]
    fn test_type_wrong_arity_errors() {
        let mut interpreter = Interpreter::with_output(Box::new(Vec::new()));
        assert!(native_type(&mut interpreter, &[]).is_err());
        assert!(native_type(&mut interpreter, &[Value::Nil, Value::Nil]).is_err());
    }
}
