//! Wall-clock time: clock
//!
//! `clock` returns seconds since the Unix epoch as a number, with
//! millisecond precision.

use crate::callable::{Callable, NativeFn};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the epoch, millisecond precision.
pub fn native_clock(_: &mut Interpreter, _: &[Value]) -> Result<Value, RuntimeError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    Ok(Value::Number(now.as_millis() as f64 / 1000.0))
}

/// Register time built-ins in the environment.
pub fn register(env: &Rc<Environment>) {
    env.define(
        "clock",
        Value::Callable(Callable::Native(NativeFn {
            name: "clock",
            arity: Some(0),
            func: native_clock,
        })),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_returns_positive_number() {
        let mut interpreter = Interpreter::with_output(Box::new(Vec::new()));
        match native_clock(&mut interpreter, &[]).unwrap() {
            Value::Number(n) => assert!(n > 0.0),
            other => panic!("Expected Number, got {:?}", other),
        }
    }
}
