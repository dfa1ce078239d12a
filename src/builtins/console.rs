//! Console I/O: print, input
//!
//! - `print`: variadic; writes its arguments space-separated with a
//!   trailing newline and returns nil
//! - `input`: reads one line from standard input and returns it as a string

use crate::callable::{Callable, NativeFn};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::io::BufRead;
use std::rc::Rc;

/// Prints arguments space-separated with a trailing newline. Returns nil.
pub fn native_print(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let text = args
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    interpreter.write_output(&text);
    Ok(Value::Nil)
}

/// Reads a line from standard input, without the trailing newline.
/// End of input yields an empty string.
pub fn native_input(_: &mut Interpreter, _: &[Value]) -> Result<Value, RuntimeError> {
    let mut line = String::new();
    let stdin = std::io::stdin();
    let _ = stdin.lock().read_line(&mut line);
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Value::Str(line))
}

/// Register console built-ins in the environment.
pub fn register(env: &Rc<Environment>) {
    env.define(
        "print",
        Value::Callable(Callable::Native(NativeFn {
            name: "print",
            arity: None,
            func: native_print,
        })),
    );
    env.define(
        "input",
        Value::Callable(Callable::Native(NativeFn {
            name: "input",
            arity: Some(0),
            func: native_input,
        })),
    );
}
