//! List construction: list
//!
//! `list(...)` builds a fresh list containing its arguments. The list
//! methods `len()` and `append(v)` are not registered here: they are
//! dispatched through the generic property-access path on list values and
//! operate on the list's backing storage (see the evaluator's `Get`
//! handling).

use crate::callable::{Callable, NativeFn};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::rc::Rc;

/// A new list containing the given arguments in order.
pub fn native_list(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::list(args.to_vec()))
}

/// Register list built-ins in the environment.
pub fn register(env: &Rc<Environment>) {
    env.define(
        "list",
        Value::Callable(Callable::Native(NativeFn {
            name: "list",
            arity: None,
            func: native_list,
        })),
    );
}
