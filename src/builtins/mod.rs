//! # Built-in Functions
//!
//! The native callables registered into the global environment before
//! execution, organized by category:
//!
//! - **[console]**: print, input - standard I/O
//! - **[time]**: clock - wall-clock time
//! - **[types]**: type - value tag inspection
//! - **[lists]**: list - list construction (`len`/`append` dispatch through
//!   the property-access path on list values)
//!
//! Each category module exposes a `register` function installing its
//! bindings; `register_builtins` runs them all.

use crate::env::Environment;
use std::rc::Rc;

pub mod console;
pub mod lists;
pub mod time;
pub mod types;

/// Register every built-in in the given (global) environment.
pub fn register_builtins(env: &Rc<Environment>) {
    console::register(env);
    time::register(env);
    types::register(env);
    lists::register(env);
}
