// ABOUTME: The callable sum type: user functions, classes, natives, list methods

use crate::ast::FunctionDecl;
use crate::class::{LoxClass, LoxInstance};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{Control, Interpreter};
use crate::token::Token;
use crate::value::{ListRef, Value};
use std::fmt;
use std::rc::Rc;

/// Signature of a native function. Natives receive the interpreter so that
/// `print` can reach the configured output sink.
pub type NativeFunc = fn(&mut Interpreter, &[Value]) -> Result<Value, RuntimeError>;

/// A built-in function registered in the global environment.
/// `arity: None` marks a variadic native; the call site skips the arity
/// check and the native validates its own arguments.
#[derive(Clone, Copy)]
pub struct NativeFn {
    pub name: &'static str,
    pub arity: Option<usize>,
    pub func: NativeFunc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMethodKind {
    Len,
    Append,
}

/// Everything invocable with `(...)` or obtainable from property access.
#[derive(Clone)]
pub enum Callable {
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Native(NativeFn),
    /// `len`/`append` bound to a list's backing storage.
    ListMethod { list: ListRef, kind: ListMethodKind },
}

impl Callable {
    /// Declared arity; `None` means any number of arguments is accepted.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Callable::Function(function) => Some(function.arity()),
            Callable::Class(class) => Some(class.arity()),
            Callable::Native(native) => native.arity,
            Callable::ListMethod { kind, .. } => match kind {
                ListMethodKind::Len => Some(0),
                ListMethodKind::Append => Some(1),
            },
        }
    }

    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value, RuntimeError> {
        match self {
            Callable::Function(function) => function.call(interpreter, arguments, paren),
            Callable::Class(class) => LoxClass::construct(class, interpreter, arguments, paren),
            Callable::Native(native) => (native.func)(interpreter, &arguments),
            Callable::ListMethod { list, kind } => match kind {
                ListMethodKind::Len => Ok(Value::Number(list.borrow().len() as f64)),
                ListMethodKind::Append => {
                    list.borrow_mut().push(arguments[0].clone());
                    Ok(Value::Nil)
                }
            },
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function(function) => write!(f, "<fn {}>", function.name()),
            Callable::Class(class) => write!(f, "<class {}>", class.name),
            Callable::Native(native) => write!(f, "<native fn: {}>", native.name),
            Callable::ListMethod { kind, .. } => {
                let name = match kind {
                    ListMethodKind::Len => "len",
                    ListMethodKind::Append => "append",
                };
                write!(f, "<native fn: {}>", name)
            }
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// A user function: its declaration plus the environment captured at the
/// point of declaration. The capture outlives the declaring scope.
#[derive(Debug)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<Environment>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<Environment>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
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

    /// A fresh callable whose closure wraps this one with `this` bound to
    /// the receiver. Evaluating `inst.m` twice yields two distinct
    /// callables with identical observable behaviour.
    pub fn bind(&self, instance: Rc<LoxInstance>) -> LoxFunction {
        let environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(instance));
        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value, RuntimeError> {
        let environment = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(param.lexeme.clone(), argument);
        }

        match interpreter.execute_block(&self.declaration.body, environment)? {
            Control::Return(value) => {
                // An initializer always yields the instance, even on an
                // early `return;`.
                if self.is_initializer {
                    Ok(self.closure.get_at(0, "this"))
                } else {
                    Ok(value)
                }
            }
            Control::Normal => {
                if self.is_initializer {
                    Ok(self.closure.get_at(0, "this"))
                } else {
                    Ok(Value::Nil)
                }
            }
            // A loop signal escaping the frame means the loop it targeted
            // is outside this call; that is never legal.
            Control::Break(_) => Err(RuntimeError::new(
                paren,
                "Runtime Error. Cannot break outside of a loop.",
            )),
            Control::Continue(_) => Err(RuntimeError::new(
                paren,
                "Runtime Error. Cannot continue outside of a loop.",
            )),
        }
    }
}
